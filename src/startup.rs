use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use parking_lot::RwLock;
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{AccessPayload, RefreshPayload, TokenCodec};
use crate::clock::Clock;
use crate::configuration::Settings;
use crate::error::AppError;
use crate::logger::LoggerMiddleware;
use crate::middleware::AccessTokenMiddleware;
use crate::routes::{
    create_user, delete_session, delete_user, health_check, list_sessions, list_users, login,
    logout, refresh,
};
use crate::session::SessionRegistry;
use crate::users::UserDirectory;

/// Everything the request handlers share
#[derive(Clone)]
pub struct Services {
    pub access_codec: Arc<TokenCodec<AccessPayload>>,
    pub refresh_codec: Arc<TokenCodec<RefreshPayload>>,
    pub sessions: Arc<RwLock<SessionRegistry>>,
    pub users: Arc<RwLock<UserDirectory>>,
    pub clock: Arc<dyn Clock>,
}

impl Services {
    /// Build codecs, an empty session registry and a user directory seeded
    /// with the configured admin account.
    ///
    /// # Errors
    /// Returns error if a token expiry is invalid or the admin account
    /// cannot be created
    pub fn from_settings(settings: &Settings, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let tokens = &settings.tokens;
        let access_codec = TokenCodec::new(
            tokens.access_secret.as_bytes(),
            tokens.access_duration()?,
            clock.clone(),
        );
        let refresh_codec = TokenCodec::new(
            tokens.refresh_secret.as_bytes(),
            tokens.refresh_duration()?,
            clock.clone(),
        );

        let mut users = UserDirectory::new(settings.users.bcrypt_cost);
        users.create_user(&settings.users.admin_name, &settings.users.admin_password, true)?;

        Ok(Self {
            access_codec: Arc::new(access_codec),
            refresh_codec: Arc::new(refresh_codec),
            sessions: Arc::new(RwLock::new(SessionRegistry::new(clock.clone()))),
            users: Arc::new(RwLock::new(users)),
            clock,
        })
    }
}

pub fn run(listener: TcpListener, services: Services) -> Result<Server, std::io::Error> {
    let server = HttpServer::new(move || {
        App::new()
            .wrap(LoggerMiddleware)
            // Shared state
            .app_data(web::Data::from(services.access_codec.clone()))
            .app_data(web::Data::from(services.refresh_codec.clone()))
            .app_data(web::Data::from(services.sessions.clone()))
            .app_data(web::Data::from(services.users.clone()))
            .app_data(web::Data::from(services.clock.clone()))
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))
            .route("/auth/logout", web::post().to(logout))
            // Routes requiring a valid access token
            .service(
                web::scope("/sessions")
                    .wrap(AccessTokenMiddleware::new(services.access_codec.clone()))
                    .route("", web::get().to(list_sessions))
                    .route("/{id}", web::delete().to(delete_session)),
            )
            .service(
                web::scope("/users")
                    .wrap(AccessTokenMiddleware::new(services.access_codec.clone()))
                    .route("", web::get().to(list_users))
                    .route("", web::post().to(create_user))
                    .route("/{id}", web::delete().to(delete_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
