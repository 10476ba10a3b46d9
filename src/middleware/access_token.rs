/// Access Token Middleware
///
/// Validates the access token from the `accessToken` cookie (or an
/// `Authorization: Bearer` header) and injects the verified `AccessPayload`
/// into request extensions for use by route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::{AccessPayload, TokenCodec};
use crate::error::{AppError, AuthError};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Middleware for protecting routes
pub struct AccessTokenMiddleware {
    codec: Arc<TokenCodec<AccessPayload>>,
}

impl AccessTokenMiddleware {
    pub fn new(codec: Arc<TokenCodec<AccessPayload>>) -> Self {
        Self { codec }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessTokenMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AccessTokenMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AccessTokenMiddlewareService {
            service: Rc::new(service),
            codec: Arc::clone(&self.codec),
        }))
    }
}

pub struct AccessTokenMiddlewareService<S> {
    service: Rc<S>,
    codec: Arc<TokenCodec<AccessPayload>>,
}

impl<S, B> Service<ServiceRequest> for AccessTokenMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let verified = extract_token(&req)
            .ok_or(AppError::Auth(AuthError::MissingToken(ACCESS_TOKEN_COOKIE)))
            .and_then(|token| self.codec.verify(&token).map_err(AppError::from));

        match verified {
            Ok(payload) => {
                tracing::debug!(
                    user_id = %payload.user_id,
                    is_admin = payload.is_admin,
                    "Access token validated"
                );
                req.extensions_mut().insert(payload);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                let error = Error::from(e);
                Box::pin(async move { Err::<ServiceResponse<B>, Error>(error) })
            }
        }
    }
}

fn extract_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(ACCESS_TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}
