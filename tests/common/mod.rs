//! Shared setup for the integration tests

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use reqwest::Response;
use std::net::TcpListener;
use std::sync::Arc;

use session_auth::clock::ManualClock;
use session_auth::configuration::{ApplicationSettings, Settings, TokenSettings, UserSettings};
use session_auth::startup::{run, Services};

pub const ADMIN_NAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin";

pub struct TestApp {
    pub address: String,
    pub services: Services,
    pub clock: Arc<ManualClock>,
    pub client: reqwest::Client,
}

/// Tokens handed out by a successful login
pub struct LoginTokens {
    pub access: String,
    pub refresh: String,
}

pub fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 8, 6, 0, 0, 0).unwrap()
}

fn test_settings() -> Settings {
    Settings {
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        tokens: TokenSettings {
            access_secret: "accessKey".to_string(),
            access_token_expiry: 120,
            refresh_secret: "refreshKey".to_string(),
            refresh_token_expiry: 60 * 60 * 24 * 365,
        },
        users: UserSettings {
            admin_name: ADMIN_NAME.to_string(),
            admin_password: ADMIN_PASSWORD.to_string(),
            bcrypt_cost: 4,
        },
    }
}

pub async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let clock = Arc::new(ManualClock::new(start_instant()));
    let services = Services::from_settings(&test_settings(), clock.clone())
        .expect("Failed to build services");

    let server = run(listener, services.clone()).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        services,
        clock,
        client: reqwest::Client::new(),
    }
}

/// Value of the named cookie in the response's `Set-Cookie` headers
pub fn set_cookie(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|header| header.to_str().ok())
        .filter_map(|header| header.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.to_string())
}

impl TestApp {
    pub async fn post_login(&self, name: &str, password: &str) -> Response {
        self.client
            .post(&format!("{}/auth/login", &self.address))
            .header("User-Agent", "integration-tests")
            .form(&[("name", name), ("password", password)])
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(&self, name: &str, password: &str) -> LoginTokens {
        let response = self.post_login(name, password).await;
        assert_eq!(200, response.status().as_u16(), "login as {} failed", name);

        LoginTokens {
            access: set_cookie(&response, "accessToken").expect("No accessToken cookie"),
            refresh: set_cookie(&response, "refreshToken").expect("No refreshToken cookie"),
        }
    }

    pub async fn login_admin(&self) -> LoginTokens {
        self.login(ADMIN_NAME, ADMIN_PASSWORD).await
    }

    pub async fn post_refresh(&self, refresh_token: &str) -> Response {
        self.client
            .post(&format!("{}/auth/refresh", &self.address))
            .header("Cookie", format!("refreshToken={}", refresh_token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_logout(&self, refresh_token: &str) -> Response {
        self.client
            .post(&format!("{}/auth/logout", &self.address))
            .header("Cookie", format!("refreshToken={}", refresh_token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_sessions(&self, access_token: &str) -> Response {
        self.client
            .get(&format!("{}/sessions", &self.address))
            .header("Cookie", format!("accessToken={}", access_token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn delete_session(&self, access_token: &str, id: &str) -> Response {
        self.client
            .delete(&format!("{}/sessions/{}", &self.address, id))
            .header("Cookie", format!("accessToken={}", access_token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_users(&self, access_token: &str) -> Response {
        self.client
            .get(&format!("{}/users", &self.address))
            .header("Cookie", format!("accessToken={}", access_token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_user(&self, access_token: &str, body: &serde_json::Value) -> Response {
        self.client
            .post(&format!("{}/users", &self.address))
            .header("Cookie", format!("accessToken={}", access_token))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn delete_user(&self, access_token: &str, id: &str) -> Response {
        self.client
            .delete(&format!("{}/users/{}", &self.address, id))
            .header("Cookie", format!("accessToken={}", access_token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Create a non-admin user directly in the directory, returning its id
    pub fn add_user(&self, name: &str, password: &str) -> String {
        self.services
            .users
            .write()
            .create_user(name, password, false)
            .expect("Failed to create user")
            .id
    }
}
