//! Integration tests for session and user administration

mod common;

use chrono::Duration;
use serde_json::{json, Value};

use common::{spawn_app, ADMIN_NAME};

// --- Session Listing ---

#[tokio::test]
async fn admin_sees_every_session() {
    let app = spawn_app().await;
    app.add_user("user2", "user2");

    let admin = app.login_admin().await;
    app.login("user2", "user2").await;

    let response = app.get_sessions(&admin.access).await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    let sessions = body["sessions"].as_array().expect("sessions is not an array");
    assert_eq!(sessions.len(), 2);
    assert!(sessions[0]["refreshIdentity"]["issuedAtTime"].is_string());
    assert!(sessions[0]["deviceData"]["ipAddress"].is_string());
}

#[tokio::test]
async fn user_sees_only_their_own_sessions() {
    let app = spawn_app().await;
    let user_id = app.add_user("user2", "user2");

    app.login_admin().await;
    let user = app.login("user2", "user2").await;

    let body: Value = app
        .get_sessions(&user.access)
        .await
        .json()
        .await
        .expect("Failed to parse response");
    let sessions = body["sessions"].as_array().expect("sessions is not an array");

    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["refreshIdentity"]["userId"], user_id.as_str());
}

// --- Session Revocation ---

#[tokio::test]
async fn user_cannot_revoke_another_users_session() {
    let app = spawn_app().await;
    app.add_user("user2", "user2");

    app.login_admin().await;
    let user = app.login("user2", "user2").await;

    let admin_id = app.services.users.read().get_by_name(ADMIN_NAME).unwrap().id.clone();
    let admin_session = app.services.sessions.read().list_for_user(&admin_id)[0].id.to_string();

    let response = app.delete_session(&user.access, &admin_session).await;

    assert_eq!(403, response.status().as_u16());
    assert_eq!(app.services.sessions.read().len(), 2);
}

#[tokio::test]
async fn user_can_revoke_their_own_session() {
    let app = spawn_app().await;
    let user_id = app.add_user("user2", "user2");
    let user = app.login("user2", "user2").await;

    let session_id = app.services.sessions.read().list_for_user(&user_id)[0].id.to_string();
    let response = app.delete_session(&user.access, &session_id).await;

    assert_eq!(200, response.status().as_u16());
    assert!(app.services.sessions.read().is_empty());
}

#[tokio::test]
async fn admin_can_revoke_any_session() {
    let app = spawn_app().await;
    let user_id = app.add_user("user2", "user2");

    let admin = app.login_admin().await;
    let user = app.login("user2", "user2").await;

    let session_id = app.services.sessions.read().list_for_user(&user_id)[0].id.to_string();
    let response = app.delete_session(&admin.access, &session_id).await;

    assert_eq!(200, response.status().as_u16());
    assert_eq!(404, app.post_refresh(&user.refresh).await.status().as_u16());
}

#[tokio::test]
async fn revoking_an_unknown_session_returns_404() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;

    let unknown = uuid::Uuid::new_v4().to_string();
    assert_eq!(404, app.delete_session(&admin.access, &unknown).await.status().as_u16());
    assert_eq!(404, app.delete_session(&admin.access, "not-a-uuid").await.status().as_u16());
}

// --- Users ---

#[tokio::test]
async fn list_users_omits_password_hashes() {
    let app = spawn_app().await;
    app.add_user("user2", "user2");
    let user = app.login("user2", "user2").await;

    let response = app.get_users(&user.access).await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    let users = body["users"].as_array().expect("users is not an array");
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["name"], "admin");
    assert_eq!(users[1]["name"], "user2");
    assert!(users.iter().all(|user| user.get("passwordHash").is_none()));
}

#[tokio::test]
async fn admin_can_create_a_user_who_can_then_log_in() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;

    let response = app
        .post_user(&admin.access, &json!({"name": "user3", "password": "user3"}))
        .await;

    assert_eq!(201, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["name"], "user3");
    assert_eq!(body["isAdmin"], false);

    app.clock.advance(Duration::seconds(1));
    let response = app.post_login("user3", "user3").await;
    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn non_admin_cannot_create_users() {
    let app = spawn_app().await;
    app.add_user("user2", "user2");
    let user = app.login("user2", "user2").await;

    let response = app
        .post_user(&user.access, &json!({"name": "user3", "password": "user3"}))
        .await;

    assert_eq!(403, response.status().as_u16());
    assert_eq!(app.services.users.read().len(), 2);
}

#[tokio::test]
async fn creating_a_duplicate_user_returns_409() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;

    let response = app
        .post_user(&admin.access, &json!({"name": "admin", "password": "other"}))
        .await;

    assert_eq!(409, response.status().as_u16());
}

#[tokio::test]
async fn creating_a_user_with_empty_fields_returns_400() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;

    let test_cases = vec![
        (json!({"name": "", "password": "pw"}), "empty name"),
        (json!({"name": "user3", "password": ""}), "empty password"),
    ];

    for (body, reason) in test_cases {
        let response = app.post_user(&admin.access, &body).await;
        assert_eq!(400, response.status().as_u16(), "Should reject request: {}", reason);
    }
}

#[tokio::test]
async fn deleting_a_user_revokes_their_sessions() {
    let app = spawn_app().await;
    let user_id = app.add_user("user2", "user2");

    let admin = app.login_admin().await;
    let user = app.login("user2", "user2").await;

    let response = app.delete_user(&admin.access, &user_id).await;

    assert_eq!(200, response.status().as_u16());
    assert!(app.services.sessions.read().list_for_user(&user_id).is_empty());
    assert_eq!(app.services.sessions.read().len(), 1);
    assert_eq!(404, app.post_refresh(&user.refresh).await.status().as_u16());
}

#[tokio::test]
async fn admin_cannot_delete_themselves() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;
    let admin_id = app.services.users.read().get_by_name(ADMIN_NAME).unwrap().id.clone();

    let response = app.delete_user(&admin.access, &admin_id).await;

    assert_eq!(400, response.status().as_u16());
    assert_eq!(app.services.users.read().len(), 1);
}

#[tokio::test]
async fn deleting_an_unknown_user_returns_404() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;

    let response = app.delete_user(&admin.access, "missing").await;

    assert_eq!(404, response.status().as_u16());
}
