//! In-process stand-in for the auth backend, used by client tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{Query, Request},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::{client::api::ApiClient, config::ClientConfig};

pub const ADA_PASSWORD: &str = "Aa1!aaaa";
pub const ADA_TOKEN: &str = "jwt-ada";

/// Every request path (with query) the stub has seen.
#[derive(Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<String>>>);

impl Calls {
    pub fn recorded(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

fn ada(token: &str) -> Value {
    json!({
        "email": "ada@example.com",
        "firstName": "Ada",
        "lastName": "Lovelace",
        "authProvider": "local",
        "token": token
    })
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, message.to_string()).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == format!("Bearer {ADA_TOKEN}"))
}

async fn register(Json(body): Json<Value>) -> Response {
    match body["email"].as_str() {
        Some("taken@example.com") => bad_request("Email already registered"),
        _ => "Verification email sent".into_response(),
    }
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["email"] == "ada@example.com" && body["password"] == ADA_PASSWORD {
        (
            [(header::SET_COOKIE, format!("jwt={ADA_TOKEN}; Path=/; HttpOnly"))],
            Json(ada(ADA_TOKEN)),
        )
            .into_response()
    } else {
        bad_request("Invalid credentials")
    }
}

async fn google(Json(body): Json<Value>) -> Response {
    if body["idToken"] == "good" {
        Json(json!({
            "email": "grace@gmail.com",
            "firstName": "Grace",
            "lastName": "Hopper",
            "profilePic": "https://pics.example.com/g.png",
            "authProvider": "google",
            "token": "jwt-grace"
        }))
        .into_response()
    } else {
        bad_request("Invalid Google token")
    }
}

async fn logout(headers: HeaderMap) -> &'static str {
    let has_cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.contains("jwt="));
    if has_cookie {
        "Logged out successfully"
    } else {
        "No active session"
    }
}

async fn forgot_password(Json(body): Json<Value>) -> Response {
    match body["email"].as_str() {
        Some("ada@example.com") => "Password reset link sent to your email".into_response(),
        _ => bad_request("Email not registered"),
    }
}

async fn reset_password(
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let token = body["token"]
        .as_str()
        .or(query.get("token").map(String::as_str));
    if token == Some("reset-ok") {
        "Password reset successfully".into_response()
    } else {
        bad_request("Invalid or Expired token. Try resetting your password again.")
    }
}

async fn verify(Query(query): Query<HashMap<String, String>>) -> Response {
    match query.get("token").map(String::as_str) {
        Some("verify-ok") => "Email verified! Redirecting to login...".into_response(),
        _ => bad_request("Invalid or Expired token. Try registering again."),
    }
}

async fn complete_registration(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "Missing token").into_response();
    }
    let mut user = ada(ADA_TOKEN);
    user["firstName"] = body["firstName"].clone();
    user["lastName"] = body["lastName"].clone();
    Json(user).into_response()
}

async fn update_profile(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Missing token" }))).into_response();
    }
    match body["newEmail"].as_str() {
        Some("taken@example.com") => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Email already registered" })),
        )
            .into_response(),
        Some(_) => Json(json!({ "message": "Verification email sent to new address" })).into_response(),
        None => {
            let mut user = ada("jwt-ada-2");
            user["firstName"] = body["firstName"].clone();
            user["lastName"] = body["lastName"].clone();
            Json(json!({ "message": "Profile updated successfully", "user": user })).into_response()
        }
    }
}

async fn change_password(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "Missing token").into_response();
    }
    if body["oldPassword"] == ADA_PASSWORD {
        "Password changed successfully".into_response()
    } else {
        bad_request("Old password is incorrect")
    }
}

/// Starts the stub on an ephemeral port and returns a client pointed at it.
pub async fn spawn_backend() -> (ApiClient, Calls) {
    let calls = Calls::default();
    let recorder = calls.clone();
    let app = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/google", post(google))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/auth/verify", get(verify).post(verify))
        .route("/api/auth/complete-registration", post(complete_registration))
        .route("/api/auth/update-profile", post(update_profile))
        .route("/api/auth/change-password", post(change_password))
        .layer(middleware::from_fn(move |req: Request, next: Next| {
            let recorder = recorder.clone();
            async move {
                recorder.0.lock().unwrap().push(req.uri().to_string());
                next.run(req).await
            }
        }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let api = ApiClient::new(&ClientConfig::with_base(&format!("http://{addr}"))).unwrap();
    (api, calls)
}

/// A client whose backend refuses connections.
pub async fn unreachable_client() -> ApiClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    ApiClient::new(&ClientConfig::with_base(&format!("http://{addr}"))).unwrap()
}
