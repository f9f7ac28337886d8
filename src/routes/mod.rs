/**
 * Routes Module
 * API route handlers
 */
use serde::{Deserialize, Serialize};

pub mod auth;
pub mod emails;
pub mod health;
pub mod projects;
pub mod settings;
pub mod techstack;

/// Body of responses that only confirm an action.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new<T: Into<String>>(message: T) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::{
        auth::PasswordHasher,
        config::Config,
        db::Store,
        mail::DisabledMailer,
        state::AppState,
    };

    pub fn test_state() -> AppState {
        let config = Config {
            bcrypt_cost: PasswordHasher::MIN_COST,
            ..Config::default()
        };
        AppState::new(config, Store::in_memory(), Arc::new(DisabledMailer))
    }

    pub fn admin_token(state: &AppState) -> String {
        state
            .tokens
            .issue("admin-1", "admin@example.com", "admin")
            .unwrap()
            .0
    }

    pub async fn send(
        app: Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header("authorization", format!("Bearer {token}"));
        }
        let req = match body {
            Some(json) => req
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}
