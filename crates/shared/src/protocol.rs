use serde::{Deserialize, Serialize};

use crate::domain::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub running: bool,
}

/// Body returned by start/stop. `running` reflects the state after the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlAck {
    pub running: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// New account. A missing `role` becomes the admin role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: UserId,
    pub username: String,
    pub role: String,
}

/// Identity and role taken from the verified access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: UserId,
    pub role: String,
}

pub fn system_status_route() -> &'static str {
    "/api/system/status"
}

pub fn system_start_route() -> &'static str {
    "/api/system/start"
}

pub fn system_stop_route() -> &'static str {
    "/api/system/stop"
}

pub fn login_route() -> &'static str {
    "/api/auth/login"
}

pub fn register_route() -> &'static str {
    "/api/auth/register"
}

pub fn me_route() -> &'static str {
    "/api/auth/me"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ErrorCode};

    #[test]
    fn status_response_uses_running_field() {
        let parsed: StatusResponse =
            serde_json::from_str(r#"{"running":true}"#).expect("status json");
        assert!(parsed.running);
    }

    #[test]
    fn register_request_role_is_optional() {
        let parsed: RegisterRequest =
            serde_json::from_str(r#"{"username":"ops","password":"pw"}"#).expect("register json");
        assert_eq!(parsed.role, None);
    }

    #[test]
    fn me_response_serializes_plain_id() {
        let body = serde_json::to_value(MeResponse {
            id: UserId(7),
            role: "admin".to_string(),
        })
        .expect("me json");
        assert_eq!(body, serde_json::json!({ "id": 7, "role": "admin" }));
    }

    #[test]
    fn api_error_codes_are_snake_case() {
        let body = serde_json::to_value(ApiError::new(ErrorCode::Forbidden, "admin only"))
            .expect("error json");
        assert_eq!(body["code"], "forbidden");
        assert_eq!(body["message"], "admin only");
    }
}
