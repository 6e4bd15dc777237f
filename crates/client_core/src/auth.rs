//! Role Reader: pulls the role claim out of the locally stored access token.
//!
//! The claim is read without verifying the signature, so the result is a UI
//! hint only. The control service re-checks the role on every request.

use std::sync::Arc;

use base64::{
    engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
    Engine as _,
};
use serde_json::{Map, Value};
use shared::domain::{is_admin_role, ACCESS_TOKEN_KEY};
use thiserror::Error;
use tracing::warn;

use crate::token_store::{TokenStore, TokenStoreError};

const TOKEN_SEGMENTS: usize = 3;

#[derive(Debug, Error)]
pub enum TokenDecodeError {
    #[error("expected 3 dot-separated segments, found {0}")]
    SegmentCount(usize),
    #[error("token payload is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("token payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("token payload is not a JSON object")]
    NotAnObject,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to read stored token: {0}")]
    Store(#[from] TokenStoreError),
    #[error("malformed access token: {0}")]
    Decode(#[from] TokenDecodeError),
}

/// Decoded payload segment of an access token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    payload: Map<String, Value>,
}

impl TokenClaims {
    /// The `role` claim as text. Missing or `null` is empty; non-string
    /// values are rendered as their JSON text.
    pub fn role(&self) -> String {
        match self.payload.get("role") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(role)) => role.clone(),
            Some(other) => other.to_string(),
        }
    }

    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.payload.get(claim)
    }
}

pub fn decode_token_claims(token: &str) -> Result<TokenClaims, TokenDecodeError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != TOKEN_SEGMENTS {
        return Err(TokenDecodeError::SegmentCount(segments.len()));
    }

    let encoded = segments[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .or_else(|err| STANDARD_NO_PAD.decode(encoded).map_err(|_| err))?;

    match serde_json::from_slice::<Value>(&bytes)? {
        Value::Object(payload) => Ok(TokenClaims { payload }),
        _ => Err(TokenDecodeError::NotAnObject),
    }
}

#[derive(Clone)]
pub struct AuthService {
    tokens: Arc<dyn TokenStore>,
}

impl AuthService {
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self { tokens }
    }

    pub fn access_token(&self) -> Result<Option<String>, TokenStoreError> {
        self.tokens.get_item(ACCESS_TOKEN_KEY)
    }

    pub fn set_token(&self, token: &str) -> Result<(), TokenStoreError> {
        self.tokens.set_item(ACCESS_TOKEN_KEY, token.trim())
    }

    pub fn clear_token(&self) -> Result<(), TokenStoreError> {
        self.tokens.remove_item(ACCESS_TOKEN_KEY)
    }

    /// Role claim of the stored token; no token yields an empty role.
    pub fn try_user_role(&self) -> Result<String, AuthError> {
        let Some(token) = self.access_token()? else {
            return Ok(String::new());
        };
        Ok(decode_token_claims(&token)?.role())
    }

    /// Like [`Self::try_user_role`], but any failure counts as no role.
    pub fn get_user_role(&self) -> String {
        self.try_user_role().unwrap_or_else(|error| {
            warn!(%error, "ignoring unreadable access token");
            String::new()
        })
    }

    pub fn is_admin(&self) -> bool {
        is_admin_role(&self.get_user_role())
    }
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;
