use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use shared::{
    domain::ACCESS_TOKEN_KEY,
    error::ApiError,
    protocol::{system_start_route, system_status_route, system_stop_route, StatusResponse},
};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::token_store::{TokenStore, TokenStoreError};

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("invalid control service url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("control service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("control service rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("failed to read access token: {0}")]
    Token(#[from] TokenStoreError),
}

/// Status and start/stop operations of the managed system.
#[async_trait]
pub trait SystemControlService: Send + Sync {
    async fn get_status(&self) -> Result<StatusResponse, ControlError>;
    async fn start_system(&self) -> Result<(), ControlError>;
    async fn stop_system(&self) -> Result<(), ControlError>;
}

pub struct HttpSystemControl {
    http: Client,
    base_url: Url,
    tokens: Arc<dyn TokenStore>,
}

impl HttpSystemControl {
    pub fn new(server_url: &str, tokens: Arc<dyn TokenStore>) -> Result<Self, ControlError> {
        let mut base_url = Url::parse(server_url).map_err(|source| ControlError::InvalidUrl {
            url: server_url.to_string(),
            source,
        })?;
        // Routes are joined relative to the base, so it must end in `/` to
        // keep a path prefix such as `/control`.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base_url,
            tokens,
        })
    }

    fn endpoint(&self, route: &str) -> Result<Url, ControlError> {
        self.base_url
            .join(route.trim_start_matches('/'))
            .map_err(|source| ControlError::InvalidUrl {
                url: format!("{}{route}", self.base_url),
                source,
            })
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ControlError> {
        Ok(match self.tokens.get_item(ACCESS_TOKEN_KEY)? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn post_control(&self, route: &str) -> Result<(), ControlError> {
        let request = self.authorized(self.http.post(self.endpoint(route)?))?;
        let response = request.send().await?;
        ensure_success(response).await?;
        debug!(route, "control request accepted");
        Ok(())
    }
}

#[async_trait]
impl SystemControlService for HttpSystemControl {
    async fn get_status(&self) -> Result<StatusResponse, ControlError> {
        let request = self.authorized(self.http.get(self.endpoint(system_status_route())?))?;
        let response = ensure_success(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn start_system(&self) -> Result<(), ControlError> {
        self.post_control(system_start_route()).await
    }

    async fn stop_system(&self) -> Result<(), ControlError> {
        self.post_control(system_stop_route()).await
    }
}

async fn ensure_success(response: Response) -> Result<Response, ControlError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ControlError::Rejected {
        status: status.as_u16(),
        message: rejection_message(status, &body),
    })
}

fn rejection_message(status: StatusCode, body: &str) -> String {
    if let Ok(api_error) = serde_json::from_str::<ApiError>(body) {
        return api_error.message;
    }
    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
#[path = "tests/system_control_tests.rs"]
mod tests;
