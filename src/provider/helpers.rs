use std::time::Duration;

use log::trace;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use super::ProviderError;

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ProviderError::Decode(e.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

pub fn http_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProviderError::Client(e.to_string()))
}

// Read the full body and turn non-success statuses into errors
async fn read_body(response: Response) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response.text().await?;
    trace!("Response [{}]: {}", status, body);
    if !status.is_success() {
        return Err(ProviderError::Api { status, body });
    }
    Ok(body)
}

/// Parse a JSON response body, failing on error statuses and unparsable bodies alike
pub async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    let body = read_body(response).await?;
    serde_json::from_str(&body)
        .map_err(|e| ProviderError::Decode(format!("{} (body: {:?})", e, body)))
}

/// Check a response for success, discarding the body
pub async fn expect_success(response: Response) -> Result<(), ProviderError> {
    read_body(response).await.map(|_| ())
}
