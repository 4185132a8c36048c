use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize)]
struct GreetRequest {
    name: String,
}

#[derive(Deserialize)]
struct GreetResponse {
    reply: String,
}

/// Failure of the greet call. Every rejection (connect error, bad status,
/// undecodable body) converges to this one kind; the transcript shows its
/// `Display` form prefixed with "Error: ".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetError {
    message: String,
}

impl GreetError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for GreetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for GreetError {}

impl From<reqwest::Error> for GreetError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// The remote greet capability: one named argument in, one reply string out.
/// Injected into the controller so tests can script the backend.
#[async_trait]
pub trait Greeter: Send + Sync {
    async fn greet(&self, name: &str) -> Result<String, GreetError>;
}

/// HTTP implementation of the greet contract.
///
/// `POST {base_url}/greet` with body `{"name": ...}`; a 200 carries
/// `{"reply": ...}`.
pub struct GreetClient {
    client: Client,
    base_url: String,
}

impl GreetClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Greeter for GreetClient {
    async fn greet(&self, name: &str) -> Result<String, GreetError> {
        let url = format!("{}/greet", self.base_url);

        let request = GreetRequest {
            name: name.to_string(),
        };

        tracing::debug!(url = %url, "sending greet request");

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(GreetError::new(format!(
                "greet request failed with status: {}",
                response.status()
            )));
        }

        let greet_response: GreetResponse = response.json().await?;
        Ok(greet_response.reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_the_single_named_argument() {
        let request = GreetRequest {
            name: "Dana".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, serde_json::json!({ "name": "Dana" }));
    }

    #[test]
    fn response_parses_reply_field() {
        let response: GreetResponse =
            serde_json::from_str(r#"{"reply": "Hello, Dana! Welcome to TARS."}"#).unwrap();
        assert_eq!(response.reply, "Hello, Dana! Welcome to TARS.");
    }

    #[test]
    fn error_displays_its_message_unadorned() {
        let err = GreetError::new("timeout");
        assert_eq!(err.to_string(), "timeout");
    }

    #[test]
    fn client_strips_trailing_slash_from_base_url() {
        let client = GreetClient::new("http://localhost:7878/");
        assert_eq!(client.base_url, "http://localhost:7878");
    }
}
