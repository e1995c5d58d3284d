//! HTTP client for the wordhoard API.

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::db::{CefrLevel, UserResponse, Word};

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the bearer token, or there was none
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response from server: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated(_))
    }
}

/// Token and profile returned by register and login
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
}

/// Fields sent on word create and update
#[derive(Debug, Clone, Default, Serialize)]
pub struct WordInput {
    pub word: String,
    pub meaning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<CefrLevel>,
}

#[derive(Debug, Default, Serialize)]
struct ProfileUpdate<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<CefrLevel>,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: UserResponse,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    message: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
}

/// Turn a response status and body into `T` or a typed error
fn decode<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, ClientError> {
    if status.is_success() {
        return Ok(serde_json::from_slice(body)?);
    }

    let message = serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    if status == StatusCode::UNAUTHORIZED {
        Err(ClientError::Unauthenticated(message))
    } else {
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://localhost:5000`
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        decode(status, &body)
    }

    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.send(self.request(Method::GET, "/health")).await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, ClientError> {
        let body = serde_json::json!({ "name": name, "email": email, "password": password });
        self.send(self.request(Method::POST, "/api/auth/register").json(&body))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let body = serde_json::json!({ "email": email, "password": password });
        self.send(self.request(Method::POST, "/api/auth/login").json(&body))
            .await
    }

    pub async fn me(&self) -> Result<UserResponse, ClientError> {
        let envelope: UserEnvelope = self.send(self.request(Method::GET, "/api/auth/me")).await?;
        Ok(envelope.user)
    }

    pub async fn update_me(
        &self,
        name: Option<&str>,
        level: Option<CefrLevel>,
    ) -> Result<UserResponse, ClientError> {
        let body = ProfileUpdate { name, level };
        let envelope: UserEnvelope = self
            .send(self.request(Method::PUT, "/api/auth/me").json(&body))
            .await?;
        Ok(envelope.user)
    }

    pub async fn list_words(&self) -> Result<Vec<Word>, ClientError> {
        self.words_at("/api/words").await
    }

    pub async fn words_by_level(&self, level: CefrLevel) -> Result<Vec<Word>, ClientError> {
        self.words_at(&format!("/api/words/level/{}", level)).await
    }

    pub async fn words_by_user(&self, user_id: &str) -> Result<Vec<Word>, ClientError> {
        self.words_at(&format!("/api/words/user/{}", user_id)).await
    }

    async fn words_at(&self, path: &str) -> Result<Vec<Word>, ClientError> {
        let envelope: DataEnvelope<Vec<Word>> = self.send(self.request(Method::GET, path)).await?;
        Ok(envelope.data)
    }

    pub async fn get_word(&self, id: &str) -> Result<Word, ClientError> {
        let envelope: DataEnvelope<Word> = self
            .send(self.request(Method::GET, &format!("/api/words/{}", id)))
            .await?;
        Ok(envelope.data)
    }

    pub async fn create_word(&self, input: &WordInput) -> Result<Word, ClientError> {
        let envelope: DataEnvelope<Word> = self
            .send(self.request(Method::POST, "/api/words").json(input))
            .await?;
        Ok(envelope.data)
    }

    pub async fn update_word(&self, id: &str, input: &WordInput) -> Result<Word, ClientError> {
        let envelope: DataEnvelope<Word> = self
            .send(
                self.request(Method::PUT, &format!("/api/words/{}", id))
                    .json(input),
            )
            .await?;
        Ok(envelope.data)
    }

    /// Returns the server's confirmation message
    pub async fn delete_word(&self, id: &str) -> Result<String, ClientError> {
        let envelope: MessageEnvelope = self
            .send(self.request(Method::DELETE, &format!("/api/words/{}", id)))
            .await?;
        Ok(envelope.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_success() {
        let body = br#"{"success":true,"data":{"id":"w1","word":"dog","meaning":"a pet","level":"A1","user":"u1","createdAt":"t","updatedAt":"t"}}"#;
        let envelope: DataEnvelope<Word> = decode(StatusCode::OK, body).unwrap();
        assert_eq!(envelope.data.word, "dog");
        assert_eq!(envelope.data.example, None);
        assert_eq!(envelope.data.level, CefrLevel::A1);
    }

    #[test]
    fn test_decode_message_envelope() {
        let body = br#"{"success":true,"message":"Word deleted"}"#;
        let envelope = decode::<MessageEnvelope>(StatusCode::OK, body).unwrap();
        assert_eq!(envelope.message, "Word deleted");
    }

    #[test]
    fn test_decode_unauthorized() {
        let body = br#"{"success":false,"code":"UNAUTHORIZED","message":"Not authorized, no token"}"#;
        let err = decode::<MessageEnvelope>(StatusCode::UNAUTHORIZED, body).unwrap_err();
        assert!(err.is_unauthenticated());
        assert_eq!(err.to_string(), "Not authorized, no token");
    }

    #[test]
    fn test_decode_api_error_uses_envelope_message() {
        let body = br#"{"success":false,"code":"NOT_FOUND","message":"Word not found"}"#;
        match decode::<MessageEnvelope>(StatusCode::NOT_FOUND, body) {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "Word not found");
            }
            other => panic!("unexpected result: {:?}", other.map(|m| m.message)),
        }
    }

    #[test]
    fn test_decode_error_without_envelope() {
        match decode::<MessageEnvelope>(StatusCode::BAD_GATEWAY, b"<html>") {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected result: {:?}", other.map(|m| m.message)),
        }
    }

    #[test]
    fn test_word_input_skips_absent_fields() {
        let input = WordInput {
            word: "dog".to_string(),
            meaning: "a pet".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value, serde_json::json!({"word": "dog", "meaning": "a pet"}));
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:5000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
