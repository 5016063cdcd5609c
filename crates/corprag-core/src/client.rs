use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ServiceError;
use crate::upload::UploadFile;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// The remote side of the conversation: answers questions and ingests
/// documents.
#[async_trait]
pub trait RagBackend: Send + Sync {
    async fn ask(&self, query: &str) -> Result<String, ServiceError>;

    async fn ingest(&self, file: &UploadFile) -> Result<(), ServiceError>;
}

#[derive(Serialize)]
struct AskRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct AskResponse {
    answer: String,
}

/// HTTP client for the `/api/chat` and `/api/ingest` endpoints
#[derive(Clone)]
pub struct RagClient {
    client: Client,
    base_url: String,
}

impl RagClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ServiceError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl RagBackend for RagClient {
    async fn ask(&self, query: &str) -> Result<String, ServiceError> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&AskRequest { query })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::Rejected(response.status()));
        }

        let body = response.text().await?;
        let parsed: AskResponse =
            serde_json::from_str(&body).map_err(|e| ServiceError::Malformed(e.to_string()))?;
        Ok(parsed.answer)
    }

    async fn ingest(&self, file: &UploadFile) -> Result<(), ServiceError> {
        let url = format!("{}/api/ingest", self.base_url);

        let part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        let form = Form::new().part("file", part);

        let response = self.client.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            return Err(ServiceError::Rejected(response.status()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use wiremock::matchers::{body_json, body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_ask_returns_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(serde_json::json!({ "query": "How many vacation days?" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "answer": "Twenty." })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = RagClient::new(&server.uri());
        let answer = client.ask("How many vacation days?").await.unwrap();
        assert_eq!(answer, "Twenty.");
    }

    #[tokio::test]
    async fn test_ask_non_success_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = RagClient::new(&server.uri());
        let err = client.ask("anything").await.unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(StatusCode::INTERNAL_SERVER_ERROR)));
    }

    #[tokio::test]
    async fn test_ask_missing_answer_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "reply": "hi" })),
            )
            .mount(&server)
            .await;

        let client = RagClient::new(&server.uri());
        let err = client.ask("anything").await.unwrap_err();
        assert!(matches!(err, ServiceError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_ask_unreachable_is_transport_error() {
        // Grab a free port, then close it so the connection is refused
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = RagClient::new(&format!("http://127.0.0.1:{}", port));
        let err = client.ask("anything").await.unwrap_err();
        assert!(matches!(err, ServiceError::Transport(_)));
    }

    #[tokio::test]
    async fn test_ingest_sends_file_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/ingest"))
            .and(body_string_contains("name=\"file\""))
            .and(body_string_contains("filename=\"handbook.txt\""))
            .and(body_string_contains("remote work is allowed"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Ingestion successful"))
            .expect(1)
            .mount(&server)
            .await;

        let client = RagClient::new(&format!("{}/", server.uri()));
        let file = UploadFile::new("handbook.txt", b"remote work is allowed".to_vec());
        client.ingest(&file).await.unwrap();
    }

    #[tokio::test]
    async fn test_ingest_non_success_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/ingest"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Error: bad pdf"))
            .mount(&server)
            .await;

        let client = RagClient::new(&server.uri());
        let file = UploadFile::new("broken.pdf", vec![0u8; 4]);
        let err = client.ingest(&file).await.unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = RagClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}
