use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ExchangeError;

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GeminiResponse {
    fn into_answer(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// Client for a Gemini `generateContent` endpoint.
///
/// The endpoint URL is opaque: any key or model selection is already part
/// of it. One POST per question, no retry, no timeout.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one question and return the first candidate's first text part.
    pub async fn ask(&self, question: &str) -> Result<String, ExchangeError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: question }],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), body = %body, "Gemini response");

        if !status.is_success() {
            return Err(ExchangeError::Status {
                status: status.as_u16(),
            });
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)?;
        parsed.into_answer().ok_or(ExchangeError::MissingAnswer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new(&format!("{}/v1beta/models/test:generateContent", server.uri()))
    }

    #[tokio::test]
    async fn test_ask_sends_question_and_extracts_answer() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/test:generateContent"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "contents": [{ "parts": [{ "text": "What is Rust?" }] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [
                    { "content": { "parts": [{ "text": "A language." }, { "text": "ignored" }] } },
                    { "content": { "parts": [{ "text": "second candidate" }] } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = client_for(&server).ask("What is Rust?").await.unwrap();
        assert_eq!(answer, "A language.");
    }

    #[tokio::test]
    async fn test_missing_candidates_is_missing_answer() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "promptFeedback": {} })))
            .mount(&server)
            .await;

        let err = client_for(&server).ask("hi").await.unwrap_err();
        assert!(matches!(err, ExchangeError::MissingAnswer));
    }

    #[tokio::test]
    async fn test_empty_parts_is_missing_answer() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [] } }]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).ask("hi").await.unwrap_err();
        assert_eq!(err.kind(), "missing_answer");
    }

    #[tokio::test]
    async fn test_non_json_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).ask("hi").await.unwrap_err();
        assert!(matches!(err, ExchangeError::Decode(_)));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "code": 400, "message": "API key not valid" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).ask("hi").await.unwrap_err();
        assert!(matches!(err, ExchangeError::Status { status: 400 }));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Bind then release a port so nothing is listening on it
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = GeminiClient::new(&format!("http://127.0.0.1:{}/", port));

        let err = client.ask("hi").await.unwrap_err();
        assert!(matches!(err, ExchangeError::Transport(_)));
    }
}
