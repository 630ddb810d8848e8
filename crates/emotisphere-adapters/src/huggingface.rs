//! Hugging Face inference client implementing [`EmotionClassifier`].
//!
//! The hosted inference API has moved between hosts more than once, so
//! the client walks a fixed list of endpoint variants and moves on after
//! any failure; only the last error is reported. A 503 means the model is
//! still loading: wait a fixed five seconds before giving that endpoint up.
//!
//! Responses come in several shapes depending on host and pipeline
//! version; all are reduced to a list of `(label, score)` and the highest
//! score wins.

use std::time::Duration;

use emotisphere_core::{AdapterError, EmotionClassifier};
use emotisphere_types::{Classification, Emotion};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::HUGGINGFACE_API_KEY;

const TIMEOUT: Duration = Duration::from_secs(30);
const MODEL_LOADING_BACKOFF: Duration = Duration::from_secs(5);

/// Endpoint variants for `model`, in the order they are tried.
pub fn endpoints(model: &str) -> [String; 3] {
    [
        format!("https://router.huggingface.co/hf-inference/v1/models/{model}"),
        format!("https://router.huggingface.co/hf-inference/models/{model}"),
        format!("https://api-inference.huggingface.co/models/{model}"),
    ]
}

/// Text-classification client for a single emotion model.
#[derive(Debug, Clone)]
pub struct HuggingFaceClient {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoints: [String; 3],
}

impl HuggingFaceClient {
    /// Build a client for `model` with a 30 second request timeout.
    pub fn new(api_key: Option<String>, model: &str) -> Result<Self, AdapterError> {
        Self::with_endpoints(api_key, endpoints(model))
    }

    pub(crate) fn with_endpoints(
        api_key: Option<String>,
        endpoints: [String; 3],
    ) -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| AdapterError::Http(format!("inference client build failed: {e}")))?;
        Ok(Self {
            client,
            api_key,
            endpoints,
        })
    }

    async fn classify_at(
        &self,
        url: &str,
        api_key: &str,
        text: &str,
    ) -> Result<Classification, AdapterError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .header("x-use-cache", "false")
            .json(&serde_json::json!({ "inputs": text }))
            .send()
            .await
            .map_err(|e| AdapterError::Http(format!("inference request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdapterError::Http(format!("inference body read failed: {e}")))?;

        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            tokio::time::sleep(MODEL_LOADING_BACKOFF).await;
            return Err(AdapterError::ModelLoading);
        }
        if !status.is_success() {
            return Err(AdapterError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_classification(&body)
    }
}

impl EmotionClassifier for HuggingFaceClient {
    async fn classify(&self, text: &str) -> Result<Classification, AdapterError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AdapterError::MissingCredential(HUGGINGFACE_API_KEY))?;

        let mut last_error = None;
        for url in &self.endpoints {
            match self.classify_at(url, api_key, text).await {
                Ok(classification) => return Ok(classification),
                Err(e) => {
                    debug!(%url, error = %e, "inference endpoint failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        let last = last_error.unwrap_or_else(|| AdapterError::InvalidInput("no endpoints".to_owned()));
        warn!(error = %last, "all inference endpoints failed");
        Err(AdapterError::Exhausted(Box::new(last)))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    #[serde(default)]
    score: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Flat(Vec<LabelScore>),
    Nested(Vec<Vec<LabelScore>>),
    Wrapped { data: Vec<LabelScore> },
    Single(LabelScore),
}

impl InferenceResponse {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            Self::Flat(scores) | Self::Wrapped { data: scores } => scores,
            Self::Nested(groups) => groups.into_iter().flatten().collect(),
            Self::Single(score) => vec![score],
        }
    }
}

/// Reduce an inference response body to the top-scoring emotion.
pub fn parse_classification(body: &str) -> Result<Classification, AdapterError> {
    let response: InferenceResponse = serde_json::from_str(body)
        .map_err(|e| AdapterError::Decode(format!("unexpected inference response: {e}")))?;

    response
        .into_scores()
        .into_iter()
        .reduce(|best, next| if next.score > best.score { next } else { best })
        .map(|best| Classification {
            emotion: Emotion::from_label(&best.label),
            confidence: best.score,
        })
        .ok_or_else(|| AdapterError::Decode("no emotions in inference response".to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    type Route = (&'static str, u16, &'static str);

    /// Serve canned responses by path on a local port and record every
    /// path requested, in order.
    async fn responder(routes: &'static [Route]) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let path = read_request_path(&mut socket).await;
                let (status, body) = routes
                    .iter()
                    .find(|(p, ..)| *p == path)
                    .map_or((404, ""), |(_, status, body)| (*status, *body));
                log.lock().unwrap().push(path);
                let response = format!(
                    "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        (base, seen)
    }

    /// Read one request (headers plus `content-length` body) and return its path.
    async fn read_request_path(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0_u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(chunk.get(..n).unwrap_or_default());
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text
                    .lines()
                    .find_map(|line| {
                        line.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .and_then(|v| v.trim().parse::<usize>().ok())
                    })
                    .unwrap_or(0);
                if buf.len() >= end.saturating_add(4).saturating_add(length) {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf)
            .split_whitespace()
            .nth(1)
            .unwrap_or_default()
            .to_owned()
    }

    fn client_for(base: &str) -> HuggingFaceClient {
        let endpoints = ["/a", "/b", "/c"].map(|path| format!("{base}{path}"));
        HuggingFaceClient::with_endpoints(Some("key".to_owned()), endpoints).unwrap()
    }

    fn paths(seen: &Mutex<Vec<String>>) -> Vec<String> {
        seen.lock().unwrap().clone()
    }

    fn emotion_of(body: &str) -> Option<Emotion> {
        parse_classification(body).ok().map(|c| c.emotion)
    }

    #[test]
    fn flat_list_picks_highest_score() {
        let body = r#"[{"label":"sadness","score":0.1},{"label":"joy","score":0.7},{"label":"anger","score":0.2}]"#;
        let classification = parse_classification(body).ok();
        assert_eq!(classification.map(|c| c.emotion), Some(Emotion::Happy));
        assert!(classification.is_some_and(|c| (c.confidence - 0.7).abs() < f64::EPSILON));
    }

    #[test]
    fn nested_list_is_flattened() {
        let body = r#"[[{"label":"fear","score":0.9},{"label":"neutral","score":0.05}]]"#;
        assert_eq!(emotion_of(body), Some(Emotion::Surprised));
    }

    #[test]
    fn wrapped_and_single_shapes() {
        assert_eq!(
            emotion_of(r#"{"data":[{"label":"anger","score":0.6}]}"#),
            Some(Emotion::Angry)
        );
        assert_eq!(emotion_of(r#"{"label":"ennui","score":0.99}"#), Some(Emotion::Neutral));
    }

    #[test]
    fn empty_or_unknown_shapes_fail() {
        assert!(matches!(parse_classification("[]"), Err(AdapterError::Decode(_))));
        assert!(matches!(
            parse_classification(r#"{"error":"boom"}"#),
            Err(AdapterError::Decode(_))
        ));
    }

    #[test]
    fn endpoints_are_ordered_router_first() {
        let urls = endpoints("org/model");
        assert!(urls.first().is_some_and(|u| u.contains("/hf-inference/v1/models/org/model")));
        assert!(urls.last().is_some_and(|u| u.starts_with("https://api-inference.")));
    }

    #[tokio::test]
    async fn server_error_moves_on_to_next_endpoint() {
        static ROUTES: [Route; 3] = [
            ("/a", 500, "oops"),
            ("/b", 200, r#"[{"label":"joy","score":0.9}]"#),
            ("/c", 200, r#"[{"label":"anger","score":0.9}]"#),
        ];
        let (base, seen) = responder(&ROUTES).await;

        let classification = client_for(&base).classify("good news").await.unwrap();

        assert_eq!(classification.emotion, Emotion::Happy);
        assert_eq!(paths(&seen), vec!["/a", "/b"]);
    }

    #[tokio::test]
    async fn every_endpoint_failing_reports_the_last_error() {
        static ROUTES: [Route; 3] = [
            ("/a", 401, "unauthorized"),
            ("/b", 500, "oops"),
            ("/c", 410, "gone"),
        ];
        let (base, seen) = responder(&ROUTES).await;

        let result = client_for(&base).classify("bad news").await;

        assert!(matches!(
            result,
            Err(AdapterError::Exhausted(last)) if matches!(*last, AdapterError::Status { status: 410, .. })
        ));
        assert_eq!(paths(&seen), vec!["/a", "/b", "/c"]);
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = HuggingFaceClient::new(None, "org/model");
        let Ok(client) = client else {
            return;
        };
        assert!(matches!(
            client.classify("hello").await,
            Err(AdapterError::MissingCredential(HUGGINGFACE_API_KEY))
        ));
    }
}
