//! HTTP transport for the widget.

use reqwest::header::{CACHE_CONTROL, PRAGMA};
use serde_json::Value;
use url::Url;

use super::feed::LogSource;
use super::topic::TopicSource;
use crate::error::{Error, Result};

/// HTTP client for a panel server.
///
/// # Example
///
/// ```rust,no_run
/// use chat_feed_panel::widget::{PanelClient, FeedPoller, VirtualFeed};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = PanelClient::new("http://localhost:5000")?;
/// let poller = FeedPoller::new(client);
/// let mut feed = VirtualFeed::new(1.0, 20.0);
/// poller.poll_once(&mut feed).await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PanelClient {
    base_url: Url,
    http: reqwest::Client,
}

/// String fields of a `GET /topics` body, success or failure.
///
/// Fields of any other JSON type are treated as absent.
#[derive(Debug, Default, PartialEq, Eq)]
struct TopicBody {
    topic: Option<String>,
    error: Option<String>,
}

impl TopicBody {
    /// `None` unless `bytes` hold a JSON object.
    fn parse(bytes: &[u8]) -> Option<Self> {
        let Ok(Value::Object(mut map)) = serde_json::from_slice::<Value>(bytes) else {
            return None;
        };
        let mut take = |key: &str| match map.remove(key) {
            Some(Value::String(value)) => Some(value),
            _ => None,
        };
        Some(Self {
            topic: take("topic"),
            error: take("error"),
        })
    }
}

impl PanelClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the server (e.g., "http://localhost:5000")
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a new client with a custom reqwest client.
    pub fn with_client(base_url: impl AsRef<str>, http: reqwest::Client) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())?;
        Ok(Self { base_url, http })
    }

    fn url(&self, path: &str) -> Url {
        self.base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone())
    }
}

/// Pull `lines` out of a `/logs` body.
///
/// Non-string entries are rendered as their JSON text.
fn lines_from_body(body: Value) -> Result<Vec<String>> {
    let Value::Object(mut map) = body else {
        return Err(Error::MalformedResponse("body is not an object".into()));
    };
    match map.remove("lines") {
        Some(Value::Array(items)) => Ok(items
            .into_iter()
            .map(|item| match item {
                Value::String(line) => line,
                other => other.to_string(),
            })
            .collect()),
        _ => Err(Error::MalformedResponse("missing `lines` array".into())),
    }
}

#[async_trait::async_trait]
impl LogSource for PanelClient {
    async fn fetch_lines(&self) -> Result<Vec<String>> {
        let response = self
            .http
            .get(self.url("/logs"))
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: None,
            });
        }

        let body: Value = serde_json::from_slice(&response.bytes().await?)?;
        lines_from_body(body)
    }
}

#[async_trait::async_trait]
impl TopicSource for PanelClient {
    async fn fetch_topic(&self) -> Result<String> {
        let response = self.http.get(self.url("/topics")).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            // A non-JSON failure body just means no server message.
            let message = TopicBody::parse(&bytes).and_then(|body| body.error);
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = TopicBody::parse(&bytes)
            .ok_or_else(|| Error::MalformedResponse("body is not an object".into()))?;
        match body {
            TopicBody {
                topic: Some(topic), ..
            } => Ok(topic),
            TopicBody {
                error: Some(error), ..
            } => Err(Error::Api {
                status: status.as_u16(),
                message: Some(error),
            }),
            _ => Err(Error::MalformedResponse("missing `topic` field".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lines_from_body() {
        let lines = lines_from_body(json!({ "lines": ["a", "b"] })).unwrap();
        assert_eq!(lines, vec!["a", "b"]);

        let mixed = lines_from_body(json!({ "lines": ["a", 3, null] })).unwrap();
        assert_eq!(mixed, vec!["a", "3", "null"]);
    }

    #[test]
    fn test_lines_from_body_rejects_other_shapes() {
        assert!(lines_from_body(json!({ "lines": "a" })).is_err());
        assert!(lines_from_body(json!({ "rows": [] })).is_err());
        assert!(lines_from_body(json!(["a"])).is_err());
    }

    #[test]
    fn test_topic_body_keeps_only_string_fields() {
        let body = TopicBody::parse(br#"{"topic": 5, "error": "x"}"#).unwrap();
        assert_eq!(
            body,
            TopicBody {
                topic: None,
                error: Some("x".into())
            }
        );

        let body = TopicBody::parse(br#"{"topic": " tides "}"#).unwrap();
        assert_eq!(body.topic.as_deref(), Some(" tides "));
        assert!(body.error.is_none());

        assert!(TopicBody::parse(b"<html>").is_none());
        assert!(TopicBody::parse(b"[1]").is_none());
    }

    #[test]
    fn test_url_join() {
        let client = PanelClient::new("http://localhost:5000").unwrap();
        assert_eq!(client.url("/logs").as_str(), "http://localhost:5000/logs");
    }
}
