//! Backboard assistant API client (assistants → threads → messages).

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use super::AgentBackend;
use crate::error::{Result, ScoreError};

pub const DEFAULT_BASE_URL: &str = "https://app.backboard.io/api";

pub struct BackboardClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl BackboardClient {
    /// `request_timeout` bounds a single HTTP call; the orchestrator applies
    /// its own per-component timeout on top.
    pub fn new(base_url: &str, api_key: &str, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("coin-trust-score/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json(resp: reqwest::Response) -> Result<Value> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let head: String = body.chars().take(200).collect();
            return Err(ScoreError::Agent {
                message: format!("HTTP {status}: {head}"),
                status: Some(status.as_u16()),
            });
        }
        Ok(resp.json::<Value>().await?)
    }
}

#[derive(Deserialize)]
struct AssistantResp {
    assistant_id: String,
}

#[derive(Deserialize)]
struct ThreadResp {
    thread_id: String,
}

fn field<T: for<'de> Deserialize<'de>>(v: Value, what: &str) -> Result<T> {
    serde_json::from_value(v).map_err(|e| ScoreError::Agent {
        message: format!("unexpected {what} response: {e}"),
        status: None,
    })
}

#[async_trait::async_trait]
impl AgentBackend for BackboardClient {
    async fn create_assistant(&self, name: &str, system_prompt: &str) -> Result<String> {
        let resp = self
            .http
            .post(self.url("/assistants"))
            .header("X-API-Key", &self.api_key)
            .json(&serde_json::json!({ "name": name, "system_prompt": system_prompt }))
            .send()
            .await?;
        let body: AssistantResp = field(Self::read_json(resp).await?, "assistant")?;
        Ok(body.assistant_id)
    }

    async fn create_thread(&self, assistant_id: &str) -> Result<String> {
        let resp = self
            .http
            .post(self.url(&format!("/assistants/{assistant_id}/threads")))
            .header("X-API-Key", &self.api_key)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let body: ThreadResp = field(Self::read_json(resp).await?, "thread")?;
        Ok(body.thread_id)
    }

    async fn send_message(
        &self,
        thread_id: &str,
        content: &str,
        memory: Option<&str>,
    ) -> Result<String> {
        let mut form: Vec<(&str, &str)> = vec![("content", content), ("stream", "false")];
        if let Some(m) = memory {
            form.push(("memory", m));
        }
        let resp = self
            .http
            .post(self.url(&format!("/threads/{thread_id}/messages")))
            .header("X-API-Key", &self.api_key)
            .form(&form)
            .send()
            .await?;
        let body = Self::read_json(resp).await?;
        Ok(message_text(&body))
    }

    fn name(&self) -> &'static str {
        "backboard"
    }
}

/// The service normally returns `content` as a string; anything else is
/// rendered as JSON text so extraction can still have a go at it.
fn message_text(body: &Value) -> String {
    match body.get("content") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
