// src/agents/mod.rs
//! Remote scoring agents: backend abstraction, the Backboard client, and the
//! one-shot "new thread, one message, parse the reply" exchange.

pub mod backboard;
pub mod prompts;

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use tracing::{debug, warn};

use crate::contract::{parse_agent_response, Component, SubscoreRecord};
use crate::error::{Result, ScoreError};

pub use backboard::BackboardClient;

/// Hosted assistant service. Each scoring call uses a fresh thread; no call
/// depends on another call's thread.
#[async_trait::async_trait]
pub trait AgentBackend: Send + Sync {
    async fn create_assistant(&self, name: &str, system_prompt: &str) -> Result<String>;
    async fn create_thread(&self, assistant_id: &str) -> Result<String>;
    async fn send_message(
        &self,
        thread_id: &str,
        content: &str,
        memory: Option<&str>,
    ) -> Result<String>;
    /// Backend name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Ask one assistant to score the context and parse its reply.
pub async fn ask_agent(
    backend: &dyn AgentBackend,
    assistant_id: &str,
    component: Component,
    ctx: &Value,
    memory: Option<&str>,
) -> Result<SubscoreRecord> {
    let prompt = prompts::scoring_prompt(component, ctx);
    let thread_id = backend.create_thread(assistant_id).await?;
    debug!(%component, assistant_id, thread_id = %thread_id, "agent thread created");

    let raw = backend.send_message(&thread_id, &prompt, memory).await?;
    parse_agent_response(assistant_id, &raw).inspect_err(|e| {
        // Never log raw model output; a fingerprint is enough to correlate.
        warn!(
            %component,
            assistant_id,
            backend = backend.name(),
            raw_id = %fingerprint(&raw),
            raw_len = raw.len(),
            error = %e,
            "agent reply rejected"
        );
    })
}

/// Short SHA-256 prefix of a text, for correlating log lines without content.
pub fn fingerprint(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Canned replies per assistant id, for tests and offline runs.
///
/// Assistants without a reply fail with an agent error. `delay` holds every
/// reply back, which is how timeouts are exercised.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: HashMap<String, String>,
    delay: Option<std::time::Duration>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, assistant_id: &str, text: &str) -> Self {
        self.replies
            .insert(assistant_id.to_string(), text.to_string());
        self
    }

    pub fn delayed(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// `(assistant_id, prompt)` pairs received so far.
    pub fn received(&self) -> Vec<(String, String)> {
        self.prompts
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl AgentBackend for ScriptedBackend {
    async fn create_assistant(&self, name: &str, _system_prompt: &str) -> Result<String> {
        Ok(format!("scripted-{}", name.to_ascii_lowercase().replace(' ', "-")))
    }

    async fn create_thread(&self, assistant_id: &str) -> Result<String> {
        // Thread id carries the assistant id so send_message can find the reply.
        Ok(format!("thread:{assistant_id}"))
    }

    async fn send_message(
        &self,
        thread_id: &str,
        content: &str,
        _memory: Option<&str>,
    ) -> Result<String> {
        let assistant_id = thread_id.strip_prefix("thread:").unwrap_or(thread_id);
        if let Ok(mut g) = self.prompts.lock() {
            g.push((assistant_id.to_string(), content.to_string()));
        }
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        self.replies
            .get(assistant_id)
            .cloned()
            .ok_or_else(|| ScoreError::Agent {
                message: format!("no scripted reply for {assistant_id}"),
                status: Some(500),
            })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
