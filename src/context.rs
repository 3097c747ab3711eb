// src/context.rs
//! Context Document providers.
//!
//! A provider turns a coin identifier into the JSON context document every
//! scorer reads. The production provider shells out to an external fetcher
//! script; the fixture provider serves a fixed document for tests and demos.

use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Result, ScoreError};

pub type ContextDocument = Value;

#[async_trait::async_trait]
pub trait ContextProvider: Send + Sync {
    async fn fetch(&self, coin: &str) -> Result<ContextDocument>;
    fn name(&self) -> &'static str;
}

/// Runs `program args... <coin>` and parses its stdout as the context document.
///
/// The fetcher logs to stderr; stdout is expected to carry only JSON, but stray
/// lines around the object are tolerated.
#[derive(Debug, Clone)]
pub struct CommandContextProvider {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandContextProvider {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Build from a `[program, arg, ...]` command line. Empty → `None`.
    pub fn from_command_line(cmd: &[String], timeout: Duration) -> Option<Self> {
        let (program, args) = cmd.split_first()?;
        Some(Self::new(program.clone(), args.to_vec(), timeout))
    }
}

#[async_trait::async_trait]
impl ContextProvider for CommandContextProvider {
    async fn fetch(&self, coin: &str) -> Result<ContextDocument> {
        let unavailable = |message: String| ScoreError::ContextUnavailable {
            coin: coin.to_string(),
            message,
        };

        let run = Command::new(&self.program)
            .args(&self.args)
            .arg(coin)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok(out)) => out,
            Ok(Err(e)) => return Err(unavailable(format!("failed to spawn {}: {e}", self.program))),
            Err(_) => return Err(unavailable(format!("timed out after {:?}", self.timeout))),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = stdout.trim();
        let stderr = stderr.trim();
        if !stderr.is_empty() {
            debug!(coin, stderr_len = stderr.len(), "context fetcher wrote to stderr");
        }

        if !output.status.success() {
            return Err(unavailable(format!(
                "fetcher exited with {}. stderr: {stderr}",
                output.status
            )));
        }
        if stdout.is_empty() {
            return Err(unavailable(format!("fetcher printed nothing. stderr: {stderr}")));
        }

        parse_context_output(stdout).map_err(|e| {
            let head: String = stdout.chars().take(300).collect();
            warn!(coin, error = %e, "context fetcher returned invalid JSON");
            unavailable(format!("invalid JSON ({e}); stdout head: {head:?}"))
        })
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

/// Parse fetcher stdout: whole text first, then the outermost `{...}` span.
/// Only JSON objects are accepted.
pub fn parse_context_output(out: &str) -> std::result::Result<ContextDocument, String> {
    let whole = serde_json::from_str::<Value>(out);
    let parsed = match whole {
        Ok(v) => v,
        Err(first) => match (out.find('{'), out.rfind('}')) {
            (Some(i), Some(j)) if j > i => {
                serde_json::from_str::<Value>(&out[i..=j]).map_err(|_| first.to_string())?
            }
            _ => return Err(first.to_string()),
        },
    };
    if parsed.is_object() {
        Ok(parsed)
    } else {
        Err("context document is not a JSON object".to_string())
    }
}

/// Serves the same document for every coin. The document's own `name` is
/// kept when present; otherwise the requested coin is filled in.
#[derive(Debug, Clone)]
pub struct FixtureContextProvider {
    doc: ContextDocument,
}

impl FixtureContextProvider {
    pub fn new(doc: ContextDocument) -> Self {
        Self { doc }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::Context as _;
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture context from {}", path.display()))?;
        let doc = parse_context_output(&data).map_err(|e| anyhow::anyhow!(e))?;
        Ok(Self::new(doc))
    }
}

#[async_trait::async_trait]
impl ContextProvider for FixtureContextProvider {
    async fn fetch(&self, coin: &str) -> Result<ContextDocument> {
        let mut doc = self.doc.clone();
        if let Some(obj) = doc.as_object_mut() {
            obj.entry("name")
                .or_insert_with(|| Value::String(coin.to_string()));
        }
        Ok(doc)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

/// Display name for reports: the document's `name`, else the requested id.
pub fn coin_name(doc: &ContextDocument, requested: &str) -> String {
    doc.get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(requested)
        .to_string()
}
