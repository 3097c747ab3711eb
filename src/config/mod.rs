// src/config/mod.rs
pub mod score;

pub use score::{AssistantIds, ScoreConfig};
