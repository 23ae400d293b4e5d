//! Prediction history: a best-effort JSONL log of completed predictions and
//! the summaries `liverisk history` prints from it.

pub mod logger;
pub mod reporter;
