// src/services/mod.rs

pub mod extractor;
pub mod gemini;
pub mod merge;
pub mod prompts;
pub mod session;
pub mod store;
