//! # autoengage Provider - Gemini
//!
//! [`ContentGenerator`](autoengage_protocols::ContentGenerator) backed by the
//! Gemini `generateContent` API in JSON response mode.

mod client;
mod provider;
mod types;

pub use client::{GeminiClient, DEFAULT_BASE_URL};
pub use provider::GeminiGenerator;
pub use types::*;
