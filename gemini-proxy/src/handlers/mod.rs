//! HTTP handlers for the Gemini proxy.

pub mod health;
pub mod proxy;
