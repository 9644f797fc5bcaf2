//! service-core: Shared HTTP infrastructure for the gemini proxy.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
