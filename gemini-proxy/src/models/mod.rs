pub mod generation;

pub use generation::{Content, GenerationRequest, GenerationResponse, Part};
