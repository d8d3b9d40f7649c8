pub mod client;
pub mod prompt;

pub use client::{
    AdvisoryAnswer, AdvisoryError, FALLBACK_ANSWER, GeminiClient, GeminiConfig, TextGenerator, ask,
};
pub use prompt::{AdvisoryPrompt, FarmerContext, MissingInputError, build};
