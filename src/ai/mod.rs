//! AI service integration for prompt reinterpretation and image generation
//!
//! Two narrow seams hide the vendor: one language-model call that classifies
//! and rewrites a prompt, and one image-model call that renders a description.

pub mod mime;
pub mod mock;
pub mod openai;

pub use mock::{MockImageGenerationClient, MockReinterpretClient};
pub use openai::{OpenAiImageClient, OpenAiReinterpretClient};

use crate::models::Reinterpretation;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ReinterpretService: Send + Sync {
    /// Classify `prompt`, pick one of `allowed_themes` and rewrite it into a
    /// brand-free visual description with labels and tags.
    async fn classify_and_rewrite(
        &self,
        prompt: &str,
        allowed_themes: &[String],
    ) -> Result<Reinterpretation>;
}

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Render the full image prompt and return the PNG bytes.
    async fn render(&self, prompt: &str) -> Result<Vec<u8>>;
}
