use super::{ImageGenerationService, ReinterpretService};
use crate::models::{Category, Labels, Reinterpretation, Tags};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Smallest valid PNG (1x1 pixel).
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 pixel
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44,
    0x41, // IDAT chunk
    0x54, 0x08, 0x99, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0xE2, 0x25,
    0x00, 0xBC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, // IEND chunk
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[derive(Clone)]
pub struct MockReinterpretClient {
    responses: Arc<Mutex<Vec<Reinterpretation>>>,
    failure: Option<String>,
    call_count: Arc<Mutex<usize>>,
}

impl MockReinterpretClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            failure: None,
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_response(self, response: Reinterpretation) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    /// Every call fails with an `AiProvider` error carrying `message`.
    pub fn with_failure(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockReinterpretClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReinterpretService for MockReinterpretClient {
    async fn classify_and_rewrite(
        &self,
        prompt: &str,
        allowed_themes: &[String],
    ) -> Result<Reinterpretation> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        if let Some(message) = &self.failure {
            return Err(Error::AiProvider(message.clone()));
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Default: safe, first allowed theme, prompt kept as description
            let theme = allowed_themes
                .first()
                .cloned()
                .unwrap_or_else(|| "other".to_string());
            Ok(Reinterpretation {
                category: Category::SafePrevention,
                theme,
                labels: Labels {
                    fr: prompt.to_string(),
                    en: prompt.to_string(),
                    pt: prompt.to_string(),
                },
                tags: Tags {
                    fr: Vec::new(),
                    en: Vec::new(),
                    pt: Vec::new(),
                },
                visual_description: prompt.to_string(),
            })
        } else {
            let index = (*count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}

#[derive(Clone)]
pub struct MockImageGenerationClient {
    image_responses: Arc<Mutex<Vec<Vec<u8>>>>,
    failure: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockImageGenerationClient {
    pub fn new() -> Self {
        Self {
            image_responses: Arc::new(Mutex::new(Vec::new())),
            failure: None,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_image_response(self, response: Vec<u8>) -> Self {
        self.image_responses.lock().unwrap().push(response);
        self
    }

    /// Every call fails with an `AiProvider` error carrying `message`.
    pub fn with_failure(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Prompts received so far, in call order.
    pub fn get_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockImageGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerationService for MockImageGenerationClient {
    async fn render(&self, prompt: &str) -> Result<Vec<u8>> {
        let count = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };

        if let Some(message) = &self.failure {
            return Err(Error::AiProvider(message.clone()));
        }

        let responses = self.image_responses.lock().unwrap();
        if responses.is_empty() {
            Ok(TINY_PNG.to_vec())
        } else {
            let index = (count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_reinterpret_default_uses_first_theme() {
        let client = MockReinterpretClient::new();
        let themes = vec!["nature".to_string(), "other".to_string()];

        let result = client
            .classify_and_rewrite("un arbre", &themes)
            .await
            .unwrap();
        assert_eq!(result.theme, "nature");
        assert_eq!(result.visual_description, "un arbre");
        assert_eq!(client.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_reinterpret_cycles_responses() {
        let first = Reinterpretation {
            category: Category::Violence,
            ..MockReinterpretClient::new()
                .classify_and_rewrite("x", &[])
                .await
                .unwrap()
        };
        let second = Reinterpretation {
            category: Category::Emotion,
            ..first.clone()
        };
        let client = MockReinterpretClient::new()
            .with_response(first)
            .with_response(second);

        let categories = [
            client.classify_and_rewrite("a", &[]).await.unwrap().category,
            client.classify_and_rewrite("a", &[]).await.unwrap().category,
            client.classify_and_rewrite("a", &[]).await.unwrap().category,
        ];
        assert_eq!(
            categories,
            [Category::Violence, Category::Emotion, Category::Violence]
        );
    }

    #[tokio::test]
    async fn test_mock_image_records_prompts_and_failures() {
        let client = MockImageGenerationClient::new();
        let probe = client.clone();

        let bytes = client.render("first").await.unwrap();
        assert_eq!(&bytes[..4], &[0x89, 0x50, 0x4E, 0x47]);
        assert_eq!(probe.get_prompts(), vec!["first".to_string()]);

        let failing = MockImageGenerationClient::new().with_failure("Moderation blocked");
        let err = failing.render("second").await.unwrap_err();
        assert!(err.to_string().contains("Moderation blocked"));
        assert_eq!(failing.get_call_count(), 1);
    }
}
