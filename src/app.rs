//! Request orchestration: validation, reinterpretation, then image production.

use crate::ai::{
    ImageGenerationService, MockImageGenerationClient, MockReinterpretClient,
    OpenAiImageClient, OpenAiReinterpretClient, ReinterpretService,
};
use crate::media::{ImageProducer, MediaOutcome};
use crate::models::{Config, GenerateRequest, Metadata, RefusalReason};
use crate::validator::{validate_prompt, Validation};
use crate::{Error, Result};
use tracing::{debug, info};

/// Handles `/generate` requests. Built once at startup and shared read-only.
pub struct App {
    config: Config,
    reinterpreter: Box<dyn ReinterpretService>,
    images: ImageProducer,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub reinterpreter: Box<dyn ReinterpretService>,
    pub image_gen: Box<dyn ImageGenerationService>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices, config: Config) -> Self {
        let images = ImageProducer::new(services.image_gen, config.images_dir(), config.mock);
        Self {
            config,
            reinterpreter: services.reinterpreter,
            images,
        }
    }

    /// Construct the app for `config`, wiring OpenAI clients unless bypass mode is on.
    pub async fn from_config(config: Config) -> Result<Self> {
        tokio::fs::create_dir_all(config.images_dir()).await?;
        info!("Media directory: {}", config.images_dir().display());

        let services = if config.mock {
            info!("MOCK enabled - external AI calls are bypassed");
            AppServices {
                reinterpreter: Box::new(MockReinterpretClient::new()),
                image_gen: Box::new(MockImageGenerationClient::new()),
            }
        } else {
            let api_key = config
                .openai_api_key
                .clone()
                .ok_or_else(|| Error::Config("OPENAI_API_KEY not set".to_string()))?;

            // Reuse one HTTP connection pool across provider clients.
            let http_client = reqwest::Client::new();

            info!("Reinterpretation model: {}", config.chat_model);
            info!("Image model: {}", config.image_model);
            AppServices {
                reinterpreter: Box::new(OpenAiReinterpretClient::new_with_client(
                    api_key.clone(),
                    config.chat_model.clone(),
                    http_client.clone(),
                    config.chat_timeout,
                )),
                image_gen: Box::new(OpenAiImageClient::new_with_client(
                    api_key,
                    config.image_model.clone(),
                    http_client,
                    config.image_timeout,
                )),
            }
        };

        Ok(Self::with_services(services, config))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate and reinterpret a prompt.
    ///
    /// Refusals come back as `Ok` metadata; an approved result still carries its
    /// `visual_description`. Only a failed reinterpretation call is an `Err`.
    pub async fn validate_and_generate_metadata(
        &self,
        prompt: &str,
        allowed_themes: &[String],
    ) -> Result<Metadata> {
        let clean = match validate_prompt(prompt, &self.config) {
            Validation::Refused(reason) => return Ok(Metadata::refused(reason)),
            Validation::Bypass(clean) => return Ok(Metadata::bypass_stub(&clean)),
            Validation::Proceed(clean) => clean,
        };

        let reinterpretation = self
            .reinterpreter
            .classify_and_rewrite(&clean, allowed_themes)
            .await?;

        if reinterpretation.category.is_refused() {
            info!("Prompt refused by model: {:?}", reinterpretation.category);
            return Ok(Metadata::refused(RefusalReason::PromptRefusedViolence));
        }

        Ok(Metadata::approved(reinterpretation))
    }

    /// Full pipeline for one request.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<Metadata> {
        info!("New generation request");
        debug!("Prompt received: {}", request.prompt.trim());

        let mut metadata = self
            .validate_and_generate_metadata(&request.prompt, &request.themes_possibles)
            .await?;
        if !metadata.is_approved() {
            return Ok(metadata);
        }

        let description = metadata.take_visual_description().unwrap_or_default();
        let theme = metadata.theme.clone().unwrap_or_default();

        match self.images.produce(&description, &theme).await {
            MediaOutcome::Stored(url_media) => {
                metadata.url_media = Some(url_media);
                Ok(metadata)
            }
            MediaOutcome::SafetyBlocked => {
                Ok(Metadata::refused(RefusalReason::PromptRefusedViolence))
            }
            MediaOutcome::Failed => Ok(Metadata::refused(RefusalReason::TechnicalError)),
        }
    }
}
