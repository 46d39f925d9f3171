//! Data models and structures
//!
//! Defines the request and response shapes of the `/generate` endpoint, the
//! structured reinterpretation returned by the language model, and the service
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Body of `POST /generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub themes_possibles: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Approved,
    Refused,
}

/// Machine-readable refusal code returned to the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefusalReason {
    PromptSizeInvalid,
    PromptGibberishNotAllowed,
    PromptRefusedViolence,
    TechnicalError,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Category {
    #[serde(rename = "SAFE_PREVENTION")]
    SafePrevention,
    #[serde(rename = "EMOTION")]
    Emotion,
    #[serde(rename = "VIOLENCE")]
    Violence,
    #[serde(rename = "INAPPROPRIE")]
    Inappropriate,
}

impl Category {
    pub const ALL: [&'static str; 4] = ["SAFE_PREVENTION", "EMOTION", "VIOLENCE", "INAPPROPRIE"];

    /// Categories that end the request with a violence refusal.
    pub fn is_refused(&self) -> bool {
        matches!(self, Category::Violence | Category::Inappropriate)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Labels {
    pub fr: String,
    pub en: String,
    pub pt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tags {
    pub fr: Vec<String>,
    pub en: Vec<String>,
    pub pt: Vec<String>,
}

/// Structured object produced by the reinterpretation model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reinterpretation {
    pub category: Category,
    pub theme: String,
    pub labels: Labels,
    pub tags: Tags,
    pub visual_description: String,
}

/// Response body of `POST /generate`.
///
/// `visual_description` only lives between reinterpretation and image
/// generation; it is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RefusalReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
    #[serde(skip_serializing, default)]
    pub visual_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_media: Option<String>,
}

impl Metadata {
    pub fn refused(reason: RefusalReason) -> Self {
        Self {
            status: Status::Refused,
            reason: Some(reason),
            category: None,
            theme: None,
            labels: None,
            tags: None,
            visual_description: None,
            url_media: None,
        }
    }

    pub fn approved(reinterpretation: Reinterpretation) -> Self {
        Self {
            status: Status::Approved,
            reason: None,
            category: Some(reinterpretation.category),
            theme: Some(reinterpretation.theme),
            labels: Some(reinterpretation.labels),
            tags: Some(reinterpretation.tags),
            visual_description: Some(reinterpretation.visual_description),
            url_media: None,
        }
    }

    /// Placeholder returned in bypass mode instead of calling the language model.
    pub fn bypass_stub(prompt: &str) -> Self {
        let mock = || "mock".to_string();
        Self::approved(Reinterpretation {
            category: Category::SafePrevention,
            theme: "other".to_string(),
            labels: Labels {
                fr: mock(),
                en: mock(),
                pt: mock(),
            },
            tags: Tags {
                fr: vec![mock()],
                en: vec![mock()],
                pt: vec![mock()],
            },
            visual_description: prompt.to_string(),
        })
    }

    pub fn is_approved(&self) -> bool {
        self.status == Status::Approved
    }

    /// Remove the internal description, leaving the metadata safe to return.
    pub fn take_visual_description(&mut self) -> Option<String> {
        self.visual_description.take()
    }
}

pub const DEFAULT_FORBIDDEN_TERMS: [&str; 5] = ["frappe", "agresse", "donne un coup", "viol", "sexe"];

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub mock: bool,
    pub chat_model: String,
    pub image_model: String,
    pub media_root: PathBuf,
    pub forbidden_terms: Vec<String>,
    pub bind_addr: String,
    pub chat_timeout: Duration,
    pub image_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            mock: false,
            chat_model: "gpt-4o-mini".to_string(),
            image_model: "gpt-image-1".to_string(),
            media_root: PathBuf::from("media"),
            forbidden_terms: DEFAULT_FORBIDDEN_TERMS
                .iter()
                .map(|term| term.to_string())
                .collect(),
            bind_addr: "0.0.0.0:8000".to_string(),
            chat_timeout: Duration::from_secs(60),
            image_timeout: Duration::from_secs(180),
        }
    }
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mock = lookup("MOCK")
            .map(|value| value.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let openai_api_key = lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty());
        if openai_api_key.is_none() && !mock {
            return Err(crate::Error::Config(
                "OPENAI_API_KEY not set (required unless MOCK=true)".to_string(),
            ));
        }

        let forbidden_terms = match lookup("FORBIDDEN_TERMS") {
            Some(raw) => parse_terms(&raw),
            None => defaults.forbidden_terms,
        };

        Ok(Self {
            openai_api_key,
            mock,
            chat_model: lookup("CHAT_MODEL").unwrap_or(defaults.chat_model),
            image_model: lookup("IMAGE_MODEL").unwrap_or(defaults.image_model),
            media_root: lookup("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_root),
            forbidden_terms,
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            chat_timeout: parse_secs(&lookup, "CHAT_TIMEOUT_SECS", defaults.chat_timeout)?,
            image_timeout: parse_secs(&lookup, "IMAGE_TIMEOUT_SECS", defaults.image_timeout)?,
        })
    }

    pub fn images_dir(&self) -> PathBuf {
        self.media_root.join("images")
    }
}

fn parse_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .collect()
}

fn parse_secs<F>(lookup: &F, key: &str, default: Duration) -> crate::Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| crate::Error::Config(format!("{} must be a number of seconds", key))),
        None => Ok(default),
    }
}
