//! Image production and storage
//!
//! Renders a reinterpreted description with the illustration style template and
//! stores the PNG under `<media_root>/images/<theme_folder>/`.

use crate::ai::{mime, ImageGenerationService};
use crate::{prompts, Error, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Public path returned in bypass mode.
pub const MOCK_MEDIA_PATH: &str = "/media/images/other/mock.png";

const FALLBACK_FOLDER: &str = "other";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaOutcome {
    /// Public relative path of the stored asset.
    Stored(String),
    SafetyBlocked,
    Failed,
}

pub struct ImageProducer {
    renderer: Box<dyn ImageGenerationService>,
    images_dir: PathBuf,
    mock: bool,
}

impl ImageProducer {
    pub fn new(renderer: Box<dyn ImageGenerationService>, images_dir: PathBuf, mock: bool) -> Self {
        Self {
            renderer,
            images_dir,
            mock,
        }
    }

    /// Render `description` and store it under the folder for `theme`.
    ///
    /// One render attempt; failures are reported as outcomes, never retried.
    pub async fn produce(&self, description: &str, theme: &str) -> MediaOutcome {
        let folder = theme_folder(theme);
        let dir = self.images_dir.join(&folder);

        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            error!("Failed to create media directory {}: {}", dir.display(), e);
            return MediaOutcome::Failed;
        }

        if self.mock {
            return MediaOutcome::Stored(MOCK_MEDIA_PATH.to_string());
        }

        info!("Sending description to the image model (theme folder: {})", folder);
        match self.render_and_store(description, &dir, &folder).await {
            Ok(public_path) => {
                info!("Image stored at {}", public_path);
                MediaOutcome::Stored(public_path)
            }
            Err(e) => {
                error!("Image generation failed: {}", e);
                classify_failure(&e)
            }
        }
    }

    async fn render_and_store(&self, description: &str, dir: &Path, folder: &str) -> Result<String> {
        let image = self.renderer.render(&prompts::image_prompt(description)).await?;
        if !mime::is_png(&image) {
            warn!(
                "Image model returned {} bytes of {} data, storing as PNG anyway",
                image.len(),
                mime::describe_format(&image)
            );
        }

        let filename = asset_filename();
        tokio::fs::write(dir.join(&filename), &image).await?;

        Ok(format!("/media/images/{}/{}", folder, filename))
    }
}

/// Trim and lowercase the theme and replace spaces with underscores. Path
/// separators are replaced too, and names that would leave the images directory
/// fall back to `other`.
pub fn theme_folder(theme: &str) -> String {
    let folder: String = theme
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c => c,
        })
        .collect();

    if folder.is_empty() || folder.chars().all(|c| c == '.') {
        FALLBACK_FOLDER.to_string()
    } else {
        folder
    }
}

/// `asset_` followed by six random hex digits.
fn asset_filename() -> String {
    let bytes: [u8; 3] = rand::random();
    format!(
        "asset_{:02x}{:02x}{:02x}.png",
        bytes[0], bytes[1], bytes[2]
    )
}

/// Map a render or storage error to an outcome from its message text.
pub fn classify_failure(err: &Error) -> MediaOutcome {
    let message = err.to_string().to_lowercase();
    if message.contains("safety") || message.contains("moderation") {
        MediaOutcome::SafetyBlocked
    } else {
        MediaOutcome::Failed
    }
}
