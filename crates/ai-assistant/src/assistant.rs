use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use artisan_core::{Product, User};

use crate::json::parse_structured;
use crate::prompts;
use crate::{ChatMessage, CompletionRequest, LLMProvider, Result};

pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Characters of base64 kept in an image preview.
const PREVIEW_CHARS: usize = 100;

/// An uploaded image, held base64-encoded.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub content_type: String,
    pub base64: String,
}

impl ImageAttachment {
    pub fn from_bytes(content_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            content_type: content_type.into(),
            base64: STANDARD.encode(bytes),
        }
    }

    pub fn is_image_type(content_type: &str) -> bool {
        content_type.starts_with("image/")
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, self.base64)
    }

    /// Truncated data URL echoed back to clients.
    pub fn preview(&self) -> String {
        let end = self.base64.len().min(PREVIEW_CHARS);
        format!("data:image/jpeg;base64,{}...", &self.base64[..end])
    }
}

/// Notes an artisan gives for a generated story.
#[derive(Debug, Clone, Deserialize)]
pub struct StoryBrief {
    pub artisan_name: String,
    pub craft_type: String,
    pub simple_text: String,
    #[serde(default)]
    pub cultural_background: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
}

/// Marketplace assistant: one stateless completion per call.
#[derive(Clone)]
pub struct ArtisanAssistant {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl ArtisanAssistant {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn test_connection(&self) -> Result<String> {
        self.ask(prompts::CONNECTION_CHECK_PROMPT, None).await
    }

    pub async fn analyze_product(&self, description: Option<&str>) -> Result<String> {
        self.ask(&prompts::quick_product_analysis(description), None)
            .await
    }

    pub async fn analyze_product_image(
        &self,
        image: &ImageAttachment,
        description: Option<&str>,
    ) -> Result<Value> {
        let reply = self
            .ask(&prompts::detailed_product_analysis(description), Some(image))
            .await?;
        Ok(parse_structured(&reply))
    }

    pub async fn generate_story(&self, brief: &StoryBrief) -> Result<String> {
        let prompt = prompts::quick_story(
            &brief.artisan_name,
            &brief.craft_type,
            &brief.simple_text,
            brief.cultural_background.as_deref(),
        );
        self.ask(&prompt, None).await
    }

    pub async fn generate_story_with_image(
        &self,
        brief: &StoryBrief,
        image: Option<&ImageAttachment>,
    ) -> Result<Value> {
        let prompt = prompts::illustrated_story(
            &brief.artisan_name,
            &brief.craft_type,
            &brief.simple_text,
            brief.cultural_background.as_deref(),
            image.is_some(),
        );
        let reply = self.ask(&prompt, image).await?;
        Ok(parse_structured(&reply))
    }

    pub async fn social_content(&self, product: &Product, platform: &str) -> Result<String> {
        self.ask(&prompts::social_content(product, platform), None)
            .await
    }

    pub async fn translate(&self, text: Option<&str>, languages: Option<&[String]>) -> Result<String> {
        let text = text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(prompts::DEFAULT_TRANSLATION_TEXT);
        let languages: Vec<String> = match languages {
            Some(langs) if !langs.is_empty() => langs.to_vec(),
            _ => prompts::DEFAULT_TRANSLATION_LANGUAGES
                .iter()
                .map(|l| l.to_string())
                .collect(),
        };

        self.ask(&prompts::translation(text, &languages), None).await
    }

    pub async fn recommend(&self, user: &User, products: &[Product]) -> Result<String> {
        self.ask(&prompts::recommendations(user, products), None)
            .await
    }

    async fn ask(&self, prompt: &str, image: Option<&ImageAttachment>) -> Result<String> {
        let mut message = ChatMessage::user(prompt);
        if let Some(image) = image {
            message = message.with_image(image.data_url());
        }

        let request = CompletionRequest::builder(&self.model)
            .system(prompts::SYSTEM_PROMPT)
            .add_message(message)
            .build();

        let response = self.provider.complete(request).await?;
        tracing::debug!(
            provider = self.provider.name(),
            tokens = response.usage.total(),
            "Assistant reply received"
        );

        Ok(response.text)
    }
}
