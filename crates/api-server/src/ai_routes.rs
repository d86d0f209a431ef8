//! AI assistant routes.
//!
//! Each handler makes one stateless completion call. Text endpoints return the
//! model reply verbatim; the image endpoints parse it into JSON.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use ai_assistant::{ArtisanAssistant, ImageAttachment, LLMError, StoryBrief};
use artisan_core::ProductFilter;

use crate::extract::ApiJson;
use crate::{AppError, AppState};

/// Catalogue products shown to the model when recommending.
const RECOMMENDATION_CATALOGUE: i64 = 10;

/// Map LLMError to AppError: 503 when the provider is missing or
/// misconfigured, 500 otherwise.
fn ai_err(context: &str, e: LLMError) -> AppError {
    let status = if e.is_unavailable() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    AppError::with_status(status, anyhow::anyhow!("{context} failed: {e}"))
}

fn require_assistant<'a>(state: &'a AppState, context: &str) -> Result<&'a ArtisanAssistant, AppError> {
    state
        .assistant
        .as_ref()
        .ok_or_else(|| ai_err(context, LLMError::NotConfigured))
}

#[derive(Deserialize)]
pub struct ProductAnalysisRequest {
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub simple_description: Option<String>,
}

#[derive(Deserialize)]
pub struct SocialContentRequest {
    pub product_id: String,
    pub platform: String,
}

#[derive(Deserialize, Default)]
pub struct TranslateRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
}

pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ai/analyze-product", post(analyze_product))
        .route("/api/ai/analyze-product-image", post(analyze_product_image))
        .route("/api/ai/generate-story", post(generate_story))
        .route(
            "/api/ai/generate-story-with-image",
            post(generate_story_with_image),
        )
        .route("/api/ai/generate-social-content", post(generate_social_content))
        .route("/api/ai/translate", post(translate))
        .route("/api/ai/recommendations/:user_id", get(recommendations))
}

async fn analyze_product(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ProductAnalysisRequest>,
) -> Result<Json<Value>, AppError> {
    const CONTEXT: &str = "AI analysis";
    let assistant = require_assistant(&state, CONTEXT)?;

    if body.image_data.as_deref().is_some_and(|d| !d.is_empty()) {
        tracing::debug!("Inline image_data is not sent to the model; use analyze-product-image");
    }

    let suggestions = assistant
        .analyze_product(body.simple_description.as_deref())
        .await
        .map_err(|e| ai_err(CONTEXT, e))?;

    Ok(Json(json!({
        "ai_suggestions": suggestions,
        "status": "success",
    })))
}

async fn analyze_product_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, AppError> {
    const CONTEXT: &str = "AI analysis";

    let form = UploadForm::read(multipart?).await?;
    let image = form
        .image
        .as_ref()
        .ok_or_else(|| AppError::bad_request("File must be an image"))?;

    let analysis = require_assistant(&state, CONTEXT)?
        .analyze_product_image(image, form.text("description"))
        .await
        .map_err(|e| ai_err(CONTEXT, e))?;

    Ok(Json(json!({
        "ai_analysis": analysis,
        "image_url": image.preview(),
        "status": "success",
    })))
}

async fn generate_story(
    State(state): State<AppState>,
    ApiJson(brief): ApiJson<StoryBrief>,
) -> Result<Json<Value>, AppError> {
    const CONTEXT: &str = "Story generation";

    let story = require_assistant(&state, CONTEXT)?
        .generate_story(&brief)
        .await
        .map_err(|e| ai_err(CONTEXT, e))?;

    Ok(Json(json!({
        "story_content": story,
        "status": "success",
    })))
}

async fn generate_story_with_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, AppError> {
    const CONTEXT: &str = "Story generation";

    let form = UploadForm::read(multipart?).await?;
    let brief = StoryBrief {
        artisan_name: form.required("artisan_name")?,
        craft_type: form.required("craft_type")?,
        simple_text: form.required("simple_text")?,
        cultural_background: form.text("cultural_background").map(str::to_string),
        product_id: form.text("product_id").map(str::to_string),
    };

    let story = require_assistant(&state, CONTEXT)?
        .generate_story_with_image(&brief, form.image.as_ref())
        .await
        .map_err(|e| ai_err(CONTEXT, e))?;

    let mut response = json!({
        "story_content": story,
        "status": "success",
    });
    if let Some(image) = form.image.as_ref() {
        response["image_preview"] = Value::String(image.preview());
    }

    Ok(Json(response))
}

async fn generate_social_content(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SocialContentRequest>,
) -> Result<Json<Value>, AppError> {
    const CONTEXT: &str = "Social content generation";

    let product = state.products().require(&body.product_id).await?;
    let content = require_assistant(&state, CONTEXT)?
        .social_content(&product, &body.platform)
        .await
        .map_err(|e| ai_err(CONTEXT, e))?;

    Ok(Json(json!({
        "social_content": content,
        "platform": body.platform,
        "status": "success",
    })))
}

async fn translate(
    State(state): State<AppState>,
    body: Option<Json<TranslateRequest>>,
) -> Result<Json<Value>, AppError> {
    const CONTEXT: &str = "Translation";

    let body = body.map(|Json(b)| b).unwrap_or_default();
    let translations = require_assistant(&state, CONTEXT)?
        .translate(body.text.as_deref(), body.languages.as_deref())
        .await
        .map_err(|e| ai_err(CONTEXT, e))?;

    Ok(Json(json!({
        "translations": translations,
        "status": "success",
    })))
}

async fn recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    const CONTEXT: &str = "Recommendation";

    let user = state.users().require(&user_id).await?;
    let products = state
        .products()
        .list(&ProductFilter::default(), RECOMMENDATION_CATALOGUE)
        .await?;

    let recommendations = require_assistant(&state, CONTEXT)?
        .recommend(&user, &products)
        .await
        .map_err(|e| ai_err(CONTEXT, e))?;

    Ok(Json(json!({
        "recommendations": recommendations,
        "user_id": user_id,
        "status": "success",
    })))
}

/// Parsed multipart form: an optional `image` file plus text fields.
struct UploadForm {
    image: Option<ImageAttachment>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm {
            image: None,
            fields: HashMap::new(),
        };

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::bad_request(format!("Invalid multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == "image" {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let named = field.file_name().is_some_and(|f| !f.is_empty());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(format!("Failed to read upload: {e}")))?;

                // Browsers send an empty, unnamed part for an untouched file input
                if bytes.is_empty() && !named {
                    continue;
                }
                if !ImageAttachment::is_image_type(&content_type) {
                    return Err(AppError::bad_request("File must be an image"));
                }

                tracing::debug!("Received {} byte {} upload", bytes.len(), content_type);
                form.image = Some(ImageAttachment::from_bytes(content_type, &bytes));
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::bad_request(format!("Invalid form field {name}: {e}")))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    fn required(&self, name: &str) -> Result<String, AppError> {
        self.text(name)
            .map(str::to_string)
            .ok_or_else(|| AppError::bad_request(format!("Missing required field: {name}")))
    }
}
