use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use artisan_core::{Story, StoryInput};
use marketplace_store::STORY_LIST_LIMIT;

use crate::auth::AuthenticatedUser;
use crate::extract::ApiJson;
use crate::{AppError, AppState};

#[derive(Deserialize)]
pub struct CreateStoryRequest {
    #[serde(flatten)]
    pub story: StoryInput,
    #[serde(default)]
    pub artisan_id: Option<String>,
}

pub fn story_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stories", get(list_stories).post(create_story))
        .route("/api/stories/:id", get(get_story))
        .route("/api/stories/artisan/:artisan_id", get(list_artisan_stories))
}

async fn create_story(
    State(state): State<AppState>,
    session: AuthenticatedUser,
    ApiJson(body): ApiJson<CreateStoryRequest>,
) -> Result<Json<Story>, AppError> {
    let artisan_id = session.content_owner(body.artisan_id.as_deref())?;
    let story = state.stories().create(&artisan_id, body.story).await?;
    tracing::info!("Artisan {} published story {}", artisan_id, story.id);
    Ok(Json(story))
}

async fn list_stories(State(state): State<AppState>) -> Result<Json<Vec<Story>>, AppError> {
    Ok(Json(state.stories().list(STORY_LIST_LIMIT).await?))
}

async fn get_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Story>, AppError> {
    Ok(Json(state.stories().require(&id).await?))
}

async fn list_artisan_stories(
    State(state): State<AppState>,
    Path(artisan_id): Path<String>,
) -> Result<Json<Vec<Story>>, AppError> {
    let stories = state
        .stories()
        .list_by_artisan(&artisan_id, STORY_LIST_LIMIT)
        .await?;
    Ok(Json(stories))
}
