//! Product catalogue and artisan portfolio routes.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use artisan_core::{Portfolio, Product, ProductFilter, ProductInput, ProductUpdate};
use marketplace_store::{PRODUCT_LIST_LIMIT, STORY_LIST_LIMIT};

use crate::auth::AuthenticatedUser;
use crate::extract::{ApiJson, ApiQuery};
use crate::{AppError, AppState};

/// Create body: product fields plus an optional explicit owner.
#[derive(Deserialize)]
pub struct CreateProductRequest {
    #[serde(flatten)]
    pub product: ProductInput,
    #[serde(default)]
    pub artisan_id: Option<String>,
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/artisans/:id/portfolio", get(get_portfolio))
}

async fn create_product(
    State(state): State<AppState>,
    session: AuthenticatedUser,
    ApiJson(body): ApiJson<CreateProductRequest>,
) -> Result<Json<Product>, AppError> {
    let artisan_id = session.content_owner(body.artisan_id.as_deref())?;
    let product = state.products().create(&artisan_id, body.product).await?;
    tracing::info!("Artisan {} listed product {}", artisan_id, product.id);
    Ok(Json(product))
}

async fn list_products(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ProductFilter>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = state.products().list(&filter, PRODUCT_LIST_LIMIT).await?;
    Ok(Json(products))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(state.products().require(&id).await?))
}

async fn update_product(
    State(state): State<AppState>,
    session: AuthenticatedUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ProductUpdate>,
) -> Result<Json<Product>, AppError> {
    let catalog = state.products();
    let existing = catalog.require(&id).await?;
    session.require_owner(&existing.artisan_id)?;

    Ok(Json(catalog.update(&id, body).await?))
}

async fn delete_product(
    State(state): State<AppState>,
    session: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let catalog = state.products();
    let existing = catalog.require(&id).await?;
    session.require_owner(&existing.artisan_id)?;

    catalog.delete(&id).await?;
    tracing::info!("Artisan {} removed product {}", session.user.id, id);
    Ok(Json(json!({ "status": "deleted", "id": id })))
}

async fn get_portfolio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Portfolio>, AppError> {
    let artisan = state.users().require(&id).await?;
    let filter = ProductFilter {
        artisan_id: Some(artisan.id.clone()),
        ..Default::default()
    };

    let products = state.products().list(&filter, PRODUCT_LIST_LIMIT).await?;
    let stories = state
        .stories()
        .list_by_artisan(&artisan.id, STORY_LIST_LIMIT)
        .await?;

    Ok(Json(Portfolio {
        artisan,
        products,
        stories,
    }))
}
