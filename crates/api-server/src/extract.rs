//! Request extractors whose rejections render as `{"detail": ...}` bodies.

use axum::extract::{FromRequest, FromRequestParts};

use crate::AppError;

/// `axum::Json` with the rejection routed through `AppError`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` with the rejection routed through `AppError`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
