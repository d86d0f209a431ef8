//! Account and profile routes.

use axum::{
    extract::{ConnectInfo, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::net::SocketAddr;

use artisan_core::{LoginRequest, MarketplaceError, NewUser, ProfileUpdate, User};

use crate::auth::{client_ip, AuthError, AuthenticatedUser};
use crate::extract::ApiJson;
use crate::{AppError, AppState};

#[derive(Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/users/:id", get(get_user).put(update_user))
}

async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewUser>,
) -> Result<Json<User>, AppError> {
    let user = state.users().register(body).await?;
    Ok(Json(user))
}

async fn login(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let ip = client_ip(connect_info.as_ref());
    let guard = &state.brute_force_guard;

    if guard.is_locked(&ip) {
        tracing::warn!("Login refused for locked-out IP {}", ip);
        return Err(AuthError::Locked.into());
    }

    let user = match state.users().authenticate(&body.email, &body.password).await {
        Ok(user) => user,
        Err(e) => {
            if matches!(
                e.downcast_ref::<MarketplaceError>(),
                Some(MarketplaceError::Unauthorized(_))
            ) {
                tracing::warn!("Failed login for {} from {}", body.email.trim(), ip);
                guard.record_failure(&ip);
            }
            return Err(e.into());
        }
    };

    guard.record_success(&ip);
    let token = state.sessions().issue(&user.id).await?;
    tracing::info!("User {} logged in", user.id);

    Ok(Json(LoginResponse { user, token }))
}

async fn logout(
    State(state): State<AppState>,
    session: AuthenticatedUser,
) -> Result<Json<Value>, AppError> {
    state.sessions().revoke(&session.token).await?;
    tracing::info!("User {} logged out", session.user.id);
    Ok(Json(json!({ "status": "logged_out" })))
}

async fn me(session: AuthenticatedUser) -> Json<User> {
    Json(session.user)
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.users().require(&id).await?))
}

async fn update_user(
    State(state): State<AppState>,
    session: AuthenticatedUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    session.require_owner(&id)?;
    let user = state.users().update_profile(&id, body).await?;
    Ok(Json(user))
}
