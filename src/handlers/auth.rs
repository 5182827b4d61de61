// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthContext, i18n::Locale},
    models::{
        auth::{AuthResponse, LoginUserPayload, User},
        rbac::RolePermissionsResponse,
    },
};

// POST /api/v1/auth/login
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Token da equipe (7 dias)", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas"),
        (status = 403, description = "Conta desativada")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LoginUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let token = app_state
        .auth_service
        .login_user(&payload.email, &payload.password)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(AuthResponse { token })))
}

// GET /api/v1/auth/me
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Usuário autenticado", body = User),
        (status = 401, description = "Não autenticado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    locale: Locale,
    ctx: AuthContext,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .user_service
        .get_user(ctx.user_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(user)))
}

// GET /api/v1/auth/me/permissions
#[utoipa::path(
    get,
    path = "/api/v1/auth/me/permissions",
    tag = "Auth",
    responses(
        (status = 200, description = "Papel, permissões e hierarquia do usuário", body = RolePermissionsResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_my_permissions(ctx: AuthContext) -> Json<RolePermissionsResponse> {
    Json(RolePermissionsResponse::from(ctx.role))
}
