// src/handlers/notifications.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{
        error::ApiError,
        pagination::{PageRequest, Paginated},
    },
    config::AppState,
    middleware::{auth::AuthContext, i18n::Locale},
    models::notification::{Notification, NotificationFilter, UnreadCount},
};

// Toda rota aqui só enxerga as notificações do próprio usuário

// GET /api/v1/notifications
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "Notifications",
    params(NotificationFilter),
    responses((status = 200, description = "Notificações do usuário", body = Paginated<Notification>)),
    security(("api_jwt" = []))
)]
pub async fn list_notifications(
    State(app_state): State<AppState>,
    locale: Locale,
    ctx: AuthContext,
    Query(filter): Query<NotificationFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(filter.page, filter.per_page);

    let (notifications, total) = app_state
        .notification_service
        .list(ctx.user_id, &filter, page)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(Paginated::new(notifications, page, total))))
}

// GET /api/v1/notifications/unread-count
#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread-count",
    tag = "Notifications",
    responses((status = 200, description = "Quantidade não lida", body = UnreadCount)),
    security(("api_jwt" = []))
)]
pub async fn unread_count(
    State(app_state): State<AppState>,
    locale: Locale,
    ctx: AuthContext,
) -> Result<impl IntoResponse, ApiError> {
    let unread = app_state
        .notification_service
        .unread_count(ctx.user_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(UnreadCount { unread })))
}

// POST /api/v1/notifications/{id}/read
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "ID da notificação")),
    responses(
        (status = 200, description = "Marcada como lida", body = Notification),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_read(
    State(app_state): State<AppState>,
    locale: Locale,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let notification = app_state
        .notification_service
        .mark_read(id, ctx.user_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(notification)))
}

// POST /api/v1/notifications/read-all
#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    tag = "Notifications",
    responses((status = 204, description = "Todas marcadas como lidas")),
    security(("api_jwt" = []))
)]
pub async fn mark_all_read(
    State(app_state): State<AppState>,
    locale: Locale,
    ctx: AuthContext,
) -> Result<impl IntoResponse, ApiError> {
    let updated = app_state
        .notification_service
        .mark_all_read(ctx.user_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::debug!("📭 {} notificações marcadas como lidas para {}", updated, ctx.email);
    Ok(StatusCode::NO_CONTENT)
}
