// src/handlers/services.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        pagination::{PageRequest, Paginated},
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermServicesDelete, PermServicesEdit, PermServicesView, RequirePermission},
    },
    models::customer::{
        CustomerService, CustomerServiceDetail, CustomerServiceFilter, ServiceStatus, UpdateCustomerServicePayload,
    },
};

// GET /api/v1/services
#[utoipa::path(
    get,
    path = "/api/v1/services",
    tag = "Services",
    params(CustomerServiceFilter),
    responses((status = 200, description = "Serviços paginados", body = Paginated<CustomerServiceDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_services(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermServicesView>,
    Query(filter): Query<CustomerServiceFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(filter.page, filter.per_page);

    let (services, total) = app_state
        .crm_service
        .list_services(&filter, page)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(Paginated::new(services, page, total))))
}

// GET /api/v1/services/{id}
#[utoipa::path(
    get,
    path = "/api/v1/services/{id}",
    tag = "Services",
    params(("id" = Uuid, Path, description = "ID do serviço")),
    responses(
        (status = 200, description = "Serviço com produto", body = CustomerServiceDetail),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_service(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermServicesView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = app_state
        .crm_service
        .get_service(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(service)))
}

// PUT /api/v1/services/{id}
#[utoipa::path(
    put,
    path = "/api/v1/services/{id}",
    tag = "Services",
    params(("id" = Uuid, Path, description = "ID do serviço")),
    request_body = UpdateCustomerServicePayload,
    responses(
        (status = 200, description = "Serviço atualizado", body = CustomerService),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_service(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermServicesEdit>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerServicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let service = app_state
        .crm_service
        .update_service(id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(service)))
}

async fn change_status(
    app_state: &AppState,
    locale: &Locale,
    id: Uuid,
    target: ServiceStatus,
) -> Result<Json<CustomerService>, ApiError> {
    app_state
        .crm_service
        .change_service_status(id, target)
        .await
        .map(Json)
        .map_err(|app_err| app_err.to_api_error(locale, &app_state.i18n_store))
}

// POST /api/v1/services/{id}/suspend
#[utoipa::path(
    post,
    path = "/api/v1/services/{id}/suspend",
    tag = "Services",
    params(("id" = Uuid, Path, description = "ID do serviço")),
    responses(
        (status = 200, description = "Serviço suspenso", body = CustomerService),
        (status = 409, description = "Mudança de status inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn suspend_service(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermServicesEdit>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    change_status(&app_state, &locale, id, ServiceStatus::Suspended).await
}

// POST /api/v1/services/{id}/activate
#[utoipa::path(
    post,
    path = "/api/v1/services/{id}/activate",
    tag = "Services",
    params(("id" = Uuid, Path, description = "ID do serviço")),
    responses(
        (status = 200, description = "Serviço reativado", body = CustomerService),
        (status = 409, description = "Mudança de status inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn activate_service(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermServicesEdit>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    change_status(&app_state, &locale, id, ServiceStatus::Active).await
}

// POST /api/v1/services/{id}/terminate
#[utoipa::path(
    post,
    path = "/api/v1/services/{id}/terminate",
    tag = "Services",
    params(("id" = Uuid, Path, description = "ID do serviço")),
    responses(
        (status = 200, description = "Serviço cancelado (definitivo)", body = CustomerService),
        (status = 409, description = "Serviço já cancelado")
    ),
    security(("api_jwt" = []))
)]
pub async fn terminate_service(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermServicesEdit>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    change_status(&app_state, &locale, id, ServiceStatus::Terminated).await
}

// DELETE /api/v1/services/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/services/{id}",
    tag = "Services",
    params(("id" = Uuid, Path, description = "ID do serviço")),
    responses(
        (status = 204, description = "Removido"),
        (status = 409, description = "Serviço referenciado por chamados")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_service(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermServicesDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .crm_service
        .delete_service(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
