// src/handlers/customers.rs

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
        rbac::{
            PermCustomersCreate, PermCustomersDelete, PermCustomersEdit, PermCustomersView, PermServicesCreate,
            PermServicesView, RequirePermission,
        },
    },
    models::customer::{
        CreateCustomerPayload, CreateCustomerServicePayload, Customer, CustomerDetail, CustomerFilter,
        CustomerService, CustomerServiceDetail, PortalAccessPayload, UpdateCustomerPayload,
    },
};

// POST /api/v1/customers
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    tag = "Customers",
    request_body = CreateCustomerPayload,
    responses(
        (status = 201, description = "Cliente criado com código CUST-AAAAMMDD-NNN", body = Customer),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermCustomersCreate>,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .crm_service
        .create_customer(&payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// GET /api/v1/customers
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    tag = "Customers",
    params(CustomerFilter),
    responses((status = 200, description = "Clientes paginados", body = Paginated<Customer>)),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermCustomersView>,
    Query(filter): Query<CustomerFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(filter.page, filter.per_page);

    let (customers, total) = app_state
        .crm_service
        .list_customers(&filter, page)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(Paginated::new(customers, page, total))))
}

// GET /api/v1/customers/{id}
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente com serviços", body = CustomerDetail),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermCustomersView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .crm_service
        .get_customer(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customer)))
}

// PUT /api/v1/customers/{id}
#[utoipa::path(
    put,
    path = "/api/v1/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = UpdateCustomerPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = Customer),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermCustomersEdit>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .crm_service
        .update_customer(id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customer)))
}

// PUT /api/v1/customers/{id}/portal-access
#[utoipa::path(
    put,
    path = "/api/v1/customers/{id}/portal-access",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = PortalAccessPayload,
    responses(
        (status = 204, description = "Senha do portal definida"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_portal_access(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermCustomersEdit>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PortalAccessPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .crm_service
        .set_portal_password(id, &payload.password)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// DELETE /api/v1/customers/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 204, description = "Removido"),
        (status = 409, description = "Cliente com serviços ou chamados")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermCustomersDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .crm_service
        .delete_customer(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/v1/customers/{id}/services
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}/services",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses((status = 200, description = "Serviços do cliente", body = Vec<CustomerServiceDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_customer_services(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermServicesView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let services = app_state
        .crm_service
        .services_of(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(services)))
}

// POST /api/v1/customers/{id}/services
#[utoipa::path(
    post,
    path = "/api/v1/customers/{id}/services",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = CreateCustomerServicePayload,
    responses(
        (status = 201, description = "Serviço contratado (SVC-AAAAMM-NNNN)", body = CustomerService),
        (status = 404, description = "Cliente ou produto não encontrado"),
        (status = 422, description = "Produto inativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer_service(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermServicesCreate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateCustomerServicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let service = app_state
        .crm_service
        .create_service(id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(service)))
}
