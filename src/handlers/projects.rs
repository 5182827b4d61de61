// src/handlers/projects.rs

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
        auth::AuthContext,
        i18n::Locale,
        rbac::{
            ManagerOrAdmin, PermProjectsApprove, PermProjectsComplete, PermProjectsCreate, PermProjectsDelete,
            PermProjectsEdit, PermProjectsSubmit, PermProjectsView, RequirePermission, RequireRole,
        },
    },
    models::project::{
        CreateProjectPayload, Project, ProjectAction, ProjectDetail, ProjectFilter, RejectProjectPayload,
        UpdateProjectPayload,
    },
};

// POST /api/v1/projects
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    tag = "Projects",
    request_body = CreateProjectPayload,
    responses(
        (status = 201, description = "Projeto criado em pending", body = Project),
        (status = 404, description = "Lead, produto ou gerente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_project(
    State(app_state): State<AppState>,
    locale: Locale,
    gate: RequirePermission<PermProjectsCreate>,
    Json(payload): Json<CreateProjectPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let project = app_state
        .project_service
        .create_project(&payload, gate.ctx.user_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(project)))
}

// GET /api/v1/projects
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    tag = "Projects",
    params(ProjectFilter),
    responses((status = 200, description = "Projetos paginados", body = Paginated<ProjectDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_projects(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermProjectsView>,
    Query(filter): Query<ProjectFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(filter.page, filter.per_page);

    let (projects, total) = app_state
        .project_service
        .list_projects(&filter, page)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(Paginated::new(projects, page, total))))
}

// GET /api/v1/projects/{id}
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "ID do projeto")),
    responses(
        (status = 200, description = "Projeto com relações", body = ProjectDetail),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_project(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermProjectsView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let project = app_state
        .project_service
        .get_project(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(project)))
}

// PUT /api/v1/projects/{id}
#[utoipa::path(
    put,
    path = "/api/v1/projects/{id}",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "ID do projeto")),
    request_body = UpdateProjectPayload,
    responses(
        (status = 200, description = "Projeto atualizado", body = Project),
        (status = 404, description = "Não encontrado"),
        (status = 409, description = "Projeto já foi para aprovação")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_project(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermProjectsEdit>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProjectPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let project = app_state
        .project_service
        .update_project(id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(project)))
}

// DELETE /api/v1/projects/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "ID do projeto")),
    responses(
        (status = 204, description = "Removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_project(
    State(app_state): State<AppState>,
    locale: Locale,
    _gate: RequirePermission<PermProjectsDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .project_service
        .delete_project(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// --- FLUXO DE APROVAÇÃO ---

async fn run_transition(
    app_state: &AppState,
    locale: &Locale,
    ctx: &AuthContext,
    id: Uuid,
    action: ProjectAction,
    reason: Option<String>,
) -> Result<Json<Project>, ApiError> {
    app_state
        .project_service
        .transition(ctx, id, action, reason)
        .await
        .map(Json)
        .map_err(|app_err| app_err.to_api_error(locale, &app_state.i18n_store))
}

// POST /api/v1/projects/{id}/start
#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/start",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "ID do projeto")),
    responses(
        (status = 200, description = "pending -> in_progress", body = Project),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn start_project(
    State(app_state): State<AppState>,
    locale: Locale,
    gate: RequirePermission<PermProjectsEdit>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    run_transition(&app_state, &locale, &gate.ctx, id, ProjectAction::Start, None).await
}

// POST /api/v1/projects/{id}/submit
#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/submit",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "ID do projeto")),
    responses(
        (status = 200, description = "Enviado para aprovação; gerente notificado", body = Project),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn submit_project(
    State(app_state): State<AppState>,
    locale: Locale,
    gate: RequirePermission<PermProjectsSubmit>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    run_transition(&app_state, &locale, &gate.ctx, id, ProjectAction::Submit, None).await
}

// POST /api/v1/projects/{id}/approve
#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/approve",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "ID do projeto")),
    responses(
        (status = 200, description = "Aprovado; quem submeteu é notificado", body = Project),
        (status = 403, description = "Exige manager ou admin"),
        (status = 409, description = "Projeto não está aguardando aprovação")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_project(
    State(app_state): State<AppState>,
    locale: Locale,
    gate: RequireRole<ManagerOrAdmin>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    run_transition(&app_state, &locale, &gate.ctx, id, ProjectAction::Approve, None).await
}

// POST /api/v1/projects/{id}/reject
#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/reject",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "ID do projeto")),
    request_body = RejectProjectPayload,
    responses(
        (status = 200, description = "Rejeitado; quem submeteu é notificado", body = Project),
        (status = 403, description = "Sem permissão de aprovação"),
        (status = 409, description = "Projeto não está aguardando aprovação")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_project(
    State(app_state): State<AppState>,
    locale: Locale,
    gate: RequirePermission<PermProjectsApprove>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectProjectPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let reason = payload
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    run_transition(&app_state, &locale, &gate.ctx, id, ProjectAction::Reject, reason).await
}

// POST /api/v1/projects/{id}/complete
#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/complete",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "ID do projeto")),
    responses(
        (status = 200, description = "approved -> completed", body = Project),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_project(
    State(app_state): State<AppState>,
    locale: Locale,
    gate: RequirePermission<PermProjectsComplete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    run_transition(&app_state, &locale, &gate.ctx, id, ProjectAction::Complete, None).await
}
