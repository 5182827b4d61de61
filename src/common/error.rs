use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    common::i18n::I18nStore,
    middleware::i18n::Locale,
    models::{
        customer::ServiceStatus,
        project::{InvalidTransition, ProjectAction, ProjectStatus},
        rbac::Permission,
    },
};

// Nosso tipo de erro de domínio, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Não autenticado")]
    Unauthenticated,

    #[error("Conta desativada")]
    AccountDisabled,

    #[error("Permissão ausente: {0}")]
    MissingPermission(Permission),

    #[error("Papel ausente: {0}")]
    MissingRole(String),

    // Guarda a chave da entidade ("project", "lead"...) para traduzir depois
    #[error("{0} não encontrado")]
    NotFound(&'static str),

    #[error("Transição inválida: {action} a partir de {from}")]
    InvalidTransition {
        action: ProjectAction,
        from: ProjectStatus,
    },

    #[error("Projeto não editável")]
    ProjectNotEditable,

    #[error("Lead não está em closed_won")]
    LeadNotConvertible,

    #[error("Lead já convertido")]
    LeadAlreadyConverted,

    #[error("Produto inativo")]
    ProductInactive,

    #[error("Transição de serviço inválida: {from:?} -> {to:?}")]
    InvalidServiceTransition {
        from: ServiceStatus,
        to: ServiceStatus,
    },

    #[error("Cliente sem acesso ao portal")]
    PortalAccessDisabled,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Usuário tentou remover a si mesmo")]
    CannotDeleteSelf,

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro ao gerar documento: {0}")]
    DocumentError(String),
}

impl From<InvalidTransition> for AppError {
    fn from(t: InvalidTransition) -> Self {
        AppError::InvalidTransition { action: t.action, from: t.from }
    }
}

impl AppError {
    /// Converte violação de chave única ou estrangeira em conflito; o resto vira DatabaseError.
    pub fn from_constraint(e: sqlx::Error, detail: impl Into<String>) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
                return AppError::UniqueConstraintViolation(detail.into());
            }
        }
        e.into()
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::AccountDisabled
            | AppError::MissingPermission(_)
            | AppError::MissingRole(_)
            | AppError::PortalAccessDisabled => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition { .. }
            | AppError::InvalidServiceTransition { .. }
            | AppError::ProjectNotEditable
            | AppError::LeadAlreadyConverted
            | AppError::EmailAlreadyExists
            | AppError::CannotDeleteSelf
            | AppError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
            AppError::LeadNotConvertible | AppError::ProductInactive => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_)
            | AppError::DocumentError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Traduz o erro para a resposta HTTP no idioma da requisição.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let status = self.status_code();

        let (error, details) = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            let key = e.message.as_deref().unwrap_or(e.code.as_ref());
                            Value::String(store.get(lang, key))
                        })
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                (store.get(lang, "validation_failed"), Some(Value::Object(details)))
            }
            AppError::InvalidCredentials => (store.get(lang, "invalid_credentials"), None),
            AppError::InvalidToken => (store.get(lang, "invalid_token"), None),
            AppError::Unauthenticated => (store.get(lang, "unauthenticated"), None),
            AppError::AccountDisabled => (store.get(lang, "account_disabled"), None),
            AppError::MissingPermission(p) => (
                store.format(lang, "forbidden_permission", &[("required", p.slug())]),
                Some(json!({ "requiredPermission": p.slug() })),
            ),
            AppError::MissingRole(roles) => (
                store.format(lang, "forbidden_role", &[("required", roles.as_str())]),
                Some(json!({ "requiredRoles": roles })),
            ),
            AppError::NotFound(entity) => {
                let name = store.get(lang, &format!("entity.{}", entity));
                (store.format(lang, "not_found", &[("entity", name.as_str())]), None)
            }
            AppError::InvalidTransition { action, from } => (
                store.format(
                    lang,
                    "invalid_transition",
                    &[("action", action.as_str()), ("from", from.as_str())],
                ),
                Some(json!({ "action": action.as_str(), "currentStatus": from.as_str() })),
            ),
            AppError::ProjectNotEditable => (store.get(lang, "project_not_editable"), None),
            AppError::LeadNotConvertible => (store.get(lang, "lead_not_convertible"), None),
            AppError::LeadAlreadyConverted => (store.get(lang, "lead_already_converted"), None),
            AppError::ProductInactive => (store.get(lang, "product_inactive"), None),
            AppError::InvalidServiceTransition { from, to } => (
                store.format(
                    lang,
                    "invalid_service_transition",
                    &[("from", from.as_str()), ("to", to.as_str())],
                ),
                None,
            ),
            AppError::PortalAccessDisabled => (store.get(lang, "portal_access_disabled"), None),
            AppError::EmailAlreadyExists => (store.get(lang, "email_already_exists"), None),
            AppError::CannotDeleteSelf => (store.get(lang, "cannot_delete_self"), None),
            AppError::UniqueConstraintViolation(detail) => {
                (store.format(lang, "unique_violation", &[("detail", detail.as_str())]), None)
            }

            // Todos os outros erros viram 500. O `tracing` loga a mensagem detalhada.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (store.get(lang, "internal_error"), None)
            }
        };

        ApiError { status, error, details }
    }
}

// O formato de erro que sai pela API
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn en() -> Locale {
        Locale("en".into())
    }

    #[test]
    fn forbidden_carries_required_permission() {
        let store = I18nStore::load().unwrap();
        let api = AppError::MissingPermission(Permission::ProjectsApprove).to_api_error(&en(), &store);
        assert_eq!(api.status, StatusCode::FORBIDDEN);
        assert!(api.error.contains("projects.approve"));
    }

    #[test]
    fn forbidden_carries_required_roles() {
        let store = I18nStore::load().unwrap();
        let api = AppError::MissingRole("manager,admin".into()).to_api_error(&en(), &store);
        assert_eq!(api.status, StatusCode::FORBIDDEN);
        assert!(api.error.contains("manager,admin"));
    }

    #[test]
    fn invalid_transition_is_a_conflict_with_description() {
        let store = I18nStore::load().unwrap();
        let err: AppError = ProjectStatus::Pending.apply(ProjectAction::Approve).unwrap_err().into();
        let api = err.to_api_error(&en(), &store);
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.error, "Cannot approve a project in status 'pending'.");
    }

    #[test]
    fn not_found_is_localized() {
        let store = I18nStore::load().unwrap();
        let api = AppError::NotFound("project").to_api_error(&Locale("pt".into()), &store);
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.error, "Projeto não encontrado.");
    }

    #[derive(Validate)]
    struct Sample {
        #[validate(email(message = "invalid_email"))]
        email: String,
    }

    #[test]
    fn validation_errors_list_fields() {
        let store = I18nStore::load().unwrap();
        let errors = Sample { email: "nope".into() }.validate().unwrap_err();
        let api = AppError::ValidationError(errors).to_api_error(&en(), &store);
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.details.unwrap()["email"][0], "Invalid e-mail.");
    }
}
