// src/services/user_service.rs

use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    db::UserRepository,
    models::{
        auth::{CreateUserPayload, UpdateUserPayload, User, UserFilter},
        rbac::Role,
    },
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    pub fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    pub async fn create_user(&self, payload: &CreateUserPayload) -> Result<User, AppError> {
        let hashed_password = hash_password(&payload.password).await?;

        let user = self
            .user_repo
            .create_user(payload.name.trim(), payload.email.trim(), &hashed_password, payload.role)
            .await?;

        tracing::info!("👤 Usuário criado: {} ({})", user.email, user.role);
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, AppError> {
        self.user_repo.find_by_id(id).await?.ok_or(AppError::NotFound("user"))
    }

    pub async fn update_user(&self, id: Uuid, payload: &UpdateUserPayload) -> Result<User, AppError> {
        self.user_repo
            .update_user(
                id,
                payload.name.as_deref().map(str::trim),
                payload.email.as_deref().map(str::trim),
                payload.is_active,
            )
            .await?
            .ok_or(AppError::NotFound("user"))
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<(), AppError> {
        if !self.user_repo.delete_user(id).await? {
            return Err(AppError::NotFound("user"));
        }
        Ok(())
    }

    pub async fn list_users(&self, filter: &UserFilter, page: PageRequest) -> Result<(Vec<User>, i64), AppError> {
        self.user_repo.list_users(filter, page).await
    }

    /// Cria o primeiro administrador quando o banco ainda não tem nenhum.
    pub async fn ensure_bootstrap_admin(&self, email: &str, password: &str) -> Result<(), AppError> {
        if self.user_repo.count_admins().await? > 0 {
            return Ok(());
        }

        let hashed_password = hash_password(password).await?;
        self.user_repo
            .create_user("Administrador", email, &hashed_password, Role::Admin)
            .await?;

        tracing::info!("🛡️ Administrador inicial criado: {}", email);
        Ok(())
    }
}
