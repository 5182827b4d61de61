// src/services/project_service.rs

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    db::{LeadRepository, ProductRepository, ProjectRepository, UserRepository},
    middleware::auth::AuthContext,
    models::{
        auth::User,
        notification::NotificationKind,
        project::{
            CreateProjectPayload, Project, ProjectAction, ProjectDetail, ProjectFilter, UpdateProjectPayload,
        },
        rbac::Role,
    },
    services::notification_service::{project_notification, NotificationDispatcher},
};

/// Quem recebe o aviso de uma transição.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipients {
    User(Uuid),
    AllManagers,
}

/// Tipo de aviso e destinatários de cada ação; `None` quando a ação não avisa ninguém.
pub fn notification_target(action: ProjectAction, project: &Project) -> Option<(NotificationKind, Recipients)> {
    match action {
        ProjectAction::Submit => {
            let recipients = project
                .manager_id
                .map(Recipients::User)
                .unwrap_or(Recipients::AllManagers);
            Some((NotificationKind::ProjectSubmitted, recipients))
        }
        ProjectAction::Approve => Some((NotificationKind::ProjectApproved, Recipients::User(project.submitter()))),
        ProjectAction::Reject => Some((NotificationKind::ProjectRejected, Recipients::User(project.submitter()))),
        ProjectAction::Start | ProjectAction::Complete => None,
    }
}

#[derive(Clone)]
pub struct ProjectService {
    pool: PgPool,
    project_repo: ProjectRepository,
    lead_repo: LeadRepository,
    product_repo: ProductRepository,
    user_repo: UserRepository,
    notifier: NotificationDispatcher,
}

impl ProjectService {
    pub fn new(
        pool: PgPool,
        project_repo: ProjectRepository,
        lead_repo: LeadRepository,
        product_repo: ProductRepository,
        user_repo: UserRepository,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self { pool, project_repo, lead_repo, product_repo, user_repo, notifier }
    }

    pub async fn create_project(&self, payload: &CreateProjectPayload, created_by: Uuid) -> Result<Project, AppError> {
        self.lead_repo
            .find_by_id(&self.pool, payload.lead_id)
            .await?
            .ok_or(AppError::NotFound("lead"))?;

        self.ensure_active_product(payload.product_id).await?;

        if let Some(manager_id) = payload.manager_id {
            self.ensure_manager(manager_id).await?;
        }

        let project = self.project_repo.create_project(payload, created_by).await?;
        tracing::info!("📁 Projeto '{}' criado", project.title);
        Ok(project)
    }

    pub async fn get_project(&self, id: Uuid) -> Result<ProjectDetail, AppError> {
        self.project_repo
            .find_detail(id)
            .await?
            .ok_or(AppError::NotFound("project"))
    }

    pub async fn update_project(&self, id: Uuid, payload: &UpdateProjectPayload) -> Result<Project, AppError> {
        let current = self
            .project_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("project"))?;

        if !current.status.is_editable() {
            return Err(AppError::ProjectNotEditable);
        }
        if let Some(product_id) = payload.product_id {
            self.ensure_active_product(product_id).await?;
        }
        if let Some(manager_id) = payload.manager_id {
            self.ensure_manager(manager_id).await?;
        }

        // O WHERE do UPDATE repete a checagem de status
        self.project_repo
            .update_project(id, payload)
            .await?
            .ok_or(AppError::ProjectNotEditable)
    }

    pub async fn delete_project(&self, id: Uuid) -> Result<(), AppError> {
        if !self.project_repo.delete_project(id).await? {
            return Err(AppError::NotFound("project"));
        }
        Ok(())
    }

    pub async fn list_projects(
        &self,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> Result<(Vec<ProjectDetail>, i64), AppError> {
        self.project_repo.list_projects(filter, page).await
    }

    /// Aplica uma ação do fluxo de aprovação e avisa a outra parte.
    pub async fn transition(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        action: ProjectAction,
        reason: Option<String>,
    ) -> Result<Project, AppError> {
        let required = action.required_role();
        if !ctx.role.has_role_access(required) {
            return Err(AppError::MissingRole(required.as_str().to_string()));
        }

        let current = self
            .project_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("project"))?;

        let next = current.transitioned(action, ctx.user_id, reason, Utc::now())?;

        let saved = match self.project_repo.save_transition(current.status, &next).await? {
            Some(saved) => saved,
            // Outra requisição mexeu no status entre a leitura e a escrita
            None => {
                let latest = self
                    .project_repo
                    .find_by_id(id)
                    .await?
                    .ok_or(AppError::NotFound("project"))?;
                return Err(AppError::InvalidTransition { action, from: latest.status });
            }
        };

        tracing::info!(
            "🔀 Projeto {}: {} -> {} ({} por {})",
            saved.id,
            current.status,
            saved.status,
            action,
            ctx.email
        );

        self.notify(action, &saved, &ctx.name).await;
        Ok(saved)
    }

    // Falha ao achar destinatários só vira log: a transição já foi gravada
    async fn notify(&self, action: ProjectAction, project: &Project, actor_name: &str) {
        let Some((kind, recipients)) = notification_target(action, project) else {
            return;
        };

        let users = match self.resolve_recipients(recipients).await {
            Ok(users) => users,
            Err(e) => {
                tracing::error!("🔥 Não foi possível carregar destinatários do projeto {}: {}", project.id, e);
                return;
            }
        };

        if users.is_empty() {
            tracing::warn!("⚠️ Nenhum destinatário ativo para {:?} do projeto {}", kind, project.id);
        }

        for user in &users {
            self.notifier
                .dispatch(project_notification(kind, project, user, actor_name));
        }
    }

    async fn resolve_recipients(&self, recipients: Recipients) -> Result<Vec<User>, AppError> {
        match recipients {
            Recipients::User(id) => Ok(self
                .user_repo
                .find_by_id(id)
                .await?
                .filter(|u| u.is_active)
                .into_iter()
                .collect()),
            Recipients::AllManagers => self.user_repo.list_active_by_role(Role::Manager).await,
        }
    }

    async fn ensure_active_product(&self, product_id: Uuid) -> Result<(), AppError> {
        let product = self
            .product_repo
            .find_by_id(&self.pool, product_id)
            .await?
            .ok_or(AppError::NotFound("product"))?;

        if !product.is_active {
            return Err(AppError::ProductInactive);
        }
        Ok(())
    }

    async fn ensure_manager(&self, user_id: Uuid) -> Result<(), AppError> {
        match self.user_repo.find_by_id(user_id).await? {
            Some(user) if user.is_active && user.role.has_role_access(Role::Manager) => Ok(()),
            Some(_) => Err(AppError::MissingRole(Role::Manager.as_str().to_string())),
            None => Err(AppError::NotFound("user")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::ProjectStatus;
    use tokio::sync::mpsc;

    fn project(created_by: Uuid, manager_id: Option<Uuid>) -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            title: "Link dedicado 500M".into(),
            description: None,
            lead_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            status: ProjectStatus::Pending,
            created_by,
            manager_id,
            submitted_by: None,
            submitted_at: None,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn user(id: Uuid, role: Role, email: &str) -> User {
        let now = Utc::now();
        User {
            id,
            name: email.split('@').next().unwrap_or_default().into(),
            email: email.into(),
            password_hash: String::new(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn submit_targets_assigned_manager_or_every_manager() {
        let manager = Uuid::new_v4();
        let assigned = project(Uuid::new_v4(), Some(manager));
        assert_eq!(
            notification_target(ProjectAction::Submit, &assigned),
            Some((NotificationKind::ProjectSubmitted, Recipients::User(manager)))
        );

        let unassigned = project(Uuid::new_v4(), None);
        assert_eq!(
            notification_target(ProjectAction::Submit, &unassigned),
            Some((NotificationKind::ProjectSubmitted, Recipients::AllManagers))
        );
    }

    #[test]
    fn start_and_complete_notify_nobody() {
        let p = project(Uuid::new_v4(), None);
        assert_eq!(notification_target(ProjectAction::Start, &p), None);
        assert_eq!(notification_target(ProjectAction::Complete, &p), None);
    }

    #[tokio::test]
    async fn submit_then_approve_notifies_each_counterpart() {
        let sales = user(Uuid::new_v4(), Role::Sales, "vendas@provedor.net");
        let manager = user(Uuid::new_v4(), Role::Manager, "gerente@provedor.net");
        let directory = [sales.clone(), manager.clone()];
        let lookup = |id: Uuid| directory.iter().find(|u| u.id == id).cloned().unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let notifier = NotificationDispatcher::from_sender(tx);

        // Vendedor submete
        let pending = project(sales.id, Some(manager.id));
        let submitted = pending
            .transitioned(ProjectAction::Submit, sales.id, None, Utc::now())
            .unwrap();
        assert_eq!(submitted.status, ProjectStatus::WaitingApproval);

        let (kind, recipients) = notification_target(ProjectAction::Submit, &submitted).unwrap();
        let Recipients::User(to) = recipients else { panic!("esperava um gerente") };
        assert!(notifier.dispatch(project_notification(kind, &submitted, &lookup(to), &sales.name)));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.recipient_id, manager.id);
        assert_eq!(first.kind, NotificationKind::ProjectSubmitted);

        // Gerente aprova
        let approved = submitted
            .transitioned(ProjectAction::Approve, manager.id, None, Utc::now())
            .unwrap();
        assert_eq!(approved.status, ProjectStatus::Approved);
        assert_eq!(approved.approved_by, Some(manager.id));
        assert!(approved.approved_at.is_some());

        let (kind, recipients) = notification_target(ProjectAction::Approve, &approved).unwrap();
        let Recipients::User(to) = recipients else { panic!("esperava o vendedor") };
        assert!(notifier.dispatch(project_notification(kind, &approved, &lookup(to), &manager.name)));

        let second = rx.recv().await.unwrap();
        assert_eq!(second.recipient_id, sales.id);
        assert_eq!(second.recipient_email, "vendas@provedor.net");
        assert_eq!(second.kind, NotificationKind::ProjectApproved);
        assert_eq!(second.data["status"], "approved");
    }

    #[test]
    fn rejection_message_carries_the_reason() {
        let sales = user(Uuid::new_v4(), Role::Sales, "vendas@provedor.net");
        let manager = Uuid::new_v4();
        let rejected = project(sales.id, Some(manager))
            .transitioned(ProjectAction::Submit, sales.id, None, Utc::now())
            .and_then(|p| p.transitioned(ProjectAction::Reject, manager, Some("Sem viabilidade".into()), Utc::now()))
            .unwrap();

        let (kind, recipients) = notification_target(ProjectAction::Reject, &rejected).unwrap();
        assert_eq!(recipients, Recipients::User(sales.id));

        let msg = project_notification(kind, &rejected, &sales, "Gerente");
        assert!(msg.body.ends_with("Motivo: Sem viabilidade"));
    }
}
