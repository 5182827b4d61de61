// src/models/project.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::rbac::Role;

// --- ESTADOS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Pending,
    InProgress,
    WaitingApproval,
    Approved,
    Rejected,
    Completed,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 6] = [
        ProjectStatus::Pending,
        ProjectStatus::InProgress,
        ProjectStatus::WaitingApproval,
        ProjectStatus::Approved,
        ProjectStatus::Rejected,
        ProjectStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Pending => "pending",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::WaitingApproval => "waiting_approval",
            ProjectStatus::Approved => "approved",
            ProjectStatus::Rejected => "rejected",
            ProjectStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ProjectStatus::Rejected | ProjectStatus::Completed)
    }

    /// Título, descrição e vínculos só podem ser editados antes da submissão.
    pub fn is_editable(self) -> bool {
        matches!(self, ProjectStatus::Pending | ProjectStatus::InProgress)
    }

    /// Aplica uma ação ao estado atual. Pares não previstos na tabela falham sem mudar nada.
    pub fn apply(self, action: ProjectAction) -> Result<ProjectStatus, InvalidTransition> {
        use ProjectAction as A;
        use ProjectStatus as S;

        match (self, action) {
            (S::Pending, A::Start) => Ok(S::InProgress),
            (S::Pending | S::InProgress, A::Submit) => Ok(S::WaitingApproval),
            (S::WaitingApproval, A::Approve) => Ok(S::Approved),
            (S::WaitingApproval, A::Reject) => Ok(S::Rejected),
            (S::Approved, A::Complete) => Ok(S::Completed),
            (from, action) => Err(InvalidTransition { from, action }),
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- AÇÕES ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAction {
    Start,
    Submit,
    Approve,
    Reject,
    Complete,
}

impl ProjectAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectAction::Start => "start",
            ProjectAction::Submit => "submit",
            ProjectAction::Approve => "approve",
            ProjectAction::Reject => "reject",
            ProjectAction::Complete => "complete",
        }
    }

    /// Papel mínimo (pela hierarquia) para executar a ação.
    pub fn required_role(self) -> Role {
        match self {
            ProjectAction::Approve | ProjectAction::Reject => Role::Manager,
            ProjectAction::Start | ProjectAction::Submit | ProjectAction::Complete => Role::Sales,
        }
    }
}

impl fmt::Display for ProjectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: ProjectStatus,
    pub action: ProjectAction,
}

// --- ENTIDADE ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    #[schema(example = "Link dedicado 500 Mega - Padaria Central")]
    pub title: String,
    pub description: Option<String>,
    pub lead_id: Uuid,
    pub product_id: Uuid,
    pub status: ProjectStatus,
    pub created_by: Uuid,
    pub manager_id: Option<Uuid>,
    pub submitted_by: Option<Uuid>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// O registro depois da ação, carimbando quem agiu e quando.
    pub fn transitioned(
        &self,
        action: ProjectAction,
        actor: Uuid,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Project, InvalidTransition> {
        let mut next = self.clone();
        next.status = self.status.apply(action)?;

        match action {
            ProjectAction::Start => {}
            ProjectAction::Submit => {
                next.submitted_by = Some(actor);
                next.submitted_at = Some(now);
            }
            ProjectAction::Approve => {
                next.approved_by = Some(actor);
                next.approved_at = Some(now);
            }
            ProjectAction::Reject => {
                next.rejection_reason = reason.filter(|r| !r.trim().is_empty());
            }
            ProjectAction::Complete => {
                next.completed_at = Some(now);
            }
        }

        next.updated_at = now;
        Ok(next)
    }

    /// Quem recebe o retorno da aprovação: quem submeteu, ou o criador.
    pub fn submitter(&self) -> Uuid {
        self.submitted_by.unwrap_or(self.created_by)
    }
}

// Projeto com as relações já carregadas (nomes do lead, produto e pessoas)
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub project: Project,
    pub lead_name: String,
    pub product_name: String,
    pub creator_name: Option<String>,
    pub manager_name: Option<String>,
    pub approver_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectPayload {
    #[validate(length(min = 3, message = "required"))]
    pub title: String,
    pub description: Option<String>,
    pub lead_id: Uuid,
    pub product_id: Uuid,
    pub manager_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectPayload {
    #[validate(length(min = 3, message = "required"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub product_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectProjectPayload {
    #[validate(length(max = 1000, message = "too_long"))]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub lead_id: Option<Uuid>,
    /// Projetos criados por este usuário
    pub created_by: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    /// Busca no título
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIONS: [ProjectAction; 5] = [
        ProjectAction::Start,
        ProjectAction::Submit,
        ProjectAction::Approve,
        ProjectAction::Reject,
        ProjectAction::Complete,
    ];

    #[test]
    fn happy_path_reaches_completed() {
        let status = ProjectStatus::Pending
            .apply(ProjectAction::Start)
            .and_then(|s| s.apply(ProjectAction::Submit))
            .and_then(|s| s.apply(ProjectAction::Approve))
            .and_then(|s| s.apply(ProjectAction::Complete));
        assert_eq!(status, Ok(ProjectStatus::Completed));
    }

    #[test]
    fn submit_is_allowed_straight_from_pending() {
        assert_eq!(
            ProjectStatus::Pending.apply(ProjectAction::Submit),
            Ok(ProjectStatus::WaitingApproval)
        );
    }

    #[test]
    fn approve_and_reject_only_from_waiting_approval() {
        for from in ProjectStatus::ALL {
            for action in [ProjectAction::Approve, ProjectAction::Reject] {
                let result = from.apply(action);
                if from == ProjectStatus::WaitingApproval {
                    assert!(result.is_ok());
                } else {
                    assert_eq!(result, Err(InvalidTransition { from, action }));
                }
            }
        }
    }

    #[test]
    fn only_waiting_approval_leads_to_approved_or_rejected() {
        for from in ProjectStatus::ALL {
            for action in ACTIONS {
                if let Ok(to) = from.apply(action) {
                    if matches!(to, ProjectStatus::Approved | ProjectStatus::Rejected) {
                        assert_eq!(from, ProjectStatus::WaitingApproval);
                    }
                }
            }
        }
    }

    #[test]
    fn terminal_states_have_no_exit() {
        for from in [ProjectStatus::Rejected, ProjectStatus::Completed] {
            assert!(from.is_terminal());
            for action in ACTIONS {
                assert!(from.apply(action).is_err(), "{} saiu via {}", from, action);
            }
        }
    }

    #[test]
    fn complete_requires_approval() {
        assert!(ProjectStatus::WaitingApproval.apply(ProjectAction::Complete).is_err());
        assert!(ProjectStatus::InProgress.apply(ProjectAction::Complete).is_err());
    }

    #[test]
    fn resubmission_is_not_a_transition() {
        assert!(ProjectStatus::WaitingApproval.apply(ProjectAction::Submit).is_err());
        assert!(ProjectStatus::Rejected.apply(ProjectAction::Submit).is_err());
    }

    fn project(status: ProjectStatus) -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            title: "Link dedicado".into(),
            description: None,
            lead_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            status,
            created_by: Uuid::new_v4(),
            manager_id: None,
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

    #[test]
    fn approve_stamps_approver_and_time() {
        let manager = Uuid::new_v4();
        let now = Utc::now();
        let approved = project(ProjectStatus::WaitingApproval)
            .transitioned(ProjectAction::Approve, manager, None, now)
            .unwrap();
        assert_eq!(approved.status, ProjectStatus::Approved);
        assert_eq!(approved.approved_by, Some(manager));
        assert_eq!(approved.approved_at, Some(now));
    }

    #[test]
    fn reject_keeps_reason_and_submitter() {
        let seller = Uuid::new_v4();
        let submitted = project(ProjectStatus::InProgress)
            .transitioned(ProjectAction::Submit, seller, None, Utc::now())
            .unwrap();
        assert_eq!(submitted.submitter(), seller);

        let rejected = submitted
            .transitioned(ProjectAction::Reject, Uuid::new_v4(), Some("Sem viabilidade".into()), Utc::now())
            .unwrap();
        assert_eq!(rejected.status, ProjectStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Sem viabilidade"));
        assert_eq!(rejected.approved_by, None);
        assert_eq!(rejected.submitter(), seller);
    }

    #[test]
    fn failed_transition_leaves_record_untouched() {
        let original = project(ProjectStatus::Pending);
        let err = original
            .transitioned(ProjectAction::Approve, Uuid::new_v4(), None, Utc::now())
            .unwrap_err();
        assert_eq!(err.from, ProjectStatus::Pending);
        assert_eq!(original.status, ProjectStatus::Pending);
        assert!(original.approved_by.is_none());
    }

    #[test]
    fn required_roles() {
        assert_eq!(ProjectAction::Approve.required_role(), Role::Manager);
        assert_eq!(ProjectAction::Reject.required_role(), Role::Manager);
        assert_eq!(ProjectAction::Submit.required_role(), Role::Sales);
        assert_eq!(ProjectAction::Complete.required_role(), Role::Sales);
        assert!(!Role::Sales.has_role_access(ProjectAction::Approve.required_role()));
        assert!(!Role::Support.has_role_access(ProjectAction::Submit.required_role()));
    }
}
