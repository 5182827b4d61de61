// src/services/lead_service.rs

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{codes::CodeScope, error::AppError, pagination::PageRequest},
    db::{customer_repo::NewCustomer, CustomerRepository, LeadRepository, SequenceRepository, UserRepository},
    models::{
        customer::Customer,
        lead::{CreateLeadPayload, Lead, LeadFilter, LeadStatus, LeadWithAssignee, UpdateLeadPayload},
    },
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct LeadService {
    pool: PgPool,
    lead_repo: LeadRepository,
    user_repo: UserRepository,
    customer_repo: CustomerRepository,
    sequence_repo: SequenceRepository,
}

impl LeadService {
    pub fn new(
        pool: PgPool,
        lead_repo: LeadRepository,
        user_repo: UserRepository,
        customer_repo: CustomerRepository,
        sequence_repo: SequenceRepository,
    ) -> Self {
        Self { pool, lead_repo, user_repo, customer_repo, sequence_repo }
    }

    pub async fn create_lead(&self, payload: &CreateLeadPayload, created_by: Uuid) -> Result<Lead, AppError> {
        if let Some(user_id) = payload.assigned_to {
            self.ensure_active_user(user_id).await?;
        }
        self.lead_repo.create_lead(payload, created_by).await
    }

    pub async fn get_lead(&self, id: Uuid) -> Result<LeadWithAssignee, AppError> {
        self.lead_repo
            .find_with_assignee(id)
            .await?
            .ok_or(AppError::NotFound("lead"))
    }

    pub async fn update_lead(&self, id: Uuid, payload: &UpdateLeadPayload) -> Result<Lead, AppError> {
        self.lead_repo
            .update_lead(id, payload)
            .await?
            .ok_or(AppError::NotFound("lead"))
    }

    pub async fn assign_lead(&self, id: Uuid, user_id: Uuid) -> Result<Lead, AppError> {
        self.ensure_active_user(user_id).await?;
        self.lead_repo
            .assign(id, user_id)
            .await?
            .ok_or(AppError::NotFound("lead"))
    }

    pub async fn delete_lead(&self, id: Uuid) -> Result<(), AppError> {
        if !self.lead_repo.delete_lead(id).await? {
            return Err(AppError::NotFound("lead"));
        }
        Ok(())
    }

    pub async fn list_leads(
        &self,
        filter: &LeadFilter,
        page: PageRequest,
    ) -> Result<(Vec<LeadWithAssignee>, i64), AppError> {
        self.lead_repo.list_leads(filter, page).await
    }

    /// Converte um lead fechado (closed_won) em cliente, com código gerado.
    /// Um lead gera no máximo um cliente.
    pub async fn convert_lead(&self, id: Uuid, portal_password: Option<&str>) -> Result<Customer, AppError> {
        // Hash antes da transação para não segurar a conexão durante o bcrypt
        let portal_password_hash = match portal_password {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;

        let lead = self
            .lead_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("lead"))?;

        if lead.status != LeadStatus::ClosedWon {
            return Err(AppError::LeadNotConvertible);
        }

        if self.customer_repo.find_by_lead(&mut *tx, lead.id).await?.is_some() {
            return Err(AppError::LeadAlreadyConverted);
        }

        let today = Utc::now().date_naive();
        let customer_code = self
            .sequence_repo
            .next_code(&mut *tx, CodeScope::Customer, today)
            .await?;

        // A UNIQUE em customers.lead_id segura duas conversões simultâneas
        let customer = self
            .customer_repo
            .create_customer(
                &mut *tx,
                NewCustomer {
                    customer_code: &customer_code,
                    lead_id: Some(lead.id),
                    name: &lead.name,
                    company: lead.company.as_deref(),
                    email: lead.email.as_deref(),
                    phone: lead.phone.as_deref(),
                    address: lead.address.as_deref(),
                    portal_password_hash: portal_password_hash.as_deref(),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!("🤝 Lead {} convertido no cliente {}", lead.id, customer.customer_code);
        Ok(customer)
    }

    async fn ensure_active_user(&self, user_id: Uuid) -> Result<(), AppError> {
        match self.user_repo.find_by_id(user_id).await? {
            Some(user) if user.is_active => Ok(()),
            _ => Err(AppError::NotFound("user")),
        }
    }
}
