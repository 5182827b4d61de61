// src/services/ticket_service.rs

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{codes::CodeScope, error::AppError, pagination::PageRequest},
    db::{ticket_repo::NewTicket, CustomerRepository, SequenceRepository, TicketRepository, UserRepository},
    models::ticket::{
        CreateTicketPayload, SupportTicket, TicketCategory, TicketDetail, TicketFilter, TicketPriority, TicketStatus,
    },
};

#[derive(Clone)]
pub struct TicketService {
    pool: PgPool,
    ticket_repo: TicketRepository,
    customer_repo: CustomerRepository,
    user_repo: UserRepository,
    sequence_repo: SequenceRepository,
}

impl TicketService {
    pub fn new(
        pool: PgPool,
        ticket_repo: TicketRepository,
        customer_repo: CustomerRepository,
        user_repo: UserRepository,
        sequence_repo: SequenceRepository,
    ) -> Self {
        Self { pool, ticket_repo, customer_repo, user_repo, sequence_repo }
    }

    /// Abre um chamado para o cliente. O serviço citado precisa ser dele.
    pub async fn open_ticket(&self, customer_id: Uuid, payload: &CreateTicketPayload) -> Result<SupportTicket, AppError> {
        if self.customer_repo.find_by_id(customer_id).await?.is_none() {
            return Err(AppError::NotFound("customer"));
        }

        if let Some(service_id) = payload.customer_service_id {
            match self.customer_repo.find_service(service_id).await? {
                Some(service) if service.customer_id == customer_id => {}
                _ => return Err(AppError::NotFound("service")),
            }
        }

        let mut tx = self.pool.begin().await?;

        let ticket_number = self
            .sequence_repo
            .next_code(&mut *tx, CodeScope::Ticket, Utc::now().date_naive())
            .await?;

        let ticket = self
            .ticket_repo
            .create_ticket(
                &mut *tx,
                NewTicket {
                    ticket_number: &ticket_number,
                    customer_id,
                    customer_service_id: payload.customer_service_id,
                    subject: payload.subject.trim(),
                    description: payload.description.trim(),
                    priority: payload.priority.unwrap_or(TicketPriority::Medium),
                    category: payload.category.unwrap_or(TicketCategory::General),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!("🎫 Chamado {} aberto", ticket.ticket_number);
        Ok(ticket)
    }

    pub async fn get_ticket(&self, id: Uuid) -> Result<TicketDetail, AppError> {
        self.ticket_repo
            .find_detail(id)
            .await?
            .ok_or(AppError::NotFound("ticket"))
    }

    /// Igual a `get_ticket`, mas chamado de outro cliente conta como inexistente.
    pub async fn get_customer_ticket(&self, customer_id: Uuid, id: Uuid) -> Result<TicketDetail, AppError> {
        match self.ticket_repo.find_detail(id).await? {
            Some(detail) if detail.ticket.customer_id == customer_id => Ok(detail),
            _ => Err(AppError::NotFound("ticket")),
        }
    }

    pub async fn assign_ticket(&self, id: Uuid, user_id: Uuid) -> Result<SupportTicket, AppError> {
        match self.user_repo.find_by_id(user_id).await? {
            Some(user) if user.is_active => {}
            _ => return Err(AppError::NotFound("user")),
        }

        self.ticket_repo
            .assign(id, user_id)
            .await?
            .ok_or(AppError::NotFound("ticket"))
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: TicketStatus,
        priority: Option<TicketPriority>,
    ) -> Result<SupportTicket, AppError> {
        let ticket = self
            .ticket_repo
            .update_status(id, status, priority)
            .await?
            .ok_or(AppError::NotFound("ticket"))?;

        tracing::info!("🎫 Chamado {} agora está {:?}", ticket.ticket_number, ticket.status);
        Ok(ticket)
    }

    pub async fn delete_ticket(&self, id: Uuid) -> Result<(), AppError> {
        if !self.ticket_repo.delete_ticket(id).await? {
            return Err(AppError::NotFound("ticket"));
        }
        Ok(())
    }

    pub async fn list_tickets(
        &self,
        filter: &TicketFilter,
        page: PageRequest,
    ) -> Result<(Vec<TicketDetail>, i64), AppError> {
        self.ticket_repo.list_tickets(filter, page).await
    }
}
