// src/db/ticket_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{like_pattern, PageRequest},
    },
    models::ticket::{
        SupportTicket, TicketCategory, TicketDetail, TicketFilter, TicketPriority, TicketStatus,
    },
};

const SELECT_DETAIL: &str = r#"
    SELECT t.*,
           c.name AS customer_name,
           c.customer_code,
           u.name AS assignee_name
    FROM support_tickets t
    JOIN customers c ON c.id = t.customer_id
    LEFT JOIN users u ON u.id = t.assigned_to
    WHERE 1=1
"#;

pub struct NewTicket<'a> {
    pub ticket_number: &'a str,
    pub customer_id: Uuid,
    pub customer_service_id: Option<Uuid>,
    pub subject: &'a str,
    pub description: &'a str,
    pub priority: TicketPriority,
    pub category: TicketCategory,
}

#[derive(Clone)]
pub struct TicketRepository {
    pool: PgPool,
}

impl TicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_ticket<'e, E>(
        &self,
        executor: E,
        new: NewTicket<'_>,
    ) -> Result<SupportTicket, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, SupportTicket>(
            r#"
            INSERT INTO support_tickets (
                ticket_number, customer_id, customer_service_id, subject, description, priority, category
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new.ticket_number)
        .bind(new.customer_id)
        .bind(new.customer_service_id)
        .bind(new.subject)
        .bind(new.description)
        .bind(new.priority)
        .bind(new.category)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_constraint(e, format!("Chamado '{}' já existe.", new.ticket_number)))
    }

    pub async fn find_detail(&self, id: Uuid) -> Result<Option<TicketDetail>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new(SELECT_DETAIL);
        query.push(" AND t.id = ").push_bind(id);

        let ticket = query
            .build_query_as::<TicketDetail>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(ticket)
    }

    pub async fn assign(&self, id: Uuid, user_id: Uuid) -> Result<Option<SupportTicket>, AppError> {
        let ticket = sqlx::query_as::<_, SupportTicket>(
            r#"
            UPDATE support_tickets SET
                assigned_to = $2,
                status = CASE WHEN status = 'open' THEN 'in_progress'::ticket_status ELSE status END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    /// Atualiza status/prioridade. `resolved_at` é carimbado ao resolver e limpo ao reabrir.
    pub async fn update_status(
        &self,
        id: Uuid,
        status: TicketStatus,
        priority: Option<TicketPriority>,
    ) -> Result<Option<SupportTicket>, AppError> {
        let ticket = sqlx::query_as::<_, SupportTicket>(
            r#"
            UPDATE support_tickets SET
                status = $2,
                priority = COALESCE($3, priority),
                resolved_at = CASE
                    WHEN $2 IN ('resolved'::ticket_status, 'closed'::ticket_status)
                        THEN COALESCE(resolved_at, NOW())
                    ELSE NULL
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(priority)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    pub async fn delete_ticket(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM support_tickets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_tickets(
        &self,
        filter: &TicketFilter,
        page: PageRequest,
    ) -> Result<(Vec<TicketDetail>, i64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM support_tickets t WHERE 1=1");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(SELECT_DETAIL);
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY t.created_at DESC LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let tickets = query
            .build_query_as::<TicketDetail>()
            .fetch_all(&self.pool)
            .await?;

        Ok((tickets, total))
    }

    pub async fn count_open_for_customer(&self, customer_id: Uuid) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM support_tickets WHERE customer_id = $1 AND status IN ('open', 'in_progress')",
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &TicketFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND t.status = ").push_bind(status);
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND t.priority = ").push_bind(priority);
    }
    if let Some(category) = filter.category {
        qb.push(" AND t.category = ").push_bind(category);
    }
    if let Some(customer_id) = filter.customer_id {
        qb.push(" AND t.customer_id = ").push_bind(customer_id);
    }
    if let Some(user_id) = filter.assigned_to {
        qb.push(" AND t.assigned_to = ").push_bind(user_id);
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (t.ticket_number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR t.subject ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
