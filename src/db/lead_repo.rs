// src/db/lead_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{like_pattern, PageRequest},
    },
    models::lead::{CreateLeadPayload, Lead, LeadFilter, LeadWithAssignee, UpdateLeadPayload},
};

const SELECT_WITH_ASSIGNEE: &str = r#"
    SELECT l.*, u.name AS assignee_name, c.id AS customer_id
    FROM leads l
    LEFT JOIN users u ON u.id = l.assigned_to
    LEFT JOIN customers c ON c.lead_id = l.id
    WHERE 1=1
"#;

#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_lead(
        &self,
        payload: &CreateLeadPayload,
        created_by: Uuid,
    ) -> Result<Lead, AppError> {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (name, company, email, phone, address, source, notes, assigned_to, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.company)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.address)
        .bind(&payload.source)
        .bind(&payload.notes)
        .bind(payload.assigned_to)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(lead)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(lead)
    }

    /// Lead com o nome do responsável e o cliente gerado (se já convertido)
    pub async fn find_with_assignee(&self, id: Uuid) -> Result<Option<LeadWithAssignee>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new(SELECT_WITH_ASSIGNEE);
        query.push(" AND l.id = ").push_bind(id);

        let lead = query
            .build_query_as::<LeadWithAssignee>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(lead)
    }

    pub async fn update_lead(
        &self,
        id: Uuid,
        payload: &UpdateLeadPayload,
    ) -> Result<Option<Lead>, AppError> {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads SET
                name = COALESCE($2, name),
                company = COALESCE($3, company),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                address = COALESCE($6, address),
                source = COALESCE($7, source),
                notes = COALESCE($8, notes),
                status = COALESCE($9, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&payload.name)
        .bind(&payload.company)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.address)
        .bind(&payload.source)
        .bind(&payload.notes)
        .bind(payload.status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lead)
    }

    pub async fn assign(&self, id: Uuid, user_id: Uuid) -> Result<Option<Lead>, AppError> {
        let lead = sqlx::query_as::<_, Lead>(
            "UPDATE leads SET assigned_to = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lead)
    }

    pub async fn delete_lead(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_constraint(e, "O lead possui projetos ou cliente vinculados."))?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_leads(
        &self,
        filter: &LeadFilter,
        page: PageRequest,
    ) -> Result<(Vec<LeadWithAssignee>, i64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM leads l WHERE 1=1");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(SELECT_WITH_ASSIGNEE);
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY l.created_at DESC LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let leads = query
            .build_query_as::<LeadWithAssignee>()
            .fetch_all(&self.pool)
            .await?;

        Ok((leads, total))
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &LeadFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND l.status = ").push_bind(status);
    }
    if let Some(user_id) = filter.assigned_to {
        qb.push(" AND l.assigned_to = ").push_bind(user_id);
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (l.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR l.company ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR l.email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
