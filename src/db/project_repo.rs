// src/db/project_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{like_pattern, PageRequest},
    },
    models::project::{
        CreateProjectPayload, Project, ProjectDetail, ProjectFilter, ProjectStatus, UpdateProjectPayload,
    },
};

// Projeto + nomes das relações, para não fazer N consultas no handler
const SELECT_DETAIL: &str = r#"
    SELECT p.*,
           l.name  AS lead_name,
           pr.name AS product_name,
           cu.name AS creator_name,
           m.name  AS manager_name,
           a.name  AS approver_name
    FROM projects p
    JOIN leads l ON l.id = p.lead_id
    JOIN products pr ON pr.id = p.product_id
    LEFT JOIN users cu ON cu.id = p.created_by
    LEFT JOIN users m ON m.id = p.manager_id
    LEFT JOIN users a ON a.id = p.approved_by
    WHERE 1=1
"#;

#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_project(
        &self,
        payload: &CreateProjectPayload,
        created_by: Uuid,
    ) -> Result<Project, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (title, description, lead_id, product_id, manager_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.lead_id)
        .bind(payload.product_id)
        .bind(payload.manager_id)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(project)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(project)
    }

    pub async fn find_detail(&self, id: Uuid) -> Result<Option<ProjectDetail>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new(SELECT_DETAIL);
        query.push(" AND p.id = ").push_bind(id);

        let project = query
            .build_query_as::<ProjectDetail>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(project)
    }

    // Edição só enquanto o projeto ainda não foi submetido (checado no WHERE)
    pub async fn update_project(
        &self,
        id: Uuid,
        payload: &UpdateProjectPayload,
    ) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                product_id = COALESCE($4, product_id),
                manager_id = COALESCE($5, manager_id),
                updated_at = NOW()
            WHERE id = $1 AND status IN ('pending', 'in_progress')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.product_id)
        .bind(payload.manager_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    /// Grava a transição apenas se o status no banco ainda for `from`.
    /// `None` significa que outra requisição mudou o projeto antes.
    pub async fn save_transition(
        &self,
        from: ProjectStatus,
        project: &Project,
    ) -> Result<Option<Project>, AppError> {
        let saved = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects SET
                status = $3,
                submitted_by = $4,
                submitted_at = $5,
                approved_by = $6,
                approved_at = $7,
                rejection_reason = $8,
                completed_at = $9,
                updated_at = $10
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(project.id)
        .bind(from)
        .bind(project.status)
        .bind(project.submitted_by)
        .bind(project.submitted_at)
        .bind(project.approved_by)
        .bind(project.approved_at)
        .bind(&project.rejection_reason)
        .bind(project.completed_at)
        .bind(project.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(saved)
    }

    pub async fn delete_project(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_projects(
        &self,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> Result<(Vec<ProjectDetail>, i64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM projects p WHERE 1=1");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(SELECT_DETAIL);
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY p.updated_at DESC LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let projects = query
            .build_query_as::<ProjectDetail>()
            .fetch_all(&self.pool)
            .await?;

        Ok((projects, total))
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProjectFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND p.status = ").push_bind(status);
    }
    if let Some(lead_id) = filter.lead_id {
        qb.push(" AND p.lead_id = ").push_bind(lead_id);
    }
    if let Some(user_id) = filter.created_by {
        qb.push(" AND p.created_by = ").push_bind(user_id);
    }
    if let Some(user_id) = filter.manager_id {
        qb.push(" AND p.manager_id = ").push_bind(user_id);
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        qb.push(" AND p.title ILIKE ").push_bind(like_pattern(search));
    }
}
