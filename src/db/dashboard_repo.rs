// src/db/dashboard_repo.rs

use sqlx::{Acquire, Executor, Postgres};

use crate::{
    common::error::AppError,
    models::dashboard::{monthly_recurring_revenue, CycleRevenue, DashboardSummary, LeadStatusCount},
};

// Só agrega leituras de outras tabelas; recebe a conexão de quem chama
#[derive(Clone, Default)]
pub struct DashboardRepository;

impl DashboardRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn get_summary<'e, E>(&self, executor: E) -> Result<DashboardSummary, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        // Transação só para ler um snapshot consistente dos números
        let mut tx = executor.begin().await?;

        // A. Funil de leads
        let leads_by_status = sqlx::query_as::<_, LeadStatusCount>(
            r#"
            SELECT status, COUNT(*) AS total
            FROM leads
            GROUP BY status
            ORDER BY status
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        // B. Projetos parados esperando um gerente
        let projects_waiting_approval: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM projects WHERE status = 'waiting_approval'",
        )
        .fetch_one(&mut *tx)
        .await?;

        // C. Serviços ativos + receita recorrente, agrupados pelo ciclo do produto
        let revenue_by_cycle = sqlx::query_as::<_, CycleRevenue>(
            r#"
            SELECT p.billing_cycle, COUNT(*) AS services, COALESCE(SUM(s.monthly_fee), 0) AS total_fee
            FROM customer_services s
            JOIN products p ON p.id = s.product_id
            WHERE s.status = 'active'
            GROUP BY p.billing_cycle
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let active_services: i64 = revenue_by_cycle.iter().map(|row| row.services).sum();
        let monthly_recurring_revenue = monthly_recurring_revenue(&revenue_by_cycle);

        // D. Chamados em aberto
        let open_tickets: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM support_tickets WHERE status IN ('open', 'in_progress')",
        )
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DashboardSummary {
            leads_by_status,
            projects_waiting_approval,
            active_services,
            open_tickets,
            monthly_recurring_revenue,
        })
    }
}
