// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::{lead::LeadStatus, product::BillingCycle};

// Contagem de leads por etapa do funil
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadStatusCount {
    pub status: LeadStatus,
    pub total: i64,
}

// Soma das mensalidades dos serviços ativos de um mesmo ciclo de cobrança
#[derive(Debug, Clone, Copy, FromRow)]
pub struct CycleRevenue {
    pub billing_cycle: BillingCycle,
    pub services: i64,
    pub total_fee: Decimal,
}

/// Receita recorrente mensal: cada ciclo convertido para o equivalente mensal,
/// cobrança avulsa não entra.
pub fn monthly_recurring_revenue(rows: &[CycleRevenue]) -> Decimal {
    rows.iter()
        .map(|row| row.billing_cycle.monthly_equivalent(row.total_fee))
        .sum()
}

// Os cards do topo do painel da equipe
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub leads_by_status: Vec<LeadStatusCount>,
    pub projects_waiting_approval: i64,
    pub active_services: i64,
    pub open_tickets: i64,
    pub monthly_recurring_revenue: Decimal, // Equivalente mensal dos serviços ativos
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn row(cycle: BillingCycle, services: i64, total: &str) -> CycleRevenue {
        CycleRevenue { billing_cycle: cycle, services, total_fee: Decimal::from_str(total).unwrap() }
    }

    #[test]
    fn recurring_revenue_normalizes_each_cycle_to_a_month() {
        let rows = vec![
            row(BillingCycle::Monthly, 2, "199.80"),
            row(BillingCycle::Yearly, 1, "1200.00"),
            row(BillingCycle::Quarterly, 1, "300.00"),
            row(BillingCycle::OneTime, 1, "500.00"),
        ];

        assert_eq!(monthly_recurring_revenue(&rows), Decimal::from_str("399.80").unwrap());
    }

    #[test]
    fn yearly_service_counts_as_a_twelfth() {
        let rows = vec![row(BillingCycle::Yearly, 1, "1200.00")];
        assert_eq!(monthly_recurring_revenue(&rows), Decimal::from(100));
    }

    #[test]
    fn one_time_charges_are_not_recurring() {
        let rows = vec![row(BillingCycle::OneTime, 3, "750.00")];
        assert_eq!(monthly_recurring_revenue(&rows), Decimal::ZERO);
        assert_eq!(monthly_recurring_revenue(&[]), Decimal::ZERO);
    }
}
