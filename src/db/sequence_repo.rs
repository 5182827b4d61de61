// src/db/sequence_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Postgres};

use crate::common::{codes::CodeScope, error::AppError};

// Contador atômico por (escopo, período). O upsert trava a linha do contador,
// então duas criações simultâneas nunca recebem o mesmo número.
#[derive(Clone, Default)]
pub struct SequenceRepository;

impl SequenceRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn next_value<'e, E>(
        &self,
        executor: E,
        scope: CodeScope,
        period: &str,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let value = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO code_sequences (scope, period, last_value)
            VALUES ($1, $2, 1)
            ON CONFLICT (scope, period)
            DO UPDATE SET last_value = code_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(scope.as_str())
        .bind(period)
        .fetch_one(executor)
        .await?;

        Ok(value)
    }

    /// Gera o próximo código formatado (ex: CUST-20261016-001) para a data.
    pub async fn next_code<'e, E>(
        &self,
        executor: E,
        scope: CodeScope,
        date: NaiveDate,
    ) -> Result<String, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sequence = self.next_value(executor, scope, &scope.period(date)).await?;
        Ok(scope.format(date, sequence))
    }
}
