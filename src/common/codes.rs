// src/common/codes.rs

use chrono::NaiveDate;

// Os códigos gerados têm um prefixo de data e um sequencial zero-padded.
// O sequencial vem do contador atômico em `code_sequences` (ver SequenceRepository).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeScope {
    Customer,
    Service,
    Ticket,
}

impl CodeScope {
    pub fn as_str(self) -> &'static str {
        match self {
            CodeScope::Customer => "customer",
            CodeScope::Service => "service",
            CodeScope::Ticket => "ticket",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            CodeScope::Customer => "CUST",
            CodeScope::Service => "SVC",
            CodeScope::Ticket => "TKT",
        }
    }

    fn width(self) -> usize {
        match self {
            CodeScope::Customer => 3,
            CodeScope::Service | CodeScope::Ticket => 4,
        }
    }

    /// Período ao qual o contador pertence: dia para clientes e chamados, mês para serviços.
    pub fn period(self, date: NaiveDate) -> String {
        match self {
            CodeScope::Customer | CodeScope::Ticket => date.format("%Y%m%d").to_string(),
            CodeScope::Service => date.format("%Y%m").to_string(),
        }
    }

    /// Monta o código com o número preenchido com zeros até `width()`.
    ///
    /// Acima da largura o número só cresce (`CUST-20261016-1000`) e continua único,
    /// mas deixa de ordenar como texto depois de `-999`. Para ordem de emissão use
    /// `created_at` (as listagens já fazem isso), nunca o próprio código.
    pub fn format(self, date: NaiveDate, sequence: i64) -> String {
        format!(
            "{}-{}-{:0width$}",
            self.prefix(),
            self.period(date),
            sequence,
            width = self.width()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn customer_codes_are_padded_to_three_digits() {
        assert_eq!(CodeScope::Customer.format(day(2026, 10, 16), 1), "CUST-20261016-001");
        assert_eq!(CodeScope::Customer.format(day(2026, 10, 16), 42), "CUST-20261016-042");
    }

    #[test]
    fn service_numbers_are_monthly_with_four_digits() {
        assert_eq!(CodeScope::Service.format(day(2026, 10, 1), 7), "SVC-202610-0007");
        assert_eq!(
            CodeScope::Service.period(day(2026, 10, 1)),
            CodeScope::Service.period(day(2026, 10, 31))
        );
    }

    #[test]
    fn ticket_numbers_are_daily() {
        assert_eq!(CodeScope::Ticket.format(day(2026, 1, 2), 12), "TKT-20260102-0012");
    }

    #[test]
    fn same_day_codes_are_strictly_increasing() {
        let date = day(2026, 10, 16);
        let codes: Vec<String> = (1..=120).map(|n| CodeScope::Customer.format(date, n)).collect();
        for pair in codes.windows(2) {
            assert!(pair[0] < pair[1], "{} >= {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn sequence_overflow_widens_instead_of_colliding() {
        let date = day(2026, 10, 16);
        assert_eq!(CodeScope::Customer.format(date, 1000), "CUST-20261016-1000");

        // Único, mas a ordem textual quebra depois da largura
        let (last_padded, widened) = (CodeScope::Customer.format(date, 999), CodeScope::Customer.format(date, 1000));
        assert_ne!(last_padded, widened);
        assert!(widened < last_padded);
    }
}
