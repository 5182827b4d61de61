// src/common/pagination.rs

use serde::Serialize;
use utoipa::ToSchema;

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;
// Acima disso o OFFSET estouraria i64
pub const MAX_PAGE: i64 = i64::MAX / MAX_PER_PAGE;

// Página e tamanho já normalizados a partir da query string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, page: PageRequest, total: i64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + page.per_page - 1) / page.per_page };
        Self {
            data,
            page: page.page,
            per_page: page.per_page,
            total,
            total_pages,
        }
    }
}

/// Envolve o termo de busca para ILIKE, escapando os curingas do usuário.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_clamps_values() {
        assert_eq!(PageRequest::new(None, None), PageRequest { page: 1, per_page: 20 });
        assert_eq!(PageRequest::new(Some(0), Some(1000)), PageRequest { page: 1, per_page: 100 });
        assert_eq!(PageRequest::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn huge_page_number_does_not_overflow_the_offset() {
        let page = PageRequest::new(Some(i64::MAX), Some(MAX_PER_PAGE));
        assert_eq!(page.page, MAX_PAGE);
        assert!(page.offset() > 0);

        let negative = PageRequest::new(Some(i64::MIN), Some(i64::MAX));
        assert_eq!(negative, PageRequest { page: 1, per_page: MAX_PER_PAGE });
        assert_eq!(negative.offset(), 0);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = PageRequest::new(Some(1), Some(10));
        assert_eq!(Paginated::<u8>::new(vec![], page, 0).total_pages, 0);
        assert_eq!(Paginated::<u8>::new(vec![], page, 10).total_pages, 1);
        assert_eq!(Paginated::<u8>::new(vec![], page, 11).total_pages, 2);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" fibra "), "%fibra%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
    }
}
