// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::common::i18n::DEFAULT_LANG;

const SUPPORTED: &[&str] = &["en", "pt"];

// Idioma da requisição, usado para traduzir as mensagens de erro
#[derive(Debug, Clone, PartialEq)]
pub struct Locale(pub String);

impl Locale {
    /// Primeiro idioma suportado do Accept-Language ("pt-BR" -> "pt").
    pub fn from_header(value: Option<&str>) -> Self {
        let lang = value
            .map(accept_language::parse)
            .unwrap_or_default()
            .into_iter()
            .map(|tag| tag.split('-').next().unwrap_or_default().to_lowercase())
            .find(|lang| SUPPORTED.contains(&lang.as_str()))
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Locale(lang)
    }

    pub fn from_parts(parts: &Parts) -> Self {
        Self::from_header(
            parts
                .headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|value| value.to_str().ok()),
        )
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Locale::from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_supported_language() {
        assert_eq!(Locale::from_header(Some("pt-BR,pt;q=0.9,en;q=0.8")).0, "pt");
        assert_eq!(Locale::from_header(Some("fr-FR, en;q=0.5")).0, "en");
        assert_eq!(Locale::from_header(Some("de")).0, "en");
        assert_eq!(Locale::from_header(None).0, "en");
    }

    #[test]
    fn reads_the_accept_language_of_the_request() {
        let request = axum::http::Request::builder()
            .header(header::ACCEPT_LANGUAGE, "pt-BR")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();
        assert_eq!(Locale::from_parts(&parts).0, "pt");

        let (parts, _) = axum::http::Request::new(()).into_parts();
        assert_eq!(Locale::from_parts(&parts).0, "en");
    }
}
