// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "en";

// Catálogos embutidos no binário
const CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut messages = HashMap::new();
        for (lang, raw) in CATALOGS {
            let catalog: HashMap<String, String> = serde_json::from_str(raw)
                .map_err(|e| anyhow::anyhow!("Catálogo '{}' inválido: {}", lang, e))?;
            messages.insert(lang.to_string(), catalog);
        }
        Ok(Self { messages })
    }

    /// Busca a chave no idioma pedido, cai para o padrão e por fim devolve a própria chave.
    pub fn get(&self, lang: &str, key: &str) -> String {
        self.messages
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|c| c.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Igual a `get`, trocando `{nome}` pelos argumentos.
    pub fn format(&self, lang: &str, key: &str, args: &[(&str, &str)]) -> String {
        let mut message = self.get(lang, key);
        for (name, value) in args {
            message = message.replace(&format!("{{{}}}", name), value);
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogs_have_the_same_keys() {
        let store = I18nStore::load().unwrap();
        let en = &store.messages["en"];
        let pt = &store.messages["pt"];
        for key in en.keys() {
            assert!(pt.contains_key(key), "pt sem a chave {}", key);
        }
        assert_eq!(en.len(), pt.len());
    }

    #[test]
    fn falls_back_to_default_language_then_key() {
        let store = I18nStore::load().unwrap();
        assert_eq!(store.get("fr", "invalid_email"), "Invalid e-mail.");
        assert_eq!(store.get("pt", "no.such.key"), "no.such.key");
    }

    #[test]
    fn formats_placeholders() {
        let store = I18nStore::load().unwrap();
        let msg = store.format("en", "forbidden_permission", &[("required", "projects.approve")]);
        assert_eq!(msg, "You need the 'projects.approve' permission to perform this action.");
    }
}
