use std::collections::HashMap;
use std::sync::{Arc, RwLock};

mod generated {
    include!(concat!(env!("OUT_DIR"), "/unoui_i18n_generated.rs"));
}

#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub enum Locale {
    #[default]
    System,
    Tag(String),
}

impl From<String> for Locale {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("system") {
            return Self::System;
        }
        Self::Tag(value.trim().to_string())
    }
}

impl From<&str> for Locale {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

#[derive(Clone)]
pub struct I18nManager {
    catalog: Arc<I18nCatalog>,
    locale: Arc<RwLock<Locale>>,
}

impl Default for I18nManager {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nManager {
    pub fn new() -> Self {
        Self {
            catalog: Arc::new(I18nCatalog::load()),
            locale: Arc::new(RwLock::new(Locale::System)),
        }
    }

    pub fn with_locale(locale: impl Into<Locale>) -> Self {
        let manager = Self::new();
        manager.set_locale(locale);
        manager
    }

    pub fn locale(&self) -> Locale {
        match self.locale.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_locale(&self, locale: impl Into<Locale>) {
        let mut guard = match self.locale.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = locale.into();
    }

    pub fn default_locale(&self) -> &'static str {
        self.catalog.default_locale
    }

    pub fn resolved_locale(&self) -> &'static str {
        self.catalog
            .resolve_locale(self.requested_locale().as_deref())
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    pub fn t(&self, key: &str) -> String {
        self.lookup(key).unwrap_or(key).to_string()
    }

    pub fn t_with(&self, key: &str, params: &[(&str, &str)]) -> String {
        let raw = self.lookup(key).unwrap_or(key);
        if params.is_empty() {
            return raw.to_string();
        }
        format_template(raw, params)
    }

    fn requested_locale(&self) -> Option<String> {
        match self.locale() {
            Locale::System => system_locale(),
            Locale::Tag(tag) => Some(tag),
        }
    }

    fn lookup(&self, key: &str) -> Option<&'static str> {
        let resolved = self.resolved_locale();
        self.catalog.lookup(resolved, key)
    }
}

struct I18nCatalog {
    default_locale: &'static str,
    entries: HashMap<&'static str, HashMap<&'static str, &'static str>>,
    /// Normalized tag, or bare language subtag, to catalog locale.
    aliases: HashMap<String, &'static str>,
}

impl I18nCatalog {
    fn load() -> Self {
        let mut entries = generated::LOCALES
            .iter()
            .map(|(locale, pairs)| (*locale, pairs.iter().copied().collect::<HashMap<_, _>>()))
            .collect::<HashMap<_, _>>();
        entries.entry(generated::DEFAULT_LOCALE).or_default();

        let mut aliases = HashMap::new();
        let mut by_language = HashMap::<String, Vec<&'static str>>::new();
        for locale in entries.keys().copied() {
            let tag = normalize_locale_tag(locale);
            by_language
                .entry(primary_language(&tag).to_string())
                .or_default()
                .push(locale);
            aliases.insert(tag, locale);
        }
        // A bare language only resolves when a single catalog locale uses it.
        for (language, locales) in by_language {
            if let [only] = locales.as_slice() {
                aliases.entry(language).or_insert(*only);
            }
        }

        Self {
            default_locale: generated::DEFAULT_LOCALE,
            entries,
            aliases,
        }
    }

    fn resolve_locale(&self, requested: Option<&str>) -> &'static str {
        requested
            .map(normalize_locale_tag)
            .and_then(|tag| {
                self.aliases
                    .get(&tag)
                    .or_else(|| self.aliases.get(primary_language(&tag)))
                    .copied()
            })
            .unwrap_or(self.default_locale)
    }

    fn lookup(&self, locale: &'static str, key: &str) -> Option<&'static str> {
        self.entries.get(locale)?.get(key).copied()
    }
}

#[cfg(feature = "i18n")]
fn system_locale() -> Option<String> {
    sys_locale::get_locale()
}

#[cfg(not(feature = "i18n"))]
fn system_locale() -> Option<String> {
    None
}

impl std::fmt::Debug for I18nManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("I18nManager")
            .field("locale", &self.locale())
            .field("resolved", &self.resolved_locale())
            .finish()
    }
}

fn normalize_locale_tag(tag: &str) -> String {
    let base = tag.trim().split(['.', '@']).next().unwrap_or_default();
    base.split(['-', '_'])
        .filter(|segment| !segment.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn primary_language(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}

/// Replaces `{name}` placeholders; unknown or unterminated ones stay verbatim.
fn format_template(template: &str, params: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            output.push_str(&rest[open..]);
            return output;
        };
        let token = &after[..close];
        match params.iter().find(|(name, _)| *name == token) {
            Some((_, value)) => output.push_str(value),
            None => output.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }
    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::{I18nManager, Locale};

    #[test]
    fn missing_translation_shows_key() {
        let i18n = I18nManager::with_locale("zh-CN");
        assert_eq!(i18n.t("form.only_in_tests"), "form.only_in_tests");
    }

    #[test]
    fn supports_locale_tag_normalization() {
        let i18n = I18nManager::with_locale("zh_CN.UTF-8");
        assert_eq!(i18n.resolved_locale(), "zh-CN");
        assert_eq!(i18n.t("form.required"), "此字段为必填项");
    }

    #[test]
    fn falls_back_to_language_then_default_locale() {
        let i18n = I18nManager::with_locale("en-GB");
        assert_eq!(i18n.resolved_locale(), "en-US");

        i18n.set_locale("fr-FR");
        assert_eq!(i18n.resolved_locale(), i18n.default_locale());
    }

    #[test]
    fn supports_placeholder_interpolation() {
        let i18n = I18nManager::with_locale("en-US");
        assert_eq!(
            i18n.t_with("form.min_length", &[("min", "3")]),
            "At least 3 characters required"
        );
        assert_eq!(i18n.t_with("form.min_length", &[]), "At least {min} characters required");
    }

    #[test]
    fn system_keyword_maps_to_system_locale() {
        assert_eq!(Locale::from(" System "), Locale::System);
        assert_eq!(Locale::from("en-US"), Locale::Tag("en-US".to_string()));
    }
}
