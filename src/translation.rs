use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Chinese names for the chemicals operators most commonly flag. Used to fill
/// in translations for keywords added without one.
const BUILTIN_TRANSLATIONS: &[(&str, &str)] = &[
    ("Calcium Nitrate", "硝酸钙"),
    ("Calcium Nitrate Tetrahydrate", "四水合硝酸钙"),
    ("Magnesium Nitrate Hexahydrate", "六水合硝酸镁"),
];

pub fn builtin_translation(keyword: &str) -> Option<&'static str> {
    BUILTIN_TRANSLATIONS
        .iter()
        .find(|(english, _)| *english == keyword)
        .map(|(_, chinese)| *chinese)
}

pub fn builtin_translations() -> TranslationMap {
    TranslationMap::from_pairs(BUILTIN_TRANSLATIONS.iter().copied())
}

/// Keyword to display-name mapping. Lookups are exact and case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationMap {
    entries: BTreeMap<String, String>,
}

impl TranslationMap {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.entries.get(keyword).map(String::as_str)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.entries.contains_key(keyword)
    }

    pub fn insert(&mut self, keyword: impl Into<String>, translated: impl Into<String>) {
        self.entries.insert(keyword.into(), translated.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub struct TranslationResolver<'a> {
    map: &'a TranslationMap,
}

impl<'a> TranslationResolver<'a> {
    pub fn new(map: &'a TranslationMap) -> Self {
        Self { map }
    }

    /// The mapped name for `keyword`, or `fallback` when the keyword is empty or
    /// has no entry.
    pub fn resolve(&self, keyword: &str, fallback: &str) -> String {
        if keyword.is_empty() {
            return fallback.to_string();
        }
        self.map
            .get(keyword)
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string())
    }
}
