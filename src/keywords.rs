use serde::{Deserialize, Serialize};

/// Ordered, read-only list of cargo keywords for one mail direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.keywords
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.keywords.iter()
    }
}

/// Uppercases and removes every space character, so "Calcium  nitrate" and
/// "CALCIUM NITRATE" compare equal.
pub fn normalize_keyword(text: &str) -> String {
    text.chars()
        .filter(|c| *c != ' ')
        .flat_map(char::to_uppercase)
        .collect()
}

pub struct KeywordMatcher;

impl KeywordMatcher {
    /// Every keyword whose normalized form occurs in the normalized text, in the
    /// order the keywords were configured.
    pub fn find_matches<'a>(text: &str, keywords: &'a [String]) -> Vec<&'a str> {
        if text.is_empty() {
            return Vec::new();
        }

        let normalized_text = normalize_keyword(text);
        keywords
            .iter()
            .filter(|keyword| {
                let normalized = normalize_keyword(keyword);
                // A blank keyword would otherwise match everything.
                !normalized.is_empty() && normalized_text.contains(&normalized)
            })
            .map(String::as_str)
            .collect()
    }

    pub fn find_matches_owned(text: &str, keywords: &KeywordSet) -> Vec<String> {
        Self::find_matches(text, keywords.as_slice())
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}
