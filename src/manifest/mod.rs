pub mod classifier;
pub mod extractor;
pub mod pipeline;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use classifier::FormatClassifier;
pub use extractor::RecordExtractor;
pub use pipeline::ManifestParser;

use crate::keywords::KeywordSet;
use crate::translation::TranslationMap;

/// Configuration snapshot a parse runs against. Built once per direction and
/// shared read-only between parses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseSettings {
    pub keywords: KeywordSet,
    pub translations: TranslationMap,
}

impl ParseSettings {
    pub fn new(keywords: KeywordSet, translations: TranslationMap) -> Self {
        Self {
            keywords,
            translations,
        }
    }
}

/// Display text for a detail line without a usable bill of lading.
pub const UNKNOWN_BILL_OF_LADING: &str = "未知提单号";
/// Display text when no description line follows a detail line.
pub const UNKNOWN_GOODS_NAME: &str = "未知货名";
/// Display text when no keyword could be translated.
pub const UNKNOWN_CHINESE_NAME: &str = "未知中文货名";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManifestKind {
    Import,
    Export,
    Unrecognized,
}

impl ManifestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManifestKind::Import => "import",
            ManifestKind::Export => "export",
            ManifestKind::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One container taken from a "51" detail line and the "53" description line
/// that follows it in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub container_number: String,
    pub bill_of_lading: Option<String>,
    pub english_goods_description: Option<String>,
    pub chinese_goods_description: String,
    /// Every configured keyword found in the English description, in configured order.
    pub matched_keywords: Vec<String>,
}

impl ContainerRecord {
    pub fn bill_of_lading_display(&self) -> &str {
        self.bill_of_lading
            .as_deref()
            .unwrap_or(UNKNOWN_BILL_OF_LADING)
    }

    pub fn english_goods_display(&self) -> &str {
        self.english_goods_description
            .as_deref()
            .unwrap_or(UNKNOWN_GOODS_NAME)
    }

    pub fn primary_keyword(&self) -> Option<&str> {
        self.matched_keywords.first().map(String::as_str)
    }
}

/// Characters in `line` from `start` up to (not including) `end`, counted in
/// code points. Callers check the line length first.
pub(crate) fn char_slice(line: &str, start: usize, end: usize) -> String {
    line.chars().skip(start).take(end.saturating_sub(start)).collect()
}

pub(crate) fn char_len(line: &str) -> usize {
    line.chars().count()
}

/// Splits on `\n` only; a trailing `\r` stays on the line, as the fixed-width
/// generator output is read.
pub(crate) fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
}
