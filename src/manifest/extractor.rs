use super::{
    char_len, char_slice, split_lines, ContainerRecord, ManifestKind, ParseSettings,
};
use crate::keywords::KeywordMatcher;
use crate::translation::TranslationResolver;

const DETAIL_PREFIX: &str = "51";
const DESCRIPTION_PREFIX: &str = "53";

// Code point offsets of the export list layout.
const CONTAINER_RANGE: (usize, usize) = (2, 13);
const BILL_OF_LADING_RANGE: (usize, usize) = (28, 44);
const GOODS_RANGE: (usize, usize) = (13, 43);
const MIN_DETAIL_LEN: usize = 44;
const MIN_DESCRIPTION_LEN: usize = 43;

/// Pulls container records out of export container lists.
pub struct RecordExtractor<'a> {
    settings: &'a ParseSettings,
}

impl<'a> RecordExtractor<'a> {
    pub fn new(settings: &'a ParseSettings) -> Self {
        Self { settings }
    }

    /// Records whose cargo description mentions a configured keyword, or `None`
    /// when the text has no 51/53 lines or nothing matched.
    ///
    /// A detail line takes the first long-enough description line after it in
    /// document order. Container numbers are not compared: the generator writes
    /// each description after its own detail line, so adjacency is the link.
    pub fn extract(&self, text: &str, kind: ManifestKind) -> Option<Vec<ContainerRecord>> {
        if kind != ManifestKind::Export {
            log::debug!("Structured extraction only applies to export manifests, got {kind}");
            return None;
        }

        let records: Vec<&str> = split_lines(text)
            .filter(|line| line.starts_with(DETAIL_PREFIX) || line.starts_with(DESCRIPTION_PREFIX))
            .collect();

        if records.is_empty() {
            log::warn!("No 51 or 53 record lines found");
            return None;
        }

        log::info!("Found {} record lines", records.len());

        let resolver = TranslationResolver::new(&self.settings.translations);
        let mut containers = Vec::new();

        for (i, record) in records.iter().enumerate() {
            if !record.starts_with(DETAIL_PREFIX) || char_len(record) < MIN_DETAIL_LEN {
                continue;
            }

            let container_number = Self::container_number(record);
            let bill_of_lading = Self::bill_of_lading(record);
            let english_goods_description = Self::next_description(&records[i + 1..]);

            let matched_keywords = english_goods_description
                .as_deref()
                .map(|goods| KeywordMatcher::find_matches_owned(goods, &self.settings.keywords))
                .unwrap_or_default();

            let mut container = ContainerRecord {
                container_number,
                bill_of_lading,
                english_goods_description,
                chinese_goods_description: String::new(),
                matched_keywords,
            };

            let Some(primary) = container.primary_keyword() else {
                log::info!(
                    "No keyword matched - container: {}, bill of lading: {}, goods: {}",
                    container.container_number,
                    container.bill_of_lading_display(),
                    container.english_goods_display()
                );
                continue;
            };

            container.chinese_goods_description =
                resolver.resolve(primary, container.english_goods_display());

            log::info!(
                "Keyword matched - container: {}, bill of lading: {}, goods: {}, chinese: {}",
                container.container_number,
                container.bill_of_lading_display(),
                container.english_goods_display(),
                container.chinese_goods_description
            );
            containers.push(container);
        }

        if containers.is_empty() {
            log::warn!("No records contained a configured keyword");
            return None;
        }

        log::info!("Extracted {} keyword-matched records", containers.len());
        Some(containers)
    }

    fn container_number(record: &str) -> String {
        char_slice(record, CONTAINER_RANGE.0, CONTAINER_RANGE.1)
            .trim()
            .to_string()
    }

    fn bill_of_lading(record: &str) -> Option<String> {
        let raw = char_slice(record, BILL_OF_LADING_RANGE.0, BILL_OF_LADING_RANGE.1);
        let cleaned = raw.trim().replace('\0', "");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned.to_string())
        }
    }

    fn next_description(following: &[&str]) -> Option<String> {
        following
            .iter()
            .find(|line| {
                line.starts_with(DESCRIPTION_PREFIX) && char_len(line) >= MIN_DESCRIPTION_LEN
            })
            .map(|line| {
                char_slice(line, GOODS_RANGE.0, GOODS_RANGE.1)
                    .trim()
                    .to_string()
            })
    }
}
