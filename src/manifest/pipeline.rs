use super::{ContainerRecord, FormatClassifier, ManifestKind, ParseSettings, RecordExtractor};

/// Entry point for one decoded `.txt` attachment.
///
/// Holds nothing but the configuration snapshot, so a parser can be shared
/// between threads handling different mails.
#[derive(Debug, Clone)]
pub struct ManifestParser {
    settings: ParseSettings,
}

impl ManifestParser {
    pub fn new(settings: ParseSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ParseSettings {
        &self.settings
    }

    pub fn classify(&self, raw_text: &str) -> ManifestKind {
        FormatClassifier::classify(raw_text)
    }

    /// Keyword-matched container records, or `None` when the text is not an
    /// export manifest, has no record lines, or nothing matched.
    pub fn parse(&self, raw_text: &str) -> Option<Vec<ContainerRecord>> {
        let kind = self.classify(raw_text);
        if kind != ManifestKind::Export {
            log::warn!("Skipping {kind} manifest, only export lists are extracted");
            return None;
        }

        RecordExtractor::new(&self.settings).extract(raw_text, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::KeywordSet;
    use crate::manifest::classifier::{EXPORT_HEADER_MARKER, IMPORT_HEADER_MARKER};
    use crate::translation::TranslationMap;

    fn create_test_parser() -> ManifestParser {
        ManifestParser::new(ParseSettings::new(
            KeywordSet::new(["Calcium Nitrate Tetrahydrate"]),
            TranslationMap::from_pairs([("Calcium Nitrate Tetrahydrate", "四水合硝酸钙")]),
        ))
    }

    fn manifest(marker: &str, goods: &str) -> String {
        format!(
            "{marker}\n51{:<11}{:<15}{:<16}\n53{:<11}{:<30}\n99END\n",
            "ABCD1234567", "", "HBLNO123456789", "", goods
        )
    }

    #[test]
    fn test_matched_export_manifest() {
        let parser = create_test_parser();
        let records = parser
            .parse(&manifest(EXPORT_HEADER_MARKER, "Calcium Nitrate Tetrahydrate"))
            .unwrap();

        assert_eq!(
            records,
            vec![ContainerRecord {
                container_number: "ABCD1234567".to_string(),
                bill_of_lading: Some("HBLNO123456789".to_string()),
                english_goods_description: Some("Calcium Nitrate Tetrahydrate".to_string()),
                chinese_goods_description: "四水合硝酸钙".to_string(),
                matched_keywords: vec!["Calcium Nitrate Tetrahydrate".to_string()],
            }]
        );
    }

    #[test]
    fn test_unmatched_export_manifest() {
        let parser = create_test_parser();
        assert!(parser
            .parse(&manifest(EXPORT_HEADER_MARKER, "Steel Coils"))
            .is_none());
    }

    #[test]
    fn test_import_manifest_is_skipped() {
        let parser = create_test_parser();
        let text = manifest(IMPORT_HEADER_MARKER, "Calcium Nitrate Tetrahydrate");
        assert_eq!(parser.classify(&text), ManifestKind::Import);
        assert!(parser.parse(&text).is_none());
    }

    #[test]
    fn test_arbitrary_text_is_skipped() {
        let parser = create_test_parser();
        assert!(parser.parse("").is_none());
        assert!(parser.parse("\u{0}\u{0}ÿ🚢 random bytes\n\n").is_none());
    }

    #[test]
    fn test_crlf_line_endings() {
        let parser = create_test_parser();
        let text = manifest(EXPORT_HEADER_MARKER, "Calcium Nitrate Tetrahydrate").replace('\n', "\r\n");
        let records = parser.parse(&text).unwrap();
        assert_eq!(records[0].bill_of_lading.as_deref(), Some("HBLNO123456789"));
    }

    #[test]
    fn test_parser_shared_between_threads() {
        let parser = std::sync::Arc::new(create_test_parser());
        let text = manifest(EXPORT_HEADER_MARKER, "Calcium Nitrate Tetrahydrate");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let parser = parser.clone();
                let text = text.clone();
                std::thread::spawn(move || parser.parse(&text).map(|r| r.len()))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(1));
        }
    }
}
