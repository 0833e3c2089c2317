use chardetng::EncodingDetector;
use encoding_rs::{Encoding, BIG5, GB18030, GBK, UTF_8};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: String,
    pub had_errors: bool,
}

/// Legacy encodings trusted over UTF-8 when the detector picks them and they
/// decode cleanly. Manifests from older Chinese generators use these.
fn is_legacy_cjk(encoding: &'static Encoding) -> bool {
    encoding == GBK || encoding == GB18030 || encoding == BIG5
}

/// Decodes attachment bytes to text. UTF-8 is the default, with invalid
/// sequences replaced by U+FFFD. Only a clean decode in a detected Chinese
/// legacy encoding overrides it.
pub fn decode_text(bytes: &[u8]) -> DecodedText {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    if let Ok(text) = std::str::from_utf8(bytes) {
        return DecodedText {
            text: text.to_string(),
            encoding: "utf-8".to_string(),
            had_errors: false,
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let guessed = detector.guess(None, true);

    if is_legacy_cjk(guessed) {
        let (text, had_errors) = guessed.decode_without_bom_handling(bytes);
        if !had_errors {
            let name = guessed.name().to_lowercase();
            log::debug!("Attachment decoded as {name}");
            return DecodedText {
                text: text.into_owned(),
                encoding: name,
                had_errors: false,
            };
        }
    }

    let (text, had_errors) = UTF_8.decode_without_bom_handling(bytes);
    log::warn!(
        "Attachment is not valid UTF-8 (detector guessed {}), invalid bytes replaced",
        guessed.name()
    );

    DecodedText {
        text: text.into_owned(),
        encoding: "utf-8".to_string(),
        had_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::KeywordSet;
    use crate::manifest::{ManifestParser, ParseSettings};
    use crate::translation::TranslationMap;

    #[test]
    fn test_utf8_passthrough() {
        let decoded = decode_text("51ABCD1234567 硝酸钙".as_bytes());
        assert_eq!(decoded.text, "51ABCD1234567 硝酸钙");
        assert_eq!(decoded.encoding, "utf-8");
        assert!(!decoded.had_errors);
    }

    #[test]
    fn test_bom_is_stripped() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"00NCLCONTAINER LIST");
        assert_eq!(decode_text(&bytes).text, "00NCLCONTAINER LIST");
    }

    #[test]
    fn test_stray_byte_keeps_utf8() {
        let mut bytes = format!(
            "00NCLCONTAINER LIST 出口舱单\n51{:<11}{:<15}{:<16}\n53{:<11}{:<30}\n",
            "ABCD1234567", "", "HBL0001", "", "硝酸钙"
        )
        .into_bytes();
        bytes.push(0xFF);

        let decoded = decode_text(&bytes);
        assert_eq!(decoded.encoding, "utf-8");
        assert!(decoded.had_errors);
        assert!(decoded.text.starts_with("00NCLCONTAINER LIST 出口舱单"));
        assert!(decoded.text.ends_with('\u{FFFD}'));

        let parser = ManifestParser::new(ParseSettings::new(
            KeywordSet::new(["硝酸钙"]),
            TranslationMap::default(),
        ));
        let records = parser.parse(&decoded.text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].matched_keywords, vec!["硝酸钙".to_string()]);
    }

    #[test]
    fn test_gbk_text() {
        let source = "53 出口舱单 集装箱货物品名：硝酸钙，四水合硝酸钙，六水合硝酸镁。\
                      本公司已经按照规定申报危险品，请及时处理并回复确认。";
        let (bytes, _, _) = encoding_rs::GBK.encode(source);
        let decoded = decode_text(&bytes);

        assert!(decoded.text.starts_with("53 "));
        assert_ne!(decoded.encoding, "utf-8");
        if decoded.encoding == "gbk" {
            assert_eq!(decoded.text, source);
        }
    }
}
