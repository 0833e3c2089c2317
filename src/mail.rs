use crate::config::Direction;
use crate::encoding::decode_text;
use crate::keywords::{KeywordMatcher, KeywordSet};
use crate::manifest::{ContainerRecord, ManifestKind, ManifestParser};
use crate::report;
use lazy_static::lazy_static;
use mail_parser::{MessageParser, MimeHeaders};
use regex::Regex;

lazy_static! {
    static ref ANGLE_ADDRESS: Regex = Regex::new(r"<([^>]+)>").unwrap();
    static ref BARE_ADDRESS: Regex = Regex::new(r"[\w.+-]+@[\w.-]+\.\w+").unwrap();
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

impl Attachment {
    pub fn is_text_file(&self) -> bool {
        self.filename.to_lowercase().ends_with(".txt")
    }
}

/// A fetched mail reduced to what the scan looks at.
#[derive(Debug, Clone, Default)]
pub struct InboundMail {
    pub uid: String,
    pub from: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

impl InboundMail {
    /// Parses a raw RFC 822 message. Subject and file names come back decoded.
    pub fn from_rfc822(uid: impl Into<String>, raw: &[u8]) -> Option<Self> {
        let parsed = MessageParser::default().parse(raw)?;

        let from = parsed
            .from()
            .and_then(|addr| addr.first())
            .map(|a| match (a.name(), a.address()) {
                (Some(name), Some(address)) => format!("{name} <{address}>"),
                (None, Some(address)) => address.to_string(),
                (Some(name), None) => name.to_string(),
                (None, None) => String::new(),
            })
            .unwrap_or_default();

        let attachments = parsed
            .attachments()
            .filter_map(|part| {
                let filename = MimeHeaders::attachment_name(part)?;
                Some(Attachment {
                    filename: filename.to_string(),
                    content: part.contents().to_vec(),
                })
            })
            .collect();

        Some(Self {
            uid: uid.into(),
            from,
            subject: parsed.subject().unwrap_or_default().to_string(),
            body: parsed
                .body_text(0)
                .map(|b| b.to_string())
                .unwrap_or_default(),
            attachments,
        })
    }

    pub fn sender_address(&self) -> String {
        extract_email_address(&self.from)
    }
}

/// The address in a From header: the `<...>` part when present, else the first
/// thing that looks like an address, else the header unchanged.
pub fn extract_email_address(header: &str) -> String {
    if let Some(captures) = ANGLE_ADDRESS.captures(header) {
        return captures[1].trim().to_string();
    }
    if let Some(found) = BARE_ADDRESS.find(header) {
        return found.as_str().to_string();
    }
    header.trim().to_string()
}

#[derive(Debug, Clone)]
pub struct ManifestAttachment {
    pub filename: String,
    pub kind: ManifestKind,
}

#[derive(Debug, Clone)]
pub struct MailScanOutcome {
    pub uid: String,
    pub direction: Direction,
    pub sender: String,
    pub subject: String,
    pub subject_keywords: Vec<String>,
    pub body_keywords: Vec<String>,
    pub filename_keywords: Vec<String>,
    pub text_attachments: Vec<ManifestAttachment>,
    /// Attachment the records were taken from.
    pub manifest_attachment: Option<String>,
    pub records: Option<Vec<ContainerRecord>>,
    pub matched_keywords: Vec<String>,
}

impl MailScanOutcome {
    pub fn has_keyword(&self) -> bool {
        self.records.is_some()
            || !self.subject_keywords.is_empty()
            || !self.body_keywords.is_empty()
            || !self.filename_keywords.is_empty()
    }

    pub fn container_count(&self) -> usize {
        self.records.as_ref().map_or(0, Vec::len)
    }

    /// Whether a report should be mailed back: only when a manifest yielded records.
    pub fn needs_reply(&self) -> bool {
        self.records.is_some()
    }

    pub fn report_file_name(&self, prefix: &str) -> Option<String> {
        let attachment = self.manifest_attachment.as_ref()?;
        Some(report::report_file_name(prefix, attachment))
    }

    /// The reply carrying the report back to the sender, copied to any extra
    /// recipients. `None` when there is nothing to report.
    pub fn reply_draft(
        &self,
        mailbox: &str,
        report_name: &str,
        additional_recipients: &[String],
    ) -> Option<ReplyDraft> {
        if !self.needs_reply() {
            return None;
        }

        let mut to = vec![self.sender.clone()];
        for recipient in additional_recipients {
            let address = extract_email_address(recipient);
            if !address.is_empty() && !to.contains(&address) {
                to.push(address);
            }
        }

        Some(ReplyDraft {
            to,
            subject: format!("回复+{}+附件核查清单", self.subject),
            body: format!(
                "尊敬的客户，您好：\n\n\
                 根据您发送至{mailbox}邮箱、文件名为\"{report_name}\"的附件，经核查发现，\
                 相关航次中有涉及危险品（化学品）的货物。请贵司务必重视此事，并尽快采取应急处置措施。\n\n\
                 如您需要其它协助，请随时与我们联系。\n\n祝商祺！\n"
            ),
            attachment_name: report_name.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyDraft {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
}

/// Runs the keyword and manifest checks a mailbox worker performs per message.
pub struct MailScanner {
    direction: Direction,
    parser: ManifestParser,
}

impl MailScanner {
    pub fn new(direction: Direction, parser: ManifestParser) -> Self {
        Self { direction, parser }
    }

    fn keywords(&self) -> &KeywordSet {
        &self.parser.settings().keywords
    }

    pub fn scan(&self, mail: &InboundMail) -> MailScanOutcome {
        log::info!(
            "Processing mail - uid: {}, from: {}, subject: {}",
            mail.uid,
            mail.from,
            mail.subject
        );

        let keywords = self.keywords();
        let subject_keywords = KeywordMatcher::find_matches_owned(&mail.subject, keywords);
        let body_keywords = KeywordMatcher::find_matches_owned(&mail.body, keywords);

        let mut filename_keywords = Vec::new();
        let mut text_attachments = Vec::new();
        let mut manifest_attachment: Option<String> = None;
        let mut records: Option<Vec<ContainerRecord>> = None;

        for attachment in &mail.attachments {
            filename_keywords.extend(KeywordMatcher::find_matches_owned(
                &attachment.filename,
                keywords,
            ));

            if !attachment.is_text_file() {
                continue;
            }

            let decoded = decode_text(&attachment.content);
            let kind = self.parser.classify(&decoded.text);
            log::info!("Text attachment {} classified as {kind}", attachment.filename);
            text_attachments.push(ManifestAttachment {
                filename: attachment.filename.clone(),
                kind,
            });

            if self.direction != Direction::Export || kind != ManifestKind::Export {
                continue;
            }
            if records.is_some() {
                continue;
            }

            log::info!("Parsing export manifest attachment: {}", attachment.filename);
            if let Some(found) = self.parser.parse(&decoded.text) {
                log::info!(
                    "Attachment {} produced {} matched records",
                    attachment.filename,
                    found.len()
                );
                manifest_attachment = Some(attachment.filename.clone());
                records = Some(found);
            } else {
                log::warn!(
                    "Attachment {} is not a matching manifest",
                    attachment.filename
                );
            }
        }

        let matched_keywords = match &records {
            Some(found) => {
                let goods = found
                    .iter()
                    .map(|r| r.english_goods_display())
                    .collect::<Vec<_>>()
                    .join(" ");
                KeywordMatcher::find_matches_owned(&goods, keywords)
            }
            None => dedup_in_order(
                subject_keywords
                    .iter()
                    .chain(body_keywords.iter())
                    .chain(filename_keywords.iter()),
            ),
        };

        let outcome = MailScanOutcome {
            uid: mail.uid.clone(),
            direction: self.direction,
            sender: mail.sender_address(),
            subject: mail.subject.clone(),
            subject_keywords,
            body_keywords,
            filename_keywords,
            text_attachments,
            manifest_attachment,
            records,
            matched_keywords,
        };

        if outcome.has_keyword() {
            log::info!("Keyword match: {}", outcome.matched_keywords.join(","));
        } else {
            log::info!("No keyword matched - subject: {}", outcome.subject);
        }

        outcome
    }
}

fn dedup_in_order<'a>(keywords: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for keyword in keywords {
        if !unique.contains(keyword) {
            unique.push(keyword.clone());
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ParseSettings;
    use crate::translation::TranslationMap;

    fn create_test_scanner(direction: Direction) -> MailScanner {
        MailScanner::new(
            direction,
            ManifestParser::new(ParseSettings::new(
                KeywordSet::new(["Calcium Nitrate", "Magnesium Nitrate Hexahydrate"]),
                TranslationMap::from_pairs([("Calcium Nitrate", "硝酸钙")]),
            )),
        )
    }

    fn export_manifest(goods: &str) -> Vec<u8> {
        format!(
            "00NCLCONTAINER LIST\n51{:<11}{:<15}{:<16}\n53{:<11}{:<30}\n",
            "ABCD1234567", "", "HBL0001", "", goods
        )
        .into_bytes()
    }

    fn mail_with(attachments: Vec<Attachment>) -> InboundMail {
        InboundMail {
            uid: "42".to_string(),
            from: "Shipping Agent <agent@example.com>".to_string(),
            subject: "Manifest VOY 001".to_string(),
            body: "Please find the manifest attached.".to_string(),
            attachments,
        }
    }

    #[test]
    fn test_extract_email_address() {
        assert_eq!(
            extract_email_address("Agent <agent@example.com>"),
            "agent@example.com"
        );
        assert_eq!(
            extract_email_address("reply to ops.team@port.example.cn please"),
            "ops.team@port.example.cn"
        );
        assert_eq!(extract_email_address(" unknown "), "unknown");
    }

    #[test]
    fn test_text_file_extension_is_case_insensitive() {
        let attachment = Attachment {
            filename: "VOY001.manifest.TXT".to_string(),
            content: vec![],
        };
        assert!(attachment.is_text_file());
    }

    #[test]
    fn test_export_mail_with_matching_manifest() {
        let scanner = create_test_scanner(Direction::Export);
        let mail = mail_with(vec![
            Attachment {
                filename: "notes.pdf".to_string(),
                content: b"%PDF".to_vec(),
            },
            Attachment {
                filename: "VOY001.txt".to_string(),
                content: export_manifest("CALCIUM NITRATE"),
            },
        ]);

        let outcome = scanner.scan(&mail);

        assert!(outcome.needs_reply());
        assert!(outcome.has_keyword());
        assert_eq!(outcome.container_count(), 1);
        assert_eq!(outcome.sender, "agent@example.com");
        assert_eq!(outcome.matched_keywords, vec!["Calcium Nitrate"]);
        assert_eq!(outcome.manifest_attachment.as_deref(), Some("VOY001.txt"));
        assert_eq!(
            outcome.report_file_name("processed_").as_deref(),
            Some("processed_VOY001.csv")
        );
    }

    #[test]
    fn test_reply_draft() {
        let scanner = create_test_scanner(Direction::Export);
        let mail = mail_with(vec![Attachment {
            filename: "VOY001.txt".to_string(),
            content: export_manifest("CALCIUM NITRATE"),
        }]);
        let outcome = scanner.scan(&mail);

        let draft = outcome
            .reply_draft(
                "export@terminal.example.cn",
                "processed_VOY001.csv",
                &[
                    "Duty Desk <duty@terminal.example.cn>".to_string(),
                    "agent@example.com".to_string(),
                ],
            )
            .unwrap();

        assert_eq!(draft.to, vec!["agent@example.com", "duty@terminal.example.cn"]);
        assert_eq!(draft.subject, "回复+Manifest VOY 001+附件核查清单");
        assert!(draft.body.contains("processed_VOY001.csv"));
        assert!(draft.body.contains("export@terminal.example.cn"));
    }

    #[test]
    fn test_export_mail_without_match() {
        let scanner = create_test_scanner(Direction::Export);
        let mail = mail_with(vec![Attachment {
            filename: "VOY001.txt".to_string(),
            content: export_manifest("STEEL COILS"),
        }]);

        let outcome = scanner.scan(&mail);

        assert!(!outcome.needs_reply());
        assert!(!outcome.has_keyword());
        assert_eq!(outcome.text_attachments.len(), 1);
        assert_eq!(outcome.text_attachments[0].kind, ManifestKind::Export);
        assert_eq!(outcome.report_file_name("processed_"), None);
        assert_eq!(outcome.reply_draft("box@example.com", "r.csv", &[]), None);
    }

    #[test]
    fn test_keyword_in_subject_and_filename() {
        let scanner = create_test_scanner(Direction::Import);
        let mut mail = mail_with(vec![Attachment {
            filename: "magnesium nitrate hexahydrate.xlsx".to_string(),
            content: vec![],
        }]);
        mail.subject = "CALCIUM NITRATE shipment".to_string();

        let outcome = scanner.scan(&mail);

        assert!(outcome.has_keyword());
        assert!(!outcome.needs_reply());
        assert_eq!(
            outcome.matched_keywords,
            vec!["Calcium Nitrate", "Magnesium Nitrate Hexahydrate"]
        );
    }

    #[test]
    fn test_import_direction_does_not_extract() {
        let scanner = create_test_scanner(Direction::Import);
        let mail = mail_with(vec![Attachment {
            filename: "VOY001.txt".to_string(),
            content: export_manifest("CALCIUM NITRATE"),
        }]);

        let outcome = scanner.scan(&mail);

        assert!(outcome.records.is_none());
        assert_eq!(outcome.text_attachments[0].kind, ManifestKind::Export);
    }

    #[test]
    fn test_first_matching_attachment_wins() {
        let scanner = create_test_scanner(Direction::Export);
        let mail = mail_with(vec![
            Attachment {
                filename: "a.txt".to_string(),
                content: export_manifest("STEEL COILS"),
            },
            Attachment {
                filename: "b.txt".to_string(),
                content: export_manifest("CALCIUM NITRATE"),
            },
            Attachment {
                filename: "c.txt".to_string(),
                content: export_manifest("MAGNESIUM NITRATE HEXAHYDRATE"),
            },
        ]);

        let outcome = scanner.scan(&mail);
        assert_eq!(outcome.manifest_attachment.as_deref(), Some("b.txt"));
        assert_eq!(outcome.container_count(), 1);
    }

    #[test]
    fn test_from_rfc822() {
        let raw = b"From: Agent <agent@example.com>\r\n\
Subject: Manifest VOY 001\r\n\
Message-ID: <1@example.com>\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n\
\r\n\
--XYZ\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Manifest attached.\r\n\
--XYZ\r\n\
Content-Type: text/plain; name=\"VOY001.txt\"\r\n\
Content-Disposition: attachment; filename=\"VOY001.txt\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
MDBOQ0xDT05UQUlORVIgTElTVAo=\r\n\
--XYZ--\r\n";

        let mail = InboundMail::from_rfc822("7", raw).unwrap();

        assert_eq!(mail.uid, "7");
        assert_eq!(mail.subject, "Manifest VOY 001");
        assert_eq!(mail.sender_address(), "agent@example.com");
        assert!(mail.body.contains("Manifest attached."));
        assert_eq!(mail.attachments.len(), 1);
        assert_eq!(mail.attachments[0].filename, "VOY001.txt");
        assert_eq!(mail.attachments[0].content, b"00NCLCONTAINER LIST\n".to_vec());
    }
}
