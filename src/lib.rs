pub mod config;
pub mod encoding;
pub mod keywords;
pub mod mail;
pub mod manifest;
pub mod report;
pub mod translation;

pub use config::{Config, Direction};
pub use keywords::{KeywordMatcher, KeywordSet};
pub use mail::{Attachment, InboundMail, MailScanOutcome, MailScanner};
pub use manifest::{ContainerRecord, ManifestKind, ManifestParser, ParseSettings};
pub use translation::{TranslationMap, TranslationResolver};
