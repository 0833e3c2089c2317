use crate::keywords::{normalize_keyword, KeywordSet};
use crate::manifest::ParseSettings;
use crate::translation::{builtin_translation, builtin_translations, TranslationMap};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "manifest-scanner.yaml";

/// Which mailbox a message arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Import,
    Export,
}

impl Direction {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "import" | "进口" => Some(Direction::Import),
            "export" | "出口" => Some(Direction::Export),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Import => f.write_str("import"),
            Direction::Export => f.write_str("export"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub keywords: KeywordsConfig,
    #[serde(default)]
    pub keyword_translation: TranslationMap,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub reply: ReplyConfig,
}

/// Who replies are sent from and who is copied on them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplyConfig {
    #[serde(default)]
    pub import_mailbox: String,
    #[serde(default)]
    pub export_mailbox: String,
    #[serde(default)]
    pub import_recipients: Vec<String>,
    #[serde(default)]
    pub export_recipients: Vec<String>,
}

impl ReplyConfig {
    pub fn mailbox_for(&self, direction: Direction) -> &str {
        match direction {
            Direction::Import => &self.import_mailbox,
            Direction::Export => &self.export_mailbox,
        }
    }

    pub fn recipients_for(&self, direction: Direction) -> &[String] {
        match direction {
            Direction::Import => &self.import_recipients,
            Direction::Export => &self.export_recipients,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordsConfig {
    #[serde(default)]
    pub import: Vec<String>,
    #[serde(default)]
    pub export: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

fn default_output_dir() -> String {
    "reports".to_string()
}

fn default_file_prefix() -> String {
    "processed_".to_string()
}

impl ReportConfig {
    /// Where reports go: the command-line directory when given, else the
    /// configured one.
    pub fn resolve_output_dir<'a>(&'a self, cli_dir: Option<&'a str>) -> &'a str {
        cli_dir
            .map(str::trim)
            .filter(|dir| !dir.is_empty())
            .unwrap_or(self.output_dir.as_str())
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let keywords = vec![
            "Calcium Nitrate".to_string(),
            "Calcium Nitrate Tetrahydrate".to_string(),
            "Magnesium Nitrate Hexahydrate".to_string(),
        ];

        Config {
            keywords: KeywordsConfig {
                import: keywords.clone(),
                export: keywords,
            },
            keyword_translation: builtin_translations(),
            report: ReportConfig::default(),
            reply: ReplyConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Loads the configuration, filling in translations for keywords that
    /// have none. A missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let mut config = Self::from_file(path)?;
            let added = config.ensure_keyword_translations();
            if added > 0 {
                log::info!(
                    "Added {added} missing keyword translations to configuration from {}",
                    path.display()
                );
            }
            Ok(config)
        } else {
            log::warn!(
                "Configuration file '{}' not found, using default configuration",
                path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn keywords_for(&self, direction: Direction) -> &[String] {
        match direction {
            Direction::Import => &self.keywords.import,
            Direction::Export => &self.keywords.export,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for direction in [Direction::Import, Direction::Export] {
            let mut seen = HashSet::new();
            for keyword in self.keywords_for(direction) {
                let normalized = normalize_keyword(keyword);
                if normalized.is_empty() {
                    anyhow::bail!("Blank {direction} keyword in configuration");
                }
                if !seen.insert(normalized) {
                    anyhow::bail!("Duplicate {direction} keyword: '{keyword}'");
                }
            }
        }

        for (keyword, translated) in self.keyword_translation.iter() {
            if translated.trim().is_empty() {
                anyhow::bail!("Empty translation for keyword '{keyword}'");
            }
        }

        Ok(())
    }

    /// Adds a translation for every keyword that lacks one: the built-in name
    /// when known, otherwise the keyword itself so report columns are never blank.
    pub fn ensure_keyword_translations(&mut self) -> usize {
        let mut added = 0;
        let keywords: Vec<String> = self
            .keywords
            .import
            .iter()
            .chain(self.keywords.export.iter())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        for keyword in keywords {
            if self.keyword_translation.contains(&keyword) {
                continue;
            }
            let translated = builtin_translation(&keyword)
                .map(str::to_string)
                .unwrap_or_else(|| keyword.clone());
            log::debug!("Adding translation for keyword '{keyword}': {translated}");
            self.keyword_translation.insert(keyword, translated);
            added += 1;
        }

        added
    }

    pub fn parse_settings(&self, direction: Direction) -> ParseSettings {
        ParseSettings::new(
            KeywordSet::new(self.keywords_for(direction).iter().cloned()),
            self.keyword_translation.clone(),
        )
    }
}
