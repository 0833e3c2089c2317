use crate::keywords::KeywordSet;
use crate::manifest::ContainerRecord;
use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const REPORT_HEADERS: [&str; 4] = ["提单号", "箱号", "英文货名", "中文货名"];

/// One report line: bill of lading, container, English goods, Chinese goods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub bill_of_lading: String,
    pub container_number: String,
    pub english_goods_description: String,
    pub chinese_goods_description: String,
}

impl From<&ContainerRecord> for ReportRow {
    fn from(record: &ContainerRecord) -> Self {
        Self {
            bill_of_lading: record.bill_of_lading_display().to_string(),
            container_number: record.container_number.clone(),
            english_goods_description: record.english_goods_display().to_string(),
            chinese_goods_description: record.chinese_goods_description.clone(),
        }
    }
}

impl ReportRow {
    fn columns(&self) -> [&str; 4] {
        [
            self.bill_of_lading.as_str(),
            self.container_number.as_str(),
            self.english_goods_description.as_str(),
            self.chinese_goods_description.as_str(),
        ]
    }
}

/// `<prefix><source file stem>.csv`, the name a report for `source_name` is
/// written under.
pub fn report_file_name(prefix: &str, source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "manifest".to_string());
    format!("{prefix}{stem}.csv")
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line(columns: &[&str]) -> String {
    let mut line = columns
        .iter()
        .map(|c| csv_field(c))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

pub fn render_csv(records: &[ContainerRecord]) -> String {
    let mut csv = csv_line(&REPORT_HEADERS);
    for record in records {
        csv.push_str(&csv_line(&ReportRow::from(record).columns()));
    }
    csv
}

pub fn render_json(records: &[ContainerRecord]) -> anyhow::Result<String> {
    let rows: Vec<ReportRow> = records.iter().map(ReportRow::from).collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

const TABLE_WIDTHS: [usize; 3] = [18, 13, 32];

/// Terminal columns taken by `text`. CJK and fullwidth characters occupy two.
fn display_width(text: &str) -> usize {
    text.chars()
        .map(|c| match c as u32 {
            0x1100..=0x115F
            | 0x2E80..=0x303E
            | 0x3041..=0x33FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xA000..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6 => 2,
            _ => 1,
        })
        .sum()
}

fn pad_to(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(display_width(text));
    format!("{text}{} ", " ".repeat(padding))
}

fn table_line(columns: [&str; 4]) -> String {
    let mut line = String::new();
    for (column, width) in columns.iter().zip(TABLE_WIDTHS) {
        line.push_str(&pad_to(column, width));
    }
    line.push_str(columns[3]);
    line.push('\n');
    line
}

/// Plain-text table for the terminal.
pub fn render_table(records: &[ContainerRecord]) -> String {
    let mut table = table_line(REPORT_HEADERS);
    for record in records {
        table.push_str(&table_line(ReportRow::from(record).columns()));
    }
    table
}

pub fn write_report<P: AsRef<Path>>(
    dir: P,
    file_name: &str,
    records: &[ContainerRecord],
) -> anyhow::Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create report directory: {}", dir.display()))?;

    let path = dir.join(file_name);
    std::fs::write(&path, render_csv(records))
        .with_context(|| format!("Failed to write report: {}", path.display()))?;

    log::info!(
        "Report written: {} ({} records)",
        path.display(),
        records.len()
    );
    Ok(path)
}

/// Matched containers per configured keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordSummary {
    pub counts: Vec<(String, usize)>,
}

impl KeywordSummary {
    /// A container counts once for every keyword its description matched.
    /// Keywords keep their configured order, including those with no matches.
    pub fn from_records(records: &[ContainerRecord], keywords: &KeywordSet) -> Self {
        let counts = keywords
            .iter()
            .map(|keyword| {
                let count = records
                    .iter()
                    .filter(|r| r.matched_keywords.contains(keyword))
                    .count();
                (keyword.clone(), count)
            })
            .collect();
        Self { counts }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }
}
