use super::{char_len, split_lines, ManifestKind};

/// Header token written at the top of export container lists.
pub const EXPORT_HEADER_MARKER: &str = "00NCLCONTAINER LIST";
/// Summary token written at the top of import cargo reports.
pub const IMPORT_HEADER_MARKER: &str = "00:IFCSUM:";

/// Record codes that open colon-delimited import lines.
pub const IMPORT_RECORD_PREFIXES: [&str; 12] = [
    "00:", "10:", "11:", "12:", "13:", "16:", "17:", "18:", "41:", "44:", "47:", "51:",
];

const SAMPLE_CHARS: usize = 500;
const COLON_SCAN_LINES: usize = 20;
const MIN_COLONS_PER_LINE: usize = 5;
const MIN_COLON_LINES: usize = 3;
const PREFIX_SCAN_LINES: usize = 30;
const MIN_PREFIX_LINES: usize = 5;
const PAIR_SCAN_LINES: usize = 20;
const MIN_DETAIL_LEN: usize = 13;
const MIN_DESCRIPTION_LEN: usize = 43;

/// Decides which fixed-width dialect a manifest is written in.
///
/// Checks run first-match-wins: header markers in the leading sample, then the
/// colon density and record prefixes typical of import reports, and finally the
/// 51/53 line pairs of export lists.
pub struct FormatClassifier;

impl FormatClassifier {
    pub fn classify(text: &str) -> ManifestKind {
        if text.is_empty() {
            log::info!("Empty manifest text, not classified");
            return ManifestKind::Unrecognized;
        }

        let sample: String = text.chars().take(SAMPLE_CHARS).collect();

        if sample.contains(EXPORT_HEADER_MARKER) {
            log::info!("Export manifest detected: starts with {EXPORT_HEADER_MARKER}");
            return ManifestKind::Export;
        }

        if sample.contains(IMPORT_HEADER_MARKER) {
            log::info!("Import manifest detected: starts with {IMPORT_HEADER_MARKER}");
            return ManifestKind::Import;
        }

        let colon_lines = Self::count_colon_heavy_lines(text);
        if colon_lines >= MIN_COLON_LINES {
            log::info!("Import manifest detected: {colon_lines} colon-delimited lines");
            return ManifestKind::Import;
        }

        let prefixed_lines = Self::count_import_prefixed_lines(text);
        if prefixed_lines >= MIN_PREFIX_LINES {
            log::info!("Import manifest detected: {prefixed_lines} import record lines");
            return ManifestKind::Import;
        }

        let (has_detail, has_description) = Self::find_export_pair(text);
        if has_detail && has_description {
            log::info!("Export manifest detected: paired 51 and 53 lines");
            return ManifestKind::Export;
        }
        if has_detail {
            // Possibly a reduced export layout without description lines.
            log::info!("Found a 51 line without any 53 line, treating as export");
            return ManifestKind::Export;
        }

        log::info!("Manifest format not recognized");
        ManifestKind::Unrecognized
    }

    fn count_colon_heavy_lines(text: &str) -> usize {
        split_lines(text)
            .take(COLON_SCAN_LINES)
            .filter(|line| line.matches(':').count() >= MIN_COLONS_PER_LINE)
            .count()
    }

    fn count_import_prefixed_lines(text: &str) -> usize {
        split_lines(text)
            .take(PREFIX_SCAN_LINES)
            .filter(|line| {
                IMPORT_RECORD_PREFIXES
                    .iter()
                    .any(|prefix| line.starts_with(prefix))
            })
            .count()
    }

    fn find_export_pair(text: &str) -> (bool, bool) {
        let mut has_detail = false;
        let mut has_description = false;

        for line in split_lines(text).take(PAIR_SCAN_LINES) {
            if line.starts_with("51") && char_len(line) >= MIN_DETAIL_LEN {
                if !line.contains(':') {
                    has_detail = true;
                }
            } else if line.starts_with("53") && char_len(line) >= MIN_DESCRIPTION_LEN {
                has_description = true;
            }
        }

        (has_detail, has_description)
    }
}
