//! Input loaders that map requirement exports onto domain records
//!
//! Architecture: Anti-Corruption Layer - tool exports are translated before they reach the engine
//! - CSV headers are normalized and matched against configurable column aliases
//! - JSON arrays stay loosely typed so the analyzer can isolate malformed entries
//! - Every load remembers the SHA-256 digest of the bytes it read

pub mod csv;

use crate::config::InputConfig;
use crate::domain::errors::{LintError, LintResult};
use crate::domain::requirements::{RequirementBuilder, RequirementRecord};
use crate::report::REPORT_BASENAME;
use self::csv::CsvTable;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Supported input file kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Csv,
    Json,
}

impl InputKind {
    /// Determine the kind from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Records read from one file
#[derive(Debug, Clone)]
pub enum LoadedRecords {
    /// Rows already mapped and validated
    Typed(Vec<RequirementRecord>),
    /// Representations still to be validated, one per array element
    Raw(Vec<Value>),
}

impl LoadedRecords {
    pub fn len(&self) -> usize {
        match self {
            Self::Typed(records) => records.len(),
            Self::Raw(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of loading one input file
#[derive(Debug, Clone)]
pub struct LoadedInput {
    pub path: PathBuf,
    pub records: LoadedRecords,
    /// Rows dropped because they had neither title nor text
    pub skipped_rows: usize,
    /// Hex SHA-256 of the file contents
    pub digest: String,
}

/// Loads requirement files according to the input configuration
#[derive(Debug, Clone)]
pub struct RequirementLoader {
    config: InputConfig,
}

impl RequirementLoader {
    pub fn new(config: InputConfig) -> Self {
        Self { config }
    }

    /// Load a single file, choosing the format from its extension
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> LintResult<LoadedInput> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(LintError::input(path, "Input file not found"));
        }

        let kind = InputKind::from_path(path).ok_or_else(|| {
            LintError::input(path, "Unsupported input format (expected .csv or .json)")
        })?;

        let bytes = fs::read(path)?;
        let digest = digest_bytes(&bytes);
        let content = String::from_utf8(bytes)
            .map_err(|e| LintError::input(path, format!("Input is not valid UTF-8: {e}")))?;

        let (records, skipped_rows) = match kind {
            InputKind::Csv => {
                let (records, skipped) = self.parse_csv(path, &content)?;
                (LoadedRecords::Typed(records), skipped)
            }
            InputKind::Json => (LoadedRecords::Raw(parse_json(path, &content)?), 0),
        };

        tracing::info!(
            "Loaded {} record(s) from {} ({} skipped)",
            records.len(),
            path.display(),
            skipped_rows
        );

        Ok(LoadedInput {
            path: path.to_path_buf(),
            records,
            skipped_rows,
            digest,
        })
    }

    /// Load files and directories; directories contribute their CSV/JSON files in sorted order
    pub fn load_paths<P: AsRef<Path>>(&self, paths: &[P]) -> LintResult<Vec<LoadedInput>> {
        let mut loaded = Vec::new();

        for path in paths {
            let path = path.as_ref();
            if path.is_dir() {
                // Files found by the walk are best-effort; only named files are fatal
                for file in discover_files(path)? {
                    match self.load_file(&file) {
                        Ok(input) => loaded.push(input),
                        Err(e) => tracing::warn!("Skipping {}: {}", file.display(), e),
                    }
                }
            } else {
                loaded.push(self.load_file(path)?);
            }
        }

        Ok(loaded)
    }

    /// Map CSV content onto records, returning them with the number of skipped rows
    pub fn parse_csv(
        &self,
        path: &Path,
        content: &str,
    ) -> LintResult<(Vec<RequirementRecord>, usize)> {
        let table = CsvTable::parse(content).map_err(|e| LintError::input(path, e.to_string()))?;

        let mut records = Vec::new();
        let mut skipped = 0;

        for (index, pairs) in table.pairs().enumerate() {
            let row_number = index + 1;
            let row: HashMap<String, &str> = pairs
                .into_iter()
                .map(|(header, value)| (header.trim().to_lowercase(), value.trim()))
                .collect();

            match self.map_row(&row, row_number) {
                Some(builder) => {
                    let record = builder.build().map_err(|e| {
                        LintError::input(path, format!("Invalid requirement at row {row_number}: {e}"))
                    })?;
                    records.push(record);
                }
                None => {
                    tracing::warn!(
                        "Row {}: empty requirement (no title/text) -> skipped",
                        row_number
                    );
                    skipped += 1;
                }
            }
        }

        Ok((records, skipped))
    }

    fn map_row(
        &self,
        row: &HashMap<String, &str>,
        row_number: usize,
    ) -> Option<RequirementBuilder> {
        let cfg = &self.config;
        let system = pick_or_empty(row, &cfg.system_columns);
        let component = pick_or_empty(row, &cfg.component_columns);
        let priority = pick_or_empty(row, &cfg.priority_columns);
        let text = pick_or_empty(row, &cfg.text_columns);

        let title = match pick_first(row, &cfg.title_columns) {
            Some(title) => title,
            None => [system.as_str(), component.as_str(), priority.as_str()]
                .iter()
                .filter(|part| !part.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" / "),
        };

        if title.is_empty() && text.is_empty() {
            return None;
        }

        let id = pick_first(row, &cfg.id_columns).unwrap_or_else(|| format!("REQ-{row_number:03}"));
        let source = pick_first(row, &cfg.source_columns).unwrap_or_else(|| cfg.default_source.clone());

        Some(
            RequirementRecord::builder(id)
                .title(title)
                .text(text)
                .source(source)
                .system(system)
                .component(component)
                .priority(priority)
                .rationale(pick_or_empty(row, &cfg.rationale_columns))
                .verification_method(pick_or_empty(row, &cfg.verification_columns))
                .acceptance_criteria(pick_or_empty(row, &cfg.acceptance_columns)),
        )
    }
}

impl Default for RequirementLoader {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}

/// First non-empty value among the alias columns
fn pick_first(row: &HashMap<String, &str>, aliases: &[String]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|alias| row.get(&alias.trim().to_lowercase()))
        .find(|value| !value.is_empty())
        .map(|value| value.to_string())
}

fn pick_or_empty(row: &HashMap<String, &str>, aliases: &[String]) -> String {
    pick_first(row, aliases).unwrap_or_default()
}

fn parse_json(path: &Path, content: &str) -> LintResult<Vec<Value>> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| LintError::input(path, format!("Invalid JSON: {e}")))?;

    match value {
        Value::Array(items) => Ok(items),
        _ => Err(LintError::input(
            path,
            "Expected a JSON array of requirement records",
        )),
    }
}

/// CSV and JSON files under `root`, sorted by path; our own report files are left out
pub fn discover_files(root: &Path) -> LintResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| LintError::input(root, format!("Failed to walk directory: {e}")))?;
        let path = entry.path();
        if !entry.file_type().is_file() || InputKind::from_path(path).is_none() {
            continue;
        }
        if is_report_file(path) {
            tracing::debug!("Ignoring report file {}", path.display());
            continue;
        }
        files.push(entry.into_path());
    }

    files.sort();
    Ok(files)
}

fn is_report_file(path: &Path) -> bool {
    path.file_stem().and_then(|stem| stem.to_str()) == Some(REPORT_BASENAME)
}

/// Lower-case hex SHA-256
pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DEMO_CSV: &str = "\u{feff}req_id,system,component,priority,source,requirement_text,rationale,verification_method,acceptance_criteria
REQ-001,Rolling stock,Brakes,High,doors,\"The braking system shall stop the train within 800 m.\",Safety,Test,\"Stopping distance over 10 runs is at most 800 m.\"
,,,,,,,,
,Signalling,,Low,,The system should be fast.,,,
";

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_csv_mapping() {
        let loader = RequirementLoader::default();
        let (records, skipped) = loader.parse_csv(Path::new("demo.csv"), DEMO_CSV).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(skipped, 1);

        let first = &records[0];
        assert_eq!(first.id(), "REQ-001");
        assert_eq!(first.title(), "Rolling stock / Brakes / High");
        assert_eq!(first.source(), "doors");
        assert_eq!(first.verification_method(), "Test");

        let second = &records[1];
        assert_eq!(second.id(), "REQ-003");
        assert_eq!(second.title(), "Signalling / Low");
        assert_eq!(second.source(), "demo");
        assert!(second.acceptance_criteria().is_empty());
    }

    #[test]
    fn test_csv_header_normalization_and_aliases() {
        let content = " ID ,Summary,Description,AC\nR-9,Logging,,Audit log retained 90 days.\n";
        let loader = RequirementLoader::default();
        let (records, _) = loader.parse_csv(Path::new("legacy.csv"), content).unwrap();

        assert_eq!(records[0].id(), "R-9");
        assert_eq!(records[0].title(), "Logging");
        assert!(records[0].text().is_empty());
        assert_eq!(records[0].acceptance_criteria(), "Audit log retained 90 days.");
    }

    #[test]
    fn test_csv_errors_are_input_errors() {
        let loader = RequirementLoader::default();
        let err = loader.parse_csv(Path::new("empty.csv"), "").unwrap_err();
        assert!(matches!(err, LintError::Input { .. }));
        assert!(err.to_string().contains("no header row"));
    }

    #[test]
    fn test_load_file_and_digest() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "reqs.csv", DEMO_CSV);

        let loaded = RequirementLoader::default().load_file(&path).unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.skipped_rows, 1);
        assert_eq!(loaded.digest, digest_bytes(DEMO_CSV.as_bytes()));
        assert_eq!(loaded.digest.len(), 64);
    }

    #[test]
    fn test_load_json_keeps_raw_values() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "reqs.json", r#"[{"id": "REQ-1", "text": "x"}, 7]"#);

        let loaded = RequirementLoader::default().load_file(&path).unwrap();
        match loaded.records {
            LoadedRecords::Raw(values) => assert_eq!(values.len(), 2),
            LoadedRecords::Typed(_) => panic!("JSON input should stay raw"),
        }

        let object = write(&dir, "single.json", r#"{"id": "REQ-1"}"#);
        assert!(RequirementLoader::default().load_file(&object).is_err());
    }

    #[test]
    fn test_missing_and_unsupported_files() {
        let dir = TempDir::new().unwrap();
        let loader = RequirementLoader::default();

        assert!(loader.load_file(dir.path().join("absent.csv")).is_err());
        let txt = write(&dir, "notes.txt", "hello");
        let err = loader.load_file(&txt).unwrap_err();
        assert!(err.to_string().contains("Unsupported input format"));
    }

    #[test]
    fn test_load_directory_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        write(&dir, "b.csv", "id,text\nB-1,The fan shall spin.\n");
        write(&dir, "nested/a.json", r#"[{"id": "A-1", "text": "The lamp shall glow."}]"#);
        write(&dir, "readme.md", "ignored");

        let loaded = RequirementLoader::default().load_paths(&[dir.path()]).unwrap();
        let names: Vec<_> = loaded
            .iter()
            .map(|l| l.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["b.csv", "a.json"]);
    }

    #[test]
    fn test_load_directory_skips_foreign_json() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("out")).unwrap();
        write(&dir, "reqs.csv", "id,text\nR-1,The pump shall start within 2 s.\n");
        write(&dir, "out/reqlint_report.json", r#"{"summary": {"total_requirements": 1}}"#);
        write(&dir, "out/reqlint_report.csv", "id,text\nR-1,The pump shall start within 2 s.\n");
        write(&dir, "package.json", r#"{"name": "tooling"}"#);
        write(&dir, "broken.json", "[{");

        let loaded = RequirementLoader::default().load_paths(&[dir.path()]).unwrap();

        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].path.ends_with("reqs.csv"));
    }

    #[test]
    fn test_named_file_errors_stay_fatal() {
        let dir = TempDir::new().unwrap();
        let object = write(&dir, "package.json", r#"{"name": "tooling"}"#);

        let err = RequirementLoader::default().load_paths(&[object]).unwrap_err();
        assert!(matches!(err, LintError::Input { .. }));
    }

    #[test]
    fn test_csv_keeps_inch_marks_and_every_row() {
        let content = "req_id,requirement_text,verification_method,acceptance_criteria
REQ-001,The panel shall have a 5\" display.,Inspection,Diagonal is 127 mm +/- 1 mm.
REQ-002,The system should be fast.,,
REQ-003,The bezel shall be 1\" wide.,Test,Width measured at 25.4 mm.
";
        let loader = RequirementLoader::default();
        let (records, skipped) = loader.parse_csv(Path::new("inch.csv"), content).unwrap();

        assert_eq!(skipped, 0);
        let ids: Vec<_> = records.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["REQ-001", "REQ-002", "REQ-003"]);
        assert_eq!(records[0].text(), "The panel shall have a 5\" display.");
        assert_eq!(records[0].verification_method(), "Inspection");
    }
}
