use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Severity of a lint diagnostic, as the linter reports it (1 or 2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Severity {
    Warning,
    Error,
    /// Any other level (e.g. 0 for "off"). Kept for passthrough, never counted.
    Other(u8),
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Other(_) => "other",
        }
    }
}

impl From<u8> for Severity {
    fn from(value: u8) -> Self {
        match value {
            1 => Severity::Warning,
            2 => Severity::Error,
            n => Severity::Other(n),
        }
    }
}

impl From<Severity> for u8 {
    fn from(value: Severity) -> Self {
        match value {
            Severity::Warning => 1,
            Severity::Error => 2,
            Severity::Other(n) => n,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One issue reported by one lint run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDiagnostic {
    /// Rule that fired; null for parse errors
    #[serde(default)]
    pub rule_id: Option<String>,

    pub severity: Severity,

    /// Starting line (1-based)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    /// Starting column (1-based)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,

    pub message: String,

    /// Autofix payload; only its presence matters for counting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatal: Option<bool>,

    /// Fields this tool does not interpret, kept for passthrough
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawDiagnostic {
    pub fn is_fixable(&self) -> bool {
        self.fix.is_some()
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal.unwrap_or(false)
    }

    /// End line, treating 0 as "not reported"
    pub fn specified_end_line(&self) -> Option<u32> {
        self.end_line.filter(|&l| l != 0)
    }

    /// End column, treating 0 as "not reported"
    pub fn specified_end_column(&self) -> Option<u32> {
        self.end_column.filter(|&c| c != 0)
    }
}

/// One lint run's output for one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFileResult {
    /// Path as reported by the run; may be relative or absolute
    pub file_path: String,

    pub messages: Vec<RawDiagnostic>,

    #[serde(default)]
    pub error_count: usize,

    #[serde(default)]
    pub warning_count: usize,

    #[serde(default)]
    pub fixable_error_count: usize,

    #[serde(default)]
    pub fixable_warning_count: usize,

    /// Snapshot of the file contents at lint time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A diagnostic after merging equal occurrences across runs
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedDiagnostic {
    /// Deterministic ID (hash-based) e.g. "LMX-a1b2c3d4"
    pub id: String,

    /// Payload of the first occurrence
    #[serde(flatten)]
    pub diagnostic: RawDiagnostic,

    /// Number of raw diagnostics judged equal to this one
    pub occurrence: usize,

    /// Occurrence ratio is under the configured visibility threshold
    pub below_threshold: bool,

    /// File snapshot from the first occurrence's run, for source context
    #[serde(skip)]
    pub file_source: Option<String>,

    /// Raw path of the first occurrence
    pub source_file: String,
}

impl MergedDiagnostic {
    /// Generate a deterministic ID based on rule, canonical file key, and location
    pub fn generate_id(
        rule_id: Option<&str>,
        file_key: &str,
        line: Option<u32>,
        column: Option<u32>,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(rule_id.unwrap_or("").as_bytes());
        hasher.update(file_key.as_bytes());
        hasher.update(line.unwrap_or(0).to_string().as_bytes());
        hasher.update(b":");
        hasher.update(column.unwrap_or(0).to_string().as_bytes());
        let result = hasher.finalize();
        let hex = format!("{:x}", result);
        format!("LMX-{}", &hex[..8])
    }
}

/// All runs' results for one canonical file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedFileRecord {
    /// Canonical file key
    pub file_path: String,

    /// Number of raw results grouped under this key
    pub occurrence: usize,

    /// Sorted by line, column, then occurrence
    pub messages: Vec<MergedDiagnostic>,

    pub error_count: usize,
    pub warning_count: usize,
    pub fixable_error_count: usize,
    pub fixable_warning_count: usize,
}

impl MergedFileRecord {
    pub fn problem_count(&self) -> usize {
        self.error_count + self.warning_count
    }
}

/// Totals across every file of a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeTotals {
    pub files: usize,
    pub errors: usize,
    pub warnings: usize,
    pub fixable_errors: usize,
    pub fixable_warnings: usize,
}

impl MergeTotals {
    pub fn from_records(records: &[MergedFileRecord]) -> Self {
        let mut totals = MergeTotals {
            files: records.len(),
            ..Default::default()
        };
        for r in records {
            totals.errors += r.error_count;
            totals.warnings += r.warning_count;
            totals.fixable_errors += r.fixable_error_count;
            totals.fixable_warnings += r.fixable_warning_count;
        }
        totals
    }

    /// Sum the per-run rollups of unmerged results (passthrough mode)
    pub fn from_raw(results: &[RawFileResult]) -> Self {
        let mut totals = MergeTotals {
            files: results.len(),
            ..Default::default()
        };
        for r in results {
            totals.errors += r.error_count;
            totals.warnings += r.warning_count;
            totals.fixable_errors += r.fixable_error_count;
            totals.fixable_warnings += r.fixable_warning_count;
        }
        totals
    }

    pub fn problems(&self) -> usize {
        self.errors + self.warnings
    }
}

/// The complete merged report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// lintmux version
    pub version: String,

    /// When the merge was performed
    pub timestamp: String,

    /// Number of raw results merged
    pub inputs: usize,

    pub totals: MergeTotals,

    /// Merged files, in the order they were first seen
    pub files: Vec<MergedFileRecord>,
}
