use std::collections::HashMap;

use tracing::debug;

use crate::error::MuxError;
use crate::report::diagnostic::{
    MergedDiagnostic, MergedFileRecord, RawDiagnostic, RawFileResult, Severity,
};
use crate::report::identity::IdentityPolicy;

/// Resolved settings the merge pass runs with
#[derive(Debug, Clone, Default)]
pub struct MergeConfig {
    /// How raw paths are grouped into files
    pub identity: IdentityPolicy,
    /// Minimum ratio of diagnostic occurrence to file occurrence (0 disables)
    pub threshold: f64,
    /// Drop diagnostics under the threshold instead of only flagging them
    pub hide_below_threshold: bool,
}

impl MergeConfig {
    /// A diagnostic seen `occurrence` times in a file seen `file_occurrence` times
    pub fn is_below_threshold(&self, occurrence: usize, file_occurrence: usize) -> bool {
        (occurrence as f64) < self.threshold * file_occurrence as f64
    }

    /// Threshold 1 always hides; any other non-zero threshold only with hiding enabled
    fn filters(&self) -> bool {
        self.threshold > 0.0 && (self.threshold == 1.0 || self.hide_below_threshold)
    }
}

/// Candidate bucket for the equality check. End positions are compared
/// separately because a missing end matches any end.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CandidateKey {
    rule_id: Option<String>,
    severity: Severity,
    line: Option<u32>,
    column: Option<u32>,
}

impl CandidateKey {
    fn of(d: &RawDiagnostic) -> Self {
        CandidateKey {
            rule_id: d.rule_id.clone(),
            severity: d.severity,
            line: d.line,
            column: d.column,
        }
    }
}

/// End positions agree when the incoming one is unspecified or identical
fn same_end(existing: &RawDiagnostic, incoming: &RawDiagnostic) -> bool {
    incoming
        .specified_end_line()
        .is_none_or(|l| existing.end_line == Some(l))
        && incoming
            .specified_end_column()
            .is_none_or(|c| existing.end_column == Some(c))
}

struct FileAccumulator {
    key: String,
    occurrence: usize,
    messages: Vec<MergedDiagnostic>,
    /// Indices into `messages`, in insertion order
    candidates: HashMap<CandidateKey, Vec<usize>>,
}

impl FileAccumulator {
    fn new(key: String) -> Self {
        FileAccumulator {
            key,
            occurrence: 0,
            messages: Vec::new(),
            candidates: HashMap::new(),
        }
    }

    fn absorb(&mut self, result: &RawFileResult) {
        self.occurrence += 1;

        for diagnostic in &result.messages {
            let bucket = self.candidates.entry(CandidateKey::of(diagnostic)).or_default();
            let existing = bucket
                .iter()
                .copied()
                .find(|&i| same_end(&self.messages[i].diagnostic, diagnostic));

            match existing {
                Some(i) => self.messages[i].occurrence += 1,
                None => {
                    bucket.push(self.messages.len());
                    self.messages.push(MergedDiagnostic {
                        id: MergedDiagnostic::generate_id(
                            diagnostic.rule_id.as_deref(),
                            &self.key,
                            diagnostic.line,
                            diagnostic.column,
                        ),
                        diagnostic: diagnostic.clone(),
                        occurrence: 1,
                        below_threshold: false,
                        file_source: result.source.clone(),
                        source_file: result.file_path.clone(),
                    });
                }
            }
        }
    }

    fn finish(self, config: &MergeConfig) -> MergedFileRecord {
        let occurrence = self.occurrence;
        let mut messages = self.messages;

        if config.filters() {
            let before = messages.len();
            messages.retain(|m| !config.is_below_threshold(m.occurrence, occurrence));
            debug!(
                "{}: hid {} diagnostics below threshold {}",
                self.key,
                before - messages.len(),
                config.threshold
            );
        }

        let mut record = MergedFileRecord {
            file_path: self.key,
            occurrence,
            messages: Vec::new(),
            error_count: 0,
            warning_count: 0,
            fixable_error_count: 0,
            fixable_warning_count: 0,
        };

        for m in &mut messages {
            m.below_threshold = config.is_below_threshold(m.occurrence, occurrence);

            let fixable = m.diagnostic.is_fixable();
            match m.diagnostic.severity {
                Severity::Warning => {
                    record.warning_count += 1;
                    if fixable {
                        record.fixable_warning_count += 1;
                    }
                }
                Severity::Error => {
                    record.error_count += 1;
                    if fixable {
                        record.fixable_error_count += 1;
                    }
                }
                Severity::Other(_) => {}
            }
        }

        // Vec::sort_by_key is stable, ties keep insertion order.
        messages.sort_by_key(|m| {
            (
                m.diagnostic.line.unwrap_or(0),
                m.diagnostic.column.unwrap_or(0),
                m.occurrence,
            )
        });

        record.messages = messages;
        record
    }
}

/// Merge the results of independent lint runs into one record per canonical file.
///
/// Records come out in the order their keys were first seen. Any identity
/// resolution failure aborts the whole pass.
pub fn merge_results(
    results: &[RawFileResult],
    config: &MergeConfig,
) -> Result<Vec<MergedFileRecord>, MuxError> {
    let mut order: Vec<FileAccumulator> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for result in results {
        let key = config.identity.resolve(&result.file_path)?;
        let slot = match by_key.get(&key) {
            Some(&slot) => slot,
            None => {
                by_key.insert(key.clone(), order.len());
                order.push(FileAccumulator::new(key));
                order.len() - 1
            }
        };
        order[slot].absorb(result);
    }

    debug!(
        "Merged {} results into {} files ({} identity)",
        results.len(),
        order.len(),
        config.identity.name()
    );

    Ok(order.into_iter().map(|acc| acc.finish(config)).collect())
}
