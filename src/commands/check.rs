use crate::SaveContext;
use crate::classify::{Classification, Classifier};
use crate::fingerprint::FileFingerprint;
use crate::output::{self, ReportOptions};
use crate::scanner::{ScanError, Scanner};
use crate::storage::{FingerprintStore, RedbStore, persist};
use anyhow::{Context, Result};
use tracing::{info, warn};

/// A baseline that could not be persisted.
///
/// The next run sees the same mismatch again.
#[derive(Debug)]
pub struct WriteFailure {
    /// Store key that was not written
    pub path: String,
    /// Store error
    pub source: anyhow::Error,
}

/// Everything one run produced, ready for the reporter.
#[derive(Debug)]
pub struct RunReport {
    /// Outcome of every fingerprinted file
    pub classification: Classification,
    /// Files that could not be fingerprinted
    pub scan_errors: Vec<ScanError>,
    /// Baselines that could not be persisted
    pub write_failures: Vec<WriteFailure>,
}

impl RunReport {
    /// Files encountered by the scan, whether or not they could be read.
    #[must_use]
    pub fn files_seen(&self) -> usize {
        self.classification.total() + self.scan_errors.len()
    }

    /// Per-file errors from scanning and classification.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.scan_errors.len() + self.classification.errors.len()
    }
}

/// Scans the working root, opens the store and reports the result to stdout.
///
/// # Errors
///
/// Returns an error if:
/// - The working root cannot be scanned
/// - The store cannot be opened
/// - The report cannot be written
pub fn execute(ctx: &SaveContext) -> Result<RunReport> {
    let scanner = Scanner::new(ctx.root.clone(), ctx.scan_options());
    let scan = scanner.scan()?;

    let mut store = RedbStore::open(&ctx.store_path)
        .with_context(|| format!("Cannot open store: {}", ctx.store_path.display()))?;

    let report = check(ctx, scan.fingerprints, scan.errors, &mut store);

    let options = ReportOptions {
        verbosity: ctx.config.output.verbosity,
        show_hits: ctx.config.output.show_hits,
    };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    output::render(&report, options, &mut out).context("Failed to write report")?;

    Ok(report)
}

/// Classifies scanned fingerprints against `store` and persists updates.
pub fn check<S: FingerprintStore + ?Sized>(
    ctx: &SaveContext,
    fingerprints: Vec<FileFingerprint>,
    scan_errors: Vec<ScanError>,
    store: &mut S,
) -> RunReport {
    let classification = Classifier::new(&*store)
        .with_policy(ctx.config.classify.on_corrupt_record)
        .classify(fingerprints);

    for miss in classification.regressions() {
        warn!(
            path = %miss.path(),
            stored_mod_time = miss.stored.mod_time,
            fresh_mod_time = miss.fresh.mod_time,
            "stored record is newer than file on disk, leaving store untouched"
        );
    }

    let mut write_failures = apply_updates(store, &classification);
    if ctx.config.store.record_new_files {
        write_failures.extend(record_new_files(store, &classification));
    }

    RunReport {
        classification,
        scan_errors,
        write_failures,
    }
}

/// Persists the fresh record of every `PassedNewer` miss.
///
/// Failures are logged and returned; they never stop the remaining writes.
pub fn apply_updates<S: FingerprintStore + ?Sized>(
    store: &mut S,
    classification: &Classification,
) -> Vec<WriteFailure> {
    persist_all(store, classification.pending_writes(), "updated baseline")
}

/// Persists a first baseline for every hit that had no stored record.
pub fn record_new_files<S: FingerprintStore + ?Sized>(
    store: &mut S,
    classification: &Classification,
) -> Vec<WriteFailure> {
    persist_all(store, classification.new_files(), "recorded new baseline")
}

/// Persists every record in `records`, collecting failures.
fn persist_all<'a, S: FingerprintStore + ?Sized>(
    store: &mut S,
    records: impl Iterator<Item = &'a FileFingerprint>,
    action: &str,
) -> Vec<WriteFailure> {
    let mut failures = Vec::new();

    for record in records {
        match persist(store, record) {
            Ok(()) => info!(path = %record.path, checksum = %record.checksum, "{action}"),
            Err(source) => {
                warn!(path = %record.path, error = %format!("{source:#}"), "failed to write baseline");
                failures.push(WriteFailure {
                    path: record.path.clone(),
                    source,
                });
            }
        }
    }

    failures
}
