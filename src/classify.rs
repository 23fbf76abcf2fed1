//! Comparison of fresh fingerprints against the stored baseline.
//!
//! Every fresh fingerprint ends up in exactly one of three buckets:
//!
//! - **hit**: no baseline exists, or the stored checksum equals the fresh one
//!   (a timestamp-only change is not a mismatch)
//! - **miss**: the checksums differ; [`Miss::reason`] decides which side is
//!   authoritative by comparing modification times
//! - **error**: the baseline could not be read or decoded
//!
//! The classifier only reads the store. Persisting fresh records for
//! [`MissReason::PassedNewer`] misses is left to the caller, see
//! [`Classification::pending_writes`].

use crate::fingerprint::FileFingerprint;
use crate::storage::{FingerprintStore, decode_record};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Which side of a miss is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    /// The fresh file is at least as new as the stored record; the store
    /// should be updated to the fresh record
    PassedNewer,
    /// The stored record claims to be newer than the file on disk; the
    /// store is left untouched and the anomaly reported
    StoredNewer,
}

impl MissReason {
    /// Short label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PassedNewer => "need update",
            Self::StoredNewer => "time regression",
        }
    }
}

/// A fresh fingerprint whose checksum disagrees with the stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Miss {
    /// What the scan just observed
    pub fresh: FileFingerprint,
    /// What the store had recorded
    pub stored: FileFingerprint,
}

impl Miss {
    /// Ties go to the fresh record.
    #[must_use]
    pub const fn reason(&self) -> MissReason {
        if self.fresh.mod_time < self.stored.mod_time {
            MissReason::StoredNewer
        } else {
            MissReason::PassedNewer
        }
    }

    /// Path of the file that changed.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.fresh.path
    }
}

/// Why a file could not be classified.
#[derive(Debug)]
pub enum ClassifyError {
    /// The store could not be read for this path
    Lookup {
        /// Path being classified
        path: String,
        /// Store error
        source: anyhow::Error,
    },
    /// A stored value exists but is not a valid record for this path
    Decode {
        /// Path being classified
        path: String,
        /// Decode error
        source: anyhow::Error,
    },
}

impl ClassifyError {
    /// Path of the file that could not be classified.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Lookup { path, .. } | Self::Decode { path, .. } => path,
        }
    }

    /// Short description of the error category
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Lookup { .. } => "store lookup failed",
            Self::Decode { .. } => "stored record corrupt",
        }
    }
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lookup { path, source } | Self::Decode { path, source } => {
                write!(f, "{}: {}: {:#}", path, self.error_type(), source)
            }
        }
    }
}

impl std::error::Error for ClassifyError {}

/// Outcome of classifying a single fingerprint.
#[derive(Debug)]
pub enum Outcome {
    /// Content unchanged, or no baseline to compare against
    Hit(FileFingerprint),
    /// Content differs from the baseline
    Miss(Miss),
    /// The baseline could not be obtained
    Error(ClassifyError),
}

/// What to do with a stored value that does not decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorruptRecordPolicy {
    /// Report the file as a decode error
    #[default]
    Report,
    /// Treat the file as having no baseline (a hit)
    Rebaseline,
}

/// Classification of a whole scan, partitioned by outcome.
///
/// `hits.len() + misses.len() + errors.len()` always equals the number of
/// fingerprints classified.
#[derive(Debug, Default)]
pub struct Classification {
    /// Unchanged files and files without a baseline
    pub hits: Vec<FileFingerprint>,
    /// Files whose content differs from the baseline
    pub misses: Vec<Miss>,
    /// Files whose baseline could not be read
    pub errors: Vec<ClassifyError>,
    /// Indices into `hits` of files that had no usable stored record
    unbaselined: Vec<usize>,
}

impl Classification {
    /// Number of fingerprints accounted for.
    #[must_use]
    pub fn total(&self) -> usize {
        self.hits.len() + self.misses.len() + self.errors.len()
    }

    /// Fresh records that should replace the stored baseline, one per
    /// [`MissReason::PassedNewer`] miss.
    pub fn pending_writes(&self) -> impl Iterator<Item = &FileFingerprint> {
        self.misses
            .iter()
            .filter(|miss| miss.reason() == MissReason::PassedNewer)
            .map(|miss| &miss.fresh)
    }

    /// Hits that had no stored record to compare against.
    pub fn new_files(&self) -> impl Iterator<Item = &FileFingerprint> {
        self.unbaselined.iter().filter_map(|&i| self.hits.get(i))
    }

    /// Misses whose stored record is newer than the file on disk.
    pub fn regressions(&self) -> impl Iterator<Item = &Miss> {
        self.misses
            .iter()
            .filter(|miss| miss.reason() == MissReason::StoredNewer)
    }

    /// Files `outcome` into its bucket.
    fn push(&mut self, outcome: Outcome, had_baseline: bool) {
        match outcome {
            Outcome::Hit(fingerprint) => {
                if !had_baseline {
                    self.unbaselined.push(self.hits.len());
                }
                self.hits.push(fingerprint);
            }
            Outcome::Miss(miss) => self.misses.push(miss),
            Outcome::Error(err) => self.errors.push(err),
        }
    }
}

/// Compares fresh fingerprints against a read-only view of the store.
pub struct Classifier<'a, S: FingerprintStore + ?Sized> {
    /// Baseline source
    store: &'a S,
    /// Handling of undecodable stored values
    policy: CorruptRecordPolicy,
}

impl<'a, S: FingerprintStore + ?Sized> Classifier<'a, S> {
    /// Classifier reporting corrupt records as errors.
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            policy: CorruptRecordPolicy::default(),
        }
    }

    /// Sets the handling of undecodable stored values.
    #[must_use]
    pub fn with_policy(mut self, policy: CorruptRecordPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Classifies every fingerprint independently.
    pub fn classify<I>(&self, fresh: I) -> Classification
    where
        I: IntoIterator<Item = FileFingerprint>,
    {
        let mut classification = Classification::default();
        for fingerprint in fresh {
            let (outcome, had_baseline) = self.evaluate(fingerprint);
            classification.push(outcome, had_baseline);
        }

        info!(
            hits = classification.hits.len(),
            misses = classification.misses.len(),
            errors = classification.errors.len(),
            "classification finished"
        );
        classification
    }

    /// Classifies a single fingerprint against its stored baseline.
    pub fn classify_one(&self, fresh: FileFingerprint) -> Outcome {
        self.evaluate(fresh).0
    }

    /// Classifies `fresh` and reports whether a usable baseline existed.
    fn evaluate(&self, fresh: FileFingerprint) -> (Outcome, bool) {
        let stored = match self.baseline(&fresh.path) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(path = %fresh.path, error = %err, "could not classify");
                return (Outcome::Error(err), false);
            }
        };

        match stored {
            None => (Outcome::Hit(fresh), false),
            Some(stored) if stored.checksum == fresh.checksum => (Outcome::Hit(fresh), true),
            Some(stored) => {
                let miss = Miss { fresh, stored };
                debug!(path = %miss.path(), reason = miss.reason().label(), "miss");
                (Outcome::Miss(miss), true)
            }
        }
    }

    /// Reads and decodes the stored record for `path`.
    ///
    /// `Ok(None)` means there is no usable baseline.
    fn baseline(&self, path: &str) -> Result<Option<FileFingerprint>, ClassifyError> {
        let lookup = |source: anyhow::Error| ClassifyError::Lookup {
            path: path.to_string(),
            source,
        };

        if !self.store.has(path).map_err(lookup)? {
            return Ok(None);
        }
        let Some(bytes) = self.store.get(path).map_err(lookup)? else {
            return Ok(None);
        };

        let decoded = decode_record(&bytes).and_then(|record| {
            if record.path == path {
                Ok(record)
            } else {
                Err(anyhow::anyhow!(
                    "Stored record describes {} instead",
                    record.path
                ))
            }
        });

        match (decoded, self.policy) {
            (Ok(record), _) => Ok(Some(record)),
            (Err(source), CorruptRecordPolicy::Report) => Err(ClassifyError::Decode {
                path: path.to_string(),
                source,
            }),
            (Err(source), CorruptRecordPolicy::Rebaseline) => {
                warn!(path = %path, error = %format!("{source:#}"), "discarding corrupt stored record");
                Ok(None)
            }
        }
    }
}

/// Classifies `fresh` against `store` with the default policy.
pub fn classify<S, I>(fresh: I, store: &S) -> Classification
where
    S: FingerprintStore + ?Sized,
    I: IntoIterator<Item = FileFingerprint>,
{
    Classifier::new(store).classify(fresh)
}
