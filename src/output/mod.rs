//! Rendering of run results for a human operator.
//!
//! Reports are written to any [`Write`] so they can be captured in tests;
//! the binary passes stdout.

use crate::classify::{Miss, MissReason};
use crate::commands::check::RunReport;
use crate::utils::format_timestamp;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Verbosity level for report output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Only misses, errors and the summary.
    Quiet,
    /// Every section.
    #[default]
    Normal,
    /// Every section, plus timestamps on hits.
    Verbose,
}

/// What to include in a report.
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    /// Which sections to print
    pub verbosity: Verbosity,
    /// List each hit instead of just the heading
    pub show_hits: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            show_hits: true,
        }
    }
}

/// Writes the hits, misses and errors sections followed by a summary line.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn render(report: &RunReport, options: ReportOptions, out: &mut impl Write) -> io::Result<()> {
    let classification = &report.classification;
    let quiet = options.verbosity == Verbosity::Quiet;

    if !quiet {
        writeln!(out, "{}", "Hits".bold())?;
        if options.show_hits {
            for hit in &classification.hits {
                if options.verbosity == Verbosity::Verbose {
                    writeln!(
                        out,
                        "  {} {} {}",
                        hit.path,
                        hit.checksum.dimmed(),
                        format_timestamp(hit.mod_time).dimmed()
                    )?;
                } else {
                    writeln!(out, "  {} {}", hit.path, hit.checksum.dimmed())?;
                }
            }
        }
    }

    if !quiet || !classification.misses.is_empty() {
        writeln!(out, "{}", "Misses".bold())?;
        for miss in &classification.misses {
            render_miss(miss, out)?;
        }
    }

    let error_count = report.error_count();
    if !quiet || error_count > 0 {
        writeln!(out, "{}", "Errors".bold())?;
        for err in &report.scan_errors {
            writeln!(out, "  {} {}", "scan:".red(), err)?;
        }
        for err in &classification.errors {
            writeln!(out, "  {} {}", "classify:".red(), err)?;
        }
    }

    if !report.write_failures.is_empty() {
        writeln!(out, "{}", "Write failures".bold())?;
        for failure in &report.write_failures {
            writeln!(out, "  {} {:#}", failure.path.red(), failure.source)?;
        }
    }

    let regressions = classification.regressions().count();
    let updates = classification.misses.len() - regressions;
    writeln!(
        out,
        "{} files: {} unchanged, {} need update, {} time regression, {} errors",
        report.files_seen(),
        classification.hits.len(),
        updates,
        regressions,
        error_count
    )?;

    Ok(())
}

/// Writes one miss with both records.
fn render_miss(miss: &Miss, out: &mut impl Write) -> io::Result<()> {
    let reason = miss.reason();
    let label = match reason {
        MissReason::PassedNewer => reason.label().yellow(),
        MissReason::StoredNewer => reason.label().red().bold(),
    };

    writeln!(out, "  {}: {}", label, miss.path())?;
    writeln!(
        out,
        "      stored {} {}",
        miss.stored.checksum,
        format_timestamp(miss.stored.mod_time).dimmed()
    )?;
    writeln!(
        out,
        "      fresh  {} {}",
        miss.fresh.checksum,
        format_timestamp(miss.fresh.mod_time).dimmed()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Classification, ClassifyError};
    use crate::commands::check::WriteFailure;
    use crate::fingerprint::FileFingerprint;

    fn sample_report() -> RunReport {
        let mut classification = Classification::default();
        classification.hits = vec![FileFingerprint::new("same.txt", "aaaa", 0)];
        classification.misses = vec![
            Miss {
                fresh: FileFingerprint::new("edited.txt", "bbbb", 200),
                stored: FileFingerprint::new("edited.txt", "cccc", 100),
            },
            Miss {
                fresh: FileFingerprint::new("rewound.txt", "dddd", 50),
                stored: FileFingerprint::new("rewound.txt", "eeee", 100),
            },
        ];
        classification.errors = vec![ClassifyError::Lookup {
            path: "broken.txt".to_string(),
            source: anyhow::anyhow!("read failed"),
        }];
        RunReport {
            classification,
            scan_errors: Vec::new(),
            write_failures: vec![WriteFailure {
                path: "edited.txt".to_string(),
                source: anyhow::anyhow!("disk full"),
            }],
        }
    }

    fn render_to_string(report: &RunReport, options: ReportOptions) -> String {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        render(report, options, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_render_normal() {
        let text = render_to_string(&sample_report(), ReportOptions::default());

        assert!(text.contains("Hits\n  same.txt aaaa\n"));
        assert!(text.contains("need update: edited.txt"));
        assert!(text.contains("time regression: rewound.txt"));
        assert!(text.contains("classify: broken.txt: store lookup failed: read failed"));
        assert!(text.contains("Write failures\n  edited.txt disk full"));
        assert!(text.ends_with(
            "4 files: 1 unchanged, 1 need update, 1 time regression, 1 errors\n"
        ));
    }

    #[test]
    fn test_render_quiet_omits_hits() {
        let options = ReportOptions {
            verbosity: Verbosity::Quiet,
            show_hits: true,
        };
        let text = render_to_string(&sample_report(), options);

        assert!(!text.contains("Hits"));
        assert!(text.contains("Misses"));
        assert!(text.contains("Errors"));
    }

    #[test]
    fn test_render_quiet_clean_run_is_summary_only() {
        let mut classification = Classification::default();
        classification.hits = vec![FileFingerprint::new("a", "x", 1)];
        let report = RunReport {
            classification,
            scan_errors: Vec::new(),
            write_failures: Vec::new(),
        };
        let options = ReportOptions {
            verbosity: Verbosity::Quiet,
            show_hits: true,
        };

        let text = render_to_string(&report, options);
        assert_eq!(
            text,
            "1 files: 1 unchanged, 0 need update, 0 time regression, 0 errors\n"
        );
    }

    #[test]
    fn test_render_hides_hit_list() {
        let options = ReportOptions {
            verbosity: Verbosity::Normal,
            show_hits: false,
        };
        let text = render_to_string(&sample_report(), options);
        assert!(text.contains("Hits\nMisses"));
    }
}
