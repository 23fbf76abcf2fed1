/// Scan, classify, persist and report
pub mod check;
