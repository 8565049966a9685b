//! Forensic analysis and multi-factor trust scoring for business document
//! verification. Consumes already-resolved OCR, registry, and merchant
//! inputs plus the raw document bytes, and produces a bounded score
//! breakdown, a PASS/REVIEW/FAIL decision, and a forensic audit report.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod verification;
