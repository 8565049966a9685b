//! Forensic check battery: independent tamper analyzers over an immutable
//! document snapshot, fanned out across a bounded worker pool and reduced
//! to a single capped penalty.

pub mod aggregate;
mod compression;
mod copy_move;
mod frequency;
mod histogram;
mod integrity;
mod metadata;
mod noise;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::warn;

pub use aggregate::{aggregate as aggregate_penalty, PENALTY_CEILING};
pub use compression::{ErrorLevelCheck, JpegQualityCheck};
pub use copy_move::CopyMoveCheck;
pub use frequency::ResolutionConsistencyCheck;
pub use histogram::ColorHistogramCheck;
pub use integrity::IntegrityCheck;
pub use metadata::{MetadataCheck, PdfMetadataCheck};
pub use noise::NoisePatternCheck;

use super::domain::{CaptureClass, CheckResult, DocumentAsset, ForensicReport};

/// A single stateless tamper analyzer. Implementations must be pure over
/// the asset snapshot and safe to run concurrently with every other check.
pub trait ForensicCheck: Send + Sync {
    fn name(&self) -> &'static str;
    fn run(&self, asset: &DocumentAsset, ctx: &CheckContext) -> CheckResult;
}

/// Shared per-analysis context handed to every check.
#[derive(Clone)]
pub struct CheckContext {
    pub capture_class: CaptureClass,
    cancel: Arc<AtomicBool>,
}

impl CheckContext {
    pub fn new(capture_class: CaptureClass, cancel: Arc<AtomicBool>) -> Self {
        Self {
            capture_class,
            cancel,
        }
    }

    pub fn for_capture(capture_class: CaptureClass) -> Self {
        Self::new(capture_class, Arc::new(AtomicBool::new(false)))
    }

    /// Checks poll this between block computations so a caller abort or
    /// battery timeout stops in-flight work cooperatively.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub(crate) fn cancelled_for_tests() -> Self {
        Self::new(
            CaptureClass::Photographed,
            Arc::new(AtomicBool::new(true)),
        )
    }
}

impl Default for CheckContext {
    fn default() -> Self {
        Self::for_capture(CaptureClass::Photographed)
    }
}

/// Tunables for the battery run.
#[derive(Debug, Clone)]
pub struct BatteryConfig {
    /// Worker threads; `0` sizes the pool to available cores.
    pub workers: usize,
    /// Deadline for every dispatched check, measured from battery start.
    pub check_timeout: Duration,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            check_timeout: Duration::from_secs(10),
        }
    }
}

/// The fixed, ordered check list. New checks register here; the aggregator
/// needs no change as long as they define a penalty step.
pub fn standard_battery() -> Vec<Box<dyn ForensicCheck>> {
    vec![
        Box::new(MetadataCheck),
        Box::new(PdfMetadataCheck),
        Box::new(ErrorLevelCheck),
        Box::new(JpegQualityCheck),
        Box::new(CopyMoveCheck),
        Box::new(ResolutionConsistencyCheck),
        Box::new(ColorHistogramCheck),
        Box::new(NoisePatternCheck),
        Box::new(IntegrityCheck),
    ]
}

/// Runs a check list against one asset and reduces it to a report.
pub struct ForensicBattery {
    checks: Arc<Vec<Box<dyn ForensicCheck>>>,
    config: BatteryConfig,
}

impl ForensicBattery {
    pub fn standard(config: BatteryConfig) -> Self {
        Self::new(standard_battery(), config)
    }

    pub fn new(checks: Vec<Box<dyn ForensicCheck>>, config: BatteryConfig) -> Self {
        Self {
            checks: Arc::new(checks),
            config,
        }
    }

    /// Fans the battery out over the worker pool and blocks until every
    /// check returns or the deadline passes. A check missing the deadline
    /// is cancelled and recorded as a neutral timeout; its thread is left
    /// to wind down on its own so the analysis never hangs on it.
    pub fn analyze(&self, asset: Arc<DocumentAsset>) -> ForensicReport {
        let capture_class = CaptureClass::classify(asset.first_page());
        let cancel = Arc::new(AtomicBool::new(false));
        let ctx = CheckContext::new(capture_class, cancel.clone());

        let total = self.checks.len();
        let workers = self.worker_count(total);
        let next = Arc::new(AtomicUsize::new(0));
        let (sender, receiver) = mpsc::channel::<(usize, CheckResult)>();

        for _ in 0..workers {
            let checks = Arc::clone(&self.checks);
            let asset = Arc::clone(&asset);
            let ctx = ctx.clone();
            let next = Arc::clone(&next);
            let sender = sender.clone();
            thread::spawn(move || loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                if index >= checks.len() {
                    break;
                }
                let result = checks[index].run(&asset, &ctx);
                if sender.send((index, result)).is_err() {
                    break;
                }
            });
        }
        drop(sender);

        let deadline = Instant::now() + self.config.check_timeout;
        let mut slots: Vec<Option<CheckResult>> = vec![None; total];
        let mut received = 0usize;
        while received < total {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match receiver.recv_timeout(remaining) {
                Ok((index, result)) => {
                    if slots[index].replace(result).is_none() {
                        received += 1;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    cancel.store(true, Ordering::Relaxed);
                    warn!(
                        document_id = %asset.document_id.0,
                        outstanding = total - received,
                        "forensic battery deadline passed, recording neutral results"
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let checks: Vec<CheckResult> = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    CheckResult::neutral(self.checks[index].name(), "timed out")
                })
            })
            .collect();

        let penalty = aggregate::aggregate(&checks, capture_class);
        ForensicReport {
            capture_class,
            checks,
            penalty,
        }
    }

    fn worker_count(&self, total: usize) -> usize {
        let configured = if self.config.workers == 0 {
            thread::available_parallelism()
                .map(|cores| cores.get())
                .unwrap_or(4)
        } else {
            self.config.workers
        };
        configured.clamp(1, total.max(1))
    }
}
