//! Live view of one indexing run, shared between the pipeline and whatever
//! renders it (the CLI progress bar).

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Walking the root
    Selecting,
    /// Phase A
    Extracting,
    /// Phase B
    Assembling,
    Done,
}

impl Phase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Phase::Selecting,
            2 => Phase::Extracting,
            3 => Phase::Assembling,
            4 => Phase::Done,
            _ => Phase::Idle,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Selecting => "selecting",
            Phase::Extracting => "extracting",
            Phase::Assembling => "assembling",
            Phase::Done => "done",
        }
    }
}

/// Counters shared by the walk and the extraction workers of one run.
#[derive(Clone, Default)]
pub struct IndexingProgress {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    phase: AtomicU8,
    files_selected: AtomicUsize,
    files_indexed: AtomicUsize,
    files_skipped: AtomicUsize,
    files_degraded: AtomicUsize,
    symbols: AtomicUsize,
    extraction_started: Mutex<Option<Instant>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub phase: Phase,
    pub files_selected: usize,
    /// Indexed plus skipped
    pub files_done: usize,
    pub files_skipped: usize,
    pub files_degraded: usize,
    pub symbols: usize,
    /// Only known while extracting, once at least one file is done
    pub eta: Option<Duration>,
}

impl IndexingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn extraction_started(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        self.inner
            .extraction_started
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_phase(&self, phase: Phase) {
        self.inner.phase.store(phase as u8, Ordering::Release);
    }

    /// Resets every counter; the walk is about to start.
    pub fn begin_selection(&self) {
        for counter in [
            &self.inner.files_selected,
            &self.inner.files_indexed,
            &self.inner.files_skipped,
            &self.inner.files_degraded,
            &self.inner.symbols,
        ] {
            counter.store(0, Ordering::Release);
        }
        *self.extraction_started() = None;
        self.set_phase(Phase::Selecting);
    }

    pub fn file_selected(&self) {
        self.inner.files_selected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn begin_extraction(&self) {
        *self.extraction_started() = Some(Instant::now());
        self.set_phase(Phase::Extracting);
    }

    pub fn file_indexed(&self, symbols: usize, degraded: bool) {
        self.inner.files_indexed.fetch_add(1, Ordering::Relaxed);
        self.inner.symbols.fetch_add(symbols, Ordering::Relaxed);
        if degraded {
            self.inner.files_degraded.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn file_skipped(&self) {
        self.inner.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn begin_assembly(&self) {
        self.set_phase(Phase::Assembling);
    }

    pub fn finish(&self) {
        self.set_phase(Phase::Done);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let phase = Phase::from_u8(self.inner.phase.load(Ordering::Acquire));
        let files_selected = self.inner.files_selected.load(Ordering::Acquire);
        let files_skipped = self.inner.files_skipped.load(Ordering::Acquire);
        let files_done = self.inner.files_indexed.load(Ordering::Acquire) + files_skipped;

        let eta = match *self.extraction_started() {
            Some(started) if phase == Phase::Extracting => {
                estimate_remaining(started.elapsed(), files_done, files_selected)
            }
            _ => None,
        };

        ProgressSnapshot {
            phase,
            files_selected,
            files_done,
            files_skipped,
            files_degraded: self.inner.files_degraded.load(Ordering::Acquire),
            symbols: self.inner.symbols.load(Ordering::Acquire),
            eta,
        }
    }
}

/// Linear extrapolation from the files finished so far.
fn estimate_remaining(elapsed: Duration, done: usize, total: usize) -> Option<Duration> {
    if done == 0 || done >= total {
        return None;
    }
    let per_file = elapsed.as_secs_f64() / done as f64;
    Some(Duration::from_secs_f64(per_file * (total - done) as f64))
}
