//! Analysis job management
//!
//! At most one analysis is in flight per [`AnalysisQueue`]. A job is
//! identified by a fingerprint of its input file (SHA256 over size, mtime and
//! sample bytes). Starting a job while another is active is rejected with
//! [`AnalysisError::Busy`].
//!
//! The orchestrator runs on tokio's blocking pool. Progress and the final
//! outcome reach the caller through an unbounded channel owned by the
//! [`AnalysisHandle`].

use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::analysis::{analyze_file, ProgressObserver};
use crate::error::AnalysisError;
use crate::media::MediaProbe;
use crate::types::{AnalysisProgress, AnalysisResult, JobStatus};

const SAMPLE_BYTES: u64 = 8192;

/// Compute a fast fingerprint for a file based on size, mtime, and sample bytes.
/// Only the first and last 8KB are read, so this is cheap for large media.
pub fn compute_file_hash(path: &Path) -> Result<String, AnalysisError> {
    let metadata = fs::metadata(path)?;
    let file_size = metadata.len();
    let mtime = metadata
        .modified()
        .map(|t| {
            t.duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs()
        })
        .unwrap_or(0);

    let mut file = File::open(path)?;

    let mut first_bytes = vec![0u8; SAMPLE_BYTES.min(file_size) as usize];
    file.read_exact(&mut first_bytes)?;

    let mut last_bytes = Vec::new();
    if file_size > SAMPLE_BYTES * 2 {
        file.seek(SeekFrom::End(-(SAMPLE_BYTES as i64)))?;
        last_bytes = vec![0u8; SAMPLE_BYTES as usize];
        file.read_exact(&mut last_bytes)?;
    }

    let mut hasher = Sha256::new();
    hasher.update(file_size.to_le_bytes());
    hasher.update(mtime.to_le_bytes());
    hasher.update(&first_bytes);
    hasher.update(&last_bytes);

    Ok(format!("{:x}", hasher.finalize()))
}

/// Messages delivered to the owner of an [`AnalysisHandle`]. Zero or more
/// `Progress` events are followed by exactly one terminal event.
#[derive(Debug)]
pub enum AnalysisEvent {
    Progress(AnalysisProgress),
    Completed(Box<AnalysisResult>),
    Failed(AnalysisError),
}

#[derive(Debug, Clone)]
struct ActiveJob {
    id: String,
    path: PathBuf,
    cancelled: Arc<AtomicBool>,
    started_at: Instant,
}

type ActiveSlot = Arc<Mutex<Option<ActiveJob>>>;

fn lock_slot(slot: &ActiveSlot) -> MutexGuard<'_, Option<ActiveJob>> {
    // A panicking worker can't leave the slot half-written
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn ensure_idle(active: &Option<ActiveJob>) -> Result<(), AnalysisError> {
    match active {
        Some(existing) => {
            warn!(
                "Job {} already running for file: {}",
                existing.id,
                existing.path.display()
            );
            Err(AnalysisError::Busy {
                job_id: existing.id.clone(),
                path: existing.path.clone(),
            })
        }
        None => Ok(()),
    }
}

/// Clears the active slot when the worker finishes, even if it panics.
struct SlotGuard {
    slot: ActiveSlot,
    job_id: String,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let mut active = lock_slot(&self.slot);
        if let Some(job) = active.as_ref().filter(|job| job.id == self.job_id) {
            info!(
                "Completed analysis job {} for file: {} (took {:.2}s)",
                job.id,
                job.path.display(),
                job.started_at.elapsed().as_secs_f64()
            );
            *active = None;
        }
    }
}

struct ChannelObserver {
    tx: mpsc::UnboundedSender<AnalysisEvent>,
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&self, progress: &AnalysisProgress) {
        // Receiver gone means nobody is listening; the job still runs to completion
        let _ = self.tx.send(AnalysisEvent::Progress(progress.clone()));
    }
}

/// Runs analyses one at a time against a shared probe.
#[derive(Clone)]
pub struct AnalysisQueue {
    probe: Arc<dyn MediaProbe>,
    active: ActiveSlot,
}

impl AnalysisQueue {
    pub fn new(probe: Arc<dyn MediaProbe>) -> Self {
        Self {
            probe,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Start analyzing `path` on the blocking pool.
    ///
    /// Must be called from within a tokio runtime. Fails with `Busy` when a
    /// job is already active and with `Io` when the file can't be read. A busy
    /// queue rejects before the file is opened.
    pub fn start(&self, path: impl AsRef<Path>) -> Result<AnalysisHandle, AnalysisError> {
        let path = path.as_ref().to_path_buf();
        ensure_idle(&lock_slot(&self.active))?;

        let job_id = compute_file_hash(&path)?;
        debug!("start: path={}, job_id={}", path.display(), job_id);

        let cancelled = Arc::new(AtomicBool::new(false));
        {
            // Re-check: another start may have claimed the slot while hashing
            let mut active = lock_slot(&self.active);
            ensure_idle(&active)?;
            *active = Some(ActiveJob {
                id: job_id.clone(),
                path: path.clone(),
                cancelled: cancelled.clone(),
                started_at: Instant::now(),
            });
        }
        info!("Started analysis job {} for file: {}", job_id, path.display());

        let (tx, rx) = mpsc::unbounded_channel();
        let guard = SlotGuard {
            slot: self.active.clone(),
            job_id: job_id.clone(),
        };
        let probe = self.probe.clone();
        let worker_path = path.clone();
        let worker_cancelled = cancelled.clone();

        let task = tokio::task::spawn_blocking(move || {
            let observer = ChannelObserver { tx: tx.clone() };
            let outcome = analyze_file(&worker_path, probe.as_ref(), &observer, &worker_cancelled);

            // Free the slot before announcing the outcome
            drop(guard);

            let event = match outcome {
                Ok(result) => AnalysisEvent::Completed(Box::new(result)),
                Err(e) => {
                    if e.is_fatal() {
                        warn!("Analysis of {} failed: {}", worker_path.display(), e);
                    }
                    AnalysisEvent::Failed(e)
                }
            };
            let _ = tx.send(event);
        });

        Ok(AnalysisHandle {
            job_id,
            path,
            cancelled,
            events: rx,
            task,
        })
    }

    /// The active job, if any.
    pub fn status(&self) -> Option<JobStatus> {
        lock_slot(&self.active).as_ref().map(|job| JobStatus {
            job_id: job.id.clone(),
            path: job.path.clone(),
            running_seconds: job.started_at.elapsed().as_secs_f64(),
        })
    }

    /// Request cancellation of the active job. Returns false when idle.
    pub fn cancel_active(&self) -> bool {
        match lock_slot(&self.active).as_ref() {
            Some(job) => {
                job.cancelled.store(true, Ordering::SeqCst);
                info!("Cancelled analysis job {} for file: {}", job.id, job.path.display());
                true
            }
            None => {
                debug!("No active job to cancel");
                false
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        lock_slot(&self.active).is_some()
    }
}

/// Owner side of a running analysis.
pub struct AnalysisHandle {
    job_id: String,
    path: PathBuf,
    cancelled: Arc<AtomicBool>,
    events: mpsc::UnboundedReceiver<AnalysisEvent>,
    task: JoinHandle<()>,
}

impl AnalysisHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next event in order, or `None` once the terminal event was consumed.
    pub async fn next_event(&mut self) -> Option<AnalysisEvent> {
        self.events.recv().await
    }

    /// Ask the job to stop. Observed between stages.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        debug!("Cancellation requested for job {}", self.job_id);
    }

    /// Drain remaining events and return the outcome.
    pub async fn wait(mut self) -> Result<AnalysisResult, AnalysisError> {
        while let Some(event) = self.events.recv().await {
            match event {
                AnalysisEvent::Progress(_) => continue,
                AnalysisEvent::Completed(result) => return Ok(*result),
                AnalysisEvent::Failed(e) => return Err(e),
            }
        }
        // Channel closed without a terminal event: the worker died
        match self.task.await {
            Ok(()) => Err(AnalysisError::Worker("no outcome reported".to_string())),
            Err(e) => Err(AnalysisError::Worker(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{frames_json, metadata_json, FakeProbe};
    use std::io::Write;
    use std::sync::mpsc as std_mpsc;

    /// Blocks every metadata query until the test releases it.
    struct GatedProbe {
        inner: FakeProbe,
        gate: Mutex<std_mpsc::Receiver<()>>,
    }

    impl MediaProbe for GatedProbe {
        fn ensure_available(&self) -> Result<(), AnalysisError> {
            self.inner.ensure_available()
        }

        fn metadata_json(&self, path: &Path) -> Result<String, AnalysisError> {
            let _ = self.gate.lock().unwrap().recv();
            self.inner.metadata_json(path)
        }

        fn frames_json(&self, path: &Path) -> Result<String, AnalysisError> {
            self.inner.frames_json(path)
        }
    }

    fn probe() -> FakeProbe {
        FakeProbe::new(
            metadata_json("24/1"),
            frames_json(&[
                (Some("0.0"), 1000, "I"),
                (Some("0.0417"), 2000, "P"),
                (Some("0.0833"), 3000, "P"),
            ]),
        )
    }

    fn gated_queue() -> (AnalysisQueue, std_mpsc::Sender<()>) {
        let (release, gate) = std_mpsc::channel();
        let probe = GatedProbe {
            inner: probe(),
            gate: Mutex::new(gate),
        };
        (AnalysisQueue::new(Arc::new(probe)), release)
    }

    fn media_file(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".mov").tempfile().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_file_hash_is_stable() {
        let file = media_file(b"not really a movie");
        let first = compute_file_hash(file.path()).unwrap();
        let second = compute_file_hash(file.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_file_hash_samples_tail_of_large_files() {
        let mut a = vec![0u8; 64 * 1024];
        let mut b = a.clone();
        *b.last_mut().unwrap() = 1;
        a[0] = 7;
        b[0] = 7;
        let file_a = media_file(&a);
        let file_b = media_file(&b);
        assert_ne!(
            compute_file_hash(file_a.path()).unwrap(),
            compute_file_hash(file_b.path()).unwrap()
        );
    }

    #[test]
    fn test_file_hash_missing_file() {
        let err = compute_file_hash(Path::new("/nonexistent/clip.mov")).unwrap_err();
        assert!(matches!(err, AnalysisError::Io(_)));
    }

    #[tokio::test]
    async fn test_events_in_order_then_terminal() {
        let file = media_file(b"frames");
        let queue = AnalysisQueue::new(Arc::new(probe()));
        let mut handle = queue.start(file.path()).unwrap();

        let mut percentages = Vec::new();
        let mut outcome = None;
        while let Some(event) = handle.next_event().await {
            match event {
                AnalysisEvent::Progress(p) => percentages.push(p.percentage),
                terminal => {
                    outcome = Some(terminal);
                    break;
                }
            }
        }

        assert_eq!(percentages, vec![10, 20, 40, 70, 90, 100]);
        match outcome {
            Some(AnalysisEvent::Completed(result)) => {
                assert_eq!(result.frames.len(), 3);
                assert_eq!(result.source_path, file.path());
            }
            other => panic!("expected completion, got {:?}", other),
        }
        // Slot is already free once the terminal event is visible
        assert!(queue.status().is_none());
        assert!(handle.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_rejects_while_busy() {
        let file = media_file(b"first");
        let other = media_file(b"second");
        let (queue, release) = gated_queue();

        let handle = queue.start(file.path()).unwrap();
        let status = queue.status().unwrap();
        assert_eq!(status.job_id, handle.job_id());
        assert_eq!(status.path, file.path());

        match queue.start(other.path()) {
            Err(AnalysisError::Busy { job_id, path }) => {
                assert_eq!(job_id, handle.job_id());
                assert_eq!(path, file.path());
            }
            Err(e) => panic!("expected Busy, got {}", e),
            Ok(_) => panic!("expected Busy, got a second job"),
        }

        release.send(()).unwrap();
        handle.wait().await.unwrap();

        assert!(!queue.is_busy());
        release.send(()).unwrap();
        let second = queue.start(other.path()).unwrap();
        second.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_busy_rejects_before_reading_file() {
        let file = media_file(b"first");
        let (queue, release) = gated_queue();
        let handle = queue.start(file.path()).unwrap();

        // An unreadable path still reports Busy, so the file was never opened
        let err = match queue.start("/nonexistent/clip.mov") {
            Err(e) => e,
            Ok(_) => panic!("expected Busy, got a second job"),
        };
        assert!(matches!(err, AnalysisError::Busy { .. }));

        release.send(()).unwrap();
        handle.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_in_flight_job() {
        let file = media_file(b"cancel me");
        let (queue, release) = gated_queue();

        let handle = queue.start(file.path()).unwrap();
        handle.cancel();
        release.send(()).unwrap();

        let err = handle.wait().await.unwrap_err();
        assert!(matches!(err, AnalysisError::Cancelled));
        assert!(queue.status().is_none());
    }

    #[tokio::test]
    async fn test_cancel_active_from_queue() {
        let file = media_file(b"cancel via queue");
        let (queue, release) = gated_queue();
        assert!(!queue.cancel_active());

        let handle = queue.start(file.path()).unwrap();
        assert!(queue.cancel_active());
        release.send(()).unwrap();

        assert!(matches!(handle.wait().await, Err(AnalysisError::Cancelled)));
    }

    #[tokio::test]
    async fn test_failure_is_terminal_event() {
        let file = media_file(b"broken");
        let queue = AnalysisQueue::new(Arc::new(FakeProbe::unavailable()));
        let err = queue.start(file.path()).unwrap().wait().await.unwrap_err();
        assert!(matches!(err, AnalysisError::ProbeToolUnavailable { .. }));
        assert!(!queue.is_busy());
    }

    #[tokio::test]
    async fn test_missing_file_does_not_occupy_slot() {
        let queue = AnalysisQueue::new(Arc::new(probe()));
        assert!(matches!(
            queue.start("/nonexistent/clip.mov"),
            Err(AnalysisError::Io(_))
        ));
        assert!(queue.status().is_none());
    }
}
