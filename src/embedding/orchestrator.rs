use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::params::{EmbeddingParams, progress_percent};
use super::projector::{Embedding, ProjectionError, Projector};
use crate::data::encode::{FeatureMatrix, LabelVector};

// ---------------------------------------------------------------------------
// Configuration and run plumbing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Quiet period after the last input change before a run starts.
    pub debounce: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(250),
        }
    }
}

/// Cooperative stop flag handed to one run.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Everything a run depends on. Compared shallowly: the matrices by
/// identity, the parameters by [`EmbeddingParams::compute_key`].
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub features: Arc<FeatureMatrix>,
    pub labels: Arc<LabelVector>,
    pub params: EmbeddingParams,
}

impl RunInputs {
    fn same_computation(&self, other: &RunInputs) -> bool {
        Arc::ptr_eq(&self.features, &other.features)
            && Arc::ptr_eq(&self.labels, &other.labels)
            && self.params.compute_key() == other.params.compute_key()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Debouncing,
    Running,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrchestratorEvent {
    Started { run: u64 },
    Superseded { run: u64 },
    Published { run: u64 },
    Failed { run: u64, error: ProjectionError },
}

enum WorkerMessage {
    Progress {
        run: u64,
        percent: u8,
    },
    Finished {
        run: u64,
        result: Result<Embedding, ProjectionError>,
    },
}

struct ActiveRun {
    run: u64,
    cancel: CancellationToken,
}

/// Called from worker threads whenever new messages are queued.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Owns the lifecycle of one projection at a time.
///
/// `submit` debounces input changes, `poll` (called once per frame with the
/// frame's clock) drains worker messages and starts the run once the
/// debounce window has passed. Every run carries its own run id; messages
/// from any run other than the active one are dropped, so published
/// embeddings are monotonic in run id.
pub struct Orchestrator {
    config: OrchestratorConfig,
    projector: Arc<dyn Projector>,
    phase: Phase,
    deadline: Option<Instant>,
    generation: u64,
    active: Option<ActiveRun>,
    pending: Option<RunInputs>,
    last_inputs: Option<RunInputs>,
    embedding: Option<Arc<Embedding>>,
    published_run: Option<u64>,
    progress: u8,
    queued: Vec<OrchestratorEvent>,
    sender: Sender<WorkerMessage>,
    receiver: Receiver<WorkerMessage>,
    waker: Option<Waker>,
}

impl Orchestrator {
    pub fn new(projector: Arc<dyn Projector>, config: OrchestratorConfig) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            config,
            projector,
            phase: Phase::Idle,
            deadline: None,
            generation: 0,
            active: None,
            pending: None,
            last_inputs: None,
            embedding: None,
            published_run: None,
            progress: 0,
            queued: Vec::new(),
            sender,
            receiver,
            waker: None,
        }
    }

    /// Install a callback that wakes the UI when a worker reports progress.
    pub fn set_waker(&mut self, waker: impl Fn() + Send + Sync + 'static) {
        self.waker = Some(Arc::new(waker));
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Progress of the active run in percent.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// The last published embedding, if any.
    pub fn embedding(&self) -> Option<&Arc<Embedding>> {
        self.embedding.as_ref()
    }

    pub fn published_run(&self) -> Option<u64> {
        self.published_run
    }

    /// Report the current inputs. Returns `true` when they differ from the
    /// previous submission and a run has been (re)scheduled.
    pub fn submit(&mut self, inputs: RunInputs, now: Instant) -> bool {
        if self
            .last_inputs
            .as_ref()
            .is_some_and(|last| last.same_computation(&inputs))
        {
            return false;
        }
        self.last_inputs = Some(inputs.clone());
        self.supersede();

        if !inputs.features.is_computable() {
            log::debug!("no computable features, projection not scheduled");
            self.pending = None;
            self.deadline = None;
            self.phase = Phase::Idle;
            return false;
        }

        self.pending = Some(inputs);
        self.deadline = Some(now + self.config.debounce);
        self.phase = Phase::Debouncing;
        self.progress = 0;
        true
    }

    /// Drop every run and the published embedding, e.g. when a new table
    /// replaces the old one.
    pub fn reset(&mut self) {
        self.supersede();
        self.pending = None;
        self.deadline = None;
        self.last_inputs = None;
        self.embedding = None;
        self.published_run = None;
        self.progress = 0;
        self.phase = Phase::Idle;
    }

    /// Advance the state machine: apply worker messages, then start the
    /// pending run if its debounce window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Vec<OrchestratorEvent> {
        let mut events = std::mem::take(&mut self.queued);

        while let Ok(message) = self.receiver.try_recv() {
            self.handle(message, &mut events);
        }

        if self.phase == Phase::Debouncing && self.deadline.is_some_and(|d| now >= d) {
            self.launch(&mut events);
        }

        events
    }

    fn is_current(&self, run: u64) -> bool {
        self.active.as_ref().is_some_and(|a| a.run == run)
    }

    /// Invalidate the in-flight run, if any. Its progress and result will
    /// be ignored from here on.
    fn supersede(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            self.generation += 1;
            self.progress = 0;
            log::debug!("run {} superseded", active.run);
            self.queued.push(OrchestratorEvent::Superseded { run: active.run });
        }
    }

    fn handle(&mut self, message: WorkerMessage, events: &mut Vec<OrchestratorEvent>) {
        match message {
            WorkerMessage::Progress { run, percent } => {
                if self.is_current(run) {
                    self.progress = self.progress.max(percent.min(100));
                }
            }
            WorkerMessage::Finished { run, result } => {
                if !self.is_current(run) {
                    log::debug!("discarding result of stale run {run}");
                    return;
                }
                self.active = None;
                self.phase = Phase::Idle;
                match result {
                    Ok(embedding) => {
                        log::info!("run {run} published {} points", embedding.len());
                        self.embedding = Some(Arc::new(embedding));
                        self.published_run = Some(run);
                        self.progress = 100;
                        events.push(OrchestratorEvent::Published { run });
                    }
                    Err(error) => {
                        log::error!("run {run} failed: {error}");
                        self.progress = 0;
                        events.push(OrchestratorEvent::Failed { run, error });
                    }
                }
            }
        }
    }

    fn launch(&mut self, events: &mut Vec<OrchestratorEvent>) {
        self.deadline = None;
        let Some(inputs) = self.pending.take() else {
            self.phase = Phase::Idle;
            return;
        };

        self.generation += 1;
        let run = self.generation;
        let rows = inputs.features.len();

        let labels = if inputs.params.supervised {
            match inputs.labels.codes() {
                Some(codes) if inputs.labels.is_usable_for(rows) => Some(codes.to_vec()),
                _ => {
                    log::info!("run {run}: labels unusable, supervision skipped");
                    None
                }
            }
        } else {
            None
        };

        let cancel = CancellationToken::default();
        let job = ProjectionJob {
            run,
            projector: Arc::clone(&self.projector),
            inputs,
            labels,
            cancel: cancel.clone(),
            sender: self.sender.clone(),
            waker: self.waker.clone(),
        };

        let spawned = thread::Builder::new()
            .name(format!("projection-{run}"))
            .spawn(move || job.execute());

        match spawned {
            Ok(_) => {
                log::info!("run {run} started on {rows} rows");
                self.active = Some(ActiveRun { run, cancel });
                self.phase = Phase::Running;
                self.progress = 0;
                events.push(OrchestratorEvent::Started { run });
            }
            Err(err) => {
                log::error!("run {run} could not start: {err}");
                self.phase = Phase::Idle;
                events.push(OrchestratorEvent::Failed {
                    run,
                    error: ProjectionError::Failed(err.to_string()),
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Worker side
// ---------------------------------------------------------------------------

struct ProjectionJob {
    run: u64,
    projector: Arc<dyn Projector>,
    inputs: RunInputs,
    labels: Option<Vec<i64>>,
    cancel: CancellationToken,
    sender: Sender<WorkerMessage>,
    waker: Option<Waker>,
}

impl ProjectionJob {
    fn execute(self) {
        let run = self.run;
        let epochs = self.inputs.params.epochs;
        let rows = self.inputs.features.len();
        let mut reported = 0u8;

        let result = {
            let mut on_epoch = |epoch: usize| -> bool {
                if self.cancel.is_cancelled() {
                    return false;
                }
                let percent = progress_percent(epoch, epochs);
                if percent > reported {
                    reported = percent;
                    let _ = self.sender.send(WorkerMessage::Progress { run, percent });
                    self.wake();
                }
                true
            };

            panic::catch_unwind(AssertUnwindSafe(|| {
                self.projector.project(
                    &self.inputs.features,
                    &self.inputs.params,
                    self.labels.as_deref(),
                    &mut on_epoch,
                )
            }))
            .unwrap_or_else(|_| Err(ProjectionError::Failed("projection panicked".into())))
        };

        let result = result.and_then(|embedding| {
            if embedding.len() == rows {
                Ok(embedding)
            } else {
                Err(ProjectionError::Failed(format!(
                    "projection returned {} points for {rows} rows",
                    embedding.len()
                )))
            }
        });

        let _ = self.sender.send(WorkerMessage::Finished { run, result });
        self.wake();
    }

    fn wake(&self) {
        if let Some(waker) = &self.waker {
            waker();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encode::build_features;
    use crate::data::model::{Cell, RawTable};
    use std::sync::Mutex;

    fn matrix(rows: usize) -> Arc<FeatureMatrix> {
        let table = RawTable::new(
            vec!["a".into(), "b".into()],
            (0..rows)
                .map(|i| vec![Cell::Number(i as f64), Cell::Number((i * 2) as f64)])
                .collect(),
        );
        Arc::new(build_features(&table, &[0, 1]))
    }

    fn params(n_neighbors: usize) -> EmbeddingParams {
        EmbeddingParams {
            n_neighbors,
            epochs: 5,
            ..EmbeddingParams::default()
        }
    }

    fn inputs(features: &Arc<FeatureMatrix>, params: EmbeddingParams) -> RunInputs {
        RunInputs {
            features: Arc::clone(features),
            labels: Arc::new(LabelVector::Absent(features.len())),
            params,
        }
    }

    /// Each call returns `[n_neighbors, 0]` for every row.
    fn marked_embedding(features: &FeatureMatrix, params: &EmbeddingParams) -> Embedding {
        vec![[params.n_neighbors as f64, 0.0]; features.len()]
    }

    #[derive(Default)]
    struct RecordingProjector {
        calls: Mutex<Vec<(usize, Option<Vec<i64>>)>>,
    }

    impl Projector for RecordingProjector {
        fn project(
            &self,
            features: &FeatureMatrix,
            params: &EmbeddingParams,
            labels: Option<&[i64]>,
            on_epoch: &mut dyn FnMut(usize) -> bool,
        ) -> Result<Embedding, ProjectionError> {
            self.calls
                .lock()
                .unwrap()
                .push((params.n_neighbors, labels.map(|l| l.to_vec())));
            for epoch in 1..=params.epochs {
                if !on_epoch(epoch) {
                    return Err(ProjectionError::Cancelled);
                }
            }
            Ok(marked_embedding(features, params))
        }
    }

    /// Blocks every call until the test releases it.
    struct GatedProjector {
        gate: Mutex<Receiver<()>>,
    }

    impl Projector for GatedProjector {
        fn project(
            &self,
            features: &FeatureMatrix,
            params: &EmbeddingParams,
            _labels: Option<&[i64]>,
            on_epoch: &mut dyn FnMut(usize) -> bool,
        ) -> Result<Embedding, ProjectionError> {
            self.gate.lock().unwrap().recv().unwrap();
            for epoch in 1..=params.epochs {
                on_epoch(epoch);
            }
            Ok(marked_embedding(features, params))
        }
    }

    /// Reports epochs normally but stops after each epoch in `pauses`,
    /// announcing it on `reached` and waiting for the gate.
    struct SteppedProjector {
        pauses: Vec<usize>,
        reached: Mutex<Sender<usize>>,
        gate: Mutex<Receiver<()>>,
    }

    impl Projector for SteppedProjector {
        fn project(
            &self,
            features: &FeatureMatrix,
            params: &EmbeddingParams,
            _labels: Option<&[i64]>,
            on_epoch: &mut dyn FnMut(usize) -> bool,
        ) -> Result<Embedding, ProjectionError> {
            for epoch in 1..=params.epochs {
                if !on_epoch(epoch) {
                    return Err(ProjectionError::Cancelled);
                }
                if self.pauses.contains(&epoch) {
                    let _ = self.reached.lock().unwrap().send(epoch);
                    let _ = self.gate.lock().unwrap().recv();
                }
            }
            Ok(marked_embedding(features, params))
        }
    }

    struct FlakyProjector {
        fail: AtomicBool,
    }

    impl Projector for FlakyProjector {
        fn project(
            &self,
            features: &FeatureMatrix,
            params: &EmbeddingParams,
            _labels: Option<&[i64]>,
            _on_epoch: &mut dyn FnMut(usize) -> bool,
        ) -> Result<Embedding, ProjectionError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ProjectionError::Failed("boom".into()));
            }
            Ok(marked_embedding(features, params))
        }
    }

    fn orchestrator(projector: Arc<dyn Projector>) -> Orchestrator {
        Orchestrator::new(projector, OrchestratorConfig::default())
    }

    /// Poll until an event matching `pred` shows up, collecting everything.
    fn wait_for(
        orch: &mut Orchestrator,
        now: Instant,
        pred: impl Fn(&OrchestratorEvent) -> bool,
    ) -> Vec<OrchestratorEvent> {
        let mut seen = Vec::new();
        for _ in 0..1000 {
            seen.extend(orch.poll(now));
            if seen.iter().any(&pred) {
                return seen;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("timed out waiting for event, saw {seen:?}");
    }

    fn is_published(e: &OrchestratorEvent) -> bool {
        matches!(e, OrchestratorEvent::Published { .. })
    }

    #[test]
    fn rapid_changes_collapse_into_one_run() {
        let projector = Arc::new(RecordingProjector::default());
        let mut orch = orchestrator(projector.clone());
        let features = matrix(6);
        let t0 = Instant::now();

        assert!(orch.submit(inputs(&features, params(3)), t0));
        assert!(orch.submit(inputs(&features, params(4)), t0 + Duration::from_millis(100)));
        assert!(orch.submit(inputs(&features, params(5)), t0 + Duration::from_millis(200)));

        assert!(orch.poll(t0 + Duration::from_millis(300)).is_empty());
        assert_eq!(orch.phase(), Phase::Debouncing);

        let events = wait_for(&mut orch, t0 + Duration::from_millis(460), is_published);
        let started = events
            .iter()
            .filter(|e| matches!(e, OrchestratorEvent::Started { .. }))
            .count();
        assert_eq!(started, 1);
        assert_eq!(events.iter().filter(|e| is_published(e)).count(), 1);

        let calls = projector.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, 5);
        assert_eq!(orch.embedding().unwrap()[0], [5.0, 0.0]);
        assert_eq!(orch.progress(), 100);
        assert_eq!(orch.phase(), Phase::Idle);
    }

    #[test]
    fn superseded_run_never_publishes() {
        let (release, gate) = mpsc::channel();
        let projector = Arc::new(GatedProjector {
            gate: Mutex::new(gate),
        });
        let mut orch = orchestrator(projector);
        let features = matrix(4);
        let t0 = Instant::now();

        orch.submit(inputs(&features, params(3)), t0);
        let events = orch.poll(t0 + Duration::from_millis(300));
        assert_eq!(events, vec![OrchestratorEvent::Started { run: 1 }]);
        assert_eq!(orch.phase(), Phase::Running);

        // New inputs while run 1 is in flight.
        let t1 = t0 + Duration::from_millis(310);
        assert!(orch.submit(inputs(&features, params(9)), t1));
        assert_eq!(orch.phase(), Phase::Debouncing);

        release.send(()).unwrap();
        thread::sleep(Duration::from_millis(50));
        let events = orch.poll(t1 + Duration::from_millis(10));
        assert_eq!(events, vec![OrchestratorEvent::Superseded { run: 1 }]);
        assert!(orch.embedding().is_none());

        let t2 = t1 + Duration::from_millis(300);
        let events = orch.poll(t2);
        let Some(OrchestratorEvent::Started { run: second }) = events.first().cloned() else {
            panic!("expected a second run, got {events:?}");
        };
        assert!(second > 1);

        release.send(()).unwrap();
        wait_for(&mut orch, t2, is_published);
        assert_eq!(orch.published_run(), Some(second));
        assert_eq!(orch.embedding().unwrap()[0], [9.0, 0.0]);
    }

    #[test]
    fn superseded_run_progress_is_cleared_and_ignored() {
        let (release, gate) = mpsc::channel();
        let (reached_tx, reached) = mpsc::channel();
        let projector = Arc::new(SteppedProjector {
            pauses: vec![3, 5],
            reached: Mutex::new(reached_tx),
            gate: Mutex::new(gate),
        });
        let mut orch = orchestrator(projector);
        let features = matrix(4);
        let ten_epochs = |n| EmbeddingParams {
            epochs: 10,
            ..params(n)
        };
        let t0 = Instant::now();

        orch.submit(inputs(&features, ten_epochs(3)), t0);
        assert_eq!(
            orch.poll(t0 + Duration::from_millis(300)),
            vec![OrchestratorEvent::Started { run: 1 }]
        );
        assert_eq!(reached.recv().unwrap(), 3);
        let t1 = t0 + Duration::from_millis(310);
        orch.poll(t1);
        assert_eq!(orch.progress(), 30);

        // Epochs 4 and 5 are reported but left unread in the channel.
        release.send(()).unwrap();
        assert_eq!(reached.recv().unwrap(), 5);

        assert!(orch.submit(inputs(&features, ten_epochs(4)), t1));
        assert_eq!(orch.phase(), Phase::Debouncing);
        assert_eq!(orch.progress(), 0);

        let events = orch.poll(t1 + Duration::from_millis(10));
        assert_eq!(events, vec![OrchestratorEvent::Superseded { run: 1 }]);
        assert_eq!(orch.progress(), 0);

        // The old run notices the cancellation and finishes; nothing of it lands.
        release.send(()).unwrap();
        thread::sleep(Duration::from_millis(50));
        assert!(orch.poll(t1 + Duration::from_millis(20)).is_empty());
        assert_eq!(orch.progress(), 0);
        assert_eq!(orch.phase(), Phase::Debouncing);
        assert!(orch.embedding().is_none());
    }

    #[test]
    fn resubmitting_after_publish_restarts_progress() {
        let mut orch = orchestrator(Arc::new(RecordingProjector::default()));
        let features = matrix(4);
        let t0 = Instant::now();
        orch.submit(inputs(&features, params(3)), t0);
        wait_for(&mut orch, t0 + Duration::from_millis(300), is_published);
        assert_eq!(orch.progress(), 100);

        assert!(orch.submit(inputs(&features, params(4)), t0 + Duration::from_secs(1)));
        assert_eq!(orch.progress(), 0);
        assert_eq!(orch.published_run(), Some(1));
    }

    #[test]
    fn point_size_change_does_not_schedule() {
        let projector = Arc::new(RecordingProjector::default());
        let mut orch = orchestrator(projector.clone());
        let features = matrix(4);
        let labels = Arc::new(LabelVector::Absent(4));
        let base = RunInputs {
            features: Arc::clone(&features),
            labels: Arc::clone(&labels),
            params: params(3),
        };
        let t0 = Instant::now();
        orch.submit(base.clone(), t0);
        wait_for(&mut orch, t0 + Duration::from_millis(300), is_published);

        let resized = RunInputs {
            params: EmbeddingParams {
                point_size: 8.0,
                ..base.params
            },
            ..base
        };
        assert!(!orch.submit(resized, t0 + Duration::from_millis(400)));
        assert_eq!(orch.phase(), Phase::Idle);
        assert!(orch.poll(t0 + Duration::from_secs(5)).is_empty());
        assert_eq!(projector.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn single_class_labels_are_not_passed() {
        let projector = Arc::new(RecordingProjector::default());
        let mut orch = orchestrator(projector.clone());
        let features = matrix(4);
        let t0 = Instant::now();
        orch.submit(
            RunInputs {
                features: Arc::clone(&features),
                labels: Arc::new(LabelVector::Coded(vec![0, 0, 0, -1])),
                params: EmbeddingParams {
                    supervised: true,
                    ..params(3)
                },
            },
            t0,
        );
        wait_for(&mut orch, t0 + Duration::from_millis(300), is_published);
        assert_eq!(projector.calls.lock().unwrap()[0].1, None);
    }

    #[test]
    fn usable_labels_are_passed_when_supervised() {
        let projector = Arc::new(RecordingProjector::default());
        let mut orch = orchestrator(projector.clone());
        let features = matrix(4);
        let t0 = Instant::now();
        orch.submit(
            RunInputs {
                features: Arc::clone(&features),
                labels: Arc::new(LabelVector::Coded(vec![0, 1, 0, 1])),
                params: EmbeddingParams {
                    supervised: true,
                    ..params(3)
                },
            },
            t0,
        );
        wait_for(&mut orch, t0 + Duration::from_millis(300), is_published);
        assert_eq!(
            projector.calls.lock().unwrap()[0].1,
            Some(vec![0, 1, 0, 1])
        );
    }

    #[test]
    fn failure_keeps_previous_embedding() {
        let projector = Arc::new(FlakyProjector {
            fail: AtomicBool::new(false),
        });
        let mut orch = orchestrator(projector.clone());
        let features = matrix(4);
        let t0 = Instant::now();
        orch.submit(inputs(&features, params(3)), t0);
        wait_for(&mut orch, t0 + Duration::from_millis(300), is_published);

        projector.fail.store(true, Ordering::SeqCst);
        let t1 = t0 + Duration::from_secs(1);
        orch.submit(inputs(&features, params(4)), t1);
        let events = wait_for(&mut orch, t1 + Duration::from_millis(300), |e| {
            matches!(e, OrchestratorEvent::Failed { .. })
        });
        assert!(!events.iter().any(is_published));
        assert_eq!(orch.phase(), Phase::Idle);
        assert_eq!(orch.embedding().unwrap()[0], [3.0, 0.0]);
    }

    #[test]
    fn empty_features_do_not_schedule() {
        let mut orch = orchestrator(Arc::new(RecordingProjector::default()));
        let empty = Arc::new(FeatureMatrix::default());
        assert!(!orch.submit(inputs(&empty, params(3)), Instant::now()));
        assert_eq!(orch.phase(), Phase::Idle);
    }

    #[test]
    fn reset_clears_published_embedding() {
        let mut orch = orchestrator(Arc::new(RecordingProjector::default()));
        let features = matrix(3);
        let t0 = Instant::now();
        orch.submit(inputs(&features, params(2)), t0);
        wait_for(&mut orch, t0 + Duration::from_millis(300), is_published);
        orch.reset();
        assert!(orch.embedding().is_none());
        assert_eq!(orch.phase(), Phase::Idle);
        // Identical inputs schedule again after a reset.
        assert!(orch.submit(inputs(&features, params(2)), t0));
    }
}
