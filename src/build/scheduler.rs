//! Mesh rebuild scheduler
//!
//! Enforces at-most-one active job per mesh, coalesces concurrent rebuild
//! requests, and commits only the most recently started job's result. One
//! lock serializes start, snapshot, commit and cancellation; it is never
//! nested with another lock, so there is no deadlock risk.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::build::dispatch::QueueHandle;
use crate::build::job::{BuildJob, JobProgress};
use crate::core::config::MeshConfig;
use crate::core::types::Result;
use crate::mesh::assemble::PointOffsets;
use crate::mesh::buffers::MeshOutput;
use crate::voxel::store::VoxelStore;

/// How a job executes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Run to completion synchronously on the caller's thread
    #[default]
    Immediate,
    /// Run on a worker thread; completion is redelivered through the
    /// designated-thread queue
    Background,
    /// Retain the job; the caller drives it in bounded time slices via
    /// [`MeshBuilder::poll_build`]
    Incremental,
}

/// Per-start options
#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    /// Cancel a running job first instead of declining to start
    pub force: bool,
    pub mode: ExecutionMode,
    /// Restrict the snapshot to `[min, max]` layers, for partial rebuilds
    pub layer_range: Option<(i8, i8)>,
    /// Corner displacement map for mesh warping
    pub point_offsets: PointOffsets,
}

/// Outcome of a start request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    /// A job was started with this id
    Started(u64),
    /// A job is already running and `force` was not set. The running job's
    /// result will still be delivered; it is simply stale with respect to
    /// whatever prompted this call.
    AlreadyRunning,
}

/// Progress report from pumping an incremental build
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildPoll {
    /// No incremental job is active
    Idle,
    /// The slice budget was used up; pump again to continue
    InProgress,
    /// The job finished this slice and its result was committed
    Completed,
    /// The job observed its cancellation flag and unwound
    Cancelled,
}

/// Completion event, delivered exactly once per committed job on the
/// designated thread
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildComplete {
    /// Identity of the mesh that finished
    pub mesh_id: u64,
    pub job_id: u64,
    /// Min and max layer present in the processed voxel set
    pub layer_span: Option<(i8, i8)>,
}

type CompletionCallback = Box<dyn Fn(BuildComplete) + Send>;

struct ActiveJob {
    id: u64,
    cancel: Arc<AtomicBool>,
    /// Present only for incremental jobs between pumps
    job: Option<BuildJob>,
}

struct SchedulerState {
    next_job_id: u64,
    /// Most recently started job; only its result is ever committed
    latest_job_id: u64,
    active: Option<ActiveJob>,
    committed: Option<Arc<MeshOutput>>,
}

/// Rebuild scheduler for one mesh object.
///
/// Callers mutate a [`VoxelStore`], then request a rebuild; the voxel
/// snapshot is taken under the scheduler lock and the job runs per the
/// selected [`ExecutionMode`]. Completions are checked against the most
/// recently started job id, so results of superseded jobs are discarded
/// silently and a cancelled rebuild leaves the previously committed
/// geometry untouched.
pub struct MeshBuilder {
    mesh_id: u64,
    config: MeshConfig,
    state: Arc<Mutex<SchedulerState>>,
    queue: QueueHandle,
    completion: Arc<Mutex<Option<CompletionCallback>>>,
}

impl MeshBuilder {
    /// Create a scheduler for a mesh, delivering completions through the
    /// given queue handle
    pub fn new(mesh_id: u64, config: MeshConfig, queue: QueueHandle) -> Self {
        Self {
            mesh_id,
            config,
            state: Arc::new(Mutex::new(SchedulerState {
                next_job_id: 0,
                latest_job_id: 0,
                active: None,
                committed: None,
            })),
            queue,
            completion: Arc::new(Mutex::new(None)),
        }
    }

    /// Identity of the mesh this scheduler rebuilds
    pub fn mesh_id(&self) -> u64 {
        self.mesh_id
    }

    /// Register the completion callback, invoked on the queue's consumer
    /// thread once per committed job
    pub fn set_completion(&self, callback: impl Fn(BuildComplete) + Send + 'static) {
        *self.completion.lock().unwrap() = Some(Box::new(callback));
    }

    /// Whether a job is currently active
    pub fn is_running(&self) -> bool {
        self.state.lock().unwrap().active.is_some()
    }

    /// Most recently committed geometry, if any
    pub fn committed(&self) -> Option<Arc<MeshOutput>> {
        self.state.lock().unwrap().committed.clone()
    }

    /// Request a rebuild.
    ///
    /// If a job is running and `force` is false this is a no-op; with
    /// `force` the running job's cancellation flag is set before the new
    /// job starts. The store snapshot is taken under the scheduler lock,
    /// which also serializes concurrent start calls.
    pub fn start(&self, store: &VoxelStore, options: BuildOptions) -> Result<StartOutcome> {
        let (mut job, id) = {
            let mut state = self.state.lock().unwrap();
            if let Some(active) = &state.active {
                if !options.force {
                    log::debug!(
                        "mesh {}: job {} already running, start declined",
                        self.mesh_id,
                        active.id
                    );
                    return Ok(StartOutcome::AlreadyRunning);
                }
                active.cancel.store(true, Ordering::Relaxed);
            }
            state.active = None;

            let snapshot = store.snapshot(options.layer_range)?;
            state.next_job_id += 1;
            let id = state.next_job_id;
            state.latest_job_id = id;

            let cancel = Arc::new(AtomicBool::new(false));
            let job = BuildJob::new(id, &self.config, snapshot, options.point_offsets, cancel.clone());
            state.active = Some(ActiveJob { id, cancel, job: None });
            (job, id)
        };

        match options.mode {
            ExecutionMode::Immediate => {
                let progress = job.run();
                self.finish(id, progress);
            }
            ExecutionMode::Background => {
                let state = self.state.clone();
                let queue = self.queue.clone();
                let completion = self.completion.clone();
                let mesh_id = self.mesh_id;
                std::thread::spawn(move || {
                    let progress = job.run();
                    Self::finish_with(&state, &queue, &completion, mesh_id, id, progress);
                });
            }
            ExecutionMode::Incremental => {
                let mut state = self.state.lock().unwrap();
                match &mut state.active {
                    // A concurrent force-start may have claimed the slot; if
                    // so this job is already flagged and simply dropped
                    Some(active) if active.id == id => active.job = Some(job),
                    _ => {}
                }
            }
        }
        Ok(StartOutcome::Started(id))
    }

    /// Advance the active incremental job by one time slice (the
    /// configured `max_slice_ms`)
    pub fn poll_build(&self) -> BuildPoll {
        self.poll_build_with(Duration::from_millis(self.config.max_slice_ms))
    }

    /// Advance the active incremental job by one bounded time slice
    pub fn poll_build_with(&self, max_slice: Duration) -> BuildPoll {
        let mut job = {
            let mut state = self.state.lock().unwrap();
            match &mut state.active {
                Some(active) if active.job.is_some() => active.job.take().expect("checked"),
                _ => return BuildPoll::Idle,
            }
        };

        match job.poll(Some(max_slice)) {
            JobProgress::InProgress => {
                let mut state = self.state.lock().unwrap();
                match &mut state.active {
                    Some(active) if active.id == job.id() => {
                        active.job = Some(job);
                        BuildPoll::InProgress
                    }
                    // Superseded while polling; the stale job unwinds here
                    _ => BuildPoll::Cancelled,
                }
            }
            JobProgress::Cancelled => {
                self.finish(job.id(), JobProgress::Cancelled);
                BuildPoll::Cancelled
            }
            JobProgress::Complete(output) => {
                let id = job.id();
                self.finish(id, JobProgress::Complete(output));
                BuildPoll::Completed
            }
        }
    }

    /// Set the active job's cancellation flag.
    ///
    /// Threaded jobs observe it at their next safe point; a retained
    /// incremental job is released immediately. The completion callback
    /// never fires for a cancelled job and committed geometry is untouched.
    pub fn cancel(&self) {
        let mut state = self.state.lock().unwrap();
        let mut release = false;
        if let Some(active) = &mut state.active {
            active.cancel.store(true, Ordering::Relaxed);
            release = active.job.take().is_some();
        }
        if release {
            state.active = None;
        }
    }

    fn finish(&self, job_id: u64, progress: JobProgress) {
        Self::finish_with(
            &self.state,
            &self.queue,
            &self.completion,
            self.mesh_id,
            job_id,
            progress,
        );
    }

    fn finish_with(
        state: &Arc<Mutex<SchedulerState>>,
        queue: &QueueHandle,
        completion: &Arc<Mutex<Option<CompletionCallback>>>,
        mesh_id: u64,
        job_id: u64,
        progress: JobProgress,
    ) {
        let mut state = state.lock().unwrap();
        if state.active.as_ref().is_some_and(|a| a.id == job_id) {
            state.active = None;
        }
        match progress {
            JobProgress::Complete(output) => {
                if job_id == state.latest_job_id {
                    let output = Arc::new(output);
                    state.committed = Some(output.clone());
                    let event = BuildComplete {
                        mesh_id,
                        job_id,
                        layer_span: output.layer_span,
                    };
                    let completion = completion.clone();
                    queue.post(move || {
                        if let Some(callback) = completion.lock().unwrap().as_ref() {
                            callback(event);
                        }
                    });
                } else {
                    // A newer job started while this one ran; not an error
                    log::debug!("mesh {mesh_id}: discarding stale result of job {job_id}");
                }
            }
            JobProgress::Cancelled => {
                log::debug!("mesh {mesh_id}: job {job_id} unwound after cancellation");
            }
            JobProgress::InProgress => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::dispatch::WorkQueue;
    use crate::lattice::{Lattice, VoxelCoordinate};
    use crate::voxel::material::VoxelMaterial;
    use crate::voxel::voxel::Voxel;

    fn filled_store(count: i32) -> VoxelStore {
        let mut store = VoxelStore::new(Lattice::default());
        for x in 0..count {
            assert!(store.insert_if_free(Voxel::new(
                VoxelCoordinate::new(0, x, 0, 0),
                VoxelMaterial::default(),
            )));
        }
        store.invalidate();
        store
    }

    fn events(builder: &MeshBuilder) -> Arc<Mutex<Vec<BuildComplete>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        builder.set_completion(move |event| sink.lock().unwrap().push(event));
        log
    }

    #[test]
    fn test_immediate_build_commits_and_notifies() {
        let queue = WorkQueue::new();
        let builder = MeshBuilder::new(7, MeshConfig::default(), queue.handle());
        let log = events(&builder);
        let store = filled_store(4);

        let outcome = builder.start(&store, BuildOptions::default()).unwrap();
        assert!(matches!(outcome, StartOutcome::Started(_)));
        assert!(!builder.is_running());

        let output = builder.committed().expect("geometry committed");
        assert!(output.vertex_count() > 0);
        assert_eq!(output.layer_span, Some((0, 0)));

        // Callback fires on the pumping thread, exactly once
        assert!(log.lock().unwrap().is_empty());
        queue.pump();
        let fired = log.lock().unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].mesh_id, 7);
    }

    #[test]
    fn test_background_build_terminates() {
        let queue = WorkQueue::new();
        let builder = MeshBuilder::new(1, MeshConfig::default(), queue.handle());
        let log = events(&builder);
        let store = filled_store(8);

        builder
            .start(
                &store,
                BuildOptions { mode: ExecutionMode::Background, ..Default::default() },
            )
            .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        while builder.is_running() {
            assert!(std::time::Instant::now() < deadline, "background job hung");
            std::thread::sleep(Duration::from_millis(1));
        }

        queue.pump();
        assert_eq!(log.lock().unwrap().len(), 1);
        assert!(builder.committed().unwrap().vertex_count() > 0);
    }

    #[test]
    fn test_incremental_build_pumps_to_completion() {
        let queue = WorkQueue::new();
        let builder = MeshBuilder::new(1, MeshConfig::default(), queue.handle());
        let log = events(&builder);
        let store = filled_store(6);

        builder
            .start(
                &store,
                BuildOptions { mode: ExecutionMode::Incremental, ..Default::default() },
            )
            .unwrap();
        assert!(builder.is_running());

        let mut slices = 0;
        loop {
            match builder.poll_build_with(Duration::ZERO) {
                BuildPoll::InProgress => {
                    slices += 1;
                    assert!(slices < 10_000, "incremental build never finished");
                }
                BuildPoll::Completed => break,
                other => panic!("unexpected poll result {other:?}"),
            }
        }
        assert!(slices > 1, "job should have needed several slices");
        assert!(!builder.is_running());

        queue.pump();
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_start_without_force_is_noop_while_running() {
        let queue = WorkQueue::new();
        let builder = MeshBuilder::new(1, MeshConfig::default(), queue.handle());
        let store = filled_store(4);

        let first = builder
            .start(
                &store,
                BuildOptions { mode: ExecutionMode::Incremental, ..Default::default() },
            )
            .unwrap();
        assert!(matches!(first, StartOutcome::Started(_)));

        let second = builder
            .start(
                &store,
                BuildOptions { mode: ExecutionMode::Incremental, ..Default::default() },
            )
            .unwrap();
        assert_eq!(second, StartOutcome::AlreadyRunning);

        // Still exactly one job: pumping completes job one and goes idle
        loop {
            match builder.poll_build_with(Duration::from_millis(50)) {
                BuildPoll::Completed => break,
                BuildPoll::InProgress => {}
                other => panic!("unexpected poll result {other:?}"),
            }
        }
        assert_eq!(builder.poll_build_with(Duration::ZERO), BuildPoll::Idle);

        queue.pump();
        let committed = builder.committed().unwrap();
        assert!(committed.vertex_count() > 0);
    }

    #[test]
    fn test_force_start_replaces_running_job() {
        let queue = WorkQueue::new();
        let builder = MeshBuilder::new(1, MeshConfig::default(), queue.handle());
        let log = events(&builder);
        let store = filled_store(4);

        let StartOutcome::Started(first_id) = builder
            .start(
                &store,
                BuildOptions { mode: ExecutionMode::Incremental, ..Default::default() },
            )
            .unwrap()
        else {
            panic!("first start must run");
        };

        let StartOutcome::Started(second_id) = builder
            .start(
                &store,
                BuildOptions {
                    force: true,
                    mode: ExecutionMode::Incremental,
                    ..Default::default()
                },
            )
            .unwrap()
        else {
            panic!("forced start must run");
        };
        assert_ne!(first_id, second_id);

        loop {
            match builder.poll_build_with(Duration::from_millis(50)) {
                BuildPoll::Completed => break,
                BuildPoll::InProgress => {}
                other => panic!("unexpected poll result {other:?}"),
            }
        }

        queue.pump();
        let fired = log.lock().unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].job_id, second_id);
    }

    #[test]
    fn test_cancel_preserves_prior_geometry_and_skips_callback() {
        let queue = WorkQueue::new();
        let builder = MeshBuilder::new(1, MeshConfig::default(), queue.handle());
        let log = events(&builder);
        let store = filled_store(4);

        // Commit a first build
        builder.start(&store, BuildOptions::default()).unwrap();
        queue.pump();
        let before = builder.committed().unwrap();
        assert_eq!(log.lock().unwrap().len(), 1);

        // Start a second build incrementally and cancel before completion
        builder
            .start(
                &store,
                BuildOptions { mode: ExecutionMode::Incremental, ..Default::default() },
            )
            .unwrap();
        builder.cancel();
        assert!(!builder.is_running());
        assert_eq!(builder.poll_build_with(Duration::ZERO), BuildPoll::Idle);

        queue.pump();
        // No second completion, committed geometry unchanged
        assert_eq!(log.lock().unwrap().len(), 1);
        assert!(Arc::ptr_eq(&before, &builder.committed().unwrap()));
    }

    #[test]
    fn test_rebuild_of_unchanged_input_is_byte_identical() {
        let queue = WorkQueue::new();
        let builder = MeshBuilder::new(1, MeshConfig::default(), queue.handle());
        let store = filled_store(5);

        builder.start(&store, BuildOptions::default()).unwrap();
        let first = builder.committed().unwrap();
        builder.start(&store, BuildOptions::default()).unwrap();
        let second = builder.committed().unwrap();

        assert_eq!(first.submeshes.len(), second.submeshes.len());
        for (a, b) in first.submeshes.iter().zip(&second.submeshes) {
            assert_eq!(a.position_bytes(), b.position_bytes());
            assert_eq!(a.normal_bytes(), b.normal_bytes());
            assert_eq!(a.color_bytes(), b.color_bytes());
            assert_eq!(a.index_bytes(), b.index_bytes());
            assert_eq!(
                bytemuck::cast_slice::<_, u8>(&a.uv0),
                bytemuck::cast_slice::<_, u8>(&b.uv0)
            );
            assert_eq!(a.triangle_sources, b.triangle_sources);
        }
    }

    #[test]
    fn test_end_to_end_random_voxels() {
        fastrand::seed(0x5eed);
        let mut store = VoxelStore::new(Lattice::default());
        let mut placed = 0;
        while placed < 100 {
            let coord = VoxelCoordinate::new(
                0,
                fastrand::i32(-20..20),
                fastrand::i32(-20..20),
                fastrand::i32(-20..20),
            );
            if store.insert_if_free(Voxel::new(coord, VoxelMaterial::default())) {
                placed += 1;
            }
        }
        store.invalidate();

        let queue = WorkQueue::new();
        let builder = MeshBuilder::new(1, MeshConfig::default(), queue.handle());

        // Immediate mode terminates with non-empty output
        builder.start(&store, BuildOptions::default()).unwrap();
        let immediate = builder.committed().unwrap();
        assert!(immediate.vertex_count() > 0);
        assert!(immediate.submeshes.iter().any(|s| !s.indices.is_empty()));

        // Background mode terminates and matches byte for byte
        builder
            .start(
                &store,
                BuildOptions { mode: ExecutionMode::Background, ..Default::default() },
            )
            .unwrap();
        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        while builder.is_running() {
            assert!(std::time::Instant::now() < deadline, "background job hung");
            std::thread::sleep(Duration::from_millis(1));
        }
        let background = builder.committed().unwrap();
        for (a, b) in immediate.submeshes.iter().zip(&background.submeshes) {
            assert_eq!(a.position_bytes(), b.position_bytes());
            assert_eq!(a.index_bytes(), b.index_bytes());
        }
    }

    #[test]
    fn test_snapshot_error_propagates() {
        let queue = WorkQueue::new();
        let builder = MeshBuilder::new(1, MeshConfig::default(), queue.handle());
        let store = filled_store(1);

        let result = builder.start(
            &store,
            BuildOptions { layer_range: Some((3, -3)), ..Default::default() },
        );
        assert!(result.is_err());
        assert!(!builder.is_running());
    }
}
