//! Resumable mesh build job

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::core::config::MeshConfig;
use crate::lattice::Lattice;
use crate::mesh::assemble::{MeshAssembler, PointOffsets, assembly_order};
use crate::mesh::buffers::MeshOutput;
use crate::mesh::decompose::decompose_voxel;
use crate::mesh::face::FaceCoordinate;
use crate::mesh::intermediate::IntermediateMeshData;
use crate::mesh::optimize::{FaceOptimizer, build_pipeline};
use crate::voxel::voxel::Voxel;

/// Result of polling a job
pub enum JobProgress {
    /// Budget exhausted; call poll again to resume
    InProgress,
    /// The cancellation flag was observed; the job unwound without
    /// producing output
    Cancelled,
    /// The finished mesh
    Complete(MeshOutput),
}

/// Pipeline position, carried across polls
enum Stage {
    Decompose { next: usize },
    Optimize { next: usize },
    Assemble {
        keys: Vec<FaceCoordinate>,
        next: usize,
        assembler: Option<MeshAssembler>,
    },
    Finished,
}

/// One mesh rebuild, drivable to completion in a single call or in bounded
/// time slices.
///
/// The job owns its [`IntermediateMeshData`] exclusively; cancelling or
/// dropping the job releases it without touching any caller-visible state.
/// The cancellation flag is polled at every voxel and face boundary and
/// between optimiser passes.
pub struct BuildJob {
    id: u64,
    lattice: Lattice,
    cancel: Arc<AtomicBool>,
    data: IntermediateMeshData,
    passes: Vec<Box<dyn FaceOptimizer>>,
    offsets: Option<PointOffsets>,
    stage: Stage,
}

impl BuildJob {
    /// Create a job over a deterministic voxel snapshot
    pub fn new(
        id: u64,
        config: &MeshConfig,
        snapshot: Vec<Voxel>,
        offsets: PointOffsets,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            lattice: config.lattice,
            cancel,
            data: IntermediateMeshData::new(snapshot),
            passes: build_pipeline(&config.optimizers, config.merge_policy),
            offsets: Some(offsets),
            stage: Stage::Decompose { next: 0 },
        }
    }

    /// Job identity, compared against the scheduler's latest id on
    /// completion
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Drive the job until done or cancelled
    pub fn run(&mut self) -> JobProgress {
        self.poll(None)
    }

    /// Advance the pipeline until the budget is exhausted.
    ///
    /// At least one unit of work is performed per call, so a zero budget
    /// still makes progress. `None` runs to completion.
    pub fn poll(&mut self, budget: Option<Duration>) -> JobProgress {
        let start = Instant::now();
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                log::debug!("build job {} cancelled, unwinding", self.id);
                return JobProgress::Cancelled;
            }

            match &mut self.stage {
                Stage::Decompose { next } => {
                    if *next < self.data.voxels.len() {
                        let voxel = self.data.voxels[*next].clone();
                        *next += 1;
                        if let Err(err) = decompose_voxel(&self.lattice, &voxel, &mut self.data) {
                            // One malformed voxel must not block the rebuild
                            log::warn!(
                                "build job {}: skipping voxel {}: {err}",
                                self.id,
                                voxel.coordinate
                            );
                        }
                    } else {
                        log::trace!(
                            "build job {}: decomposed {} voxels into {} faces",
                            self.id,
                            self.data.voxels.len(),
                            self.data.face_count()
                        );
                        self.stage = Stage::Optimize { next: 0 };
                    }
                }
                Stage::Optimize { next } => {
                    if *next < self.passes.len() {
                        let pass = &self.passes[*next];
                        *next += 1;
                        pass.run(&mut self.data);
                    } else {
                        let keys = assembly_order(&self.data);
                        let assembler = MeshAssembler::new(
                            self.lattice,
                            self.offsets.take().unwrap_or_default(),
                        );
                        self.stage = Stage::Assemble {
                            keys,
                            next: 0,
                            assembler: Some(assembler),
                        };
                    }
                }
                Stage::Assemble { keys, next, assembler } => {
                    if *next < keys.len() {
                        let key = keys[*next];
                        *next += 1;
                        let face = self.data.faces[&key];
                        assembler
                            .as_mut()
                            .expect("assembler present until finish")
                            .push_face(&key, &face);
                    } else {
                        let output = assembler
                            .take()
                            .expect("assembler present until finish")
                            .finish(self.data.layer_span());
                        self.stage = Stage::Finished;
                        return JobProgress::Complete(output);
                    }
                }
                Stage::Finished => {
                    log::debug!("build job {} polled after completion", self.id);
                    return JobProgress::Cancelled;
                }
            }

            if let Some(budget) = budget {
                if start.elapsed() >= budget {
                    return JobProgress::InProgress;
                }
            }
        }
    }
}
