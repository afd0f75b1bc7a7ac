//! Off-thread mesh building.
//!
//! Jobs carry a value copy of the chunk ([`MeshInput`]), so the simulation
//! thread keeps full ownership of the live chunk. A dedicated worker thread
//! receives batches and fans them out over rayon; results come back over a
//! channel and are picked up by polling.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use hashbrown::HashMap;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, error, warn};
use voxterra_core::coords::ChunkPos;

use crate::input::MeshInput;
use crate::mesh::ChunkMesh;
use crate::{build_mesh, MeshStrategy};

/// Failure inside an offloaded mesh job.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshJobError {
    /// The meshing computation panicked.
    #[error("mesh job for chunk {pos:?} panicked: {message}")]
    Panicked { pos: ChunkPos, message: String },
}

/// A chunk snapshot queued for meshing.
#[derive(Debug)]
pub struct MeshJob {
    pub input: MeshInput,
    /// Chunk revision the snapshot was taken at.
    pub revision: u64,
}

/// Outcome of one mesh job.
#[derive(Debug)]
pub struct MeshWorkResult {
    pub pos: ChunkPos,
    pub revision: u64,
    pub outcome: Result<ChunkMesh, MeshJobError>,
}

/// Work request sent to the background worker thread.
#[derive(Debug)]
enum MeshWorkRequest {
    Build(Vec<MeshJob>),
    Shutdown,
}

type Mesher = fn(&MeshInput) -> ChunkMesh;

fn greedy_mesher(input: &MeshInput) -> ChunkMesh {
    build_mesh(input, MeshStrategy::Greedy)
}

fn naive_mesher(input: &MeshInput) -> ChunkMesh {
    build_mesh(input, MeshStrategy::Naive)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_owned())
}

/// Handle to the background mesh worker thread.
struct MeshWorkerHandle {
    request_tx: Sender<MeshWorkRequest>,
    result_rx: Receiver<MeshWorkResult>,
    thread: Option<JoinHandle<()>>,
}

impl MeshWorkerHandle {
    fn spawn(mesher: Mesher, queue_depth: usize) -> std::io::Result<Self> {
        let (request_tx, request_rx) = channel::bounded::<MeshWorkRequest>(queue_depth);
        let (result_tx, result_rx) = channel::unbounded::<MeshWorkResult>();

        let thread = thread::Builder::new()
            .name("mesh-worker".to_string())
            .spawn(move || Self::worker_loop(mesher, &request_rx, &result_tx))?;

        Ok(Self {
            request_tx,
            result_rx,
            thread: Some(thread),
        })
    }

    /// Blocks waiting for requests; each batch is meshed in parallel.
    fn worker_loop(mesher: Mesher, request_rx: &Receiver<MeshWorkRequest>, result_tx: &Sender<MeshWorkResult>) {
        loop {
            match request_rx.recv() {
                Ok(MeshWorkRequest::Build(jobs)) => {
                    let results: Vec<MeshWorkResult> = jobs
                        .into_par_iter()
                        .map(|job| {
                            let pos = job.input.pos();
                            let outcome = panic::catch_unwind(AssertUnwindSafe(|| mesher(&job.input)))
                                .map_err(|payload| MeshJobError::Panicked {
                                    pos,
                                    message: panic_message(payload.as_ref()),
                                });
                            MeshWorkResult {
                                pos,
                                revision: job.revision,
                                outcome,
                            }
                        })
                        .collect();
                    for result in results {
                        if result_tx.send(result).is_err() {
                            return;
                        }
                    }
                }
                Ok(MeshWorkRequest::Shutdown) | Err(_) => return,
            }
        }
    }

    fn shutdown(&mut self) {
        // The channel may already be closed.
        let _ = self.request_tx.send(MeshWorkRequest::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("mesh worker thread panicked");
            }
        }
    }
}

impl Drop for MeshWorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Tracks in-flight mesh jobs and collects their results.
///
/// At most one job per chunk is in flight; results for a chunk are applied
/// by the caller on the simulation thread.
pub struct MeshScheduler {
    worker: MeshWorkerHandle,
    in_flight: HashMap<ChunkPos, u64>,
    ready: Vec<MeshWorkResult>,
}

impl std::fmt::Debug for MeshScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshScheduler")
            .field("in_flight", &self.in_flight.len())
            .field("ready", &self.ready.len())
            .finish_non_exhaustive()
    }
}

impl MeshScheduler {
    /// Spawn the worker thread.
    pub fn spawn(strategy: MeshStrategy) -> std::io::Result<Self> {
        let mesher = match strategy {
            MeshStrategy::Greedy => greedy_mesher as Mesher,
            MeshStrategy::Naive => naive_mesher as Mesher,
        };
        Self::spawn_with(mesher)
    }

    fn spawn_with(mesher: Mesher) -> std::io::Result<Self> {
        Ok(Self {
            worker: MeshWorkerHandle::spawn(mesher, 16)?,
            in_flight: HashMap::new(),
            ready: Vec::new(),
        })
    }

    /// Number of jobs submitted but not yet returned by [`poll`](Self::poll).
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Whether a job for `pos` is outstanding.
    pub fn is_in_flight(&self, pos: ChunkPos) -> bool {
        self.in_flight.contains_key(&pos)
    }

    /// Queue a batch of jobs. Jobs for chunks that already have one in flight
    /// are skipped. Returns the jobs that were not accepted (duplicates or a
    /// full queue) so their chunks stay dirty for the next tick.
    pub fn submit(&mut self, jobs: Vec<MeshJob>) -> Vec<ChunkPos> {
        let mut rejected = Vec::new();
        let mut batch = Vec::with_capacity(jobs.len());
        for job in jobs {
            let pos = job.input.pos();
            if self.in_flight.contains_key(&pos) {
                rejected.push(pos);
            } else {
                self.in_flight.insert(pos, job.revision);
                batch.push(job);
            }
        }
        if batch.is_empty() {
            return rejected;
        }

        if let Err(err) = self.worker.request_tx.try_send(MeshWorkRequest::Build(batch)) {
            let MeshWorkRequest::Build(batch) = err.into_inner() else {
                return rejected;
            };
            debug!(count = batch.len(), "mesh queue full, deferring batch");
            for job in batch {
                let pos = job.input.pos();
                self.in_flight.remove(&pos);
                rejected.push(pos);
            }
        }
        rejected
    }

    fn accept(&mut self, result: MeshWorkResult) -> MeshWorkResult {
        self.in_flight.remove(&result.pos);
        if let Err(e) = &result.outcome {
            error!(error = %e, "mesh job failed, chunk stays dirty");
        }
        result
    }

    /// Collect every finished job without blocking.
    pub fn poll(&mut self) -> Vec<MeshWorkResult> {
        let mut out = std::mem::take(&mut self.ready);
        while let Ok(result) = self.worker.result_rx.try_recv() {
            out.push(self.accept(result));
        }
        out
    }

    /// Block until the job for `pos` (if any) finishes and return it.
    ///
    /// Other results received meanwhile are kept for the next [`poll`](Self::poll).
    pub fn wait_for(&mut self, pos: ChunkPos) -> Option<MeshWorkResult> {
        if let Some(i) = self.ready.iter().position(|r| r.pos == pos) {
            return Some(self.ready.swap_remove(i));
        }
        while self.in_flight.contains_key(&pos) {
            let Ok(result) = self.worker.result_rx.recv() else {
                warn!(?pos, "mesh worker disconnected while waiting");
                self.in_flight.clear();
                return None;
            };
            let result = self.accept(result);
            if result.pos == pos {
                return Some(result);
            }
            self.ready.push(result);
        }
        None
    }

    /// Block until every outstanding job has finished; returns all results.
    pub fn drain(&mut self) -> Vec<MeshWorkResult> {
        let mut out = std::mem::take(&mut self.ready);
        while !self.in_flight.is_empty() {
            let Ok(result) = self.worker.result_rx.recv() else {
                warn!(pending = self.in_flight.len(), "mesh worker disconnected while draining");
                self.in_flight.clear();
                break;
            };
            out.push(self.accept(result));
        }
        out
    }
}
