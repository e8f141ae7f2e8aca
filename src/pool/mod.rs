//! Batch inference pool (§4.4): owns a fleet of worker threads and four
//! shared memory regions, and fans a batch of `(agent-index, input)`
//! pairs out to them with an at-most-one-in-flight-batch guarantee.

mod error;
mod shared;
mod worker;

pub use error::PoolError;
pub use shared::SharedRegion;

use crate::ir::GraphSpec;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use worker::{FromWorker, InitMsg, ToWorker};

const INIT_TIMEOUT: Duration = Duration::from_secs(15);
const RESET_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool lifecycle state (§4.4). `Starting` is a transient state observed
/// only while `init` is in flight within the current thread of control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Disabled,
    Starting,
    Ready,
    Failed,
}

/// Everything `init` needs to stand the pool up. A plain, programmatically
/// constructed struct (no file-based config format -- see DESIGN.md).
pub struct PoolOptions {
    pub spec: GraphSpec,
    pub spec_key: String,
    pub population_count: usize,
    pub param_count: usize,
    pub input_stride: usize,
    pub output_stride: usize,
    pub max_batch: usize,
    pub weights: Vec<f32>,
    /// `None`/`Some(0)` and negative requests are not representable in
    /// `usize`; `r <= 0` from §4.4's formula is modeled by `None`.
    pub worker_count: Option<usize>,
}

struct WorkerHandle {
    tx: Sender<ToWorker>,
    join: Option<JoinHandle<()>>,
}

pub struct BatchPool {
    status: Status,
    workers: Vec<WorkerHandle>,
    from_workers_rx: Receiver<FromWorker>,
    from_workers_tx: Sender<FromWorker>,
    weights: Option<Arc<SharedRegion<f32>>>,
    input: Option<Arc<SharedRegion<f32>>>,
    output: Option<Arc<SharedRegion<f32>>>,
    index: Option<Arc<SharedRegion<u32>>>,
    spec_key: String,
    input_stride: usize,
    output_stride: usize,
    max_batch: usize,
    inflight: Option<HashSet<usize>>,
    next_batch_id: AtomicU64,
}

impl Default for BatchPool {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchPool {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            status: Status::Disabled,
            workers: Vec::new(),
            from_workers_rx: rx,
            from_workers_tx: tx,
            weights: None,
            input: None,
            output: None,
            index: None,
            spec_key: String::new(),
            input_stride: 0,
            output_stride: 0,
            max_batch: 0,
            inflight: None,
            next_batch_id: AtomicU64::new(0),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Effective worker count per §4.4's formula: `r <= 0` requests
    /// `max(1, cores-1)`; a positive request is clamped to that ceiling.
    fn effective_worker_count(requested: Option<usize>) -> usize {
        let ceiling = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .saturating_sub(1)
            .max(1);
        match requested {
            None | Some(0) => ceiling,
            Some(r) => r.min(ceiling),
        }
    }

    /// Idempotent: always shuts down any existing workers first.
    pub fn init(&mut self, options: PoolOptions) -> Result<(), PoolError> {
        self.shutdown();
        self.status = Status::Starting;

        let compiled = crate::compiler::compile_cached(&options.spec).map_err(|e| {
            self.status = Status::Failed;
            PoolError::GraphInvalid(e.to_string())
        })?;
        if compiled.total_params != options.param_count {
            self.status = Status::Failed;
            return Err(PoolError::SizeMismatch(format!(
                "paramCount {} does not match the compiled graph's totalParams {}",
                options.param_count, compiled.total_params
            )));
        }

        let worker_count = Self::effective_worker_count(options.worker_count);

        let weights_len = options.population_count * options.param_count;
        if options.weights.len() != weights_len {
            self.status = Status::Failed;
            return Err(PoolError::SizeMismatch(format!(
                "weights length {} does not match populationCount*paramCount {}",
                options.weights.len(),
                weights_len
            )));
        }

        let weights_region: Arc<SharedRegion<f32>> = Arc::new(SharedRegion::new(weights_len));
        weights_region.as_mut_slice().copy_from_slice(&options.weights);
        let input_region: Arc<SharedRegion<f32>> =
            Arc::new(SharedRegion::new(options.max_batch * options.input_stride));
        let output_region: Arc<SharedRegion<f32>> =
            Arc::new(SharedRegion::new(options.max_batch * options.output_stride));
        let index_region: Arc<SharedRegion<u32>> = Arc::new(SharedRegion::new(options.max_batch));

        let spec = Arc::new(options.spec);
        let mut workers = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let (to_worker_tx, to_worker_rx) = unbounded();
            let from_workers_tx = self.from_workers_tx.clone();
            let join = std::thread::Builder::new()
                .name(format!("nc-worker-{id}"))
                .spawn(move || worker::run(id, to_worker_rx, from_workers_tx))
                .expect("spawning a worker thread");
            workers.push(WorkerHandle {
                tx: to_worker_tx,
                join: Some(join),
            });

            let init_msg = InitMsg {
                spec: Arc::clone(&spec),
                population_count: options.population_count,
                param_count: options.param_count,
                input_stride: options.input_stride,
                output_stride: options.output_stride,
                weights: Arc::clone(&weights_region),
                input: Arc::clone(&input_region),
                output: Arc::clone(&output_region),
                index: Arc::clone(&index_region),
            };
            let _ = workers[id].tx.send(ToWorker::Init(Box::new(init_msg)));
        }

        let result = self.await_acks(&workers, worker_count, INIT_TIMEOUT, "init");

        match result {
            Ok(()) => {
                self.workers = workers;
                self.weights = Some(weights_region);
                self.input = Some(input_region);
                self.output = Some(output_region);
                self.index = Some(index_region);
                self.spec_key = options.spec_key;
                self.input_stride = options.input_stride;
                self.output_stride = options.output_stride;
                self.max_batch = options.max_batch;
                self.status = Status::Ready;
                Ok(())
            }
            Err(e) => {
                self.terminate_workers(workers);
                self.status = Status::Failed;
                self.emit_failure(&e);
                Err(e)
            }
        }
    }

    fn await_acks(
        &self,
        workers: &[WorkerHandle],
        expected: usize,
        timeout: Duration,
        _what: &str,
    ) -> Result<(), PoolError> {
        let deadline = Instant::now() + timeout;
        let mut acked: HashSet<usize> = HashSet::new();
        while acked.len() < expected {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                let missing = (0..workers.len()).find(|i| !acked.contains(i)).unwrap_or(0);
                return Err(PoolError::WorkerTimeout(missing));
            }
            match self.from_workers_rx.recv_timeout(remaining) {
                Ok(FromWorker::Ready { worker_id }) => {
                    acked.insert(worker_id);
                }
                Ok(FromWorker::Error { worker_id, reason }) => {
                    return Err(PoolError::WorkerCrash(worker_id, reason));
                }
                Ok(FromWorker::Done { .. }) => {}
                Err(RecvTimeoutError::Timeout) => {
                    let missing = (0..workers.len()).find(|i| !acked.contains(i)).unwrap_or(0);
                    return Err(PoolError::WorkerTimeout(missing));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(PoolError::WorkerCrash(0, "worker channel disconnected".into()));
                }
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn run_batch(
        &mut self,
        inputs: &[f32],
        outputs: &mut [f32],
        indices: &[u32],
        count: usize,
        input_stride: usize,
        output_stride: usize,
    ) -> Result<(), PoolError> {
        if self.status != Status::Ready {
            return Err(PoolError::NotReady);
        }
        if self.inflight.is_some() {
            return Err(PoolError::InFlight);
        }
        if input_stride != self.input_stride || output_stride != self.output_stride {
            return Err(PoolError::SizeMismatch("stride does not match init-time stride".into()));
        }
        if count > self.max_batch
            || inputs.len() < count * input_stride
            || outputs.len() < count * output_stride
            || indices.len() < count
        {
            return Err(PoolError::SizeMismatch("buffer too small for requested batch".into()));
        }

        let input_region = self.input.as_ref().expect("ready pool has shared regions").clone();
        let output_region = self.output.as_ref().expect("ready pool has shared regions").clone();
        let index_region = self.index.as_ref().expect("ready pool has shared regions").clone();

        input_region.as_mut_slice()[..count * input_stride].copy_from_slice(&inputs[..count * input_stride]);
        index_region.as_mut_slice()[..count].copy_from_slice(&indices[..count]);
        for v in &mut output_region.as_mut_slice()[..count * output_stride] {
            *v = 0.0;
        }

        let worker_count = self.workers.len().max(1);
        let chunk = (count + worker_count - 1) / worker_count;
        let batch_id = self.next_batch_id.fetch_add(1, Ordering::Relaxed);

        let mut messaged = HashSet::new();
        for (i, worker) in self.workers.iter().enumerate() {
            let start = i * chunk;
            let end = (start + chunk).min(count);
            if start >= end {
                continue;
            }
            let _ = worker.tx.send(ToWorker::Infer {
                batch_id,
                start,
                count: end - start,
            });
            messaged.insert(i);
        }
        self.inflight = Some(messaged.clone());

        while !messaged.is_empty() {
            match self.from_workers_rx.recv() {
                Ok(FromWorker::Done { worker_id, batch_id: id }) if id == batch_id => {
                    messaged.remove(&worker_id);
                }
                Ok(FromWorker::Error { worker_id, reason }) => {
                    self.inflight = None;
                    self.status = Status::Failed;
                    let err = PoolError::WorkerCrash(worker_id, reason);
                    self.emit_failure(&err);
                    return Err(err);
                }
                Ok(_) => {}
                Err(_) => {
                    self.inflight = None;
                    self.status = Status::Failed;
                    let err = PoolError::WorkerCrash(0, "worker channel disconnected mid-batch".into());
                    self.emit_failure(&err);
                    return Err(err);
                }
            }
        }

        self.inflight = None;
        outputs[..count * output_stride].copy_from_slice(&output_region.as_slice()[..count * output_stride]);
        Ok(())
    }

    pub fn update_weights(&mut self, new_weights: &[f32]) -> Result<(), PoolError> {
        if self.status != Status::Ready {
            return Err(PoolError::NotReady);
        }
        if self.inflight.is_some() {
            return Err(PoolError::InFlight);
        }
        let region = self.weights.as_ref().expect("ready pool has a weights region");
        if new_weights.len() != region.len() {
            return Err(PoolError::SizeMismatch("updateWeights length must match the weight region exactly".into()));
        }
        region.as_mut_slice().copy_from_slice(new_weights);
        Ok(())
    }

    pub fn reset_brains(&mut self) -> Result<(), PoolError> {
        if self.status != Status::Ready {
            return Err(PoolError::NotReady);
        }
        for worker in &self.workers {
            let _ = worker.tx.send(ToWorker::Reset);
        }
        match self.await_acks(&self.workers, self.workers.len(), RESET_TIMEOUT, "reset") {
            Ok(()) => Ok(()),
            Err(e) => {
                self.status = Status::Failed;
                self.emit_failure(&e);
                Err(e)
            }
        }
    }

    pub fn shutdown(&mut self) {
        let workers = std::mem::take(&mut self.workers);
        self.terminate_workers(workers);
        self.weights = None;
        self.input = None;
        self.output = None;
        self.index = None;
        self.inflight = None;
        self.status = Status::Disabled;
    }

    fn terminate_workers(&self, workers: Vec<WorkerHandle>) {
        for worker in &workers {
            let _ = worker.tx.send(ToWorker::Shutdown);
        }
        for mut worker in workers {
            if let Some(join) = worker.join.take() {
                let _ = join.join();
            }
        }
    }

    fn emit_failure(&self, error: &PoolError) {
        tracing::error!(spec_key = %self.spec_key, reason = %error, "batch pool transitioned to failed");
    }

    /// Test-only fault injection: simulate a worker reporting an error,
    /// without requiring a real worker thread to misbehave.
    #[cfg(test)]
    pub(crate) fn inject_worker_error(&self, worker_id: usize, reason: &str) {
        let _ = self.from_workers_tx.send(FromWorker::Error {
            worker_id,
            reason: reason.to_string(),
        });
    }
}

impl Drop for BatchPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
