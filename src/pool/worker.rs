//! Per-thread inference worker (§4.5): compiles the spec once at init,
//! owns one [`Brain`] per population slot, and answers `infer`/`reset`
//! requests against the pool's shared regions.

use crate::compiler::compile_cached;
use crate::ir::GraphSpec;
use crate::pool::shared::SharedRegion;
use crate::runtime::Brain;
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;

pub enum ToWorker {
    Init(Box<InitMsg>),
    Infer { batch_id: u64, start: usize, count: usize },
    Reset,
    Shutdown,
}

pub struct InitMsg {
    pub spec: Arc<GraphSpec>,
    pub population_count: usize,
    pub param_count: usize,
    pub input_stride: usize,
    pub output_stride: usize,
    pub weights: Arc<SharedRegion<f32>>,
    pub input: Arc<SharedRegion<f32>>,
    pub output: Arc<SharedRegion<f32>>,
    pub index: Arc<SharedRegion<u32>>,
}

pub enum FromWorker {
    Ready { worker_id: usize },
    Done { worker_id: usize, batch_id: u64 },
    Error { worker_id: usize, reason: String },
}

struct WorkerState {
    brains: Vec<Brain>,
    input: Arc<SharedRegion<f32>>,
    output: Arc<SharedRegion<f32>>,
    index: Arc<SharedRegion<u32>>,
    input_stride: usize,
    output_stride: usize,
}

impl WorkerState {
    fn build(msg: InitMsg) -> Result<Self, String> {
        let compiled = compile_cached(&msg.spec).map_err(|e| e.to_string())?;
        if compiled.total_params != msg.param_count {
            return Err(format!(
                "paramCount mismatch: graph needs {}, pool configured {}",
                compiled.total_params, msg.param_count
            ));
        }

        let weights = msg.weights.as_slice();
        let mut brains = Vec::with_capacity(msg.population_count);
        for slot in 0..msg.population_count {
            let slab = &weights[slot * msg.param_count..(slot + 1) * msg.param_count];
            let brain = Brain::new(Arc::clone(&compiled), slab).map_err(|e| e.to_string())?;
            brains.push(brain);
        }

        Ok(Self {
            brains,
            input: msg.input,
            output: msg.output,
            index: msg.index,
            input_stride: msg.input_stride,
            output_stride: msg.output_stride,
        })
    }

    fn infer(&mut self, start: usize, count: usize) {
        for b in start..start + count {
            let idx = self.index.as_slice()[b] as usize;
            let in_slice = &self.input.as_slice()[b * self.input_stride..(b + 1) * self.input_stride];
            let out_range = b * self.output_stride..(b + 1) * self.output_stride;

            if idx >= self.brains.len() {
                for v in self.output.sub_slice_mut(out_range) {
                    *v = 0.0;
                }
                continue;
            }

            let produced = self.brains[idx].forward(in_slice);
            let out = self.output.sub_slice_mut(out_range);
            let copy_len = produced.len().min(out.len());
            out[..copy_len].copy_from_slice(&produced[..copy_len]);
            for v in &mut out[copy_len..] {
                *v = 0.0;
            }
        }
    }

    fn reset(&mut self) {
        for brain in &mut self.brains {
            brain.reset();
        }
    }
}

/// Worker event loop. Runs until a `Shutdown` message (or channel
/// disconnect) terminates it.
pub fn run(worker_id: usize, rx: Receiver<ToWorker>, tx: Sender<FromWorker>) {
    let mut state: Option<WorkerState> = None;

    loop {
        let msg = match rx.recv() {
            Ok(msg) => msg,
            Err(_) => return,
        };

        match msg {
            ToWorker::Init(init) => match WorkerState::build(*init) {
                Ok(s) => {
                    state = Some(s);
                    let _ = tx.send(FromWorker::Ready { worker_id });
                }
                Err(reason) => {
                    let _ = tx.send(FromWorker::Error { worker_id, reason });
                }
            },
            ToWorker::Infer { batch_id, start, count } => match state.as_mut() {
                Some(s) => {
                    s.infer(start, count);
                    let _ = tx.send(FromWorker::Done { worker_id, batch_id });
                }
                None => {
                    let _ = tx.send(FromWorker::Error {
                        worker_id,
                        reason: "infer requested before a successful init".into(),
                    });
                }
            },
            ToWorker::Reset => {
                if let Some(s) = state.as_mut() {
                    s.reset();
                }
                let _ = tx.send(FromWorker::Ready { worker_id });
            }
            ToWorker::Shutdown => {
                let _ = tx.send(FromWorker::Ready { worker_id });
                return;
            }
        }
    }
}
