//! `nc-bench`: a manual smoke-test harness for the batch inference pool.
//!
//! Compiles a graph spec from a JSON file, spins up a pool, drives a
//! handful of synthetic batches through it, and prints per-batch
//! latency. Not part of the core's public contract -- a debugging aid,
//! in the spirit of the source crate's auxiliary `src/bin/*` binaries.

use anyhow::{Context, Result};
use clap::Parser;
use neuropool::{compile_cached, BatchPool, GraphSpec, PoolOptions};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "nc-bench", about = "Synthetic batch-latency smoke test")]
struct Args {
    /// Path to a JSON graph spec.
    spec: PathBuf,

    /// Number of brains in the population.
    #[arg(long, default_value_t = 8)]
    population: usize,

    /// Batch size per call to run_batch.
    #[arg(long, default_value_t = 32)]
    max_batch: usize,

    /// Number of synthetic batches to run.
    #[arg(long, default_value_t = 10)]
    batches: usize,

    /// Worker count; omit to use max(1, cores-1).
    #[arg(long)]
    workers: Option<usize>,

    /// Install a tracing-subscriber for pool/worker lifecycle events.
    #[arg(long)]
    tracing: bool,

    /// RNG seed for synthetic weights/inputs/indices.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.tracing {
        tracing_subscriber::fmt::init();
    }

    let spec_json = std::fs::read_to_string(&args.spec)
        .with_context(|| format!("reading graph spec from {}", args.spec.display()))?;
    let spec: GraphSpec = serde_json::from_str(&spec_json).context("parsing graph spec JSON")?;

    let compiled = compile_cached(&spec).context("compiling graph spec")?;
    let input_size = compiled.nodes[compiled.input_node_index()].output_size;
    let output_size = compiled.output_size;
    let total_params = compiled.total_params;

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let weights: Vec<f32> = (0..args.population * total_params)
        .map(|_| rng.gen_range(-1.0..1.0))
        .collect();

    let mut pool = BatchPool::new();
    pool.init(PoolOptions {
        spec,
        spec_key: compiled.graph_key.clone(),
        population_count: args.population,
        param_count: total_params,
        input_stride: input_size,
        output_stride: output_size,
        max_batch: args.max_batch,
        weights,
        worker_count: args.workers,
    })
    .context("initializing batch pool")?;

    println!(
        "pool ready: population={} totalParams={} inputSize={} outputSize={} workers={:?}",
        args.population, total_params, input_size, output_size, args.workers
    );

    let mut outputs = vec![0.0f32; args.max_batch * output_size];
    for batch in 0..args.batches {
        let inputs: Vec<f32> = (0..args.max_batch * input_size)
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect();
        let indices: Vec<u32> = (0..args.max_batch)
            .map(|_| rng.gen_range(0..args.population as u32))
            .collect();

        let start = Instant::now();
        pool.run_batch(&inputs, &mut outputs, &indices, args.max_batch, input_size, output_size)
            .context("running batch")?;
        let elapsed = start.elapsed();
        println!("batch {batch}: {:.3} ms", elapsed.as_secs_f64() * 1000.0);
    }

    pool.shutdown();
    Ok(())
}
