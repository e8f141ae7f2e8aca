//! Black-box integration tests for the batch pool's multi-worker sharding,
//! weight updates, and lifecycle transitions, driven only through the
//! public `neuropool` API (crate-internal fault injection lives beside
//! `BatchPool` in `src/pool/mod.rs`, see `s6_pool_failure_containment`).

use neuropool::{compile_cached, BatchPool, Edge, GraphSpec, Node, NodeKind, OutputRef, PoolOptions, Status};

fn dense_identity_spec(size: usize) -> GraphSpec {
    GraphSpec {
        spec_type: "graph".into(),
        nodes: vec![
            Node {
                id: "in".into(),
                kind: NodeKind::Input { output_size: size },
            },
            Node {
                id: "d".into(),
                kind: NodeKind::Dense {
                    input_size: size,
                    output_size: size,
                },
            },
        ],
        edges: vec![Edge {
            from: "in".into(),
            to: "d".into(),
            from_port: None,
            to_port: None,
        }],
        outputs: vec![OutputRef {
            node_id: "d".into(),
            port: None,
        }],
        output_size: size,
    }
}

fn identity_weights(size: usize) -> Vec<f32> {
    let mut w = vec![0.0f32; size * size + size];
    for i in 0..size {
        w[i * size + i] = 1.0;
    }
    w
}

fn scaled_weights(size: usize, scale: f32) -> Vec<f32> {
    let mut w = vec![0.0f32; size * size + size];
    for i in 0..size {
        w[i * size + i] = scale;
    }
    w
}

/// A batch much larger than the worker count exercises sharding: every
/// worker handles a contiguous sub-range, and output ordering must match
/// input ordering regardless of which worker produced which slot.
#[test]
fn sharded_batch_preserves_output_order() {
    let spec = dense_identity_spec(1);
    let compiled = compile_cached(&spec).unwrap();
    let weights = scaled_weights(1, 3.0);

    let mut pool = BatchPool::new();
    pool.init(PoolOptions {
        spec,
        spec_key: compiled.graph_key.clone(),
        population_count: 1,
        param_count: compiled.total_params,
        input_stride: 1,
        output_stride: 1,
        max_batch: 17,
        weights,
        worker_count: Some(4),
    })
    .unwrap();

    let inputs: Vec<f32> = (0..17).map(|i| i as f32).collect();
    let indices = vec![0u32; 17];
    let mut outputs = vec![0.0f32; 17];
    pool.run_batch(&inputs, &mut outputs, &indices, 17, 1, 1).unwrap();

    let expected: Vec<f32> = inputs.iter().map(|x| x * 3.0).collect();
    assert_eq!(outputs, expected);
    pool.shutdown();
}

/// A batch smaller than the worker count leaves some workers unmessaged;
/// the messaged subset must still fully cover the batch.
#[test]
fn small_batch_with_many_workers() {
    let spec = dense_identity_spec(1);
    let compiled = compile_cached(&spec).unwrap();
    let weights = identity_weights(1);

    let mut pool = BatchPool::new();
    pool.init(PoolOptions {
        spec,
        spec_key: compiled.graph_key.clone(),
        population_count: 1,
        param_count: compiled.total_params,
        input_stride: 1,
        output_stride: 1,
        max_batch: 8,
        weights,
        worker_count: Some(8),
    })
    .unwrap();

    let inputs = [1.0f32, 2.0];
    let indices = [0u32, 0];
    let mut outputs = [0.0f32; 2];
    pool.run_batch(&inputs, &mut outputs, &indices, 2, 1, 1).unwrap();
    assert_eq!(outputs, [1.0, 2.0]);
    pool.shutdown();
}

/// `updateWeights` takes effect on the very next `runBatch`, without the
/// pool being re-initialized (property 10).
#[test]
fn update_weights_applies_without_reinit() {
    let spec = dense_identity_spec(2);
    let compiled = compile_cached(&spec).unwrap();
    let weights = identity_weights(2);

    let mut pool = BatchPool::new();
    pool.init(PoolOptions {
        spec,
        spec_key: compiled.graph_key.clone(),
        population_count: 1,
        param_count: compiled.total_params,
        input_stride: 2,
        output_stride: 2,
        max_batch: 2,
        weights,
        worker_count: Some(2),
    })
    .unwrap();

    let inputs = [1.0, 1.0, 1.0, 1.0];
    let indices = [0u32, 0];
    let mut outputs = [0.0f32; 4];
    pool.run_batch(&inputs, &mut outputs, &indices, 2, 2, 2).unwrap();
    assert_eq!(outputs, [1.0, 1.0, 1.0, 1.0]);

    pool.update_weights(&scaled_weights(2, 5.0)).unwrap();
    pool.run_batch(&inputs, &mut outputs, &indices, 2, 2, 2).unwrap();
    assert_eq!(outputs, [5.0, 5.0, 5.0, 5.0]);
    pool.shutdown();
}

/// `resetBrains` clears hidden state without otherwise disturbing the
/// pool's ability to serve subsequent batches.
#[test]
fn reset_brains_keeps_pool_ready() {
    let spec = dense_identity_spec(2);
    let compiled = compile_cached(&spec).unwrap();
    let weights = identity_weights(2);

    let mut pool = BatchPool::new();
    pool.init(PoolOptions {
        spec,
        spec_key: compiled.graph_key.clone(),
        population_count: 1,
        param_count: compiled.total_params,
        input_stride: 2,
        output_stride: 2,
        max_batch: 2,
        weights,
        worker_count: Some(1),
    })
    .unwrap();

    pool.reset_brains().unwrap();
    assert_eq!(pool.status(), Status::Ready);

    let inputs = [1.0, 2.0];
    let indices = [0u32];
    let mut outputs = [0.0f32; 2];
    pool.run_batch(&inputs, &mut outputs, &indices, 1, 2, 2).unwrap();
    assert_eq!(outputs, [1.0, 2.0]);
    pool.shutdown();
}

/// `init` is idempotent: calling it again on an already-ready pool shuts
/// the old workers down first and stands up a fresh fleet.
#[test]
fn reinit_on_ready_pool_is_idempotent() {
    let spec = dense_identity_spec(2);
    let compiled = compile_cached(&spec).unwrap();
    let weights = identity_weights(2);

    let mut pool = BatchPool::new();
    let options = || PoolOptions {
        spec: spec.clone(),
        spec_key: compiled.graph_key.clone(),
        population_count: 1,
        param_count: compiled.total_params,
        input_stride: 2,
        output_stride: 2,
        max_batch: 2,
        weights: weights.clone(),
        worker_count: Some(1),
    };

    pool.init(options()).unwrap();
    assert_eq!(pool.status(), Status::Ready);
    pool.init(options()).unwrap();
    assert_eq!(pool.status(), Status::Ready);

    let inputs = [1.0, 2.0];
    let indices = [0u32];
    let mut outputs = [0.0f32; 2];
    pool.run_batch(&inputs, &mut outputs, &indices, 1, 2, 2).unwrap();
    assert_eq!(outputs, [1.0, 2.0]);
    pool.shutdown();
}

/// A `paramCount` that disagrees with the compiled graph's own
/// `totalParams` is rejected at `init`, before any worker is spawned.
#[test]
fn init_rejects_param_count_mismatch() {
    let spec = dense_identity_spec(2);
    let compiled = compile_cached(&spec).unwrap();
    let weights = identity_weights(2);

    let mut pool = BatchPool::new();
    let err = pool
        .init(PoolOptions {
            spec,
            spec_key: compiled.graph_key.clone(),
            population_count: 1,
            param_count: compiled.total_params + 1,
            input_stride: 2,
            output_stride: 2,
            max_batch: 2,
            weights,
            worker_count: Some(1),
        })
        .unwrap_err();
    assert!(matches!(err, neuropool::PoolError::SizeMismatch(_)));
    assert_eq!(pool.status(), Status::Failed);
}

/// A `runBatch` whose stride disagrees with init-time strides is rejected
/// without mutating any shared region (property 1 of §4.4).
#[test]
fn run_batch_rejects_stride_mismatch() {
    let spec = dense_identity_spec(2);
    let compiled = compile_cached(&spec).unwrap();
    let weights = identity_weights(2);

    let mut pool = BatchPool::new();
    pool.init(PoolOptions {
        spec,
        spec_key: compiled.graph_key.clone(),
        population_count: 1,
        param_count: compiled.total_params,
        input_stride: 2,
        output_stride: 2,
        max_batch: 2,
        weights,
        worker_count: Some(1),
    })
    .unwrap();

    let inputs = [1.0, 2.0, 3.0];
    let indices = [0u32];
    let mut outputs = [0.0f32; 3];
    let err = pool.run_batch(&inputs, &mut outputs, &indices, 1, 3, 3).unwrap_err();
    assert!(matches!(err, neuropool::PoolError::SizeMismatch(_)));
    assert_eq!(pool.status(), Status::Ready);
}
