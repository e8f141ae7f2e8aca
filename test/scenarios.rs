//! End-to-end scenarios S1-S5. S6 (pool failure containment) requires
//! white-box fault injection into a worker channel and lives as a
//! `#[cfg(test)]` unit test beside `BatchPool` instead, where crate-internal
//! visibility is available.

use neuropool::{compile_cached, BatchPool, Edge, GraphSpec, Node, NodeKind, OutputRef, PoolOptions};

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

/// S1 - Dense identity batch.
#[test]
fn s1_dense_identity_batch() {
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
        max_batch: 3,
        weights,
        worker_count: Some(1),
    })
    .unwrap();

    let inputs = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let indices = [0u32, 0, 0];
    let mut outputs = [0.0f32; 6];
    pool.run_batch(&inputs, &mut outputs, &indices, 3, 2, 2).unwrap();
    assert_eq!(outputs, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

/// S2 - Index-mapped selection.
#[test]
fn s2_index_mapped_selection() {
    let spec = dense_identity_spec(2);
    let compiled = compile_cached(&spec).unwrap();
    let param_count = compiled.total_params;

    let mut weights = identity_weights(2);
    weights.extend(scaled_weights(2, 2.0));

    let mut pool = BatchPool::new();
    pool.init(PoolOptions {
        spec,
        spec_key: compiled.graph_key.clone(),
        population_count: 2,
        param_count,
        input_stride: 2,
        output_stride: 2,
        max_batch: 2,
        weights,
        worker_count: Some(1),
    })
    .unwrap();

    let inputs = [1.0, 1.0, 1.0, 1.0];
    let indices = [0u32, 1];
    let mut outputs = [0.0f32; 4];
    pool.run_batch(&inputs, &mut outputs, &indices, 2, 2, 2).unwrap();
    assert_eq!(outputs, [1.0, 1.0, 2.0, 2.0]);
}

/// S3 - Recurrent reset.
#[test]
fn s3_recurrent_reset() {
    let spec = GraphSpec {
        spec_type: "graph".into(),
        nodes: vec![
            Node {
                id: "in".into(),
                kind: NodeKind::Input { output_size: 1 },
            },
            Node {
                id: "gru".into(),
                kind: NodeKind::Gru {
                    input_size: 1,
                    hidden_size: 1,
                },
            },
            Node {
                id: "out".into(),
                kind: NodeKind::Dense {
                    input_size: 1,
                    output_size: 1,
                },
            },
        ],
        edges: vec![
            Edge { from: "in".into(), to: "gru".into(), from_port: None, to_port: None },
            Edge { from: "gru".into(), to: "out".into(), from_port: None, to_port: None },
        ],
        outputs: vec![OutputRef { node_id: "out".into(), port: None }],
        output_size: 1,
    };
    let compiled = compile_cached(&spec).unwrap();
    let total = compiled.total_params;
    let weights: Vec<f32> = (0..total).map(|i| (i as f32 * 0.037) - 0.2).collect();

    let mut pool = BatchPool::new();
    pool.init(PoolOptions {
        spec,
        spec_key: compiled.graph_key.clone(),
        population_count: 1,
        param_count: total,
        input_stride: 1,
        output_stride: 1,
        max_batch: 1,
        weights,
        worker_count: Some(1),
    })
    .unwrap();

    let mut y1 = 0.0;
    for _ in 0..3 {
        let mut out = [0.0f32; 1];
        pool.run_batch(&[1.0], &mut out, &[0], 1, 1, 1).unwrap();
        y1 = out[0];
    }

    pool.reset_brains().unwrap();

    let mut y2 = 0.0;
    for _ in 0..3 {
        let mut out = [0.0f32; 1];
        pool.run_batch(&[1.0], &mut out, &[0], 1, 1, 1).unwrap();
        y2 = out[0];
    }

    assert!((y1 - y2).abs() < 1e-6);
}

/// S4 - Split/Concat round-trip.
#[test]
fn s4_split_concat_round_trip() {
    let spec = GraphSpec {
        spec_type: "graph".into(),
        nodes: vec![
            Node { id: "in".into(), kind: NodeKind::Input { output_size: 4 } },
            Node { id: "split".into(), kind: NodeKind::Split { output_sizes: vec![2, 2] } },
            Node { id: "concat".into(), kind: NodeKind::Concat },
            Node {
                id: "out".into(),
                kind: NodeKind::Dense { input_size: 4, output_size: 4 },
            },
        ],
        edges: vec![
            Edge { from: "in".into(), to: "split".into(), from_port: None, to_port: None },
            Edge { from: "split".into(), to: "concat".into(), from_port: Some(0), to_port: Some(0) },
            Edge { from: "split".into(), to: "concat".into(), from_port: Some(1), to_port: Some(1) },
            Edge { from: "concat".into(), to: "out".into(), from_port: None, to_port: None },
        ],
        outputs: vec![OutputRef { node_id: "out".into(), port: None }],
        output_size: 4,
    };
    let compiled = compile_cached(&spec).unwrap();
    let weights = identity_weights(4);

    let mut pool = BatchPool::new();
    pool.init(PoolOptions {
        spec,
        spec_key: compiled.graph_key.clone(),
        population_count: 1,
        param_count: compiled.total_params,
        input_stride: 4,
        output_stride: 4,
        max_batch: 1,
        weights,
        worker_count: Some(1),
    })
    .unwrap();

    let inputs = [1.0, 2.0, 3.0, 4.0];
    let mut outputs = [0.0f32; 4];
    pool.run_batch(&inputs, &mut outputs, &[0], 1, 4, 4).unwrap();
    assert_eq!(outputs, inputs);
}

/// S5 - Graph-key stability under edge reordering.
#[test]
fn s5_graph_key_stability() {
    let nodes = vec![
        Node { id: "in".into(), kind: NodeKind::Input { output_size: 2 } },
        Node { id: "a".into(), kind: NodeKind::Dense { input_size: 2, output_size: 2 } },
        Node { id: "b".into(), kind: NodeKind::Dense { input_size: 2, output_size: 2 } },
        Node { id: "out".into(), kind: NodeKind::Concat },
    ];
    let e1 = Edge { from: "in".into(), to: "a".into(), from_port: None, to_port: Some(0) };
    let e2 = Edge { from: "in".into(), to: "b".into(), from_port: None, to_port: Some(0) };
    let e3 = Edge { from: "a".into(), to: "out".into(), from_port: None, to_port: Some(0) };
    let e4 = Edge { from: "b".into(), to: "out".into(), from_port: None, to_port: Some(1) };

    let spec_a = GraphSpec {
        spec_type: "graph".into(),
        nodes: nodes.clone(),
        edges: vec![e1.clone(), e2.clone(), e3.clone(), e4.clone()],
        outputs: vec![OutputRef { node_id: "out".into(), port: None }],
        output_size: 4,
    };
    let spec_b = GraphSpec {
        spec_type: "graph".into(),
        nodes,
        edges: vec![e4, e3, e2, e1],
        outputs: vec![OutputRef { node_id: "out".into(), port: None }],
        output_size: 4,
    };

    assert_eq!(neuropool::graph_key(&spec_a), neuropool::graph_key(&spec_b));
}

