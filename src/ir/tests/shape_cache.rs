/*
 * @Description  : 形状缓存在图构建中的行为
 */

use super::{f32s, leaf};
use crate::assert_err;
use crate::errors::IrError;
use crate::ir::{Graph, GraphOptions, OpKind, ShapeCacheStats, ShapeSource, Value};
use std::cell::Cell;

/// 用计数形状函数构建一个恒等形状的节点
fn counted_identity(graph: &Graph, input: &Value, calls: &Cell<usize>) -> Result<Value, IrError> {
    graph.generic(
        OpKind::new("custom::identity"),
        &[input.clone()],
        ShapeSource::infer(|shapes| {
            calls.set(calls.get() + 1);
            Ok(shapes[0].clone())
        }),
    )
}

#[test]
fn test_identical_recipe_reuses_shape() {
    let graph = Graph::new();
    let a = leaf(&graph, 1, f32s(&[4]));
    let calls = Cell::new(0);

    let x = counted_identity(&graph, &a, &calls).unwrap();
    let y = counted_identity(&graph, &a, &calls).unwrap();

    assert_eq!(calls.get(), 1);
    assert_eq!(y.shape().unwrap(), f32s(&[4]));
    assert_eq!(x.structural_hash().unwrap(), y.structural_hash().unwrap());
    assert_eq!(
        graph.shape_cache_stats(),
        ShapeCacheStats {
            hits: 1,
            misses: 1,
            len: 1
        }
    );

    // 操作数不同则配方不同
    let b = leaf(&graph, 2, f32s(&[4]));
    counted_identity(&graph, &b, &calls).unwrap();
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_zero_capacity_disables_cache() {
    let graph = Graph::with_options(GraphOptions {
        shape_cache_capacity: 0,
        ..GraphOptions::default()
    });
    let a = leaf(&graph, 1, f32s(&[4]));
    let calls = Cell::new(0);

    counted_identity(&graph, &a, &calls).unwrap();
    counted_identity(&graph, &a, &calls).unwrap();
    assert_eq!(calls.get(), 2);
    assert_eq!(graph.shape_cache_stats().len, 0);
}

#[test]
fn test_failed_shape_fn_is_not_cached() {
    let graph = Graph::new();
    let a = leaf(&graph, 1, f32s(&[4]));
    let op = OpKind::new("custom::bad");

    for _ in 0..2 {
        assert_err!(
            graph.generic(
                op.clone(),
                &[a.clone()],
                ShapeSource::infer(|_| Err("坏形状".to_string()))
            ),
            IrError::Construction { message, .. } if message == "坏形状"
        );
    }
    let stats = graph.shape_cache_stats();
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.len, 0);
}

#[test]
fn test_known_shapes_bypass_cache() {
    let graph = Graph::new();
    let a = leaf(&graph, 1, f32s(&[4]));
    graph
        .generic(OpKind::new("custom::known"), &[a], f32s(&[4]))
        .unwrap();
    assert_eq!(graph.shape_cache_stats(), ShapeCacheStats::default());
}

#[test]
fn test_clear_shape_cache() {
    let graph = Graph::new();
    let a = leaf(&graph, 1, f32s(&[4]));
    let calls = Cell::new(0);
    counted_identity(&graph, &a, &calls).unwrap();

    graph.inner_mut().clear_shape_cache();
    counted_identity(&graph, &a, &calls).unwrap();
    assert_eq!(calls.get(), 2);
}
