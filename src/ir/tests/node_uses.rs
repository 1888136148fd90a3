/*
 * @Description  : use 集合的测试：与操作数列表严格互为镜像、排序确定
 */

use super::{f32s, leaf};
use crate::ir::{Graph, NodeId, ShapeSource, Use};

/// 每个节点的每个操作数都在生产者处有且仅有一条对应的 use
#[test]
fn test_uses_mirror_operands() {
    let graph = Graph::new();
    let a = leaf(&graph, 1, f32s(&[4]));
    let b = leaf(&graph, 2, f32s(&[4]));
    let c = graph.add(&a, &b).unwrap();
    let d = graph.mul(&c, &a).unwrap();
    let e = graph.sub(&d, &c).unwrap();
    let _f = graph.div(&e, &e).unwrap();

    let inner = graph.inner();
    let mut expected_uses = 0;
    for node in inner.nodes() {
        for (pos, operand) in node.operands().iter().enumerate() {
            let output = operand.output().unwrap();
            let producer = inner.node(output.node).unwrap();
            let matching = producer
                .uses()
                .iter()
                .filter(|u| **u == Use::new(node.id(), pos, output.index))
                .count();
            assert_eq!(matching, 1);
            expected_uses += 1;
        }
    }
    let total_uses: usize = inner.nodes().map(|n| n.uses().len()).sum();
    assert_eq!(total_uses, expected_uses);
    drop(inner);

    graph.check_invariants().unwrap();
}

/// use 按（消费者, 操作数位置, 输出序号）排序，与创建顺序无关
#[test]
fn test_use_order_is_deterministic() {
    let graph = Graph::new();
    let a = leaf(&graph, 1, f32s(&[4]));
    let b = leaf(&graph, 2, f32s(&[4]));
    let c = graph.add(&b, &a).unwrap();
    let d = graph.mul(&a, &a).unwrap();
    let e = graph.sub(&a, &c).unwrap();

    let (c, d, e) = (
        c.node_id().unwrap(),
        d.node_id().unwrap(),
        e.node_id().unwrap(),
    );
    assert_eq!(
        graph.uses(&a).unwrap(),
        vec![
            Use::new(c, 1, 0),
            Use::new(d, 0, 0),
            Use::new(d, 1, 0),
            Use::new(e, 0, 0),
        ]
    );
    assert!(Use::new(NodeId(3), 1, 0) < Use::new(NodeId(4), 0, 0));
    assert!(Use::new(NodeId(3), 0, 1) < Use::new(NodeId(3), 1, 0));
}

/// 形状函数报错时 use 一条都不会登记
#[test]
fn test_failed_construction_registers_no_uses() {
    let graph = Graph::new();
    let a = leaf(&graph, 1, f32s(&[4]));
    let b = leaf(&graph, 2, f32s(&[4]));

    let result = graph.generic(
        "custom::bad".into(),
        &[a.clone(), b.clone()],
        ShapeSource::infer(|_| Err("坏形状".to_string())),
    );
    assert!(result.is_err());
    assert!(graph.uses(&a).unwrap().is_empty());
    assert!(graph.uses(&b).unwrap().is_empty());
    assert_eq!(graph.node_count(), 2);
}

/// 同一个节点可以被多次、在多个位置使用
#[test]
fn test_shared_operand_has_one_use_per_slot() {
    let graph = Graph::new();
    let a = leaf(&graph, 1, f32s(&[4]));
    let c = graph.add(&a, &a).unwrap();
    let id = c.node_id().unwrap();
    assert_eq!(
        graph.uses(&a).unwrap(),
        vec![Use::new(id, 0, 0), Use::new(id, 1, 0)]
    );
}
