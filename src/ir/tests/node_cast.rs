/*
 * @Description  : 按标签校验的向下转型测试
 */

use super::{f32s, leaf, s64s};
use crate::assert_err;
use crate::errors::IrError;
use crate::ir::{DataHandle, DeviceData, Gather, Generic, Graph, Split, kinds, node_cast, try_node_cast};

#[test]
fn test_cast_to_matching_kind() {
    let graph = Graph::new();
    let a = leaf(&graph, 7, f32s(&[4, 3]));
    let index = leaf(&graph, 8, s64s(&[2, 3]));
    let g = graph.gather(&a, &index, 1).unwrap();

    let inner = graph.inner();
    let leaf_node = inner.node(a.node_id().unwrap()).unwrap();
    assert_eq!(
        DeviceData::cast(leaf_node).map(DeviceData::data),
        Some(&DataHandle::new(7, "cpu:0"))
    );

    let gather_node = inner.node(g.node_id().unwrap()).unwrap();
    let gather = try_node_cast::<Gather>(gather_node, &kinds::GATHER).unwrap();
    assert_eq!(gather.dim(), 1);
    assert_eq!(gather_node.cast::<Gather>(&kinds::GATHER).map(Gather::dim), Some(1));
}

#[test]
fn test_cast_to_other_kind_is_none() {
    let graph = Graph::new();
    let a = leaf(&graph, 1, f32s(&[4]));
    let c = graph.add(&a, &a).unwrap();

    let inner = graph.inner();
    let add_node = inner.node(c.node_id().unwrap()).unwrap();
    assert!(Gather::cast(add_node).is_none());
    assert!(Split::cast(add_node).is_none());
    assert!(node_cast::<Generic>(add_node, &kinds::ADD).is_some());
    // 类型对了但标签不对
    assert!(node_cast::<Generic>(add_node, &kinds::MUL).is_none());
}

/// 标签相同、类型不同的节点不能被转成该类型
#[test]
fn test_same_tag_different_kind_is_mismatch() {
    let graph = Graph::new();
    let input = leaf(&graph, 1, f32s(&[4, 3]));
    let fake = graph
        .generic(kinds::GATHER, &[input.clone()], f32s(&[4, 3]))
        .unwrap();

    let inner = graph.inner();
    let node = inner.node(fake.node_id().unwrap()).unwrap();
    assert!(node_cast::<Gather>(node, &kinds::GATHER).is_none());
    assert_err!(
        try_node_cast::<Gather>(node, &kinds::GATHER),
        IrError::KindMismatch { expected, found }
            if expected == "aten::gather/Gather" && found == "aten::gather/Generic"
    );
}
