/*
 * @Description  : 节点构建的基础测试
 *
 * 测试策略：
 * 1. 两个设备数据相加的完整示例（形状、use、命名）
 * 2. 越界访问报错
 * 3. 形状推断（广播、gather、split、常量）及其构建错误
 * 4. 非法操作数（空值、别的图的值）
 */

use super::{f32s, leaf, s64s};
use crate::assert_err;
use crate::errors::{IndexKind, IrError};
use crate::ir::{
    DataHandle, ElementType, Graph, Literal, NodeId, OpKind, Shape, ShapeSource, Use, Value, kinds,
};
use std::collections::HashSet;

// ==================== 完整示例 ====================

#[test]
fn test_add_of_two_device_data() {
    let graph = Graph::new();
    let a = leaf(&graph, 1, f32s(&[4]));
    let b = leaf(&graph, 2, f32s(&[4]));
    let c = graph.add(&a, &b).unwrap();

    assert_eq!(c.node_id(), Some(NodeId(3)));
    assert_eq!(c.index(), 0);
    assert_eq!(c.shape().unwrap(), f32s(&[4]));
    assert_eq!(c.node_shape().unwrap(), f32s(&[4]));

    // use 记录：（消费者, 操作数位置, 输出序号）
    assert_eq!(graph.uses(&a).unwrap(), vec![Use::new(NodeId(3), 0, 0)]);
    assert_eq!(graph.uses(&b).unwrap(), vec![Use::new(NodeId(3), 1, 0)]);
    assert!(graph.uses(&c).unwrap().is_empty());

    assert_eq!(graph.operands(&c).unwrap(), vec![a.clone(), b.clone()]);
    assert_eq!(graph.node_name(&c).unwrap(), "aten::add_3");
    assert_eq!(graph.node_count(), 3);
    graph.check_invariants().unwrap();
}

#[test]
fn test_node_accessors() {
    let graph = Graph::new();
    let a = leaf(&graph, 1, f32s(&[4]));
    let c = graph.mul(&a, &a).unwrap();

    let inner = graph.inner();
    let node = inner.node(NodeId(2)).unwrap();
    assert_eq!(node.op(), &kinds::MUL);
    assert_eq!(node.num_outputs(), 1);
    assert_eq!(node.shapes(), &[f32s(&[4])]);
    assert_eq!(node.operand(1).unwrap(), &a);
    assert_eq!(node.to_value(0), Some(c.clone()));
    assert_eq!(node.to_value(1), None);
    // 同一个输出被用作两个操作数，得到两条 use
    assert_eq!(inner.node(NodeId(1)).unwrap().uses().len(), 2);
}

// ==================== 越界 ====================

#[test]
fn test_output_index_out_of_range() {
    let graph = Graph::new();
    let a = leaf(&graph, 1, f32s(&[4]));

    let inner = graph.inner();
    let node = inner.node(NodeId(1)).unwrap();
    assert_err!(node.shape(1), IrError::Index(IndexKind::Output, 1, 1));
    drop(inner);

    assert_err!(a.at(1), IrError::Index(IndexKind::Output, 1, 1));
    assert_eq!(a.at(0).unwrap(), a);
}

#[test]
fn test_operand_index_out_of_range() {
    let graph = Graph::new();
    let a = leaf(&graph, 1, f32s(&[4]));
    let b = leaf(&graph, 2, f32s(&[4]));
    let c = graph.add(&a, &b).unwrap();

    assert_err!(graph.operand(&c, 2), IrError::Index(IndexKind::Operand, 2, 2));
    assert_err!(graph.operand(&a, 0), IrError::Index(IndexKind::Operand, 0, 0));
}

// ==================== 形状推断 ====================

#[test]
fn test_binary_broadcast_and_type_promotion() {
    let graph = Graph::new();
    let a = leaf(&graph, 1, f32s(&[2, 1]));
    let b = leaf(&graph, 2, s64s(&[3]));
    let c = graph.add(&a, &b).unwrap();
    assert_eq!(c.shape().unwrap(), f32s(&[2, 3]));

    // 标量与任意形状广播
    let s = leaf(&graph, 3, Shape::scalar(ElementType::F64));
    let d = graph.mul(&c, &s).unwrap();
    assert_eq!(d.shape().unwrap(), Shape::array(ElementType::F64, &[2, 3]));
}

#[test]
fn test_incompatible_broadcast_is_construction_error() {
    let graph = Graph::new();
    let a = leaf(&graph, 1, f32s(&[2]));
    let b = leaf(&graph, 2, f32s(&[3]));

    let result = graph.add(&a, &b);
    assert_err!(
        result,
        IrError::Construction { op, operand_shapes, scope, .. }
            if op == &kinds::ADD && operand_shapes == "[f32[2], f32[3]]" && scope.is_empty()
    );
    // 失败的构建不留下任何 use 或节点
    assert!(graph.uses(&a).unwrap().is_empty());
    assert!(graph.uses(&b).unwrap().is_empty());
    assert_eq!(graph.node_count(), 2);
    graph.check_invariants().unwrap();
}

#[test]
fn test_gather_shape() {
    let graph = Graph::new();
    let input = leaf(&graph, 1, f32s(&[4, 3]));
    let index = leaf(&graph, 2, s64s(&[2, 3]));
    let out = graph.gather(&input, &index, 0).unwrap();
    assert_eq!(out.shape().unwrap(), f32s(&[2, 3]));

    // dim 超出秩
    assert_err!(
        graph.gather(&input, &index, 2),
        IrError::Construction { message, .. } if message.contains("dim=2")
    );
    // 索引必须是整数
    let float_index = leaf(&graph, 3, f32s(&[2, 3]));
    assert_err!(
        graph.gather(&input, &float_index, 0),
        IrError::Construction { message, .. } if message.contains("整数")
    );
    // 非 dim 维上 index 不能比 input 大
    let wide_index = leaf(&graph, 4, s64s(&[2, 5]));
    assert_err!(graph.gather(&input, &wide_index, 0), IrError::Construction { .. });
}

#[test]
fn test_split_is_multi_output() {
    let graph = Graph::new();
    let x = leaf(&graph, 1, f32s(&[6, 2]));
    let parts = graph.split(&x, &[2, 4], 0).unwrap();

    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].shape().unwrap(), f32s(&[2, 2]));
    assert_eq!(parts[1].shape().unwrap(), f32s(&[4, 2]));
    assert_eq!(
        parts[1].node_shape().unwrap(),
        Shape::tuple(vec![f32s(&[2, 2]), f32s(&[4, 2])])
    );
    assert!(parts[0].same_node(&parts[1]));
    assert_ne!(parts[0], parts[1]);

    let y = graph.add(&parts[1], &parts[1]).unwrap();
    let consumer = y.node_id().unwrap();
    assert_eq!(
        graph.uses(&parts[0]).unwrap(),
        vec![Use::new(consumer, 0, 1), Use::new(consumer, 1, 1)]
    );
    graph.check_invariants().unwrap();

    // 各段之和必须等于该维大小
    assert_err!(
        graph.split(&x, &[2, 2], 0),
        IrError::Construction { message, .. } if message.contains("不一致")
    );
    // 没有段就没有输出
    assert_err!(graph.split(&x, &[], 0), IrError::Construction { .. });
}

/// 只有一段的 split：唯一输出的形状是该段本身，而不是一元元组
#[test]
fn test_single_segment_split_unwraps_tuple() {
    let graph = Graph::new();
    let x = leaf(&graph, 1, f32s(&[4]));
    let parts = graph.split(&x, &[4], 0).unwrap();

    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].shape().unwrap(), f32s(&[4]));
    assert_eq!(parts[0].node_shape().unwrap(), Shape::tuple(vec![f32s(&[4])]));
    let sum = graph.add(&parts[0], &x).unwrap();
    assert_eq!(sum.shape().unwrap(), f32s(&[4]));

    // 单输出且形状为数组时保持原样
    let op = OpKind::new("custom::single");
    let single = graph
        .opaque(op, "single", &[x], Shape::tuple(vec![f32s(&[4])]), 1)
        .unwrap();
    assert_eq!(single.shape().unwrap(), f32s(&[4]));
    graph.check_invariants().unwrap();
}

#[test]
fn test_declared_outputs_must_match_tuple_arity() {
    let graph = Graph::new();
    let a = leaf(&graph, 1, f32s(&[4]));
    let op = OpKind::new("custom::pair");

    assert_err!(
        graph.opaque(op.clone(), "pair", &[a.clone()], f32s(&[4]), 2),
        IrError::Construction { .. }
    );
    assert_err!(
        graph.opaque(op.clone(), "pair", &[a.clone()], Shape::tuple(vec![f32s(&[4])]), 2),
        IrError::Construction { .. }
    );
    assert_err!(
        graph.opaque(op.clone(), "pair", &[a.clone()], f32s(&[4]), 0),
        IrError::Construction { message, .. } if message.contains("不能为0")
    );

    let pair = graph
        .opaque(op, "pair", &[a], Shape::tuple(vec![f32s(&[4]), s64s(&[])]), 2)
        .unwrap();
    assert_eq!(pair.at(1).unwrap().shape().unwrap(), s64s(&[]));
}

#[test]
fn test_constant_element_count_is_checked() {
    let graph = Graph::new();
    let c = graph
        .constant(Literal::new(f32s(&[2]), vec![1.0, 2.0]))
        .unwrap();
    assert_eq!(c.shape().unwrap(), f32s(&[2]));

    assert_err!(
        graph.constant(Literal::new(f32s(&[2]), vec![1.0, 2.0, 3.0])),
        IrError::Construction { op, .. } if op == &kinds::CONSTANT
    );
}

/// 元素个数或段长之和溢出时报构建错误而不是 panic
#[test]
fn test_size_overflow_is_construction_error() {
    let graph = Graph::new();
    let huge = f32s(&[usize::MAX, 2]);
    assert_eq!(huge.element_count(), None);
    assert_eq!(
        Shape::tuple(vec![f32s(&[usize::MAX]), f32s(&[1])]).element_count(),
        None
    );
    assert_eq!(f32s(&[2, 3]).element_count(), Some(6));

    assert_err!(
        graph.constant(Literal::new(huge, vec![1.0])),
        IrError::Construction { message, .. } if message.contains("超出")
    );

    let x = leaf(&graph, 1, f32s(&[4]));
    assert_err!(
        graph.split(&x, &[usize::MAX, 5], 0),
        IrError::Construction { message, .. } if message.contains("超出")
    );
    assert!(graph.uses(&x).unwrap().is_empty());
    graph.check_invariants().unwrap();
}

// ==================== 非法操作数 ====================

#[test]
fn test_null_operand_is_rejected() {
    let graph = Graph::new();
    let a = leaf(&graph, 1, f32s(&[4]));
    let absent = Value::null();

    assert!(!absent.is_present());
    assert!(!bool::from(&absent));
    assert!(bool::from(&a));
    assert_err!(graph.add(&a, &absent), IrError::NullValue);
    assert_err!(absent.shape(), IrError::NullValue);
    assert!(graph.uses(&a).unwrap().is_empty());
}

#[test]
fn test_value_from_another_graph_is_rejected() {
    let graph = Graph::new();
    let other = Graph::new();
    let a = leaf(&graph, 1, f32s(&[4]));
    let b = leaf(&other, 1, f32s(&[4]));

    assert_err!(graph.add(&a, &b), IrError::ForeignValue);
    assert_err!(graph.uses(&b), IrError::ForeignValue);
    assert!(graph.contains(&a));
    assert!(!graph.contains(&b));
    assert!(b.graph().unwrap().ptr_eq(&other));
}

/// 不同图里 id 与输出序号都相同的 Value 互不相等，也不会在集合里相互覆盖
#[test]
fn test_value_identity_includes_graph() {
    let g1 = Graph::new();
    let g2 = Graph::new();
    let a = g1
        .device_data(DataHandle::new(1, "cpu:0"), f32s(&[4]))
        .unwrap();
    let b = g2
        .device_data(DataHandle::new(99, "cpu:0"), s64s(&[2]))
        .unwrap();

    assert_eq!(a.output(), b.output());
    assert_ne!(a, b);
    assert_ne!(a.cmp(&b), std::cmp::Ordering::Equal);
    assert_eq!(a, a.clone());
    assert_eq!(Value::null(), Value::null());
    assert_ne!(a, Value::null());

    let set = [a.clone(), b.clone(), a.clone()]
        .into_iter()
        .collect::<HashSet<Value>>();
    assert_eq!(set.len(), 2);
}

/// 形状函数在图被可变借用期间查询其它 Value，得到错误而不是 panic
#[test]
fn test_value_query_inside_shape_fn_is_error() {
    let graph = Graph::new();
    let a = leaf(&graph, 1, f32s(&[4]));
    let captured = a.clone();

    assert_err!(
        graph.generic(
            OpKind::new("custom::peek"),
            &[a.clone()],
            ShapeSource::infer(|_| captured.shape().map_err(|e| e.to_string())),
        ),
        IrError::Construction { message, .. } if message.contains("正在被修改")
    );
    assert!(graph.uses(&a).unwrap().is_empty());

    let inner = graph.inner_mut();
    assert_err!(captured.shape(), IrError::GraphBusy);
    drop(inner);
    assert_eq!(captured.shape().unwrap(), f32s(&[4]));
}
