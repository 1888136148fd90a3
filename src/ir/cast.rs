/*
 * @Description  : 按算子标签校验的安全向下转型
 *
 * 只有“记录的算子标签等于期望标签”且“节点类型确为 T”时才返回类型化视图，没有不经校验的转型路径。
 */

use super::nodes::GraphNode;
use super::nodes::raw_node::{NodeType, TraitNode};
use super::op_kind::OpKind;
use crate::errors::IrError;

/// 可从`NodeType`中取出的节点类型
pub trait KindView: Sized + 'static {
    const KIND_NAME: &'static str;

    fn from_kind(kind: &NodeType) -> Option<&Self>;
}

/// 标签不符或类型不符时返回`None`
pub fn node_cast<'a, T: KindView>(node: &'a GraphNode, op: &OpKind) -> Option<&'a T> {
    if node.op() != op {
        return None;
    }
    T::from_kind(node.kind())
}

/// 同`node_cast`，但不匹配时返回`IrError::KindMismatch`
pub fn try_node_cast<'a, T: KindView>(node: &'a GraphNode, op: &OpKind) -> Result<&'a T, IrError> {
    node_cast(node, op).ok_or_else(|| IrError::KindMismatch {
        expected: format!("{}/{}", op, T::KIND_NAME),
        found: format!("{}/{}", node.op(), node.kind().kind_name()),
    })
}
