/*
 * @Description  : 节点层：节点 ID、use 记录、节点构建请求，以及 GraphNode / Value
 */

mod graph_node;
pub(crate) mod raw_node;
mod value;

pub use graph_node::GraphNode;
pub(crate) use value::NodeToken;
pub use value::Value;

use super::hashing::HashValue;
use super::op_kind::OpKind;
use super::shape::Shape;
use raw_node::NodeType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 图内节点的稳定标识，按创建顺序递增（第一个节点为 1）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// “节点 N 的第 K 个输出”，不持有所有权，可作为映射的键
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Output {
    pub node: NodeId,
    pub index: usize,
}

impl Output {
    pub const fn new(node: NodeId, index: usize) -> Self {
        Self { node, index }
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.index)
    }
}

/// 反向边：节点`node`的第`operand_index`个操作数使用了本节点的第`index`个输出
///
/// 排序依次按消费者、操作数位置、输出序号，字段顺序即比较顺序，不要调整。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Use {
    pub node: NodeId,
    pub operand_index: usize,
    pub index: usize,
}

impl Use {
    pub const fn new(node: NodeId, operand_index: usize, index: usize) -> Self {
        Self {
            node,
            operand_index,
            index,
        }
    }
}

impl fmt::Display for Use {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "node={}, operand_index={}, index={}",
            self.node, self.operand_index, self.index
        )
    }
}

/// 形状函数：输入各操作数（对应输出）的形状，返回推断出的形状或错误描述
pub type ShapeFn<'a> = Box<dyn FnOnce(&[Shape]) -> Result<Shape, String> + 'a>;

/// 节点形状的来源：直接给定，或在构建时（缓存未命中时）调用一次形状函数
pub enum ShapeSource<'a> {
    Known(Shape),
    Infer(ShapeFn<'a>),
}

impl<'a> ShapeSource<'a> {
    pub fn infer(shape_fn: impl FnOnce(&[Shape]) -> Result<Shape, String> + 'a) -> Self {
        Self::Infer(Box::new(shape_fn))
    }
}

impl From<Shape> for ShapeSource<'_> {
    fn from(shape: Shape) -> Self {
        Self::Known(shape)
    }
}

impl fmt::Debug for ShapeSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(shape) => f.debug_tuple("Known").field(shape).finish(),
            Self::Infer(_) => f.write_str("Infer(..)"),
        }
    }
}

/// 一次节点构建请求
#[derive(Debug)]
pub struct NodeSpec<'a> {
    pub op: OpKind,
    pub operands: Vec<Value>,
    pub shape: ShapeSource<'a>,
    pub num_outputs: usize,
    /// 节点类型自带的元数据种子（如 gather 的`dim`），与图的种子策略合并
    pub hash_seed: Option<HashValue>,
    pub kind: NodeType,
}

impl<'a> NodeSpec<'a> {
    pub fn new(
        op: OpKind,
        operands: Vec<Value>,
        shape: impl Into<ShapeSource<'a>>,
        kind: impl Into<NodeType>,
    ) -> Self {
        Self {
            op,
            operands,
            shape: shape.into(),
            num_outputs: 1,
            hash_seed: None,
            kind: kind.into(),
        }
    }

    pub fn with_num_outputs(mut self, num_outputs: usize) -> Self {
        self.num_outputs = num_outputs;
        self
    }

    pub fn with_hash_seed(mut self, seed: HashValue) -> Self {
        self.hash_seed = Some(seed);
        self
    }
}

/// 克隆节点时携带的、与操作数无关的节点信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTemplate {
    pub op: OpKind,
    pub shape: Shape,
    pub num_outputs: usize,
}
