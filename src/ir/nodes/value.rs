/*
 * @Description  : Value：对“某节点的某个输出”的共享所有权句柄
 *
 * 所有权模型：
 * - 每个节点对应唯一一个`NodeToken`，所有指向该节点的 Value 共享它（`Rc`）
 * - 节点的操作数列表存的是 Value，因此操作数被强引用
 * - use 记录只存`NodeId`，是弱引用，不会与操作数形成引用环
 * - 最后一个 Value 被释放时，token 把节点从图中移除，并从其各操作数的 use 集合中摘掉对应记录
 * - token 对图本身只持有`Weak`，Value 不会让图一直存活
 */

use super::{GraphNode, NodeId, Output};
use crate::errors::IrError;
use crate::ir::graph::{Graph, GraphInner};
use crate::ir::hashing::{self, HashValue};
use crate::ir::shape::Shape;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

pub(crate) struct NodeToken {
    id: NodeId,
    graph: Weak<RefCell<GraphInner>>,
    /// 图正被借用时无法立即释放，先记到这里，由图在下一次修改时回收
    released: Rc<RefCell<Vec<NodeId>>>,
}

impl NodeToken {
    pub(crate) const fn new(
        id: NodeId,
        graph: Weak<RefCell<GraphInner>>,
        released: Rc<RefCell<Vec<NodeId>>>,
    ) -> Self {
        Self {
            id,
            graph,
            released,
        }
    }
}

impl Drop for NodeToken {
    fn drop(&mut self) {
        let Some(graph) = self.graph.upgrade() else {
            return;
        };
        let borrowed = graph.try_borrow_mut();
        match borrowed {
            Ok(mut inner) => inner.release_node_cascade(self.id),
            Err(_) => self.released.borrow_mut().push(self.id),
        }
    }
}

/// 节点输出的句柄，作为其它节点的操作数使用
///
/// 相等、排序与`Hash`都看（所属图, 节点, 输出序号）：不同图里 id 相同的节点互不相等。
/// 不同图之间的排序只保证在进程内稳定。空 Value 表示被省略的可选操作数，
/// 在布尔语境下为假（见`is_present`与`From<&Value> for bool`）。
#[derive(Clone, Default)]
pub struct Value {
    node: Option<Rc<NodeToken>>,
    index: usize,
}

impl Value {
    pub(crate) const fn from_token(token: Rc<NodeToken>, index: usize) -> Self {
        Self {
            node: Some(token),
            index,
        }
    }

    /// 空 Value（被省略的可选操作数）
    pub const fn null() -> Self {
        Self {
            node: None,
            index: 0,
        }
    }

    pub const fn is_present(&self) -> bool {
        self.node.is_some()
    }

    pub const fn is_null(&self) -> bool {
        self.node.is_none()
    }

    pub fn node_id(&self) -> Option<NodeId> {
        self.node.as_ref().map(|token| token.id)
    }

    pub const fn index(&self) -> usize {
        self.index
    }

    pub fn output(&self) -> Option<Output> {
        self.node_id().map(|id| Output::new(id, self.index))
    }

    /// 身份键：图的地址加上输出。token 持有图的`Weak`，地址在 Value 存活期间不会被复用
    fn identity(&self) -> Option<(usize, Output)> {
        self.node.as_ref().map(|token| {
            let graph = Weak::as_ptr(&token.graph).cast::<()>() as usize;
            (graph, Output::new(token.id, self.index))
        })
    }

    pub(crate) fn expect_output(&self) -> Result<Output, IrError> {
        self.output().ok_or(IrError::NullValue)
    }

    /// 是否属于给定的图
    pub(crate) fn belongs_to(&self, graph: &Weak<RefCell<GraphInner>>) -> bool {
        self.node
            .as_ref()
            .is_some_and(|token| Weak::ptr_eq(&token.graph, graph))
    }

    /// 是否与`other`指向同一个节点（不比较输出序号）
    pub fn same_node(&self, other: &Self) -> bool {
        match (&self.node, &other.node) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// 所属图的句柄
    pub fn graph(&self) -> Result<Graph, IrError> {
        let token = self.node.as_ref().ok_or(IrError::NullValue)?;
        token
            .graph
            .upgrade()
            .map(Graph::from_rc)
            .ok_or(IrError::GraphDropped)
    }

    fn with_node<R>(&self, f: impl FnOnce(&GraphNode) -> Result<R, IrError>) -> Result<R, IrError> {
        let token = self.node.as_ref().ok_or(IrError::NullValue)?;
        let graph = token.graph.upgrade().ok_or(IrError::GraphDropped)?;
        let inner = graph.try_borrow().map_err(|_| IrError::GraphBusy)?;
        f(inner.node(token.id)?)
    }

    /// 同一节点的第`index`个输出
    pub fn at(&self, index: usize) -> Result<Self, IrError> {
        let num_outputs = self.with_node(|node| Ok(node.num_outputs()))?;
        if index >= num_outputs {
            return Err(IrError::output_index(index, num_outputs));
        }
        Ok(Self {
            node: self.node.clone(),
            index,
        })
    }

    /// 本输出的形状
    ///
    /// 多输出节点返回的是对应分量的形状而不是整体的元组形状，整体形状用`node_shape`。
    pub fn shape(&self) -> Result<Shape, IrError> {
        let index = self.index;
        self.with_node(|node| node.shape(index).cloned())
    }

    /// 所属节点的整体形状（多输出节点为元组）
    pub fn node_shape(&self) -> Result<Shape, IrError> {
        self.with_node(|node| Ok(node.node_shape().clone()))
    }

    /// 本输出的结构哈希：节点哈希与输出序号的合并
    pub fn structural_hash(&self) -> Result<HashValue, IrError> {
        let index = self.index;
        self.with_node(|node| Ok(hashing::output_hash(node.hash(), index)))
    }
}

impl From<&Value> for bool {
    fn from(value: &Value) -> Self {
        value.is_present()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity().cmp(&other.identity())
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.output() {
            Some(output) => write!(f, "Value({output})"),
            None => f.write_str("Value(null)"),
        }
    }
}
