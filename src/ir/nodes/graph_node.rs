/*
 * @Description  : GraphNode：图中的顶点
 *
 * 结构数据（操作数、形状、哈希、use 集合）放在这里，
 * 与节点类型相关的元数据放在`kind`（`NodeType`）里，经由算子标签访问。
 */

use super::raw_node::{NodeType, TraitNode};
use super::value::NodeToken;
use super::{NodeId, NodeTemplate, Output, Use, Value};
use crate::errors::IrError;
use crate::ir::cast::{self, KindView};
use crate::ir::hashing::HashValue;
use crate::ir::op_kind::OpKind;
use crate::ir::shape::Shape;
use std::collections::BTreeSet;
use std::fmt;
use std::panic::Location;
use std::rc::Weak;

pub struct GraphNode {
    id: NodeId,
    op: OpKind,
    /// 节点强持有其操作数
    operands: Vec<Value>,
    num_outputs: usize,
    /// 整体形状，多输出时为元组
    shape: Shape,
    /// 各输出的形状，长度恒等于`num_outputs`
    shapes: Vec<Shape>,
    /// 构建请求里显式给出的种子，克隆时沿用
    explicit_seed: Option<HashValue>,
    /// 显式种子与类型元数据合并后的种子（尚未与种子策略合并）
    seed: Option<HashValue>,
    /// 不含操作数的哈希：算子标签 + 种子 + 形状
    node_hash: HashValue,
    /// 完整的结构哈希：`node_hash`再依次合并各操作数哈希
    hash: HashValue,
    /// 谁在使用本节点的输出；只存 ID，不持有所有权
    uses: BTreeSet<Use>,
    name: String,
    scope: String,
    /// 构建调用所在的源码位置
    location: &'static Location<'static>,
    kind: NodeType,
    this: Weak<NodeToken>,
}

impl GraphNode {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: NodeId,
        op: OpKind,
        operands: Vec<Value>,
        shape: Shape,
        shapes: Vec<Shape>,
        explicit_seed: Option<HashValue>,
        seed: Option<HashValue>,
        node_hash: HashValue,
        hash: HashValue,
        name: String,
        scope: String,
        location: &'static Location<'static>,
        kind: NodeType,
        this: Weak<NodeToken>,
    ) -> Self {
        let num_outputs = shapes.len();
        Self {
            id,
            op,
            operands,
            num_outputs,
            shape,
            shapes,
            explicit_seed,
            seed,
            node_hash,
            hash,
            uses: BTreeSet::new(),
            name,
            scope,
            location,
            kind,
            this,
        }
    }

    // ========== 基础访问器 ==========

    pub const fn id(&self) -> NodeId {
        self.id
    }

    pub const fn op(&self) -> &OpKind {
        &self.op
    }

    /// 带作用域前缀的调试名，如`a/b/aten::add_3`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 构建时所在的作用域路径（可能为空）
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// 构建该节点的调用处，如`src/model.rs:42:17`
    pub const fn location(&self) -> &'static Location<'static> {
        self.location
    }

    pub const fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    pub const fn kind(&self) -> &NodeType {
        &self.kind
    }

    pub const fn hash(&self) -> HashValue {
        self.hash
    }

    pub const fn seed(&self) -> Option<HashValue> {
        self.seed
    }

    pub const fn explicit_seed(&self) -> Option<HashValue> {
        self.explicit_seed
    }

    pub const fn node_hash(&self) -> HashValue {
        self.node_hash
    }

    // ========== 形状 ==========

    /// 整体形状，多输出节点为元组
    pub const fn node_shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// 第`index`个输出的形状，越界返回`IrError::Index`
    pub fn shape(&self, index: usize) -> Result<&Shape, IrError> {
        self.shapes
            .get(index)
            .ok_or(IrError::output_index(index, self.num_outputs))
    }

    // ========== 操作数与 use ==========

    pub fn operands(&self) -> &[Value] {
        &self.operands
    }

    /// 第`index`个操作数，越界返回`IrError::Index`
    pub fn operand(&self, index: usize) -> Result<&Value, IrError> {
        self.operands
            .get(index)
            .ok_or(IrError::operand_index(index, self.operands.len()))
    }

    /// 各操作数对应的（节点, 输出序号）
    pub fn operand_outputs(&self) -> Vec<Output> {
        self.operands.iter().filter_map(Value::output).collect()
    }

    /// use 集合，已按（消费者, 操作数位置, 输出序号）排序
    pub const fn uses(&self) -> &BTreeSet<Use> {
        &self.uses
    }

    /// 指向本节点第`index`个输出的新 Value（节点正在被释放时返回`None`）
    pub fn to_value(&self, index: usize) -> Option<Value> {
        if index >= self.num_outputs {
            return None;
        }
        self.this
            .upgrade()
            .map(|token| Value::from_token(token, index))
    }

    pub fn template(&self) -> NodeTemplate {
        NodeTemplate {
            op: self.op.clone(),
            shape: self.shape.clone(),
            num_outputs: self.num_outputs,
        }
    }

    // ========== 向下转型 ==========

    /// 标签为`op`且类型确为`T`时返回类型化视图，否则`None`
    pub fn cast<T: KindView>(&self, op: &OpKind) -> Option<&T> {
        cast::node_cast(self, op)
    }

    // ========== 描述 ==========

    /// 算子、各输出形状，以及节点类型追加的字段
    pub fn describe(&self) -> String {
        let mut out = format!(
            "{}, {}, num_outputs={}, name={}",
            self.shape, self.op, self.num_outputs, self.name
        );
        for (key, value) in self.kind.describe_fields() {
            out.push_str(&format!(", {key}={value}"));
        }
        out
    }

    // ========== 图内部使用的修改 ==========

    pub(crate) fn add_use(&mut self, u: Use) {
        self.uses.insert(u);
    }

    pub(crate) fn remove_use(&mut self, u: &Use) -> bool {
        self.uses.remove(u)
    }

    /// 改写操作数槽位，返回旧值（由调用方决定何时释放）
    pub(crate) fn set_operand(&mut self, index: usize, value: Value) -> Value {
        std::mem::replace(&mut self.operands[index], value)
    }

    pub(crate) const fn set_hash(&mut self, hash: HashValue) {
        self.hash = hash;
    }

    /// 拿走操作数列表（节点被移出图时使用）
    pub(crate) fn take_operands(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.operands)
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphNode")
            .field("id", &self.id)
            .field("op", &self.op)
            .field("operands", &self.operands)
            .field("shape", &self.shape)
            .field("hash", &self.hash)
            .field("uses", &self.uses)
            .field("name", &self.name)
            .finish()
    }
}
