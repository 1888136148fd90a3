/*
 * @Description  : Graph 句柄（用户级 API）
 */

use super::inner::GraphInner;
use super::shape_cache::ShapeCacheStats;
use crate::errors::IrError;
use crate::ir::descriptor::GraphDescriptor;
use crate::ir::lowering::{Emitter, LoweredHandle, LoweringContext};
use crate::ir::nodes::raw_node::{
    Constant, DataHandle, DeviceData, Gather, Generic, Literal, Opaque, Split,
};
use crate::ir::nodes::{NodeId, NodeSpec, ShapeSource, Use, Value};
use crate::ir::op_kind::{OpKind, kinds};
use crate::ir::options::GraphOptions;
use crate::ir::scope::ScopeGuard;
use crate::ir::shape::Shape;
use std::cell::RefCell;
use std::rc::Rc;

/// Graph - 计算图句柄
///
/// # 设计原则
/// - 是`Rc<RefCell<GraphInner>>`的薄封装
/// - Clone 语义：多个 Graph 引用同一个 GraphInner
/// - 返回的 Value 共享节点的所有权，但只弱引用图本身
/// - 单线程：同一个图只能在一个线程中构建与改写
///
/// # 示例
/// ```
/// use lazy_ir::ir::{DataHandle, ElementType, Graph, Shape};
///
/// let graph = Graph::new();
/// let shape = Shape::array(ElementType::F32, &[4]);
/// let a = graph.device_data(DataHandle::new(1, "cpu:0"), shape.clone()).unwrap();
/// let b = graph.device_data(DataHandle::new(2, "cpu:0"), shape.clone()).unwrap();
/// let c = graph.add(&a, &b).unwrap();
/// assert_eq!(c.shape().unwrap(), shape);
/// assert_eq!(graph.uses(&a).unwrap().len(), 1);
/// ```
#[derive(Clone)]
pub struct Graph {
    inner: Rc<RefCell<GraphInner>>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    // ==================== 创建 ====================

    pub fn new() -> Self {
        Self::with_options(GraphOptions::default())
    }

    pub fn with_name(name: &str) -> Self {
        Self::with_options(GraphOptions::with_name(name))
    }

    pub fn with_options(options: GraphOptions) -> Self {
        Self {
            inner: GraphInner::new_shared(options),
        }
    }

    /// 从现有 Rc 创建句柄
    pub(crate) const fn from_rc(inner: Rc<RefCell<GraphInner>>) -> Self {
        Self { inner }
    }

    /// 获取内部 GraphInner 的不可变引用
    ///
    /// 持有期间丢弃的 Value 不会立即释放节点，会排队到下一次修改时回收。
    pub fn inner(&self) -> std::cell::Ref<'_, GraphInner> {
        self.inner.borrow()
    }

    /// 获取内部 GraphInner 的可变引用
    pub fn inner_mut(&self) -> std::cell::RefMut<'_, GraphInner> {
        self.inner.borrow_mut()
    }

    /// 两个句柄是否指向同一个图
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn name(&self) -> String {
        self.inner.borrow().name().to_string()
    }

    pub fn options(&self) -> GraphOptions {
        self.inner.borrow().options().clone()
    }

    pub fn node_count(&self) -> usize {
        self.inner.borrow().node_count()
    }

    // ==================== 创建节点 ====================

    /// 通用的节点构建入口
    ///
    /// 调用处的源码位置记录在节点上（见`GraphNode::location`）。
    /// 形状函数在图被可变借用期间调用，只应使用传入的操作数形状；在其中查询 Value 会得到`IrError::GraphBusy`。
    #[track_caller]
    pub fn create_node(&self, spec: NodeSpec<'_>) -> Result<Value, IrError> {
        self.inner.borrow_mut().create_node(spec)
    }

    /// 设备上已有的数据（叶子节点）
    #[track_caller]
    pub fn device_data(&self, data: DataHandle, shape: Shape) -> Result<Value, IrError> {
        self.create_node(DeviceData::spec(data, shape))
    }

    /// 字面量常量
    #[track_caller]
    pub fn constant(&self, literal: Literal) -> Result<Value, IrError> {
        self.create_node(Constant::spec(literal))
    }

    /// 逐元素二元算子，形状按广播推断
    #[track_caller]
    pub fn binary(&self, op: OpKind, lhs: &Value, rhs: &Value) -> Result<Value, IrError> {
        self.create_node(Generic::binary(op, lhs, rhs))
    }

    #[track_caller]
    pub fn add(&self, lhs: &Value, rhs: &Value) -> Result<Value, IrError> {
        self.binary(kinds::ADD, lhs, rhs)
    }

    #[track_caller]
    pub fn sub(&self, lhs: &Value, rhs: &Value) -> Result<Value, IrError> {
        self.binary(kinds::SUB, lhs, rhs)
    }

    #[track_caller]
    pub fn mul(&self, lhs: &Value, rhs: &Value) -> Result<Value, IrError> {
        self.binary(kinds::MUL, lhs, rhs)
    }

    #[track_caller]
    pub fn div(&self, lhs: &Value, rhs: &Value) -> Result<Value, IrError> {
        self.binary(kinds::DIV, lhs, rhs)
    }

    /// 任意标签的通用节点，形状由调用方给定或推断
    #[track_caller]
    pub fn generic<'a>(
        &self,
        op: OpKind,
        operands: &[Value],
        shape: impl Into<ShapeSource<'a>>,
    ) -> Result<Value, IrError> {
        self.create_node(Generic::spec(op, operands.to_vec(), shape))
    }

    #[track_caller]
    pub fn gather(&self, input: &Value, index: &Value, dim: usize) -> Result<Value, IrError> {
        self.create_node(Gather::spec(input, index, dim))
    }

    /// 返回每一段对应的 Value
    #[track_caller]
    pub fn split(
        &self,
        input: &Value,
        split_sizes: &[usize],
        dim: usize,
    ) -> Result<Vec<Value>, IrError> {
        let first = self.create_node(Split::spec(input, split_sizes, dim))?;
        (0..split_sizes.len()).map(|i| first.at(i)).collect()
    }

    /// 外部定义、不可降级的节点
    #[track_caller]
    pub fn opaque(
        &self,
        op: OpKind,
        label: &str,
        operands: &[Value],
        shape: Shape,
        num_outputs: usize,
    ) -> Result<Value, IrError> {
        self.create_node(Opaque::spec(op, label, operands.to_vec(), shape, num_outputs))
    }

    /// 以`node`所在节点为模板、绑定新操作数创建同类型节点
    #[track_caller]
    pub fn clone_node(&self, node: &Value, operands: &[Value]) -> Result<Value, IrError> {
        let id = self.own_node(node)?;
        self.inner.borrow_mut().clone_node(id, operands.to_vec())
    }

    // ==================== 图改写 ====================

    /// 把`consumer`所在节点的第`pos`个操作数改为`value`
    pub fn replace_operand(
        &self,
        consumer: &Value,
        pos: usize,
        value: &Value,
    ) -> Result<(), IrError> {
        let id = self.own_node(consumer)?;
        self.inner.borrow_mut().replace_operand(id, pos, value)
    }

    /// 把`from`所在节点的全部 use 改为指向`to`，返回改写的 use 条数
    pub fn replace_all_uses_with(&self, from: &Value, to: &Value) -> Result<usize, IrError> {
        self.inner.borrow_mut().replace_all_uses_with(from, to)
    }

    /// 回收排队中的节点释放
    pub fn collect_released(&self) {
        self.inner.borrow_mut().collect_released();
    }

    // ==================== 查询 ====================

    /// `value`所在节点的 use 集合（已排序）
    pub fn uses(&self, value: &Value) -> Result<Vec<Use>, IrError> {
        let id = self.own_node(value)?;
        let inner = self.inner.borrow();
        Ok(inner.node(id)?.uses().iter().copied().collect())
    }

    /// `value`所在节点的操作数
    pub fn operands(&self, value: &Value) -> Result<Vec<Value>, IrError> {
        let id = self.own_node(value)?;
        let inner = self.inner.borrow();
        Ok(inner.node(id)?.operands().to_vec())
    }

    /// `value`所在节点的第`pos`个操作数
    pub fn operand(&self, value: &Value, pos: usize) -> Result<Value, IrError> {
        let id = self.own_node(value)?;
        let inner = self.inner.borrow();
        inner.node(id)?.operand(pos).cloned()
    }

    /// `value`所在节点的调试名
    pub fn node_name(&self, value: &Value) -> Result<String, IrError> {
        let id = self.own_node(value)?;
        Ok(self.inner.borrow().node(id)?.name().to_string())
    }

    pub fn contains(&self, value: &Value) -> bool {
        let Some(id) = value.node_id() else {
            return false;
        };
        value.belongs_to(&Rc::downgrade(&self.inner)) && self.inner.borrow().contains(id)
    }

    /// 从`roots`出发的后序遍历
    pub fn post_order(&self, roots: &[Value]) -> Result<Vec<NodeId>, IrError> {
        let ids = roots
            .iter()
            .map(|root| self.own_node(root))
            .collect::<Result<Vec<_>, _>>()?;
        self.inner.borrow().post_order(&ids)
    }

    pub fn shape_cache_stats(&self) -> ShapeCacheStats {
        self.inner.borrow().shape_cache_stats()
    }

    /// 检查全部结构不变量（先回收排队的释放）
    pub fn check_invariants(&self) -> Result<(), IrError> {
        let mut inner = self.inner.borrow_mut();
        inner.collect_released();
        inner.check_invariants()
    }

    fn own_node(&self, value: &Value) -> Result<NodeId, IrError> {
        let id = value.node_id().ok_or(IrError::NullValue)?;
        if !value.belongs_to(&Rc::downgrade(&self.inner)) {
            return Err(IrError::ForeignValue);
        }
        Ok(id)
    }

    // ==================== 作用域 ====================

    /// 进入命名作用域，返回的守卫离开作用域时自动弹出
    pub fn scope(&self, name: &str) -> ScopeGuard {
        let stack = self.inner.borrow().scope_stack();
        ScopeGuard::enter(stack, name)
    }

    /// 在命名作用域内执行`f`
    pub fn with_scope<R>(&self, name: &str, f: impl FnOnce() -> R) -> R {
        let _guard = self.scope(name);
        f()
    }

    /// 清空作用域栈；此前创建的守卫在之后退出时不再生效
    pub fn reset_scopes(&self) {
        let stack = self.inner.borrow().scope_stack();
        stack.borrow_mut().reset();
    }

    pub fn scope_path(&self) -> String {
        self.inner.borrow().scope_path()
    }

    // ==================== 降级 ====================

    /// 用新的降级上下文降级从`roots`可达的全部节点
    pub fn lower(
        &self,
        roots: &[Value],
        emitter: &mut dyn Emitter,
    ) -> Result<Vec<LoweredHandle>, IrError> {
        let mut ctx = LoweringContext::new(emitter);
        self.lower_with(roots, &mut ctx)
    }

    /// 在已有的降级上下文中降级，已降级过的节点会被复用
    pub fn lower_with(
        &self,
        roots: &[Value],
        ctx: &mut LoweringContext<'_>,
    ) -> Result<Vec<LoweredHandle>, IrError> {
        self.inner.borrow().lower(roots, ctx)
    }

    // ==================== 描述 ====================

    pub fn describe(&self) -> Result<GraphDescriptor, IrError> {
        self.inner.borrow().describe()
    }

    pub fn to_text(&self) -> Result<String, IrError> {
        self.inner.borrow().to_text()
    }

    pub fn to_dot(&self) -> Result<String, IrError> {
        self.inner.borrow().to_dot()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("Graph")
                .field("name", &inner.name())
                .field("nodes", &inner.node_count())
                .finish(),
            Err(_) => f.write_str("Graph(<borrowed>)"),
        }
    }
}
