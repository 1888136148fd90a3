/*
 * @Description  : GraphInner 图的底层实现（节点 arena）
 *
 * 各 impl 块分散在子模块中：
 * - core.rs: 访问器、操作数解析、节点释放、不变量检查
 * - node_builders.rs: create_node / clone_node
 * - rewrite.rs: replace_operand / replace_all_uses_with 与哈希重算
 * - traversal.rs: 后序遍历
 * - lowering.rs: 降级驱动
 * - describe.rs: describe / to_text / to_dot
 */

mod core;
mod describe;
mod lowering;
mod node_builders;
mod rewrite;
mod traversal;

use super::shape_cache::ShapeCache;
use crate::ir::nodes::{GraphNode, NodeId};
use crate::ir::options::GraphOptions;
use crate::ir::scope::ScopeStack;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

/// 图的完整定义（核心实现）
///
/// 用户通常通过`Graph`句柄使用；需要在一次借用内完成多步只读查询时可用`graph.inner()`。
pub struct GraphInner {
    pub(in crate::ir::graph) options: GraphOptions,
    /// 以`NodeId`为键的节点 arena，按 ID 有序
    pub(in crate::ir::graph) nodes: BTreeMap<NodeId, GraphNode>,
    pub(in crate::ir::graph) next_id: u64,
    /// 作用域栈单独放在一个`RefCell`里，作用域守卫无需借用整个图
    pub(in crate::ir::graph) scopes: Rc<RefCell<ScopeStack>>,
    pub(in crate::ir::graph) shape_cache: ShapeCache,
    /// 图被借用期间释放的节点，等下一次修改时统一回收
    pub(in crate::ir::graph) released: Rc<RefCell<Vec<NodeId>>>,
    /// 指向自身的弱引用，交给每个节点的所有权 token
    pub(in crate::ir::graph) self_ref: Weak<RefCell<GraphInner>>,
}

impl GraphInner {
    /// 创建图并返回其共享句柄（自身弱引用需要在构造时就位）
    pub(in crate::ir::graph) fn new_shared(options: GraphOptions) -> Rc<RefCell<Self>> {
        Rc::new_cyclic(|self_ref| {
            RefCell::new(Self {
                shape_cache: ShapeCache::new(options.shape_cache_capacity),
                options,
                nodes: BTreeMap::new(),
                next_id: 1,
                scopes: Rc::new(RefCell::new(ScopeStack::new())),
                released: Rc::new(RefCell::new(Vec::new())),
                self_ref: self_ref.clone(),
            })
        })
    }
}

impl Drop for GraphInner {
    fn drop(&mut self) {
        // 节点之间只有操作数这一种强引用，直接清空即可；
        // 此时各 token 已无法升级到图，不会再回调释放逻辑
        let count = self.nodes.len();
        self.nodes.clear();
        log::trace!("图`{}`被释放，连带释放{}个节点", self.options.name, count);
    }
}
