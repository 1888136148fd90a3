/*
 * @Description  : GraphInner 基础操作：访问器、操作数解析、节点释放、不变量检查
 */

use super::GraphInner;
use crate::errors::IrError;
use crate::ir::display::format_node_display;
use crate::ir::graph::ShapeCacheStats;
use crate::ir::hashing::{self, HashValue};
use crate::ir::nodes::{GraphNode, NodeId, Output, Use, Value};
use crate::ir::options::GraphOptions;
use crate::ir::scope::ScopeStack;
use crate::ir::shape::Shape;
use std::cell::RefCell;
use std::rc::Rc;

impl GraphInner {
    // ========== 基础访问器 ==========

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub const fn options(&self) -> &GraphOptions {
        &self.options
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&GraphNode, IrError> {
        self.nodes.get(&id).ok_or(IrError::NodeNotFound(id))
    }

    pub(in crate::ir::graph) fn node_mut(&mut self, id: NodeId) -> Result<&mut GraphNode, IrError> {
        self.nodes.get_mut(&id).ok_or(IrError::NodeNotFound(id))
    }

    /// 按 ID 升序遍历全部节点
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    /// 节点第`index`个输出的新 Value
    pub fn value_of(&self, id: NodeId, index: usize) -> Result<Value, IrError> {
        let node = self.node(id)?;
        if index >= node.num_outputs() {
            return Err(IrError::output_index(index, node.num_outputs()));
        }
        node.to_value(index).ok_or(IrError::NodeNotFound(id))
    }

    pub(in crate::ir::graph) fn scope_stack(&self) -> Rc<RefCell<ScopeStack>> {
        Rc::clone(&self.scopes)
    }

    pub fn scope_path(&self) -> String {
        self.scopes.borrow().current_path()
    }

    pub fn shape_cache_stats(&self) -> ShapeCacheStats {
        self.shape_cache.stats()
    }

    pub fn clear_shape_cache(&mut self) {
        self.shape_cache.clear();
    }

    // ========== 操作数解析 ==========

    /// 校验 Value 可作为本图节点的操作数，返回其指向的（节点, 输出序号）
    pub(in crate::ir::graph) fn resolve_operand(&self, value: &Value) -> Result<Output, IrError> {
        let output = value.expect_output()?;
        if !value.belongs_to(&self.self_ref) {
            return Err(IrError::ForeignValue);
        }
        let producer = self.node(output.node)?;
        if output.index >= producer.num_outputs() {
            return Err(IrError::output_index(output.index, producer.num_outputs()));
        }
        Ok(output)
    }

    /// 某输出作为操作数时参与消费者哈希的值
    pub(in crate::ir::graph) fn output_hash(&self, output: Output) -> Result<HashValue, IrError> {
        let producer = self.node(output.node)?;
        Ok(hashing::output_hash(producer.hash(), output.index))
    }

    /// 某输出的形状（多输出节点取对应分量）
    pub(in crate::ir::graph) fn output_shape(&self, output: Output) -> Result<&Shape, IrError> {
        self.node(output.node)?.shape(output.index)
    }

    // ========== 节点释放 ==========

    /// 移除单个节点，摘掉它在各操作数上登记的 use，返回它持有的操作数（由调用方决定何时丢弃）
    fn release_one(&mut self, id: NodeId) -> Vec<Value> {
        let Some(mut node) = self.nodes.remove(&id) else {
            return Vec::new();
        };
        if !node.uses().is_empty() {
            log::warn!(
                "{}被释放时仍有{}个use，这些消费者将指向已不存在的节点",
                format_node_display(node.id(), node.name(), node.op()),
                node.uses().len()
            );
        }
        let operands = node.take_operands();
        for (pos, operand) in operands.iter().enumerate() {
            let Some(output) = operand.output() else {
                continue;
            };
            if let Some(producer) = self.nodes.get_mut(&output.node) {
                producer.remove_use(&Use::new(id, pos, output.index));
            }
        }
        log::trace!(
            "释放{}",
            format_node_display(node.id(), node.name(), node.op())
        );
        operands
    }

    /// 释放节点，并逐个处理因此失去最后一个所有者的操作数节点
    ///
    /// 用显式工作队列代替递归：很长的链也不会耗尽调用栈。
    pub(crate) fn release_node_cascade(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let operands = self.release_one(id);
            // 图正被借用，丢弃操作数触发的释放只会入队
            drop(operands);
            pending.append(&mut self.released.borrow_mut());
        }
    }

    /// 回收在图被借用期间排队的释放
    pub fn collect_released(&mut self) {
        let queued = std::mem::take(&mut *self.released.borrow_mut());
        if queued.is_empty() {
            return;
        }
        log::trace!("回收{}个排队释放的节点", queued.len());
        for id in queued {
            self.release_node_cascade(id);
        }
    }

    /// 等待回收的节点数
    pub fn pending_releases(&self) -> usize {
        self.released.borrow().len()
    }

    // ========== 不变量检查 ==========

    /// 检查全部结构不变量：
    /// - 形状个数等于输出数
    /// - 每个操作数都在其生产者的 use 集合里有对应记录，反之每条 use 都对应一个操作数
    /// - 缓存的哈希等于按当前操作数重新计算的结果
    pub fn check_invariants(&self) -> Result<(), IrError> {
        for node in self.nodes.values() {
            let label = || format_node_display(node.id(), node.name(), node.op());

            if node.shapes().len() != node.num_outputs() {
                return Err(IrError::InvariantViolation(format!(
                    "{}有{}个形状，但输出数为{}",
                    label(),
                    node.shapes().len(),
                    node.num_outputs()
                )));
            }

            for (pos, operand) in node.operands().iter().enumerate() {
                let output = operand.expect_output()?;
                let producer = self.node(output.node).map_err(|_| {
                    IrError::InvariantViolation(format!(
                        "{}的第{}个操作数指向已不存在的节点{}",
                        label(),
                        pos,
                        output.node
                    ))
                })?;
                if !producer.uses().contains(&Use::new(node.id(), pos, output.index)) {
                    return Err(IrError::InvariantViolation(format!(
                        "{}的第{}个操作数{}在生产者的use集合中没有记录",
                        label(),
                        pos,
                        output
                    )));
                }
            }

            for u in node.uses() {
                let consumer = self.node(u.node).map_err(|_| {
                    IrError::InvariantViolation(format!(
                        "{}的use（{}）指向已不存在的消费者",
                        label(),
                        u
                    ))
                })?;
                let matches = consumer
                    .operands()
                    .get(u.operand_index)
                    .and_then(Value::output)
                    .is_some_and(|o| o == Output::new(node.id(), u.index));
                if !matches {
                    return Err(IrError::InvariantViolation(format!(
                        "{}的use（{}）与消费者的操作数不一致",
                        label(),
                        u
                    )));
                }
            }

            let expected = self.compute_hash(node)?;
            if expected != node.hash() {
                return Err(IrError::InvariantViolation(format!(
                    "{}的哈希{}已过期，按当前操作数应为{}",
                    label(),
                    node.hash(),
                    expected
                )));
            }
        }
        Ok(())
    }

    /// 按节点当前的操作数计算完整哈希
    pub(in crate::ir::graph) fn compute_hash(&self, node: &GraphNode) -> Result<HashValue, IrError> {
        let operand_hashes = node
            .operand_outputs()
            .into_iter()
            .map(|output| self.output_hash(output))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(hashing::combine_operands(node.node_hash(), operand_hashes))
    }
}
