/*
 * @Description  : GraphInner 图改写：replace_operand / replace_all_uses_with
 *
 * 每个改写都先完成全部校验（含环检测），再一次性修改 use 集合与操作数槽位，
 * 最后按拓扑序重算被改写节点及其全部下游消费者的哈希。形状不会重新推断。
 */

use super::GraphInner;
use crate::errors::IrError;
use crate::ir::display::format_node_display;
use crate::ir::nodes::{NodeId, Output, Use, Value};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

impl GraphInner {
    /// 把节点`consumer`的第`pos`个操作数改为`value`
    ///
    /// 旧生产者恰好失去一条 use，新生产者恰好得到一条 use。
    pub fn replace_operand(
        &mut self,
        consumer: NodeId,
        pos: usize,
        value: &Value,
    ) -> Result<(), IrError> {
        self.collect_released();

        // 1. 校验
        let node = self.node(consumer)?;
        let old = node.operand(pos)?.expect_output()?;
        let new = self.resolve_operand(value)?;
        if old == new {
            return Ok(());
        }
        self.ensure_acyclic(new.node, &BTreeSet::from([consumer]))?;

        // 2. 修改
        let previous = self.rebind_operand(consumer, pos, old, value)?;
        log::debug!("{}的第{}个操作数：{} -> {}", consumer, pos, old, new);

        // 3. 重算哈希
        let result = self.rehash_from([consumer]);
        drop(previous);
        self.collect_released();
        result
    }

    /// 把`from`所在节点（任一输出）的全部 use 改为指向`to`，返回改写的 use 条数
    ///
    /// 完成后`from`节点的 use 集合为空（`to`与`from`是同一节点的不同输出时除外）。
    /// `to`与`from`完全相同时什么也不做。
    pub fn replace_all_uses_with(&mut self, from: &Value, to: &Value) -> Result<usize, IrError> {
        self.collect_released();

        // 1. 校验
        let from_output = self.resolve_operand(from)?;
        let to_output = self.resolve_operand(to)?;
        if from_output == to_output {
            log::debug!("replace_all_uses_with的源与目标相同（{from_output}），忽略");
            return Ok(0);
        }
        let uses = self
            .node(from_output.node)?
            .uses()
            .iter()
            .copied()
            .filter(|u| !(from_output.node == to_output.node && u.index == to_output.index))
            .collect::<Vec<Use>>();
        if uses.is_empty() {
            return Ok(0);
        }
        let consumers = uses.iter().map(|u| u.node).collect::<BTreeSet<NodeId>>();
        self.ensure_acyclic(to_output.node, &consumers)?;

        // 2. 修改
        let mut previous = Vec::with_capacity(uses.len());
        for u in &uses {
            let old = Output::new(from_output.node, u.index);
            previous.push(self.rebind_operand(u.node, u.operand_index, old, to)?);
        }
        log::debug!(
            "replace_all_uses_with：{} -> {}，改写{}条use，涉及{}个消费者",
            from_output,
            to_output,
            uses.len(),
            consumers.len()
        );

        // 3. 重算哈希
        let result = self.rehash_from(consumers);
        drop(previous);
        self.collect_released();
        result.map(|()| uses.len())
    }

    /// 摘掉旧 use、登记新 use、改写槽位，返回被替换掉的旧 Value
    fn rebind_operand(
        &mut self,
        consumer: NodeId,
        pos: usize,
        old: Output,
        value: &Value,
    ) -> Result<Value, IrError> {
        let new = self.resolve_operand(value)?;
        self.node_mut(old.node)?
            .remove_use(&Use::new(consumer, pos, old.index));
        self.node_mut(new.node)?
            .add_use(Use::new(consumer, pos, new.index));
        Ok(self.node_mut(consumer)?.set_operand(pos, value.clone()))
    }

    /// `producer`（经由其操作数）依赖于`consumers`中任一节点时，改写会成环
    fn ensure_acyclic(&self, producer: NodeId, consumers: &BTreeSet<NodeId>) -> Result<(), IrError> {
        let mut visited = BTreeSet::new();
        let mut stack = vec![producer];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let node = self.node(id)?;
            if consumers.contains(&id) {
                return Err(IrError::Cycle(format!(
                    "{}已依赖于被改写的消费者{}",
                    producer,
                    format_node_display(id, node.name(), node.op())
                )));
            }
            stack.extend(node.operand_outputs().iter().map(|o| o.node));
        }
        Ok(())
    }

    /// 按拓扑序重算`roots`及其全部下游消费者的哈希
    pub(in crate::ir::graph) fn rehash_from(
        &mut self,
        roots: impl IntoIterator<Item = NodeId>,
    ) -> Result<(), IrError> {
        // 受影响的节点：roots 沿 use 向下可达的全部节点
        let mut affected = BTreeSet::new();
        let mut queue = roots.into_iter().collect::<VecDeque<_>>();
        while let Some(id) = queue.pop_front() {
            if affected.insert(id) {
                queue.extend(self.node(id)?.uses().iter().map(|u| u.node));
            }
        }

        // Kahn：只统计来自受影响节点的入边
        let mut in_degree = BTreeMap::new();
        for &id in &affected {
            let count = self
                .node(id)?
                .operand_outputs()
                .iter()
                .filter(|o| affected.contains(&o.node))
                .count();
            in_degree.insert(id, count);
        }
        let mut ready = in_degree
            .iter()
            .filter(|&(_, &d)| d == 0)
            .map(|(&id, _)| id)
            .collect::<BTreeSet<_>>();

        let mut processed = 0;
        while let Some(id) = ready.pop_first() {
            let node = self.node(id)?;
            let hash = self.compute_hash(node)?;
            let consumers = node.uses().iter().map(|u| u.node).collect::<Vec<_>>();
            if hash != node.hash() {
                log::trace!("{}的哈希：{} -> {}", id, node.hash(), hash);
                self.node_mut(id)?.set_hash(hash);
            }
            processed += 1;
            for consumer in consumers {
                if let Some(d) = in_degree.get_mut(&consumer) {
                    *d -= 1;
                    if *d == 0 {
                        ready.insert(consumer);
                    }
                }
            }
        }

        if processed != affected.len() {
            return Err(IrError::InvariantViolation(format!(
                "重算哈希时发现环：{}个受影响节点中只有{}个能排出拓扑序",
                affected.len(),
                processed
            )));
        }
        Ok(())
    }
}
