/*
 * @Description  : GraphInner 遍历
 */

use super::GraphInner;
use crate::errors::IrError;
use crate::ir::nodes::NodeId;
use std::collections::BTreeMap;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

impl GraphInner {
    /// 从`roots`出发的后序遍历：每个节点排在它的全部操作数之后，且只出现一次
    ///
    /// 按根的顺序、操作数的顺序访问，结果确定。用显式栈实现，深图不会溢出调用栈。
    pub fn post_order(&self, roots: &[NodeId]) -> Result<Vec<NodeId>, IrError> {
        let mut marks = BTreeMap::new();
        let mut order = Vec::new();

        for &root in roots {
            if marks.contains_key(&root) {
                continue;
            }
            // （节点, 下一个要访问的操作数位置）
            let mut stack = vec![(root, 0usize)];
            marks.insert(root, Mark::Visiting);
            while let Some((id, next)) = stack.pop() {
                let node = self.node(id)?;
                match node.operands().get(next).map(|v| v.output()) {
                    Some(Some(output)) => {
                        stack.push((id, next + 1));
                        match marks.get(&output.node) {
                            None => {
                                marks.insert(output.node, Mark::Visiting);
                                stack.push((output.node, 0));
                            }
                            Some(Mark::Visiting) => {
                                return Err(IrError::Cycle(format!(
                                    "遍历时发现环：{}经由操作数回到了{}",
                                    id, output.node
                                )));
                            }
                            Some(Mark::Done) => {}
                        }
                    }
                    // 空操作数
                    Some(None) => stack.push((id, next + 1)),
                    None => {
                        marks.insert(id, Mark::Done);
                        order.push(id);
                    }
                }
            }
        }
        Ok(order)
    }

    /// 整个图的拓扑序（操作数在前），无关节点按 ID 升序
    pub fn topological_order(&self) -> Result<Vec<NodeId>, IrError> {
        let ids = self.node_ids();
        self.post_order(&ids)
    }
}
