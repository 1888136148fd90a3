/*
 * @Description  : GraphInner 降级驱动：按后序遍历一次，每个节点在其全部操作数之后降级
 */

use super::GraphInner;
use crate::errors::IrError;
use crate::ir::display::format_node_display;
use crate::ir::lowering::{LoweredHandle, LoweringContext};
use crate::ir::nodes::raw_node::TraitNode;
use crate::ir::nodes::{NodeId, Output, Value};

impl GraphInner {
    /// 降级从`roots`可达的全部节点，返回各根对应的后端句柄
    ///
    /// 同一上下文中已降级过的节点会被跳过，多次调用可共享子图。
    pub fn lower(
        &self,
        roots: &[Value],
        ctx: &mut LoweringContext<'_>,
    ) -> Result<Vec<LoweredHandle>, IrError> {
        let outputs = roots
            .iter()
            .map(|root| self.resolve_operand(root))
            .collect::<Result<Vec<Output>, _>>()?;
        let root_ids = outputs.iter().map(|o| o.node).collect::<Vec<NodeId>>();

        let order = self.post_order(&root_ids)?;
        let mut lowered = 0usize;
        for id in order {
            if ctx.is_lowered(id) {
                continue;
            }
            let node = self.node(id)?;
            let ops = node.kind().lower(node, ctx)?;
            ctx.return_ops(node, ops)?;
            lowered += 1;
            log::trace!(
                "降级{}",
                format_node_display(id, node.name(), node.op())
            );
        }
        log::debug!(
            "图`{}`降级完成：本次降级{}个节点，{}个根",
            self.name(),
            lowered,
            roots.len()
        );

        outputs
            .into_iter()
            .map(|output| ctx.lookup(output).ok_or(IrError::NotLowered(output)))
            .collect()
    }
}
