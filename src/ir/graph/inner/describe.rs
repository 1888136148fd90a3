/*
 * @Description  : GraphInner describe / to_text / to_dot
 */

use super::GraphInner;
use crate::errors::IrError;
use crate::ir::descriptor::{GraphDescriptor, NodeDescriptor};
use crate::ir::nodes::GraphNode;
use crate::ir::nodes::raw_node::TraitNode;

impl GraphInner {
    // ========== 图描述（describe）==========

    /// 导出图的描述符，节点按拓扑序排列
    ///
    /// # 示例
    /// ```ignore
    /// let descriptor = graph.describe()?;
    /// println!("{}", descriptor.to_json().unwrap());
    /// ```
    pub fn describe(&self) -> Result<GraphDescriptor, IrError> {
        let mut descriptor = GraphDescriptor::new(self.name());
        for id in self.topological_order()? {
            descriptor.add_node(Self::describe_node(self.node(id)?));
        }
        Ok(descriptor)
    }

    fn describe_node(node: &GraphNode) -> NodeDescriptor {
        NodeDescriptor {
            id: node.id().0,
            name: node.name().to_string(),
            op: node.op().to_string(),
            kind: node.kind().kind_name().to_string(),
            scope: node.scope().to_string(),
            location: node.location().to_string(),
            shapes: node.shapes().to_vec(),
            operands: node.operand_outputs(),
            uses: node.uses().iter().copied().collect(),
            hash: node.hash(),
            fields: node
                .kind()
                .describe_fields()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    /// 文本形式的 IR，每行一个节点，如：
    /// `%3 = aten::add(%1:0, %2:0), shape=f32[4], name=aten::add_3, hash=...`
    pub fn to_text(&self) -> Result<String, IrError> {
        let mut text = format!("graph {} {{\n", self.name());
        for id in self.topological_order()? {
            let node = self.node(id)?;
            let operands = node
                .operand_outputs()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            text.push_str(&format!(
                "  {} = {}({}), shape={}, name={}",
                id,
                node.op(),
                operands,
                node.node_shape(),
                node.name()
            ));
            for (key, value) in node.kind().describe_fields() {
                text.push_str(&format!(", {key}={value}"));
            }
            text.push_str(&format!(", hash={}\n", node.hash()));
        }
        text.push('}');
        Ok(text)
    }

    /// Graphviz DOT 格式，边从操作数指向消费者，标注输出序号与操作数位置
    pub fn to_dot(&self) -> Result<String, IrError> {
        let mut dot = String::new();
        dot.push_str(&format!("digraph \"{}\" {{\n", escape(self.name())));
        dot.push_str("    rankdir=TB;\n");
        dot.push_str("    node [shape=box style=\"rounded,filled\" fillcolor=\"#E3F2FD\" fontsize=10];\n");

        let order = self.topological_order()?;
        for &id in &order {
            let node = self.node(id)?;
            let fillcolor = if node.operands().is_empty() {
                " fillcolor=\"#E8F5E9\""
            } else {
                ""
            };
            dot.push_str(&format!(
                "    \"{}\" [label=\"{}\\n{}\\n{}\"{}];\n",
                id.0,
                escape(node.name()),
                escape(node.op().as_str()),
                node.node_shape(),
                fillcolor
            ));
        }
        for &id in &order {
            let node = self.node(id)?;
            for (pos, output) in node.operand_outputs().iter().enumerate() {
                dot.push_str(&format!(
                    "    \"{}\" -> \"{}\" [label=\"{}->{}\" fontsize=9];\n",
                    output.node.0, id.0, output.index, pos
                ));
            }
        }
        dot.push_str("}\n");
        Ok(dot)
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
