/*
 * @Description  : 节点在日志与报错中的显示格式
 */

use super::nodes::NodeId;
use super::op_kind::OpKind;

/// 格式化节点的显示
///
/// # Arguments
/// * `id` - 节点ID
/// * `name` - 节点调试名
/// * `op` - 算子标签
///
/// # Returns
/// 返回格式化后的字符串，格式为：`节点[id={}, name={}, op={}]`
pub(crate) fn format_node_display(id: NodeId, name: &str, op: &OpKind) -> String {
    format!("节点[id={}, name={}, op={}]", id, name, op)
}
