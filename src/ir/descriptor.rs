/*
 * @Description  : 图描述符（Graph Descriptor）
 *                 可序列化的图快照，用于调试输出与离线检查，不参与任何语义
 */

use super::hashing::HashValue;
use super::nodes::{Output, Use};
use super::shape::Shape;
use serde::{Deserialize, Serialize};

/// 图的可序列化描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDescriptor {
    /// 格式版本（用于向后兼容）
    pub version: String,
    /// 图名称
    pub name: String,
    /// 所有节点描述（按拓扑序，操作数在前）
    pub nodes: Vec<NodeDescriptor>,
}

/// 节点描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// 节点 ID
    pub id: u64,
    /// 带作用域前缀的调试名
    pub name: String,
    /// 算子标签
    pub op: String,
    /// 节点类型名
    pub kind: String,
    /// 构建时所在的作用域
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub scope: String,
    /// 构建调用所在的源码位置
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub location: String,
    /// 各输出的形状
    pub shapes: Vec<Shape>,
    /// 操作数（按位置）
    pub operands: Vec<Output>,
    /// use 集合（已排序）
    pub uses: Vec<Use>,
    pub hash: HashValue,
    /// 节点类型特有的字段
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub fields: Vec<(String, String)>,
}

impl GraphDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            name: name.to_string(),
            nodes: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node: NodeDescriptor) {
        self.nodes.push(node);
    }

    pub fn node(&self, id: u64) -> Option<&NodeDescriptor> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
