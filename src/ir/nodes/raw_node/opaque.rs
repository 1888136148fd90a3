/*
 * @Description  : Opaque 节点：外部定义、只参与图分析的节点类型
 *
 * 标签、形状、输出数都由调用方给定；没有实现降级，降级时返回`IrError::Unimplemented`。
 */

use super::TraitNode;
use crate::ir::hashing::{self, HashValue};
use crate::ir::nodes::{NodeSpec, ShapeSource, Value};
use crate::ir::op_kind::OpKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opaque {
    label: String,
}

impl Opaque {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
        }
    }

    pub fn spec<'a>(
        op: OpKind,
        label: &str,
        operands: Vec<Value>,
        shape: impl Into<ShapeSource<'a>>,
        num_outputs: usize,
    ) -> NodeSpec<'a> {
        NodeSpec::new(op, operands, shape, Self::new(label)).with_num_outputs(num_outputs)
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl TraitNode for Opaque {
    fn kind_name(&self) -> &'static str {
        "Opaque"
    }

    fn hash_seed(&self) -> Option<HashValue> {
        Some(hashing::hash_of(self.label.as_str()))
    }

    fn describe_fields(&self) -> Vec<(&'static str, String)> {
        vec![("label", self.label.clone())]
    }
}
