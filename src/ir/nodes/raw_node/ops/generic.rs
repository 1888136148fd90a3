/*
 * @Description  : Generic 节点：前端算子的通用载体
 *
 * 标签由调用方决定（如`aten::add`），除可选的种子外不带其它元数据。
 * 逐元素二元算子用`Generic::binary`构建，形状按广播规则推断。
 */

use crate::errors::IrError;
use crate::ir::hashing::HashValue;
use crate::ir::lowering::{EmitRequest, LoweredOps, LoweringContext};
use crate::ir::nodes::raw_node::TraitNode;
use crate::ir::nodes::{GraphNode, NodeSpec, NodeTemplate, ShapeSource, Value};
use crate::ir::op_kind::OpKind;
use crate::ir::shape::Shape;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum ShapeRule {
    /// 形状由调用方给定，克隆时原样沿用
    #[default]
    Fixed,
    /// 逐元素广播，克隆时按新操作数重新推断
    Broadcast,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generic {
    seed: Option<HashValue>,
    rule: ShapeRule,
}

impl Generic {
    pub const fn new() -> Self {
        Self {
            seed: None,
            rule: ShapeRule::Fixed,
        }
    }

    pub const fn with_seed(seed: HashValue) -> Self {
        Self {
            seed: Some(seed),
            rule: ShapeRule::Fixed,
        }
    }

    pub fn spec<'a>(
        op: OpKind,
        operands: Vec<Value>,
        shape: impl Into<ShapeSource<'a>>,
    ) -> NodeSpec<'a> {
        NodeSpec::new(op, operands, shape, Self::new())
    }

    /// 逐元素二元算子，如`aten::add`
    pub fn binary(op: OpKind, lhs: &Value, rhs: &Value) -> NodeSpec<'static> {
        let kind = Self {
            seed: None,
            rule: ShapeRule::Broadcast,
        };
        NodeSpec::new(
            op,
            vec![lhs.clone(), rhs.clone()],
            ShapeSource::infer(broadcast_shapes),
            kind,
        )
    }

    pub const fn seed(&self) -> Option<HashValue> {
        self.seed
    }
}

impl TraitNode for Generic {
    fn kind_name(&self) -> &'static str {
        "Generic"
    }

    fn hash_seed(&self) -> Option<HashValue> {
        self.seed
    }

    fn clone_shape(&self, template: &NodeTemplate) -> ShapeSource<'static> {
        match self.rule {
            ShapeRule::Fixed => ShapeSource::Known(template.shape.clone()),
            ShapeRule::Broadcast => ShapeSource::infer(broadcast_shapes),
        }
    }

    fn lower(&self, node: &GraphNode, ctx: &mut LoweringContext<'_>) -> Result<LoweredOps, IrError> {
        let operands = ctx.operand_ops(node)?;
        ctx.emitter().emit(EmitRequest {
            op: node.op(),
            name: node.name(),
            operands: &operands,
            shape: node.node_shape(),
            num_outputs: node.num_outputs(),
            attributes: Vec::new(),
        })
    }

    fn describe_fields(&self) -> Vec<(&'static str, String)> {
        match self.rule {
            ShapeRule::Fixed => Vec::new(),
            ShapeRule::Broadcast => vec![("shape_rule", "broadcast".to_string())],
        }
    }
}

/// 逐元素广播：从最右侧的维度开始对齐，每对维度须相等或有一方为 1；元素类型取提升后的类型
pub fn broadcast_shapes(shapes: &[Shape]) -> Result<Shape, String> {
    let Some((first, rest)) = shapes.split_first() else {
        return Err("逐元素算子至少需要1个操作数".to_string());
    };
    let mut element_type = first
        .element_type()
        .ok_or_else(|| format!("逐元素算子不接受元组形状的操作数：{first}"))?;
    let mut dims = first.dims().to_vec();

    for shape in rest {
        let other_type = shape
            .element_type()
            .ok_or_else(|| format!("逐元素算子不接受元组形状的操作数：{shape}"))?;
        element_type = element_type.promote(other_type);

        let other = shape.dims();
        let rank = dims.len().max(other.len());
        let mut merged = vec![0; rank];
        for i in 0..rank {
            // 从右侧对齐，缺失的维度视为 1
            let a = dims.len().checked_sub(rank - i).map_or(1, |j| dims[j]);
            let b = other.len().checked_sub(rank - i).map_or(1, |j| other[j]);
            merged[i] = match (a, b) {
                (a, b) if a == b => a,
                (1, b) => b,
                (a, 1) => a,
                _ => {
                    return Err(format!(
                        "形状{:?}与{:?}无法广播（第{}维：{}对{}）",
                        dims, other, i, a, b
                    ));
                }
            };
        }
        dims = merged;
    }

    Ok(Shape::Array { element_type, dims })
}
