/*
 * @Description  : Gather 节点：沿`dim`维按索引取值
 *
 * `out[i][j][k] = input[index[i][j][k]][j][k]`（dim = 0 时），输出形状与`index`相同。
 */

use crate::errors::IrError;
use crate::ir::hashing::{self, HashValue};
use crate::ir::lowering::{Attribute, EmitRequest, LoweredOps, LoweringContext};
use crate::ir::nodes::raw_node::TraitNode;
use crate::ir::nodes::{GraphNode, NodeSpec, NodeTemplate, ShapeSource, Value};
use crate::ir::op_kind::kinds;
use crate::ir::shape::Shape;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gather {
    dim: usize,
}

impl Gather {
    pub const fn new(dim: usize) -> Self {
        Self { dim }
    }

    pub fn spec(input: &Value, index: &Value, dim: usize) -> NodeSpec<'static> {
        NodeSpec::new(
            kinds::GATHER,
            vec![input.clone(), index.clone()],
            ShapeSource::infer(move |shapes| gather_shape(shapes, dim)),
            Self::new(dim),
        )
    }

    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// 标签为`aten::gather`时取出
    pub fn cast(node: &GraphNode) -> Option<&Self> {
        node.cast::<Self>(&kinds::GATHER)
    }
}

impl TraitNode for Gather {
    fn kind_name(&self) -> &'static str {
        "Gather"
    }

    fn hash_seed(&self) -> Option<HashValue> {
        Some(hashing::hash_of(&self.dim))
    }

    fn clone_shape(&self, _template: &NodeTemplate) -> ShapeSource<'static> {
        let dim = self.dim;
        ShapeSource::infer(move |shapes| gather_shape(shapes, dim))
    }

    fn lower(&self, node: &GraphNode, ctx: &mut LoweringContext<'_>) -> Result<LoweredOps, IrError> {
        let operands = ctx.operand_ops(node)?;
        ctx.emitter().emit(EmitRequest {
            op: node.op(),
            name: node.name(),
            operands: &operands,
            shape: node.node_shape(),
            num_outputs: 1,
            attributes: vec![("dim", Attribute::Int(self.dim as i64))],
        })
    }

    fn describe_fields(&self) -> Vec<(&'static str, String)> {
        vec![("dim", self.dim.to_string())]
    }
}

fn gather_shape(shapes: &[Shape], dim: usize) -> Result<Shape, String> {
    let [input, index] = shapes else {
        return Err(format!("gather需要2个操作数（input, index），实际为{}个", shapes.len()));
    };
    let element_type = input
        .element_type()
        .ok_or_else(|| format!("gather的input不能是元组：{input}"))?;
    let index_type = index
        .element_type()
        .ok_or_else(|| format!("gather的index不能是元组：{index}"))?;
    if !index_type.is_integral() {
        return Err(format!("gather的index必须是整数类型，实际为{index_type}"));
    }
    if input.rank() != index.rank() {
        return Err(format!(
            "gather的input与index秩必须相同：{}对{}",
            input.rank(),
            index.rank()
        ));
    }
    if dim >= input.rank() {
        return Err(format!("gather的dim={}超出了秩{}", dim, input.rank()));
    }
    for (d, (&i, &x)) in index.dims().iter().zip(input.dims()).enumerate() {
        if d != dim && i > x {
            return Err(format!(
                "gather的index在第{d}维上的大小{i}超过了input的大小{x}"
            ));
        }
    }
    Ok(Shape::array(element_type, index.dims()))
}
