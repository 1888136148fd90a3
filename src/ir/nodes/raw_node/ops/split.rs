/*
 * @Description  : Split 节点：沿`dim`维切成若干段，每段一个输出（多输出节点）
 */

use crate::errors::IrError;
use crate::ir::hashing::{self, HashValue};
use crate::ir::lowering::{Attribute, EmitRequest, LoweredOps, LoweringContext};
use crate::ir::nodes::raw_node::TraitNode;
use crate::ir::nodes::{GraphNode, NodeSpec, NodeTemplate, ShapeSource, Value};
use crate::ir::op_kind::kinds;
use crate::ir::shape::Shape;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    split_sizes: Vec<usize>,
    dim: usize,
}

impl Split {
    pub fn new(split_sizes: &[usize], dim: usize) -> Self {
        Self {
            split_sizes: split_sizes.to_vec(),
            dim,
        }
    }

    /// 输出数等于段数；形状为各段形状组成的元组
    pub fn spec(input: &Value, split_sizes: &[usize], dim: usize) -> NodeSpec<'static> {
        let kind = Self::new(split_sizes, dim);
        let num_outputs = split_sizes.len();
        NodeSpec::new(kinds::SPLIT, vec![input.clone()], kind.shape_source(), kind)
            .with_num_outputs(num_outputs)
    }

    pub fn split_sizes(&self) -> &[usize] {
        &self.split_sizes
    }

    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// 标签为`aten::split`时取出
    pub fn cast(node: &GraphNode) -> Option<&Self> {
        node.cast::<Self>(&kinds::SPLIT)
    }

    fn shape_source(&self) -> ShapeSource<'static> {
        let sizes = self.split_sizes.clone();
        let dim = self.dim;
        ShapeSource::infer(move |shapes| split_shape(shapes, &sizes, dim))
    }
}

impl TraitNode for Split {
    fn kind_name(&self) -> &'static str {
        "Split"
    }

    fn hash_seed(&self) -> Option<HashValue> {
        Some(hashing::hash_of(&(self.split_sizes.clone(), self.dim)))
    }

    fn clone_shape(&self, _template: &NodeTemplate) -> ShapeSource<'static> {
        self.shape_source()
    }

    fn lower(&self, node: &GraphNode, ctx: &mut LoweringContext<'_>) -> Result<LoweredOps, IrError> {
        let operands = ctx.operand_ops(node)?;
        let sizes = self.split_sizes.iter().map(|&s| s as i64).collect();
        ctx.emitter().emit(EmitRequest {
            op: node.op(),
            name: node.name(),
            operands: &operands,
            shape: node.node_shape(),
            num_outputs: node.num_outputs(),
            attributes: vec![
                ("split_sizes", Attribute::Ints(sizes)),
                ("dim", Attribute::Int(self.dim as i64)),
            ],
        })
    }

    fn describe_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("split_sizes", format!("{:?}", self.split_sizes)),
            ("dim", self.dim.to_string()),
        ]
    }
}

fn split_shape(shapes: &[Shape], sizes: &[usize], dim: usize) -> Result<Shape, String> {
    let [input] = shapes else {
        return Err(format!("split需要1个操作数，实际为{}个", shapes.len()));
    };
    let element_type = input
        .element_type()
        .ok_or_else(|| format!("split的输入不能是元组：{input}"))?;
    let Some(&extent) = input.dims().get(dim) else {
        return Err(format!("split的dim={}超出了秩{}", dim, input.rank()));
    };
    let total = sizes
        .iter()
        .try_fold(0usize, |acc, &size| acc.checked_add(size))
        .ok_or_else(|| format!("各段大小之和超出了usize的范围：{sizes:?}"))?;
    if total != extent {
        return Err(format!(
            "各段大小之和{total}与第{dim}维的大小{extent}不一致：{sizes:?}"
        ));
    }
    let parts = sizes
        .iter()
        .map(|&size| {
            let mut dims = input.dims().to_vec();
            dims[dim] = size;
            Shape::Array { element_type, dims }
        })
        .collect();
    Ok(Shape::tuple(parts))
}
