/*
 * @Description  : Constant 节点：字面量常量
 */

use super::TraitNode;
use crate::errors::IrError;
use crate::ir::hashing::{self, Fingerprint, HashValue, StableHash};
use crate::ir::lowering::{LoweredOps, LoweringContext};
use crate::ir::nodes::{GraphNode, NodeSpec, ShapeSource};
use crate::ir::op_kind::kinds;
use crate::ir::shape::Shape;

// 描述中最多列出的元素个数
const DESCRIBE_LIMIT: usize = 8;

/// 按行优先顺序存放的字面量数据
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    shape: Shape,
    values: Vec<f64>,
}

impl Literal {
    pub fn new(shape: Shape, values: Vec<f64>) -> Self {
        Self { shape, values }
    }

    pub fn scalar(shape: Shape, value: f64) -> Self {
        Self::new(shape, vec![value])
    }

    pub const fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

// 哈希按位计算，形状也计入：值相同但形状不同的常量不能共用形状缓存
impl StableHash for Literal {
    fn stable_hash(&self, fp: &mut Fingerprint) {
        self.shape.stable_hash(fp);
        self.values.stable_hash(fp);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    literal: Literal,
}

impl Constant {
    pub const fn new(literal: Literal) -> Self {
        Self { literal }
    }

    /// 构建请求：元素个数与形状不符时在构建阶段报错
    pub fn spec(literal: Literal) -> NodeSpec<'static> {
        let shape = literal.shape.clone();
        let count = literal.values.len();
        let source = ShapeSource::infer(move |_| {
            if shape.is_tuple() {
                return Err(format!("常量的形状不能是元组：{shape}"));
            }
            let expected = shape
                .element_count()
                .ok_or_else(|| format!("形状{shape}的元素个数超出了usize的范围"))?;
            if count != expected {
                return Err(format!("字面量有{count}个元素，而形状{shape}需要{expected}个"));
            }
            Ok(shape)
        });
        NodeSpec::new(kinds::CONSTANT, Vec::new(), source, Self::new(literal))
    }

    pub const fn literal(&self) -> &Literal {
        &self.literal
    }

    /// 标签为`prim::Constant`时取出
    pub fn cast(node: &GraphNode) -> Option<&Self> {
        node.cast::<Self>(&kinds::CONSTANT)
    }
}

impl TraitNode for Constant {
    fn kind_name(&self) -> &'static str {
        "Constant"
    }

    fn hash_seed(&self) -> Option<HashValue> {
        Some(hashing::hash_of(&self.literal))
    }

    fn lower(&self, node: &GraphNode, ctx: &mut LoweringContext<'_>) -> Result<LoweredOps, IrError> {
        let handle = ctx
            .emitter()
            .constant(node.node_shape(), &self.literal.values)?;
        Ok(LoweredOps::from_elem(handle, 1))
    }

    fn describe_fields(&self) -> Vec<(&'static str, String)> {
        let values = &self.literal.values;
        let mut shown = values
            .iter()
            .take(DESCRIBE_LIMIT)
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        if values.len() > DESCRIBE_LIMIT {
            shown.push("...".to_string());
        }
        vec![("value", format!("[{}]", shown.join(", ")))]
    }
}
