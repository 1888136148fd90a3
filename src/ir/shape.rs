/*
 * @Description  : 节点输出的形状与元素类型
 *
 * 多输出节点的整体形状是元组（tuple），其每个分量对应一个输出。
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// 元素类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Pred,
    S8,
    S16,
    S32,
    S64,
    U8,
    U32,
    U64,
    F16,
    BF16,
    F32,
    F64,
}

impl ElementType {
    /// 用于结构哈希的稳定标签，新增类型只能追加，不能改动已有取值
    pub const fn tag(self) -> u8 {
        match self {
            Self::Pred => 1,
            Self::S8 => 2,
            Self::S16 => 3,
            Self::S32 => 4,
            Self::S64 => 5,
            Self::U8 => 6,
            Self::U32 => 7,
            Self::U64 => 8,
            Self::F16 => 9,
            Self::BF16 => 10,
            Self::F32 => 11,
            Self::F64 => 12,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Pred => "pred",
            Self::S8 => "s8",
            Self::S16 => "s16",
            Self::S32 => "s32",
            Self::S64 => "s64",
            Self::U8 => "u8",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F16 => "f16",
            Self::BF16 => "bf16",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    pub const fn is_floating(self) -> bool {
        matches!(self, Self::F16 | Self::BF16 | Self::F32 | Self::F64)
    }

    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            Self::S8 | Self::S16 | Self::S32 | Self::S64 | Self::U8 | Self::U32 | Self::U64
        )
    }

    /// 二元运算的类型提升：浮点优先，其次按位宽取较大者
    pub fn promote(self, other: Self) -> Self {
        match (self.is_floating(), other.is_floating()) {
            (true, false) => self,
            (false, true) => other,
            _ => {
                if self.bit_width() >= other.bit_width() {
                    self
                } else {
                    other
                }
            }
        }
    }

    pub const fn bit_width(self) -> usize {
        match self {
            Self::Pred => 1,
            Self::S8 | Self::U8 => 8,
            Self::S16 | Self::F16 | Self::BF16 => 16,
            Self::S32 | Self::U32 | Self::F32 => 32,
            Self::S64 | Self::U64 | Self::F64 => 64,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 形状：数组（元素类型 + 各维大小）或元组
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Array {
        element_type: ElementType,
        dims: Vec<usize>,
    },
    Tuple(Vec<Shape>),
}

impl Shape {
    pub fn array(element_type: ElementType, dims: &[usize]) -> Self {
        Self::Array {
            element_type,
            dims: dims.to_vec(),
        }
    }

    pub fn scalar(element_type: ElementType) -> Self {
        Self::array(element_type, &[])
    }

    pub const fn tuple(shapes: Vec<Self>) -> Self {
        Self::Tuple(shapes)
    }

    pub const fn is_tuple(&self) -> bool {
        matches!(self, Self::Tuple(_))
    }

    /// 数组形状的元素类型（元组返回`None`）
    pub const fn element_type(&self) -> Option<ElementType> {
        match self {
            Self::Array { element_type, .. } => Some(*element_type),
            Self::Tuple(_) => None,
        }
    }

    /// 数组形状的各维大小（元组返回空切片）
    pub fn dims(&self) -> &[usize] {
        match self {
            Self::Array { dims, .. } => dims,
            Self::Tuple(_) => &[],
        }
    }

    pub fn rank(&self) -> usize {
        self.dims().len()
    }

    /// 元素总数，溢出`usize`时为`None`
    pub fn element_count(&self) -> Option<usize> {
        match self {
            Self::Array { dims, .. } => dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d)),
            Self::Tuple(shapes) => shapes
                .iter()
                .try_fold(0usize, |acc, s| acc.checked_add(s.element_count()?)),
        }
    }

    /// 元组的各分量（数组返回空切片）
    pub fn tuple_shapes(&self) -> &[Self] {
        match self {
            Self::Tuple(shapes) => shapes,
            Self::Array { .. } => &[],
        }
    }

    /// 替换元素类型，维度不变（元组逐分量替换）
    pub fn with_element_type(&self, element_type: ElementType) -> Self {
        match self {
            Self::Array { dims, .. } => Self::Array {
                element_type,
                dims: dims.clone(),
            },
            Self::Tuple(shapes) => Self::Tuple(
                shapes
                    .iter()
                    .map(|s| s.with_element_type(element_type))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array { element_type, dims } => {
                let dims = dims
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "{element_type}[{dims}]")
            }
            Self::Tuple(shapes) => {
                let parts = shapes
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "({parts})")
            }
        }
    }
}
