use thiserror::Error;
mod index;
pub use self::index::*;

use crate::ir::{NodeId, OpKind, Output, Shape};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IrError {
    // 节点构建
    #[error("构建{op}节点失败：{message}（操作数形状：{operand_shapes}，作用域：`{scope}`）")]
    Construction {
        op: OpKind,
        message: String,
        operand_shapes: String,
        scope: String,
    },
    #[error("空的Value（被省略的可选操作数）不能直接作为操作数")]
    NullValue,
    #[error("Value不属于当前图")]
    ForeignValue,
    #[error("Value所属的图已被释放")]
    GraphDropped,
    #[error("图正在被修改，无法读取节点（形状函数里不能查询其它Value）")]
    GraphBusy,
    #[error("节点{0}不存在（可能已被释放）")]
    NodeNotFound(NodeId),

    // 访问越界
    #[error("{what}索引越界：{index}，而长度为{len}")]
    Index {
        what: IndexKind,
        index: usize,
        len: usize,
    },

    // 向下转型
    #[error("节点类型不匹配：期望`{expected}`，实际为`{found}`")]
    KindMismatch { expected: String, found: String },

    // 图改写
    #[error("改写会在图中引入环：{0}")]
    Cycle(String),

    // 降级
    #[error("{op}节点（{name}）未实现降级（lower）")]
    Unimplemented { op: OpKind, name: String },
    #[error("{op}节点降级得到{got}个输出，但声明的输出数为{expected}")]
    OutputCountMismatch {
        op: OpKind,
        expected: usize,
        got: usize,
    },
    #[error("输出{0}尚未被降级，无法作为操作数使用")]
    NotLowered(Output),
    #[error("后端降级失败：{0}")]
    Lowering(String),

    #[error("图不变量被破坏：{0}")]
    InvariantViolation(String),
    #[error("配置解析失败：{0}")]
    Config(String),
}

impl IrError {
    /// 构造一个携带算子类型、操作数形状和作用域路径的构建错误
    pub fn construction(
        op: &OpKind,
        message: impl Into<String>,
        operand_shapes: &[Shape],
        scope: &str,
    ) -> Self {
        let shapes = operand_shapes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Self::Construction {
            op: op.clone(),
            message: message.into(),
            operand_shapes: format!("[{shapes}]"),
            scope: scope.to_string(),
        }
    }

    pub(crate) const fn output_index(index: usize, len: usize) -> Self {
        Self::Index {
            what: IndexKind::Output,
            index,
            len,
        }
    }

    pub(crate) const fn operand_index(index: usize, len: usize) -> Self {
        Self::Index {
            what: IndexKind::Operand,
            index,
            len,
        }
    }
}
