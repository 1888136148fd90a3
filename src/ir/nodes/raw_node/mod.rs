/*
 * @Description  : 节点类型（NodeType）与其公共接口（TraitNode）
 *
 * 结构信息（操作数、形状、哈希、use）统一放在`GraphNode`里，
 * 这里只放各类型特有的元数据，以及降级、克隆、描述三项与类型相关的行为。
 */

mod constant;
mod device_data;
mod opaque;
mod ops;

pub use constant::{Constant, Literal};
pub use device_data::{DataHandle, DeviceData};
pub use opaque::Opaque;
pub use ops::{Gather, Generic, Split, broadcast_shapes};

use super::{GraphNode, NodeTemplate, ShapeSource};
use crate::errors::IrError;
use crate::ir::hashing::HashValue;
use crate::ir::lowering::{LoweredOps, LoweringContext};
use enum_dispatch::enum_dispatch;

#[enum_dispatch]
#[derive(Debug, Clone, PartialEq)]
pub enum NodeType {
    DeviceData(DeviceData),
    Constant(Constant),
    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓算子↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    Generic(Generic),
    Gather(Gather),
    Split(Split),
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑算子↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/
    Opaque(Opaque),
}

#[enum_dispatch(NodeType)]
pub trait TraitNode {
    /// 类型名，用于描述与类型不匹配时的报错
    fn kind_name(&self) -> &'static str;

    /// 类型自带的元数据种子（如 gather 的`dim`），参与结构哈希
    fn hash_seed(&self) -> Option<HashValue> {
        None
    }

    /// 克隆到新操作数时使用的形状来源；会推断形状的类型应返回`ShapeSource::Infer`
    fn clone_shape(&self, template: &NodeTemplate) -> ShapeSource<'static> {
        ShapeSource::Known(template.shape.clone())
    }

    /// 把节点交给后端，返回每个输出对应的句柄（个数须等于节点的输出数）
    ///
    /// 默认未实现：外部定义、只用于分析的节点类型无需降级。
    fn lower(&self, node: &GraphNode, _ctx: &mut LoweringContext<'_>) -> Result<LoweredOps, IrError> {
        Err(IrError::Unimplemented {
            op: node.op().clone(),
            name: node.name().to_string(),
        })
    }

    /// `describe()`中追加的类型特有字段
    fn describe_fields(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// 为节点类型实现`KindView`，使其可经`node_cast`安全地从`GraphNode`取出
macro_rules! impl_kind_view {
    ($($variant:ident),+ $(,)?) => {
        $(
            impl crate::ir::cast::KindView for $variant {
                const KIND_NAME: &'static str = stringify!($variant);

                fn from_kind(kind: &NodeType) -> Option<&Self> {
                    match kind {
                        NodeType::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )+
    };
}

impl_kind_view!(DeviceData, Constant, Generic, Gather, Split, Opaque);
