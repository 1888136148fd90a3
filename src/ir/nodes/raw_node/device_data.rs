/*
 * @Description  : DeviceData 节点：已驻留在设备上的数据，是图的叶子
 */

use super::TraitNode;
use crate::errors::IrError;
use crate::ir::hashing::{self, Fingerprint, HashValue, StableHash};
use crate::ir::lowering::{LoweredOps, LoweringContext};
use crate::ir::nodes::{GraphNode, NodeSpec};
use crate::ir::op_kind::kinds;
use crate::ir::shape::Shape;
use serde::{Deserialize, Serialize};

/// 设备数据的句柄：数据本身由运行时管理，这里只记录标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataHandle {
    pub id: u64,
    pub device: String,
}

impl DataHandle {
    pub fn new(id: u64, device: &str) -> Self {
        Self {
            id,
            device: device.to_string(),
        }
    }
}

impl StableHash for DataHandle {
    fn stable_hash(&self, fp: &mut Fingerprint) {
        fp.write_u64(self.id);
        fp.write_str(&self.device);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceData {
    data: DataHandle,
}

impl DeviceData {
    pub const fn new(data: DataHandle) -> Self {
        Self { data }
    }

    /// 构建请求：无操作数，形状直接给定
    pub fn spec(data: DataHandle, shape: Shape) -> NodeSpec<'static> {
        NodeSpec::new(kinds::DEVICE_DATA, Vec::new(), shape, Self::new(data))
    }

    pub const fn data(&self) -> &DataHandle {
        &self.data
    }

    /// 标签为`xla::device_data`时取出
    pub fn cast(node: &GraphNode) -> Option<&Self> {
        node.cast::<Self>(&kinds::DEVICE_DATA)
    }
}

impl TraitNode for DeviceData {
    fn kind_name(&self) -> &'static str {
        "DeviceData"
    }

    // 不同的数据必须得到不同的哈希，即使形状相同
    fn hash_seed(&self) -> Option<HashValue> {
        Some(hashing::hash_of(&self.data))
    }

    fn lower(&self, node: &GraphNode, ctx: &mut LoweringContext<'_>) -> Result<LoweredOps, IrError> {
        let handle = ctx.emitter().parameter(&self.data, node.node_shape())?;
        Ok(LoweredOps::from_elem(handle, 1))
    }

    fn describe_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("data_id", self.data.id.to_string()),
            ("device", self.data.device.clone()),
        ]
    }
}
