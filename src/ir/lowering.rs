/*
 * @Description  : 降级接口：后端发射器（Emitter）与降级上下文（LoweringContext）
 *
 * 本 crate 不实现任何后端。后端实现`Emitter`，`Graph::lower`按后序遍历一次，
 * 让每个节点通过上下文取得操作数对应的后端句柄并发射自身。
 */

use super::nodes::raw_node::DataHandle;
use super::nodes::{GraphNode, NodeId, Output, Value};
use super::op_kind::OpKind;
use super::shape::Shape;
use crate::errors::IrError;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

/// 后端返回的不透明句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoweredHandle(pub u64);

impl fmt::Display for LoweredHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 一个节点降级后各输出的句柄，绝大多数节点只有一个输出
pub type LoweredOps = SmallVec<[LoweredHandle; 1]>;

/// 发射时附带的节点属性
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    Int(i64),
    Ints(Vec<i64>),
}

/// 一次通用发射请求
#[derive(Debug)]
pub struct EmitRequest<'a> {
    pub op: &'a OpKind,
    /// 节点的调试名，供后端做元数据
    pub name: &'a str,
    pub operands: &'a [LoweredHandle],
    /// 节点的整体形状（多输出时为元组）
    pub shape: &'a Shape,
    pub num_outputs: usize,
    pub attributes: Vec<(&'static str, Attribute)>,
}

/// 后端发射器
pub trait Emitter {
    /// 设备上已有的数据，成为程序的参数
    fn parameter(&mut self, data: &DataHandle, shape: &Shape) -> Result<LoweredHandle, IrError>;

    /// 字面量常量
    fn constant(&mut self, shape: &Shape, values: &[f64]) -> Result<LoweredHandle, IrError>;

    /// 其它所有算子
    fn emit(&mut self, request: EmitRequest<'_>) -> Result<LoweredOps, IrError>;
}

/// 一次降级过程的上下文：持有发射器，并记住每个（节点, 输出）已降级得到的句柄
pub struct LoweringContext<'e> {
    emitter: &'e mut dyn Emitter,
    outputs: HashMap<Output, LoweredHandle>,
}

impl<'e> LoweringContext<'e> {
    pub fn new(emitter: &'e mut dyn Emitter) -> Self {
        Self {
            emitter,
            outputs: HashMap::new(),
        }
    }

    pub fn emitter(&mut self) -> &mut dyn Emitter {
        &mut *self.emitter
    }

    pub fn lookup(&self, output: Output) -> Option<LoweredHandle> {
        self.outputs.get(&output).copied()
    }

    /// 节点是否已降级过（同一上下文内每个节点只降级一次）
    pub fn is_lowered(&self, node: NodeId) -> bool {
        self.outputs.contains_key(&Output::new(node, 0))
    }

    /// 操作数对应的后端句柄；尚未降级时返回`IrError::NotLowered`
    pub fn get_output_op(&self, value: &Value) -> Result<LoweredHandle, IrError> {
        let output = value.output().ok_or(IrError::NullValue)?;
        self.lookup(output).ok_or(IrError::NotLowered(output))
    }

    /// 按顺序取出节点全部操作数的句柄
    pub fn operand_ops(&self, node: &GraphNode) -> Result<Vec<LoweredHandle>, IrError> {
        node.operands()
            .iter()
            .map(|operand| self.get_output_op(operand))
            .collect()
    }

    pub fn assign_output_op(&mut self, output: Output, handle: LoweredHandle) {
        if let Some(previous) = self.outputs.insert(output, handle) {
            log::warn!("输出{output}被重复降级：{previous} -> {handle}");
        }
    }

    /// 登记单输出节点的降级结果
    pub fn return_op(&mut self, node: &GraphNode, handle: LoweredHandle) -> Result<LoweredOps, IrError> {
        self.return_ops(node, LoweredOps::from_elem(handle, 1))
    }

    /// 登记节点各输出的降级结果，个数必须与声明的输出数一致
    pub fn return_ops(&mut self, node: &GraphNode, ops: LoweredOps) -> Result<LoweredOps, IrError> {
        if ops.len() != node.num_outputs() {
            return Err(IrError::OutputCountMismatch {
                op: node.op().clone(),
                expected: node.num_outputs(),
                got: ops.len(),
            });
        }
        for (index, handle) in ops.iter().enumerate() {
            self.assign_output_op(Output::new(node.id(), index), *handle);
        }
        Ok(ops)
    }

    /// 已登记的输出个数
    pub fn lowered_count(&self) -> usize {
        self.outputs.len()
    }
}
