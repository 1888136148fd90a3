/*
 * @Description  : IR 单元测试
 */

mod graph_basic;
mod node_cast;
mod node_uses;
mod shape_cache;

use super::{
    DataHandle, ElementType, EmitRequest, Emitter, Graph, LoweredHandle, LoweredOps, Shape, Value,
};
use crate::errors::IrError;

fn f32s(dims: &[usize]) -> Shape {
    Shape::array(ElementType::F32, dims)
}

fn s64s(dims: &[usize]) -> Shape {
    Shape::array(ElementType::S64, dims)
}

/// 设备数据叶子，`id`同时作为数据句柄的 id
fn leaf(graph: &Graph, id: u64, shape: Shape) -> Value {
    graph
        .device_data(DataHandle::new(id, "cpu:0"), shape)
        .unwrap()
}

/// 记录每次发射的后端，句柄从 #0 开始依次分配
#[derive(Default)]
struct RecordingEmitter {
    next: u64,
    log: Vec<String>,
    /// 为 true 时每次`emit`只返回一个句柄，用于测试输出数校验
    single_output: bool,
    /// 遇到该算子时像后端不支持一样报错
    reject: Option<&'static str>,
}

impl RecordingEmitter {
    fn fresh(&mut self) -> LoweredHandle {
        let handle = LoweredHandle(self.next);
        self.next += 1;
        handle
    }
}

impl Emitter for RecordingEmitter {
    fn parameter(&mut self, data: &DataHandle, shape: &Shape) -> Result<LoweredHandle, IrError> {
        self.log.push(format!("parameter {} {}", data.id, shape));
        Ok(self.fresh())
    }

    fn constant(&mut self, shape: &Shape, values: &[f64]) -> Result<LoweredHandle, IrError> {
        self.log.push(format!("constant {shape} {values:?}"));
        Ok(self.fresh())
    }

    fn emit(&mut self, request: EmitRequest<'_>) -> Result<LoweredOps, IrError> {
        if self.reject.is_some_and(|op| op == request.op.as_str()) {
            return Err(IrError::Lowering(format!("后端不支持{}", request.op)));
        }
        let operands = request
            .operands
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let attributes = request
            .attributes
            .iter()
            .map(|(key, value)| format!(" {key}={value:?}"))
            .collect::<String>();
        self.log
            .push(format!("{}({}){}", request.op, operands, attributes));
        let count = if self.single_output {
            1
        } else {
            request.num_outputs
        };
        Ok((0..count).map(|_| self.fresh()).collect())
    }
}
