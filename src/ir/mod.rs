/*
 * @Description  : 延迟计算图的中间表示（IR）：节点、值、use、结构哈希、作用域与降级接口
 */

mod cast;
mod descriptor;
mod display;
mod graph;
pub mod hashing;
pub mod lowering;
mod nodes;
mod op_kind;
mod options;
mod scope;
mod shape;

pub use cast::{KindView, node_cast, try_node_cast};
pub use descriptor::{GraphDescriptor, NodeDescriptor};
pub use graph::{Graph, GraphInner, ShapeCacheStats};
pub use hashing::HashValue;
pub use lowering::{Attribute, EmitRequest, Emitter, LoweredHandle, LoweredOps, LoweringContext};
pub use nodes::raw_node::{
    Constant, DataHandle, DeviceData, Gather, Generic, Literal, NodeType, Opaque, Split,
    TraitNode, broadcast_shapes,
};
pub use nodes::{GraphNode, NodeId, NodeSpec, NodeTemplate, Output, ShapeSource, Use, Value};
pub use op_kind::{OpKind, kinds};
pub use options::{GraphOptions, SeedPolicy};
pub use scope::{ScopeGuard, ScopeStack};
pub use shape::{ElementType, Shape};

#[cfg(test)]
mod tests;
