//! # Lazy IR
//!
//! `lazy_ir`是延迟张量计算在交给加速器后端降级（lowering）之前的中间表示核心：
//! 前端把算子追踪（trace）成图节点，本crate负责给每个节点一个确定性的结构哈希（用于去重），
//! 记录每个节点输出被谁使用（use）以便逐节点改写图，缓存每个输出的形状，并提供确定性的调试命名。
//!
//! 入口是[`ir::Graph`]，见其文档中的示例。
//!

pub mod errors;
pub mod ir;
pub mod utils;
