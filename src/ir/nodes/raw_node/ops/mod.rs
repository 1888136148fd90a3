/*
 * @Description  : 带操作数的参考算子节点
 */

mod gather;
mod generic;
mod split;

pub use gather::Gather;
pub use generic::{Generic, broadcast_shapes};
pub use split::Split;
