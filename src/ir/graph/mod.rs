/*
 * @Description  : Graph 模块：节点的所有者与唯一的修改入口
 *
 * 公开 API：
 * - `Graph`: 用户级句柄
 * - `GraphInner`: 底层实现（需要一次借用内完成多步只读查询时使用）
 * - `ShapeCacheStats`: 形状缓存统计
 */

mod handle;
mod inner;
mod shape_cache;

pub use handle::Graph;
pub use inner::GraphInner;
pub use shape_cache::ShapeCacheStats;
