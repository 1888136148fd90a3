/// 错误断言宏 - 灵活粒度验证 Result 错误
///
/// # 用法
/// - `assert_err!(expr)` — 只验证是 Err
/// - `assert_err!(expr, Variant(literal))` — 验证错误类型 + 精确消息（String 变体）
/// - `assert_err!(expr, Index(what, index, len))` — 验证越界错误（简洁语法）
/// - `assert_err!(expr, NodeNotFound(id))` — 验证节点不存在
/// - `assert_err!(expr, Pattern { .. })` — 验证错误类型
/// - `assert_err!(expr, Pattern { field, .. } if condition)` — 验证类型 + 条件
///
/// # 示例
/// ```ignore
/// // 只验证是错误
/// assert_err!(result);
///
/// // Index 简洁语法（按顺序：what, index, len）
/// assert_err!(result, IrError::Index(IndexKind::Output, 1, 1));
///
/// // 验证错误类型（忽略所有字段）
/// assert_err!(result, IrError::Construction { .. });
///
/// // 验证消息包含关键词
/// assert_err!(result, IrError::Construction { message, .. } if message.contains("广播"));
/// ```
#[macro_export]
macro_rules! assert_err {
    // 只验证是 Err
    ($expr:expr) => {
        assert!($expr.is_err(), "预期 Err，实际得到 {:?}", $expr);
    };
    // 简洁语法：Variant(字符串字面量) - 精确匹配 String 内容
    ($expr:expr, $err_type:ident :: $variant:ident ( $expected:literal )) => {
        match &$expr {
            Err($err_type::$variant(actual)) => assert_eq!(
                actual, $expected,
                "错误消息不匹配：预期 `{}`，实际得到 `{}`",
                $expected, actual
            ),
            Err(e) => panic!(
                "错误类型不匹配：预期 `{}::{}`，实际得到 `{:?}`",
                stringify!($err_type), stringify!($variant), e
            ),
            Ok(v) => panic!(
                "预期 Err({}::{})，实际得到 Ok({:?})",
                stringify!($err_type), stringify!($variant), v
            ),
        }
    };
    // 简洁语法：Index(what, index, len)
    ($expr:expr, $err_type:ident :: Index ( $what:expr, $index:expr, $len:expr )) => {
        match &$expr {
            Err($err_type::Index { what, index, len }) => {
                assert_eq!(*what, $what, "what 不匹配");
                assert_eq!(*index, $index, "index 不匹配");
                assert_eq!(*len, $len, "len 不匹配");
            }
            Err(e) => panic!(
                "错误类型不匹配：预期 `{}::Index`，实际得到 `{:?}`",
                stringify!($err_type), e
            ),
            Ok(v) => panic!(
                "预期 Err({}::Index)，实际得到 Ok({:?})",
                stringify!($err_type), v
            ),
        }
    };
    // 简洁语法：NodeNotFound(id)
    ($expr:expr, $err_type:ident :: NodeNotFound ( $id:expr )) => {
        match &$expr {
            Err($err_type::NodeNotFound(id)) => {
                assert_eq!(*id, $id, "id 不匹配");
            }
            Err(e) => panic!(
                "错误类型不匹配：预期 `{}::NodeNotFound`，实际得到 `{:?}`",
                stringify!($err_type), e
            ),
            Ok(v) => panic!(
                "预期 Err({}::NodeNotFound)，实际得到 Ok({:?})",
                stringify!($err_type), v
            ),
        }
    };
    // 通用模式匹配（带 if guard 或复杂 pattern）
    ($expr:expr, $($pattern:tt)+) => {
        match &$expr {
            Err(e) => assert!(
                matches!(e, $($pattern)+),
                "错误类型不匹配：预期 `{}`，实际得到 `{:?}`",
                stringify!($($pattern)+),
                e
            ),
            Ok(v) => panic!(
                "预期 Err 匹配 `{}`，实际得到 Ok({:?})",
                stringify!($($pattern)+),
                v
            ),
        }
    };
}
