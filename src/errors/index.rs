use std::fmt::{self, Display};

/// 越界访问的对象
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Output,
    Operand,
}
impl Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexKind::Output => "输出",
            IndexKind::Operand => "操作数",
        };
        write!(f, "{}", name)
    }
}
