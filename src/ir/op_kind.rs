/*
 * @Description  : 算子类型（OpKind）：标识节点语义的不可变标签
 */

use super::hashing::{Fingerprint, HashValue};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// 算子类型标签，如`aten::add`、`xla::device_data`
///
/// 只按标签字符串比较相等；创建后不可变。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpKind(Cow<'static, str>);

impl OpKind {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 标签自身的稳定指纹（与进程、内存地址无关）
    pub fn fingerprint(&self) -> HashValue {
        let mut fp = Fingerprint::new();
        fp.write_str(self.as_str());
        fp.finish()
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&'static str> for OpKind {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

/// 内置参考节点用到的算子标签
pub mod kinds {
    use super::OpKind;

    pub const DEVICE_DATA: OpKind = OpKind::from_static("xla::device_data");
    pub const CONSTANT: OpKind = OpKind::from_static("prim::Constant");
    pub const ADD: OpKind = OpKind::from_static("aten::add");
    pub const SUB: OpKind = OpKind::from_static("aten::sub");
    pub const MUL: OpKind = OpKind::from_static("aten::mul");
    pub const DIV: OpKind = OpKind::from_static("aten::div");
    pub const GATHER: OpKind = OpKind::from_static("aten::gather");
    pub const SPLIT: OpKind = OpKind::from_static("aten::split");
}
