/*
 * @Description  : 图的构建配置
 */

use super::hashing::{self, DEFAULT_HASH_SEED, HashValue};
use super::op_kind::OpKind;
use crate::errors::IrError;
use serde::{Deserialize, Serialize};

/// 节点哈希种子的取法
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedPolicy {
    /// 由算子标签确定性地派生种子，不同类型的节点种子必然不同
    #[default]
    PerKind,
    /// 所有节点类型共用`DEFAULT_HASH_SEED`
    Shared,
}

impl SeedPolicy {
    /// 基础种子与节点类型自带的元数据种子合并后得到最终种子
    pub fn resolve(self, op: &OpKind, kind_seed: Option<HashValue>) -> HashValue {
        let base = match self {
            Self::PerKind => hashing::hash_combine(DEFAULT_HASH_SEED, op.fingerprint()),
            Self::Shared => DEFAULT_HASH_SEED,
        };
        match kind_seed {
            Some(seed) => hashing::hash_combine(base, seed),
            None => base,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphOptions {
    /// 图名（出现在描述与可视化中）
    pub name: String,
    pub seed_policy: SeedPolicy,
    /// 形状缓存容量，0 表示不缓存（每个节点都调用其形状函数）
    pub shape_cache_capacity: usize,
    /// 是否把当前作用域路径记入节点调试名
    pub record_scopes: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            name: "default_graph".to_string(),
            seed_policy: SeedPolicy::default(),
            shape_cache_capacity: 4096,
            record_scopes: true,
        }
    }
}

impl GraphOptions {
    pub fn with_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// 从 JSON 解析，缺省字段取默认值
    pub fn from_json(json: &str) -> Result<Self, IrError> {
        serde_json::from_str(json).map_err(|e| IrError::Config(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, IrError> {
        serde_json::to_string_pretty(self).map_err(|e| IrError::Config(e.to_string()))
    }
}
