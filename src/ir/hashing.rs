/*
 * @Description  : 结构哈希（structural hash）
 *
 * 节点哈希 = combine(算子标签, 种子, 形状描述, 各操作数哈希（按操作数顺序）)。
 * 只依赖于数据本身：不读内存地址，不依赖 HashMap 的迭代顺序或 RandomState，
 * 因此逻辑相同的图在不同进程中哈希一致，可作为上游去重/缓存的键。
 */

use super::op_kind::OpKind;
use super::shape::{ElementType, Shape};
use serde::{Deserialize, Serialize};
use std::fmt;

const FNV1A_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV1A_PRIME: u64 = 0x0100_0000_01b3;

/// 所有节点类型共用的默认种子（`SeedPolicy::Shared`时使用）
pub const DEFAULT_HASH_SEED: HashValue = HashValue(0x5a2d_296e9);

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct HashValue(pub u64);

impl fmt::Display for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// 增量式 FNV-1a 指纹
#[derive(Debug, Clone)]
pub struct Fingerprint {
    state: u64,
}

impl Fingerprint {
    pub const fn new() -> Self {
        Self {
            state: FNV1A_OFFSET,
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.state ^= u64::from(*byte);
            self.state = self.state.wrapping_mul(FNV1A_PRIME);
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_usize(&mut self, value: usize) {
        self.write_u64(value as u64);
    }

    /// 带长度前缀，避免`"ab"+"c"`与`"a"+"bc"`相撞
    pub fn write_str(&mut self, value: &str) {
        self.write_usize(value.len());
        self.write_bytes(value.as_bytes());
    }

    pub const fn finish(&self) -> HashValue {
        HashValue(self.state)
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::new()
    }
}

/// 可参与结构哈希的类型
pub trait StableHash {
    fn stable_hash(&self, fp: &mut Fingerprint);
}

impl StableHash for u64 {
    fn stable_hash(&self, fp: &mut Fingerprint) {
        fp.write_u64(*self);
    }
}

impl StableHash for i64 {
    fn stable_hash(&self, fp: &mut Fingerprint) {
        fp.write_bytes(&self.to_le_bytes());
    }
}

impl StableHash for usize {
    fn stable_hash(&self, fp: &mut Fingerprint) {
        fp.write_usize(*self);
    }
}

impl StableHash for bool {
    fn stable_hash(&self, fp: &mut Fingerprint) {
        fp.write_u8(u8::from(*self));
    }
}

// 按位哈希：-0.0 与 0.0 不同，NaN 按其位模式区分
impl StableHash for f64 {
    fn stable_hash(&self, fp: &mut Fingerprint) {
        fp.write_u64(self.to_bits());
    }
}

impl StableHash for str {
    fn stable_hash(&self, fp: &mut Fingerprint) {
        fp.write_str(self);
    }
}

impl StableHash for String {
    fn stable_hash(&self, fp: &mut Fingerprint) {
        fp.write_str(self);
    }
}

impl<T: StableHash> StableHash for [T] {
    fn stable_hash(&self, fp: &mut Fingerprint) {
        fp.write_usize(self.len());
        for item in self {
            item.stable_hash(fp);
        }
    }
}

impl<T: StableHash> StableHash for Vec<T> {
    fn stable_hash(&self, fp: &mut Fingerprint) {
        self.as_slice().stable_hash(fp);
    }
}

impl<T: StableHash> StableHash for Option<T> {
    fn stable_hash(&self, fp: &mut Fingerprint) {
        match self {
            None => fp.write_u8(0),
            Some(value) => {
                fp.write_u8(1);
                value.stable_hash(fp);
            }
        }
    }
}

impl<A: StableHash, B: StableHash> StableHash for (A, B) {
    fn stable_hash(&self, fp: &mut Fingerprint) {
        self.0.stable_hash(fp);
        self.1.stable_hash(fp);
    }
}

impl StableHash for HashValue {
    fn stable_hash(&self, fp: &mut Fingerprint) {
        fp.write_u64(self.0);
    }
}

impl StableHash for OpKind {
    fn stable_hash(&self, fp: &mut Fingerprint) {
        fp.write_str(self.as_str());
    }
}

impl StableHash for ElementType {
    fn stable_hash(&self, fp: &mut Fingerprint) {
        fp.write_u8(self.tag());
    }
}

impl StableHash for Shape {
    fn stable_hash(&self, fp: &mut Fingerprint) {
        match self {
            Shape::Array { element_type, dims } => {
                fp.write_u8(b'a');
                element_type.stable_hash(fp);
                dims.stable_hash(fp);
            }
            Shape::Tuple(shapes) => {
                fp.write_u8(b't');
                shapes.stable_hash(fp);
            }
        }
    }
}

pub fn hash_of<T: StableHash + ?Sized>(value: &T) -> HashValue {
    let mut fp = Fingerprint::new();
    value.stable_hash(&mut fp);
    fp.finish()
}

/// boost 风格的哈希合并，不满足交换律（顺序敏感）
pub const fn hash_combine(a: HashValue, b: HashValue) -> HashValue {
    let mixed = b
        .0
        .wrapping_add(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(a.0 << 6)
        .wrapping_add(a.0 >> 2);
    HashValue(a.0 ^ mixed)
}

/// 不含形状的节点哈希：算子标签 + 种子
pub fn op_hash(op: &OpKind, seed: HashValue) -> HashValue {
    hash_combine(op.fingerprint(), seed)
}

/// 按操作数顺序把各操作数哈希依次合并进`base`
pub fn combine_operands(
    base: HashValue,
    operand_hashes: impl IntoIterator<Item = HashValue>,
) -> HashValue {
    operand_hashes.into_iter().fold(base, hash_combine)
}

/// 某个节点某个输出的哈希，用作消费者计算 DAG 哈希的输入
pub const fn output_hash(node_hash: HashValue, index: usize) -> HashValue {
    hash_combine(node_hash, HashValue(index as u64))
}
