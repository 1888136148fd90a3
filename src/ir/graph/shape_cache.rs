/*
 * @Description  : 形状缓存
 *
 * 键是不含形状的构建配方哈希（算子标签 + 种子 + 各操作数哈希），
 * 命中时不再调用形状函数。容量满时按插入顺序淘汰（FIFO）；容量为 0 时不缓存。
 */

use crate::ir::hashing::HashValue;
use crate::ir::shape::Shape;
use std::collections::{HashMap, VecDeque};

/// 形状缓存的统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShapeCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
}

#[derive(Debug)]
pub(crate) struct ShapeCache {
    capacity: usize,
    entries: HashMap<HashValue, Shape>,
    order: VecDeque<HashValue>,
    hits: u64,
    misses: u64,
}

impl ShapeCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub(crate) fn get(&mut self, key: HashValue) -> Option<Shape> {
        match self.entries.get(&key) {
            Some(shape) => {
                self.hits += 1;
                Some(shape.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub(crate) fn insert(&mut self, key: HashValue, shape: Shape) {
        if self.capacity == 0 || self.entries.contains_key(&key) {
            return;
        }
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
        self.entries.insert(key, shape);
        self.order.push_back(key);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub(crate) fn stats(&self) -> ShapeCacheStats {
        ShapeCacheStats {
            hits: self.hits,
            misses: self.misses,
            len: self.entries.len(),
        }
    }
}
