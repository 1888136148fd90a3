/*
 * @Description  : 调试用的命名作用域栈
 *
 * 作用域只影响节点的调试名（如`encoder/attn/aten::add_7`），从不参与哈希或语义。
 * 每个图（构建上下文）各自持有一个栈，不存在进程级的全局栈。
 */

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeStack {
    frames: Vec<String>,
    // 每次 reset 递增，使 reset 之前创建的守卫失效
    generation: u64,
}

impl ScopeStack {
    pub const fn new() -> Self {
        Self {
            frames: Vec::new(),
            generation: 0,
        }
    }

    /// 压入一层作用域，返回压入后的深度
    pub fn push(&mut self, name: &str) -> usize {
        self.frames.push(name.to_string());
        self.frames.len()
    }

    pub fn pop(&mut self) -> Option<String> {
        self.frames.pop()
    }

    /// 截断到指定深度（深度不足时什么也不做）
    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// 当前路径，如`a/b`；无作用域时为空串
    pub fn current_path(&self) -> String {
        self.frames.join("/")
    }

    /// 给基础名加上作用域前缀：`a/b/<base>`
    pub fn qualify(&self, base: &str) -> String {
        if self.frames.is_empty() {
            return base.to_string();
        }
        format!("{}/{}", self.current_path(), base)
    }

    pub fn reset(&mut self) {
        self.frames.clear();
        self.generation += 1;
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// 作用域守卫：离开作用域（包括`?`提前返回与 panic 展开）时自动弹出
///
/// 守卫只持有作用域栈本身，不借用图，所以在持有守卫期间可以自由地构建/改写节点。
#[must_use = "守卫被立即丢弃时作用域也会立即弹出"]
pub struct ScopeGuard {
    stack: Rc<RefCell<ScopeStack>>,
    depth: usize,
    generation: u64,
}

impl ScopeGuard {
    pub(crate) fn enter(stack: Rc<RefCell<ScopeStack>>, name: &str) -> Self {
        let (depth, generation) = {
            let mut s = stack.borrow_mut();
            (s.push(name), s.generation())
        };
        Self {
            stack,
            depth,
            generation,
        }
    }

    /// 本守卫压入后的深度
    pub const fn depth(&self) -> usize {
        self.depth
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let mut stack = self.stack.borrow_mut();
        if stack.generation() != self.generation {
            log::warn!(
                "作用域守卫（深度{}）退出前作用域栈已被 reset，忽略本次弹出",
                self.depth
            );
            return;
        }
        stack.truncate(self.depth - 1);
    }
}
