/*
 * @Description  : GraphInner 节点构建：create_node / clone_node
 *
 * 构建顺序：解析操作数 -> 确定种子 -> 取得形状（缓存或形状函数）-> 计算哈希 -> 登记 use。
 * 前面任何一步失败都不会留下 use 记录或半成品节点。
 */

use super::GraphInner;
use crate::errors::IrError;
use crate::ir::display::format_node_display;
use crate::ir::hashing::{self, HashValue};
use crate::ir::nodes::raw_node::TraitNode;
use crate::ir::nodes::{
    GraphNode, NodeId, NodeSpec, NodeToken, Output, ShapeSource, Use, Value,
};
use crate::ir::shape::Shape;
use std::panic::Location;
use std::rc::Rc;

impl GraphInner {
    /// 按构建请求创建节点，返回指向其第 0 个输出的 Value
    #[track_caller]
    pub fn create_node(&mut self, spec: NodeSpec<'_>) -> Result<Value, IrError> {
        let location = Location::caller();
        self.collect_released();
        let result = self.create_node_impl(spec, location);
        // 失败时请求中的操作数已在上面被丢弃，一并回收
        self.collect_released();
        result
    }

    /// 以`node`为模板、绑定新的操作数创建一个同类型节点
    ///
    /// 类型元数据与显式种子沿用原节点；会推断形状的类型按新操作数重新推断。
    #[track_caller]
    pub fn clone_node(&mut self, id: NodeId, operands: Vec<Value>) -> Result<Value, IrError> {
        let node = self.node(id)?;
        let template = node.template();
        let kind = node.kind().clone();
        let shape = kind.clone_shape(&template);
        let spec = NodeSpec {
            op: template.op,
            operands,
            shape,
            num_outputs: template.num_outputs,
            hash_seed: node.explicit_seed(),
            kind,
        };
        self.create_node(spec)
    }

    fn create_node_impl(
        &mut self,
        spec: NodeSpec<'_>,
        location: &'static Location<'static>,
    ) -> Result<Value, IrError> {
        let NodeSpec {
            op,
            operands,
            shape,
            num_outputs,
            hash_seed,
            kind,
        } = spec;
        let scope = self.scope_path();

        // 1. 解析操作数
        let outputs = operands
            .iter()
            .map(|operand| self.resolve_operand(operand))
            .collect::<Result<Vec<Output>, _>>()?;
        let operand_shapes = outputs
            .iter()
            .map(|&output| self.output_shape(output).cloned())
            .collect::<Result<Vec<Shape>, _>>()?;
        if num_outputs == 0 {
            return Err(IrError::construction(
                &op,
                "输出数不能为0",
                &operand_shapes,
                &scope,
            ));
        }

        // 2. 种子与不含形状的配方哈希
        let seed = merge_seeds(hash_seed, kind.hash_seed());
        let resolved_seed = self.options.seed_policy.resolve(&op, seed);
        let base = hashing::op_hash(&op, resolved_seed);
        let operand_hashes = outputs
            .iter()
            .map(|&output| self.output_hash(output))
            .collect::<Result<Vec<HashValue>, _>>()?;
        let recipe = hashing::combine_operands(base, operand_hashes.iter().copied());

        // 3. 形状：缓存未命中时才调用形状函数
        let shape = match shape {
            ShapeSource::Known(shape) => shape,
            ShapeSource::Infer(shape_fn) => match self.shape_cache.get(recipe) {
                Some(shape) => shape,
                None => {
                    let shape = shape_fn(&operand_shapes).map_err(|message| {
                        IrError::construction(&op, message, &operand_shapes, &scope)
                    })?;
                    self.shape_cache.insert(recipe, shape.clone());
                    shape
                }
            },
        };
        let shapes = split_output_shapes(&shape, num_outputs).map_err(|message| {
            IrError::construction(&op, message, &operand_shapes, &scope)
        })?;

        // 4. 哈希
        let node_hash = hashing::hash_combine(base, hashing::hash_of(&shape));
        let hash = hashing::combine_operands(node_hash, operand_hashes);

        // 5. 分配 ID 与调试名
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let base_name = format!("{}_{}", op, id.0);
        let name = if self.options.record_scopes {
            self.scopes.borrow().qualify(&base_name)
        } else {
            base_name
        };

        let token = Rc::new(NodeToken::new(
            id,
            self.self_ref.clone(),
            Rc::clone(&self.released),
        ));
        let node = GraphNode::new(
            id,
            op,
            operands,
            shape,
            shapes,
            hash_seed,
            seed,
            node_hash,
            hash,
            name,
            scope,
            location,
            kind,
            Rc::downgrade(&token),
        );

        // 6. 全部校验通过后才登记 use
        for (pos, output) in outputs.iter().enumerate() {
            self.node_mut(output.node)?
                .add_use(Use::new(id, pos, output.index));
        }
        log::trace!(
            "创建{}（{}），形状{}，哈希{}",
            format_node_display(id, node.name(), node.op()),
            location,
            node.node_shape(),
            node.hash()
        );
        self.nodes.insert(id, node);

        Ok(Value::from_token(token, 0))
    }
}

/// 显式种子与类型元数据种子都存在时合并，类型元数据始终参与哈希
fn merge_seeds(explicit: Option<HashValue>, kind: Option<HashValue>) -> Option<HashValue> {
    match (explicit, kind) {
        (Some(explicit), Some(kind)) => Some(hashing::hash_combine(explicit, kind)),
        (explicit, kind) => explicit.or(kind),
    }
}

/// 把整体形状拆成各输出的形状
fn split_output_shapes(shape: &Shape, num_outputs: usize) -> Result<Vec<Shape>, String> {
    match shape {
        Shape::Tuple(parts) if parts.len() == num_outputs => Ok(parts.clone()),
        // 其余单输出情形，整体形状就是该输出的形状
        _ if num_outputs == 1 => Ok(vec![shape.clone()]),
        Shape::Tuple(parts) => Err(format!(
            "声明了{}个输出，但元组形状有{}个分量",
            num_outputs,
            parts.len()
        )),
        Shape::Array { .. } => Err(format!(
            "声明了{num_outputs}个输出，形状必须是同样元数的元组，实际为{shape}"
        )),
    }
}
