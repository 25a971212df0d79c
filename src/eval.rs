// Lowering from the typed AST to the eval tree.
//
// Eval nodes live in a flat arena and link by index, so the evaluator
// can mutate value slots freely and walk parent chains during
// quantifier re-evaluation. Literal and list payloads move out of the
// AST here; a registered constructor (eg. IP list to trie) runs on
// the materialised value before it is stored.

use crate::ast::{self, AstFlag, AstNode};
use crate::error::FilterError;
use crate::evaluator::Evaluation;
use crate::ops::{BinaryFn, CastFn, OpFn, UnaryFn};
use crate::opts::{DataResult, Host, Opts};
use crate::values::{DataType, List, Value};

#[derive(Copy, Clone, Debug)]
pub(crate) enum EvalOp {
    // a pre-populated value slot
    Value,
    And,
    Or,
    Not,
    Cast(CastFn),
    Unary(UnaryFn),
    Binary(BinaryFn),
    DataCall(u32),
    Exists(u32),
    // quantifier driving multi-value re-evaluation at the root
    Any,
}

#[derive(Debug)]
pub(crate) struct EvalNode {
    pub op: EvalOp,
    pub value: Value,
    pub parent: Option<usize>,
    pub left: Option<usize>,
    pub right: Option<usize>,
}

impl EvalNode {
    fn new(op: EvalOp) -> EvalNode {
        EvalNode {
            op,
            value: Value::None,
            parent: None,
            left: None,
            right: None,
        }
    }
}

pub(crate) struct EvalTree {
    pub nodes: Vec<EvalNode>,
    pub root: usize,
}

impl EvalTree {
    pub fn evaluate(&mut self,
                    data_cb: &mut dyn FnMut(bool, u32) -> DataResult) -> bool {
        let root = self.root;
        let mut eval = Evaluation::new(&mut self.nodes, data_cb);
        eval.eval_node(root);
        self.nodes[root].value.as_bool()
    }

    // Evaluate a tree with no data calls and take the root's value.
    fn evaluate_const(&mut self) -> Value {
        let root = self.root;
        let mut cb = |_reset: bool, _id: u32| DataResult::NotFound;
        let mut eval = Evaluation::new(&mut self.nodes, &mut cb);
        eval.eval_node(root);
        std::mem::take(&mut self.nodes[root].value)
    }
}

pub(crate) fn generate<H: Host>(root: &mut AstNode, opts: &Opts<H>)
                                -> Result<EvalTree, FilterError> {
    let mut nodes = Vec::new();
    let root = gen_node(root, opts, &mut nodes)?;

    // fix up parent links in one pass
    for i in 0..nodes.len() {
        if let Some(left) = nodes[i].left {
            nodes[left].parent = Some(i);
        }
        if let Some(right) = nodes[i].right {
            nodes[right].parent = Some(i);
        }
    }

    Ok(EvalTree { nodes, root })
}

fn push(nodes: &mut Vec<EvalNode>, node: EvalNode) -> usize {
    nodes.push(node);
    nodes.len() - 1
}

// Run the registered constructor on a freshly materialised value, if
// one exists for its type.
fn construct<H>(opts: &Opts<H>, value: Value) -> Value {
    match opts.ops().find_constructor(value.data_type()).map(|op| op.func) {
        Some(OpFn::Constructor(f)) => f(value),
        _ => value,
    }
}

// The type an operand presents to the operation lookup. A value slot
// rebuilt by a constructor is looked up by the constructed type, so
// eg. `in` binds to the trie membership function once the list became
// a trie.
fn arg_type<H>(opts: &Opts<H>, nodes: &[EvalNode], idx: usize,
               ast_type: DataType) -> DataType {
    if matches!(nodes[idx].op, EvalOp::Value) {
        if let Some(ctor) = opts.ops().find_constructor(ast_type) {
            return ctor.out;
        }
    }
    ast_type
}

fn no_operation(node: &AstNode) -> FilterError {
    FilterError::semantic(
        node.span,
        format!("no operation '{}' to bind for evaluation", node.symbol),
    )
}

fn gen_node<H: Host>(node: &mut AstNode, opts: &Opts<H>,
                     nodes: &mut Vec<EvalNode>) -> Result<usize, FilterError> {
    match node.symbol {
        ast::ROOT => {
            let multi = node
                .operand()
                .map_or(false, |n| n.flags.contains(AstFlag::MultiEvalSubtree));
            let child = match &mut node.left {
                Some(left) => gen_node(left, opts, nodes)?,
                None => return Err(no_operation(node)),
            };
            if !multi {
                return Ok(child);
            }
            // the whole expression re-evaluates per field value, and
            // no inner quantifier drives it; the root does
            let mut any = EvalNode::new(EvalOp::Any);
            any.left = Some(child);
            Ok(push(nodes, any))
        }
        "exists" => {
            let id = match node.operand() {
                Some(operand) => operand.id,
                None => return Err(no_operation(node)),
            };
            Ok(push(nodes, EvalNode::new(EvalOp::Exists(id))))
        }
        ast::LITERAL => {
            let value = construct(opts, node.value.take().unwrap_or_default());
            let mut eval_node = EvalNode::new(EvalOp::Value);
            eval_node.value = value;
            Ok(push(nodes, eval_node))
        }
        ast::NAME => {
            if node.flags.contains(AstFlag::ConstSubtree) {
                let value = construct(opts, node.value.take().unwrap_or_default());
                let mut eval_node = EvalNode::new(EvalOp::Value);
                eval_node.value = value;
                Ok(push(nodes, eval_node))
            } else {
                Ok(push(nodes, EvalNode::new(EvalOp::DataCall(node.id))))
            }
        }
        ast::LIST => {
            // every item is a const subtree; evaluate each through its
            // own small tree and collect the results
            let elem = node.data_type.elem();
            let mut items = Vec::new();
            let mut item = node.left.as_deref_mut();
            while let Some(li) = item {
                if let Some(expr) = li.left.as_deref_mut() {
                    let mut sub = Vec::new();
                    let sub_root = gen_node(expr, opts, &mut sub)?;
                    let mut sub_tree = EvalTree { nodes: sub, root: sub_root };
                    items.push(sub_tree.evaluate_const());
                }
                item = li.right.as_deref_mut();
            }
            let value = construct(opts, Value::List(List { elem, items }));
            let mut eval_node = EvalNode::new(EvalOp::Value);
            eval_node.value = value;
            Ok(push(nodes, eval_node))
        }
        "and" | "or" => {
            let (left_ast, right_ast) = match (&mut node.left, &mut node.right) {
                (Some(left), Some(right)) => (left, right),
                _ => return Err(no_operation(node)),
            };
            let left = gen_node(left_ast, opts, nodes)?;
            let right = gen_node(right_ast, opts, nodes)?;
            let op = if node.symbol == "and" { EvalOp::And } else { EvalOp::Or };
            let mut eval_node = EvalNode::new(op);
            eval_node.left = Some(left);
            eval_node.right = Some(right);
            Ok(push(nodes, eval_node))
        }
        "not" => {
            let child = match &mut node.left {
                Some(left) => gen_node(left, opts, nodes)?,
                None => return Err(no_operation(node)),
            };
            let mut eval_node = EvalNode::new(EvalOp::Not);
            eval_node.left = Some(child);
            Ok(push(nodes, eval_node))
        }
        ast::CAST => {
            let child_type = node
                .operand()
                .map_or(DataType::NONE, |n| n.data_type);
            let child = match &mut node.left {
                Some(left) => gen_node(left, opts, nodes)?,
                None => return Err(no_operation(node)),
            };
            let from = arg_type(opts, nodes, child, child_type);
            let func = match opts.ops().find_cast(from, node.data_type)
                .map(|op| op.func) {
                Some(OpFn::Cast(f)) => f,
                _ => return Err(no_operation(node)),
            };
            let mut eval_node = EvalNode::new(EvalOp::Cast(func));
            eval_node.left = Some(child);
            Ok(push(nodes, eval_node))
        }
        _ => gen_call(node, opts, nodes),
    }
}

// A unary or binary operator node: bind the concrete function from
// the operation table.
fn gen_call<H: Host>(node: &mut AstNode, opts: &Opts<H>,
                     nodes: &mut Vec<EvalNode>) -> Result<usize, FilterError> {
    let left_type = node.left.as_ref().map_or(DataType::NONE, |n| n.data_type);
    let right_type = node.right.as_ref().map_or(DataType::NONE, |n| n.data_type);

    let left = match &mut node.left {
        Some(left) => Some(gen_node(left, opts, nodes)?),
        None => None,
    };
    let right = match &mut node.right {
        Some(right) => Some(gen_node(right, opts, nodes)?),
        None => None,
    };

    let arg1 = match left {
        Some(idx) => arg_type(opts, nodes, idx, left_type),
        None => DataType::NONE,
    };
    let arg2 = match right {
        Some(idx) => arg_type(opts, nodes, idx, right_type),
        None => DataType::NONE,
    };

    let func = opts.ops()
        .find(node.symbol, node.data_type, arg1, arg2)
        .map(|op| op.func);
    let eval_op = match func {
        Some(OpFn::Binary(f)) if right.is_some() => EvalOp::Binary(f),
        Some(OpFn::Unary(f)) if right.is_none() => EvalOp::Unary(f),
        _ => return Err(no_operation(node)),
    };

    let mut eval_node = EvalNode::new(eval_op);
    eval_node.left = left;
    eval_node.right = right;
    Ok(push(nodes, eval_node))
}
