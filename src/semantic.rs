// Semantic resolution: a post-order walk that assigns every node a
// concrete data type, resolves identifiers through the host, inserts
// cast nodes where the operation table requires them, and propagates
// the const / multi-eval subtree flags.

use std::collections::HashMap;

use crate::ast::{self, AstFlag, AstNode};
use crate::error::FilterError;
use crate::opts::{FieldFlag, FieldInfo, Host, Opts};
use crate::values::DataType;

pub fn resolve_types<H: Host>(root: &mut AstNode, opts: &Opts<H>)
                              -> Result<(), FilterError> {
    let mut resolver = Resolver { opts, lookups: HashMap::new() };
    resolver.resolve(root)
}

struct Resolver<'a, H> {
    opts: &'a Opts<H>,
    // one host lookup per distinct name per compile
    lookups: HashMap<String, FieldInfo>,
}

fn invalid_operation(node: &AstNode) -> FilterError {
    let msg = if node.is_binary() {
        format!(
            "invalid operation '{}' for values of type '{}' and '{}'",
            node.symbol,
            node.left.as_ref().map_or(DataType::NONE, |n| n.data_type),
            node.right.as_ref().map_or(DataType::NONE, |n| n.data_type),
        )
    } else if node.is_unary() {
        format!(
            "invalid operation '{}' for value of type '{}'",
            node.symbol,
            node.left.as_ref().map_or(DataType::NONE, |n| n.data_type),
        )
    } else {
        format!("invalid operation '{}'", node.symbol)
    };
    FilterError::semantic(node.span, msg)
}

// Wrap the child in a __cast__ node unless it already has the target
// type. The cast inherits the child's subtree flags, so constness and
// multi-evaluation survive the insertion.
fn insert_cast(slot: &mut Option<Box<AstNode>>, to: DataType) {
    if let Some(child) = slot.take() {
        if child.data_type == to {
            *slot = Some(child);
            return;
        }
        let mut cast = AstNode::new(ast::CAST, child.span);
        cast.data_type = to;
        cast.flags = child.flags;
        cast.left = Some(child);
        *slot = Some(Box::new(cast));
    }
}

// Const is the intersection over children, multi-eval the union.
fn propagate_flags(node: &mut AstNode) {
    let multi = |n: &Option<Box<AstNode>>| {
        n.as_ref().map_or(false, |n| n.flags.contains(AstFlag::MultiEvalSubtree))
    };
    let constant = |n: &Option<Box<AstNode>>| {
        n.as_ref().map_or(true, |n| n.flags.contains(AstFlag::ConstSubtree))
    };
    if multi(&node.left) || multi(&node.right) {
        node.flags |= AstFlag::MultiEvalSubtree;
    }
    if node.left.is_some() && constant(&node.left) && constant(&node.right) {
        node.flags |= AstFlag::ConstSubtree;
    }
}

impl<'a, H: Host> Resolver<'a, H> {
    fn resolve(&mut self, node: &mut AstNode) -> Result<(), FilterError> {
        // children first
        if let Some(left) = &mut node.left {
            self.resolve(left)?;
        }
        if let Some(right) = &mut node.right {
            self.resolve(right)?;
        }

        match node.symbol {
            ast::LITERAL => {
                node.flags |= AstFlag::ConstSubtree;
                Ok(())
            }
            ast::LIST_ITEM => {
                if let Some(item) = node.left.as_deref() {
                    if !item.flags.contains(AstFlag::ConstSubtree) {
                        return Err(FilterError::semantic(
                            node.span, "list items must be const"));
                    }
                    node.data_type = item.data_type;
                }
                node.flags |= AstFlag::ConstSubtree;
                Ok(())
            }
            ast::LIST => self.resolve_list(node),
            ast::NAME => self.resolve_name(node),
            "and" | "or" => {
                let ops = self.opts.ops();
                let castable = |n: &Option<Box<AstNode>>| {
                    n.as_ref().map_or(false, |n| {
                        ops.can_cast(n.data_type, DataType::BOOL)
                    })
                };
                if !castable(&node.left) || !castable(&node.right) {
                    return Err(invalid_operation(node));
                }
                propagate_flags(node);
                insert_cast(&mut node.left, DataType::BOOL);
                insert_cast(&mut node.right, DataType::BOOL);
                node.data_type = DataType::BOOL;
                Ok(())
            }
            "not" | ast::ROOT => {
                let castable = node.left.as_ref().map_or(false, |n| {
                    self.opts.ops().can_cast(n.data_type, DataType::BOOL)
                });
                if !castable {
                    return Err(invalid_operation(node));
                }
                propagate_flags(node);
                insert_cast(&mut node.left, DataType::BOOL);
                node.data_type = DataType::BOOL;
                Ok(())
            }
            "exists" => {
                let operand = match node.operand() {
                    Some(operand) => operand,
                    None => return Err(invalid_operation(node)),
                };
                if !operand.is_symbol(ast::NAME) {
                    return Err(FilterError::semantic(
                        node.span, "expected field name for exists"));
                }
                if operand.flags.contains(AstFlag::ConstSubtree) {
                    return Err(FilterError::semantic(
                        node.span, "expected non-const field name for exists"));
                }
                node.data_type = DataType::BOOL;
                Ok(())
            }
            _ => {
                propagate_flags(node);
                self.resolve_operation(node)
            }
        }
    }

    fn resolve_name(&mut self, node: &mut AstNode) -> Result<(), FilterError> {
        let name = node.name.as_deref().unwrap_or("");
        let info = match self.lookups.get(name) {
            Some(info) => *info,
            None => {
                let info = self.opts.host().lookup(name).ok_or_else(|| {
                    FilterError::semantic(
                        node.span, format!("unknown name '{}'", name))
                })?;
                self.lookups.insert(name.to_owned(), info);
                info
            }
        };

        node.id = info.id;
        node.data_type = info.data_type;
        if info.flags.contains(FieldFlag::Const) {
            node.value = Some(self.opts.host().const_value(info.id));
            node.flags |= AstFlag::ConstSubtree;
        } else {
            node.flags |= AstFlag::MultiEvalSubtree;
        }
        Ok(())
    }

    // Look the operator up by its exact argument types, or fall back
    // to the first entry both arguments can be cast into.
    fn resolve_operation(&mut self, node: &mut AstNode) -> Result<(), FilterError> {
        let arg1 = node.left.as_ref().map_or(DataType::NONE, |n| n.data_type);
        let arg2 = node.right.as_ref().map_or(DataType::NONE, |n| n.data_type);
        let ops = self.opts.ops();

        if let Some(op) = ops.find(node.symbol, DataType::ANY, arg1, arg2) {
            node.data_type = op.out;
            return Ok(());
        }

        let candidate = ops
            .find_all(node.symbol, DataType::ANY, DataType::ANY, DataType::ANY)
            .find(|op| ops.can_cast(arg1, op.arg1) && ops.can_cast(arg2, op.arg2))
            .copied();
        let op = match candidate {
            Some(op) => op,
            None => return Err(invalid_operation(node)),
        };

        if node.left.is_some() {
            insert_cast(&mut node.left, op.arg1);
        }
        if node.right.is_some() {
            insert_cast(&mut node.right, op.arg2);
        }
        node.data_type = op.out;
        Ok(())
    }

    // Unify the element type of a literal list: intersect each item's
    // one-cast-reachable type set, prefer types already present in the
    // list, and break remaining ties with the earliest registered cast.
    fn resolve_list(&mut self, node: &mut AstNode) -> Result<(), FilterError> {
        if node.left.is_none() {
            node.data_type = DataType::LIST;
            node.flags |= AstFlag::ConstSubtree;
            return Ok(());
        }

        let ops = self.opts.ops();
        let mut types_in_list: Vec<DataType> = Vec::new();
        let mut potential: Vec<DataType> = Vec::new();

        for (i, item) in node.list_items().enumerate() {
            let mut reachable = vec![item.data_type];
            for cast in ops.casts_from(item.data_type) {
                if !reachable.contains(&cast.out) {
                    reachable.push(cast.out);
                }
            }
            if i == 0 {
                potential = reachable;
            } else {
                potential.retain(|t| reachable.contains(t));
            }
            if !types_in_list.contains(&item.data_type) {
                types_in_list.push(item.data_type);
            }
        }

        if potential.is_empty() {
            return Err(FilterError::semantic(
                node.span, "cannot cast all list items to same type"));
        }

        let priority: Vec<DataType> = types_in_list
            .iter()
            .copied()
            .filter(|t| potential.contains(t))
            .collect();
        let pool = if priority.is_empty() { &potential } else { &priority };

        let rank = |t: DataType| ops.cast_rank(t).unwrap_or(usize::MAX);
        let mut best = pool[0];
        for &t in &pool[1..] {
            if rank(t) < rank(best) {
                best = t;
            }
        }

        let mut item = node.left.as_deref_mut();
        while let Some(li) = item {
            insert_cast(&mut li.left, best);
            li.data_type = best;
            item = li.right.as_deref_mut();
        }

        node.data_type = DataType::list_of(best);
        node.flags |= AstFlag::ConstSubtree;
        Ok(())
    }
}
