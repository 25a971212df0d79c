// Eval-tree evaluation.
//
// Plain recursion computes call nodes bottom-up. Quantifier children
// (`and`/`or`/`not`/`any`) go through eval_quantified, which retries
// the subtree while the record has more values for the field behind
// the re-evaluation cursor. A missing field collapses the enclosing
// quantified evaluation to false without invoking the operations
// above it.

use crate::eval::{EvalNode, EvalOp};
use crate::opts::DataResult;
use crate::values::Value;

pub(crate) struct Evaluation<'a> {
    nodes: &'a mut [EvalNode],
    data_cb: &'a mut dyn FnMut(bool, u32) -> DataResult,
    // the DataCall node the nearest quantifier will re-invoke
    cursor: Option<usize>,
    // a data callback reported the field absent
    missing: bool,
}

impl<'a> Evaluation<'a> {
    pub fn new(nodes: &'a mut [EvalNode],
               data_cb: &'a mut dyn FnMut(bool, u32) -> DataResult)
               -> Evaluation<'a> {
        Evaluation { nodes, data_cb, cursor: None, missing: false }
    }

    pub fn eval_node(&mut self, idx: usize) {
        let op = self.nodes[idx].op;
        match op {
            EvalOp::Value => {}
            EvalOp::DataCall(id) => match (self.data_cb)(true, id) {
                DataResult::Value(value) => {
                    self.nodes[idx].value = value;
                    self.cursor = None;
                }
                DataResult::More(value) => {
                    self.nodes[idx].value = value;
                    self.cursor = Some(idx);
                }
                DataResult::NotFound => {
                    self.cursor = None;
                    self.missing = true;
                }
            },
            EvalOp::Exists(id) => {
                let found = !matches!((self.data_cb)(true, id),
                                      DataResult::NotFound);
                self.nodes[idx].value = Value::Bool(found);
            }
            EvalOp::Unary(f) | EvalOp::Cast(f) => {
                if let Some(child) = self.nodes[idx].left {
                    self.eval_node(child);
                    if self.missing {
                        return;
                    }
                    let value = f(&self.nodes[child].value);
                    self.nodes[idx].value = value;
                }
            }
            EvalOp::Binary(f) => {
                if let (Some(left), Some(right)) =
                    (self.nodes[idx].left, self.nodes[idx].right) {
                    self.eval_node(left);
                    if self.missing {
                        return;
                    }
                    self.eval_node(right);
                    if self.missing {
                        return;
                    }
                    let value = f(&self.nodes[left].value,
                                  &self.nodes[right].value);
                    self.nodes[idx].value = value;
                }
            }
            EvalOp::And => {
                if let (Some(left), Some(right)) =
                    (self.nodes[idx].left, self.nodes[idx].right) {
                    self.eval_quantified(left);
                    if !self.nodes[left].value.as_bool() {
                        self.nodes[idx].value = Value::Bool(false);
                        return;
                    }
                    self.eval_quantified(right);
                    let value = self.nodes[right].value.as_bool();
                    self.nodes[idx].value = Value::Bool(value);
                }
            }
            EvalOp::Or => {
                if let (Some(left), Some(right)) =
                    (self.nodes[idx].left, self.nodes[idx].right) {
                    self.eval_quantified(left);
                    if self.nodes[left].value.as_bool() {
                        self.nodes[idx].value = Value::Bool(true);
                        return;
                    }
                    self.eval_quantified(right);
                    let value = self.nodes[right].value.as_bool();
                    self.nodes[idx].value = Value::Bool(value);
                }
            }
            EvalOp::Not => {
                if let Some(child) = self.nodes[idx].left {
                    self.eval_quantified(child);
                    let value = !self.nodes[child].value.as_bool();
                    self.nodes[idx].value = Value::Bool(value);
                }
            }
            EvalOp::Any => {
                if let Some(child) = self.nodes[idx].left {
                    self.eval_quantified(child);
                    let value = self.nodes[child].value.as_bool();
                    self.nodes[idx].value = Value::Bool(value);
                }
            }
        }
    }

    // Evaluate a quantifier child until it turns true or the field
    // behind the cursor runs out of values.
    fn eval_quantified(&mut self, idx: usize) {
        // a cursor left behind by a sibling scope must not leak in
        self.cursor = None;
        self.missing = false;

        self.eval_node(idx);
        loop {
            if self.missing {
                self.missing = false;
                self.cursor = None;
                self.nodes[idx].value = Value::Bool(false);
                return;
            }
            if self.nodes[idx].value.as_bool() {
                return;
            }
            let cursor = match self.cursor {
                Some(cursor) => cursor,
                None => return,
            };
            self.reevaluate_upwards(cursor, idx);
        }
    }

    // Fetch the next value for the cursor's field and recompute the
    // chain of nodes from the cursor up to (and including) the
    // quantifier's child.
    fn reevaluate_upwards(&mut self, bottom: usize, top: usize) {
        let mut idx = bottom;
        loop {
            let op = self.nodes[idx].op;
            match op {
                EvalOp::DataCall(id) => match (self.data_cb)(false, id) {
                    DataResult::Value(value) => {
                        // the last value this record has
                        self.nodes[idx].value = value;
                        self.cursor = None;
                    }
                    DataResult::More(value) => {
                        self.nodes[idx].value = value;
                    }
                    DataResult::NotFound => {
                        self.cursor = None;
                        self.missing = true;
                        return;
                    }
                },
                EvalOp::Unary(f) | EvalOp::Cast(f) => {
                    if let Some(child) = self.nodes[idx].left {
                        let value = f(&self.nodes[child].value);
                        self.nodes[idx].value = value;
                    }
                }
                EvalOp::Binary(f) => {
                    if let (Some(left), Some(right)) =
                        (self.nodes[idx].left, self.nodes[idx].right) {
                        let value = f(&self.nodes[left].value,
                                      &self.nodes[right].value);
                        self.nodes[idx].value = value;
                    }
                }
                EvalOp::And => {
                    if let (Some(left), Some(right)) =
                        (self.nodes[idx].left, self.nodes[idx].right) {
                        let value = self.nodes[left].value.as_bool()
                            && self.nodes[right].value.as_bool();
                        self.nodes[idx].value = Value::Bool(value);
                    }
                }
                EvalOp::Or => {
                    if let (Some(left), Some(right)) =
                        (self.nodes[idx].left, self.nodes[idx].right) {
                        let value = self.nodes[left].value.as_bool()
                            || self.nodes[right].value.as_bool();
                        self.nodes[idx].value = Value::Bool(value);
                    }
                }
                EvalOp::Not => {
                    if let Some(child) = self.nodes[idx].left {
                        let value = !self.nodes[child].value.as_bool();
                        self.nodes[idx].value = Value::Bool(value);
                    }
                }
                // value slots and exists nodes keep their result
                EvalOp::Value | EvalOp::Exists(_) | EvalOp::Any => {}
            }

            if idx == top {
                break;
            }
            idx = match self.nodes[idx].parent {
                Some(parent) => parent,
                None => break,
            };
        }
    }
}
