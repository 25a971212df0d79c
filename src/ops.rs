// The operation table: a flat, ordered registry of operators, casts
// and constructors searched by (symbol, out, arg1, arg2) with ANY as
// wildcard. Entries added later are searched first, so host overrides
// win over the defaults.

use std::fmt;

use crate::values::{DataType, Value};

mod int;
mod uint;
mod float;
mod str;
mod ip;
mod mac;
mod flags;
mod trie;

pub const CAST_SYMBOL: &str = "__cast__";
pub const CONSTRUCTOR_SYMBOL: &str = "__constructor__";

pub type UnaryFn = fn(&Value) -> Value;
pub type BinaryFn = fn(&Value, &Value) -> Value;
pub type CastFn = fn(&Value) -> Value;
pub type ConstructorFn = fn(Value) -> Value;

// The sealed set of operation shapes. Hosts extend the table with the
// same plain fn pointers the built-in entries use.
#[derive(Copy, Clone, Debug)]
pub enum OpFn {
    Unary(UnaryFn),
    Binary(BinaryFn),
    Cast(CastFn),
    Constructor(ConstructorFn),
}

#[derive(Copy, Clone, Debug)]
pub struct Op {
    pub symbol: &'static str,
    pub out: DataType,
    pub arg1: DataType,
    pub arg2: DataType,
    pub func: OpFn,
}

impl Op {
    pub const fn unary(symbol: &'static str, arg: DataType, func: UnaryFn,
                       out: DataType) -> Op {
        Op { symbol, out, arg1: arg, arg2: DataType::NONE, func: OpFn::Unary(func) }
    }

    pub const fn binary(arg1: DataType, symbol: &'static str, arg2: DataType,
                        func: BinaryFn, out: DataType) -> Op {
        Op { symbol, out, arg1, arg2, func: OpFn::Binary(func) }
    }

    pub const fn cast(from: DataType, func: CastFn, to: DataType) -> Op {
        Op {
            symbol: CAST_SYMBOL,
            out: to,
            arg1: from,
            arg2: DataType::NONE,
            func: OpFn::Cast(func),
        }
    }

    pub const fn constructor(from: DataType, func: ConstructorFn,
                             to: DataType) -> Op {
        Op {
            symbol: CONSTRUCTOR_SYMBOL,
            out: to,
            arg1: from,
            arg2: DataType::NONE,
            func: OpFn::Constructor(func),
        }
    }

    fn matches(&self, symbol: &str, out: DataType, arg1: DataType,
               arg2: DataType) -> bool {
        self.symbol == symbol
            && (out == DataType::ANY || out == self.out)
            && (arg1 == DataType::ANY || arg1 == self.arg1)
            && (arg2 == DataType::ANY || arg2 == self.arg2)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.arg2 != DataType::NONE {
            write!(f, "{} ({}, {}) -> {}", self.symbol, self.arg1, self.arg2,
                   self.out)
        } else {
            write!(f, "{} ({}) -> {}", self.symbol, self.arg1, self.out)
        }
    }
}


#[derive(Clone, Debug, Default)]
pub struct OpTable {
    ops: Vec<Op>,
}

impl OpTable {
    pub fn new() -> OpTable {
        OpTable { ops: Vec::new() }
    }

    // The built-in table. Later blocks are prepended, so the search
    // order is flags, mac, ip, str, float, uint, int.
    pub fn default_ops() -> OpTable {
        let mut table = OpTable::new();
        table.extend(int::OPS);
        table.extend(uint::OPS);
        table.extend(float::OPS);
        table.extend(self::str::OPS);
        table.extend(ip::OPS);
        table.extend(mac::OPS);
        table.extend(flags::OPS);
        table
    }

    pub fn add(&mut self, op: Op) {
        self.ops.insert(0, op);
    }

    // Prepend a block of operations, preserving its internal order.
    pub fn extend(&mut self, ops: &[Op]) {
        self.ops.splice(0..0, ops.iter().copied());
    }

    pub fn find_all<'a>(&'a self, symbol: &'a str, out: DataType,
                        arg1: DataType, arg2: DataType)
                        -> impl Iterator<Item = &'a Op> + 'a {
        self.ops.iter().filter(move |op| op.matches(symbol, out, arg1, arg2))
    }

    pub fn find<'a>(&'a self, symbol: &'a str, out: DataType, arg1: DataType,
                arg2: DataType) -> Option<&'a Op> {
        self.find_all(symbol, out, arg1, arg2).next()
    }

    pub fn find_cast(&self, from: DataType, to: DataType) -> Option<&Op> {
        self.find(CAST_SYMBOL, to, from, DataType::NONE)
    }

    pub fn casts_from<'a>(&'a self, from: DataType)
                          -> impl Iterator<Item = &'a Op> + 'a {
        self.find_all(CAST_SYMBOL, DataType::ANY, from, DataType::NONE)
    }

    pub fn can_cast(&self, from: DataType, to: DataType) -> bool {
        from == to || self.find_cast(from, to).is_some()
    }

    pub fn find_constructor(&self, from: DataType) -> Option<&Op> {
        self.find(CONSTRUCTOR_SYMBOL, DataType::ANY, from, DataType::NONE)
    }

    // Position of the first cast producing `to`; the tie-break rank
    // for list element unification (lower is better).
    pub(crate) fn cast_rank(&self, to: DataType) -> Option<usize> {
        self.ops.iter().position(|op| {
            op.symbol == CAST_SYMBOL && op.out == to
        })
    }
}

// The opt-in trie acceleration table: a constructor that folds an IP
// list into a longest-prefix-match trie, and `in` over the result.
// Extend the options with it to enable.
pub fn trie_ops() -> &'static [Op] {
    trie::OPS
}


// Most operation functions are small match tables over value pairs.
// Values that slip past the resolver's typing fall through to None,
// which every boolean consumer reads as false.
macro_rules! unary_op {
    ($name:ident { $( $p:pat => $e:expr ),+ $(,)? }) => {
        pub(crate) fn $name(operand: &$crate::values::Value) -> $crate::values::Value {
            use $crate::values::Value::*;
            #[allow(unreachable_patterns)]
            match operand {
                $( $p => $e, )+
                _ => $crate::values::Value::None,
            }
        }
    };
}

macro_rules! binary_op {
    ($name:ident { $( $p:pat => $e:expr ),+ $(,)? }) => {
        pub(crate) fn $name(left: &$crate::values::Value,
                            right: &$crate::values::Value)
                            -> $crate::values::Value {
            use $crate::values::Value::*;
            #[allow(unreachable_patterns)]
            match (left, right) {
                $( $p => $e, )+
                _ => $crate::values::Value::None,
            }
        }
    };
}

pub(crate) use binary_op;
pub(crate) use unary_op;
