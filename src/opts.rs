// Compile options: the host callbacks and the operation table. A
// filter stores its own clone, so the caller's copy stays free to
// change or drop after compiling.

use enumflags2::BitFlags;

use crate::ops::{Op, OpTable};
use crate::values::{DataType, Value};

#[derive(BitFlags, Copy, Clone, Debug, PartialEq)]
#[repr(u8)]
pub enum FieldFlag {
    // the identifier's value is fixed at compile time; the resolver
    // fetches it once through Host::const_value
    Const = 0b1,
}

pub type FieldFlags = BitFlags<FieldFlag>;

// What a host lookup says about an identifier.
#[derive(Copy, Clone, Debug)]
pub struct FieldInfo {
    pub id: u32,
    pub data_type: DataType,
    pub flags: FieldFlags,
}

impl FieldInfo {
    // A per-record field, possibly multi-valued.
    pub fn field(id: u32, data_type: DataType) -> FieldInfo {
        FieldInfo { id, data_type, flags: BitFlags::empty() }
    }

    // A compile-time constant.
    pub fn constant(id: u32, data_type: DataType) -> FieldInfo {
        FieldInfo { id, data_type, flags: FieldFlag::Const.into() }
    }
}

// Outcome of one data callback invocation.
#[derive(Clone, Debug)]
pub enum DataResult {
    // a value, and this field has no more of them
    Value(Value),
    // a value, and asking again with reset=false yields another
    More(Value),
    // the field is absent from the record
    NotFound,
}

// The embedding. The host maps identifier names to ids and types at
// compile time and serves field values at evaluation time.
//
// `reset` is true on the first data call for a quantifier pass;
// hosts with multi-valued fields rewind their per-id iterator then
// and advance it when reset is false.
pub trait Host {
    type Record: ?Sized;

    fn lookup(&self, name: &str) -> Option<FieldInfo>;

    fn const_value(&self, id: u32) -> Value;

    fn data(&mut self, reset: bool, id: u32, record: &Self::Record) -> DataResult;
}

#[derive(Clone, Debug)]
pub struct Opts<H> {
    host: H,
    ops: OpTable,
}

impl<H> Opts<H> {
    pub fn new(host: H) -> Opts<H> {
        Opts { host, ops: OpTable::default_ops() }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn ops(&self) -> &OpTable {
        &self.ops
    }

    // Register a single operation. New entries win over existing ones.
    pub fn add_op(&mut self, op: Op) {
        self.ops.add(op);
    }

    // Register a block of operations, e.g. ops::trie_ops().
    pub fn extend_ops(&mut self, ops: &[Op]) {
        self.ops.extend(ops);
    }
}
