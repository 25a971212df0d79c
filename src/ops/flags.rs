// Bitmask field operations. Flags refine uint: equality means "some
// masked bit set", and arithmetic collapses back to uint through the
// registered cast. Flag values share the uint representation.

use crate::ops::{binary_op, unary_op, Op};
use crate::values::DataType;

binary_op! { eq_flags {
    (Uint(a), Uint(b)) => Bool(a & b != 0),
} }

binary_op! { ne_flags {
    (Uint(a), Uint(b)) => Bool(a & b == 0),
} }

unary_op! { cast_int_to_flags {
    Int(i) => Uint(*i as u64),
} }

unary_op! { cast_flags_to_uint {
    Uint(u) => Uint(*u),
} }

unary_op! { cast_flags_to_bool {
    Uint(u) => Bool(*u != 0),
} }

const FLAGS: DataType = DataType::FLAGS;

pub(crate) const OPS: &[Op] = &[
    Op::binary(FLAGS, "", FLAGS, eq_flags, DataType::BOOL),
    Op::binary(FLAGS, "==", FLAGS, eq_flags, DataType::BOOL),
    Op::binary(FLAGS, "!=", FLAGS, ne_flags, DataType::BOOL),

    Op::cast(DataType::INT, cast_int_to_flags, FLAGS),
    Op::cast(FLAGS, cast_flags_to_uint, DataType::UINT),
    Op::cast(FLAGS, cast_flags_to_bool, DataType::BOOL),
];
