// Unsigned integer operations.

use crate::ops::{binary_op, unary_op, Op};
use crate::values::DataType;

unary_op! { neg_uint {
    Uint(a) => Int((*a as i64).wrapping_neg()),
} }

binary_op! { add_uint {
    (Uint(a), Uint(b)) => Uint(a.wrapping_add(*b)),
} }

binary_op! { sub_uint {
    (Uint(a), Uint(b)) => Uint(a.wrapping_sub(*b)),
} }

binary_op! { mul_uint {
    (Uint(a), Uint(b)) => Uint(a.wrapping_mul(*b)),
} }

binary_op! { div_uint {
    (Uint(a), Uint(b)) => Uint(a.checked_div(*b).unwrap_or(0)),
} }

binary_op! { mod_uint {
    (Uint(a), Uint(b)) => Uint(a.checked_rem(*b).unwrap_or(0)),
} }

unary_op! { bitnot_uint {
    Uint(a) => Uint(!a),
} }

binary_op! { bitor_uint {
    (Uint(a), Uint(b)) => Uint(a | b),
} }

binary_op! { bitand_uint {
    (Uint(a), Uint(b)) => Uint(a & b),
} }

binary_op! { bitxor_uint {
    (Uint(a), Uint(b)) => Uint(a ^ b),
} }

binary_op! { shl_uint {
    (Uint(a), Uint(b)) => Uint(a.wrapping_shl(*b as u32)),
} }

binary_op! { shr_uint {
    (Uint(a), Uint(b)) => Uint(a.wrapping_shr(*b as u32)),
} }

binary_op! { eq_uint {
    (Uint(a), Uint(b)) => Bool(a == b),
} }

binary_op! { ne_uint {
    (Uint(a), Uint(b)) => Bool(a != b),
} }

binary_op! { lt_uint {
    (Uint(a), Uint(b)) => Bool(a < b),
} }

binary_op! { gt_uint {
    (Uint(a), Uint(b)) => Bool(a > b),
} }

binary_op! { le_uint {
    (Uint(a), Uint(b)) => Bool(a <= b),
} }

binary_op! { ge_uint {
    (Uint(a), Uint(b)) => Bool(a >= b),
} }

binary_op! { uint_in_list {
    (Uint(a), List(list)) => Bool(
        list.items.iter().any(|v| matches!(v, Uint(b) if b == a))
    ),
} }

unary_op! { cast_float_to_uint {
    Float(x) => Uint(*x as u64),
} }

unary_op! { cast_uint_to_bool {
    Uint(u) => Bool(*u != 0),
} }

unary_op! { cast_uint_list_to_bool {
    List(list) => Bool(!list.items.is_empty()),
} }

const UINT: DataType = DataType::UINT;
const UINT_LIST: DataType = DataType::list_of(DataType::UINT);

pub(crate) const OPS: &[Op] = &[
    Op::unary("-", UINT, neg_uint, DataType::INT),
    Op::binary(UINT, "+", UINT, add_uint, UINT),
    Op::binary(UINT, "-", UINT, sub_uint, UINT),
    Op::binary(UINT, "*", UINT, mul_uint, UINT),
    Op::binary(UINT, "/", UINT, div_uint, UINT),
    Op::binary(UINT, "%", UINT, mod_uint, UINT),

    Op::unary("~", UINT, bitnot_uint, UINT),
    Op::binary(UINT, "|", UINT, bitor_uint, UINT),
    Op::binary(UINT, "&", UINT, bitand_uint, UINT),
    Op::binary(UINT, "^", UINT, bitxor_uint, UINT),
    Op::binary(UINT, "<<", UINT, shl_uint, UINT),
    Op::binary(UINT, ">>", UINT, shr_uint, UINT),

    Op::binary(UINT, "", UINT, eq_uint, DataType::BOOL),
    Op::binary(UINT, "==", UINT, eq_uint, DataType::BOOL),
    Op::binary(UINT, "!=", UINT, ne_uint, DataType::BOOL),
    Op::binary(UINT, "<", UINT, lt_uint, DataType::BOOL),
    Op::binary(UINT, ">", UINT, gt_uint, DataType::BOOL),
    Op::binary(UINT, "<=", UINT, le_uint, DataType::BOOL),
    Op::binary(UINT, ">=", UINT, ge_uint, DataType::BOOL),

    Op::binary(UINT, "in", UINT_LIST, uint_in_list, DataType::BOOL),

    Op::cast(DataType::FLOAT, cast_float_to_uint, UINT),
    Op::cast(UINT, cast_uint_to_bool, DataType::BOOL),
    Op::cast(UINT_LIST, cast_uint_list_to_bool, DataType::BOOL),
];
