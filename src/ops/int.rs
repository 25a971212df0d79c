// Signed integer operations.

use crate::ops::{binary_op, unary_op, Op};
use crate::values::DataType;

unary_op! { neg_int {
    Int(a) => Int(a.wrapping_neg()),
} }

binary_op! { add_int {
    (Int(a), Int(b)) => Int(a.wrapping_add(*b)),
} }

binary_op! { sub_int {
    (Int(a), Int(b)) => Int(a.wrapping_sub(*b)),
} }

binary_op! { mul_int {
    (Int(a), Int(b)) => Int(a.wrapping_mul(*b)),
} }

binary_op! { div_int {
    (Int(a), Int(b)) => Int(a.checked_div(*b).unwrap_or(0)),
} }

binary_op! { mod_int {
    (Int(a), Int(b)) => Int(a.checked_rem(*b).unwrap_or(0)),
} }

unary_op! { bitnot_int {
    Int(a) => Int(!a),
} }

binary_op! { bitor_int {
    (Int(a), Int(b)) => Int(a | b),
} }

binary_op! { bitand_int {
    (Int(a), Int(b)) => Int(a & b),
} }

binary_op! { bitxor_int {
    (Int(a), Int(b)) => Int(a ^ b),
} }

binary_op! { shl_int {
    (Int(a), Int(b)) => Int(a.wrapping_shl(*b as u32)),
} }

binary_op! { shr_int {
    (Int(a), Int(b)) => Int(a.wrapping_shr(*b as u32)),
} }

binary_op! { eq_int {
    (Int(a), Int(b)) => Bool(a == b),
} }

binary_op! { ne_int {
    (Int(a), Int(b)) => Bool(a != b),
} }

binary_op! { lt_int {
    (Int(a), Int(b)) => Bool(a < b),
} }

binary_op! { gt_int {
    (Int(a), Int(b)) => Bool(a > b),
} }

binary_op! { le_int {
    (Int(a), Int(b)) => Bool(a <= b),
} }

binary_op! { ge_int {
    (Int(a), Int(b)) => Bool(a >= b),
} }

binary_op! { int_in_list {
    (Int(a), List(list)) => Bool(
        list.items.iter().any(|v| matches!(v, Int(b) if b == a))
    ),
} }

unary_op! { cast_float_to_int {
    Float(x) => Int(*x as i64),
} }

unary_op! { cast_uint_to_int {
    Uint(u) => Int(*u as i64),
} }

unary_op! { cast_int_to_uint {
    Int(i) => Uint(*i as u64),
} }

unary_op! { cast_int_to_bool {
    Int(i) => Bool(*i != 0),
} }

unary_op! { cast_int_list_to_bool {
    List(list) => Bool(!list.items.is_empty()),
} }

const INT: DataType = DataType::INT;
const INT_LIST: DataType = DataType::list_of(DataType::INT);

pub(crate) const OPS: &[Op] = &[
    Op::unary("-", INT, neg_int, INT),
    Op::binary(INT, "+", INT, add_int, INT),
    Op::binary(INT, "-", INT, sub_int, INT),
    Op::binary(INT, "*", INT, mul_int, INT),
    Op::binary(INT, "/", INT, div_int, INT),
    Op::binary(INT, "%", INT, mod_int, INT),

    Op::unary("~", INT, bitnot_int, INT),
    Op::binary(INT, "|", INT, bitor_int, INT),
    Op::binary(INT, "&", INT, bitand_int, INT),
    Op::binary(INT, "^", INT, bitxor_int, INT),
    Op::binary(INT, "<<", INT, shl_int, INT),
    Op::binary(INT, ">>", INT, shr_int, INT),

    Op::binary(INT, "", INT, eq_int, DataType::BOOL),
    Op::binary(INT, "==", INT, eq_int, DataType::BOOL),
    Op::binary(INT, "!=", INT, ne_int, DataType::BOOL),
    Op::binary(INT, "<", INT, lt_int, DataType::BOOL),
    Op::binary(INT, ">", INT, gt_int, DataType::BOOL),
    Op::binary(INT, "<=", INT, le_int, DataType::BOOL),
    Op::binary(INT, ">=", INT, ge_int, DataType::BOOL),

    Op::binary(INT, "in", INT_LIST, int_in_list, DataType::BOOL),

    Op::cast(DataType::FLOAT, cast_float_to_int, INT),
    Op::cast(DataType::UINT, cast_uint_to_int, INT),
    Op::cast(INT, cast_int_to_uint, DataType::UINT),
    Op::cast(INT, cast_int_to_bool, DataType::BOOL),
    Op::cast(INT_LIST, cast_int_list_to_bool, DataType::BOOL),
];
