// Floating point operations. Equality is approximate, bounded by
// FLOAT_EQ_EPSILON.

use crate::ops::{binary_op, unary_op, Op};
use crate::values::{float_eq, DataType};

unary_op! { neg_float {
    Float(a) => Float(-a),
} }

binary_op! { add_float {
    (Float(a), Float(b)) => Float(a + b),
} }

binary_op! { sub_float {
    (Float(a), Float(b)) => Float(a - b),
} }

binary_op! { mul_float {
    (Float(a), Float(b)) => Float(a * b),
} }

binary_op! { div_float {
    (Float(a), Float(b)) => Float(a / b),
} }

binary_op! { eq_float {
    (Float(a), Float(b)) => Bool(float_eq(*a, *b)),
} }

binary_op! { ne_float {
    (Float(a), Float(b)) => Bool(!float_eq(*a, *b)),
} }

binary_op! { lt_float {
    (Float(a), Float(b)) => Bool(a < b),
} }

binary_op! { gt_float {
    (Float(a), Float(b)) => Bool(a > b),
} }

binary_op! { le_float {
    (Float(a), Float(b)) => Bool(a <= b),
} }

binary_op! { ge_float {
    (Float(a), Float(b)) => Bool(a >= b),
} }

binary_op! { float_in_list {
    (Float(a), List(list)) => Bool(
        list.items.iter().any(|v| matches!(v, Float(b) if float_eq(*a, *b)))
    ),
} }

unary_op! { cast_int_to_float {
    Int(i) => Float(*i as f64),
} }

unary_op! { cast_float_to_bool {
    Float(x) => Bool(*x != 0.0),
} }

unary_op! { cast_float_list_to_bool {
    List(list) => Bool(!list.items.is_empty()),
} }

const FLOAT: DataType = DataType::FLOAT;
const FLOAT_LIST: DataType = DataType::list_of(DataType::FLOAT);

pub(crate) const OPS: &[Op] = &[
    Op::unary("-", FLOAT, neg_float, FLOAT),
    Op::binary(FLOAT, "+", FLOAT, add_float, FLOAT),
    Op::binary(FLOAT, "-", FLOAT, sub_float, FLOAT),
    Op::binary(FLOAT, "*", FLOAT, mul_float, FLOAT),
    Op::binary(FLOAT, "/", FLOAT, div_float, FLOAT),

    Op::binary(FLOAT, "", FLOAT, eq_float, DataType::BOOL),
    Op::binary(FLOAT, "==", FLOAT, eq_float, DataType::BOOL),
    Op::binary(FLOAT, "!=", FLOAT, ne_float, DataType::BOOL),
    Op::binary(FLOAT, "<", FLOAT, lt_float, DataType::BOOL),
    Op::binary(FLOAT, ">", FLOAT, gt_float, DataType::BOOL),
    Op::binary(FLOAT, "<=", FLOAT, le_float, DataType::BOOL),
    Op::binary(FLOAT, ">=", FLOAT, ge_float, DataType::BOOL),

    Op::binary(FLOAT, "in", FLOAT_LIST, float_in_list, DataType::BOOL),

    // no uint cast here: uint comparisons must keep resolving through
    // the uint block, which is searched after this one
    Op::cast(DataType::INT, cast_int_to_float, FLOAT),
    Op::cast(FLOAT, cast_float_to_bool, DataType::BOOL),
    Op::cast(FLOAT_LIST, cast_float_list_to_bool, DataType::BOOL),
];
