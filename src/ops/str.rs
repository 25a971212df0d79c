// String operations. Comparison is length + bytes.

use crate::ops::{binary_op, unary_op, Op};
use crate::values::DataType;

binary_op! { eq_str {
    (Str(a), Str(b)) => Bool(a == b),
} }

binary_op! { ne_str {
    (Str(a), Str(b)) => Bool(a != b),
} }

binary_op! { contains_str {
    (Str(big), Str(little)) => Bool(big.contains(little.as_str())),
} }

binary_op! { str_in_list {
    (Str(a), List(list)) => Bool(
        list.items.iter().any(|v| matches!(v, Str(b) if b == a))
    ),
} }

unary_op! { cast_str_to_bool {
    Str(s) => Bool(!s.is_empty()),
} }

unary_op! { cast_str_list_to_bool {
    List(list) => Bool(!list.items.is_empty()),
} }

const STR: DataType = DataType::STR;
const STR_LIST: DataType = DataType::list_of(DataType::STR);

pub(crate) const OPS: &[Op] = &[
    Op::binary(STR, "", STR, eq_str, DataType::BOOL),
    Op::binary(STR, "==", STR, eq_str, DataType::BOOL),
    Op::binary(STR, "!=", STR, ne_str, DataType::BOOL),

    Op::binary(STR, "contains", STR, contains_str, DataType::BOOL),

    Op::binary(STR, "in", STR_LIST, str_in_list, DataType::BOOL),

    Op::cast(STR, cast_str_to_bool, DataType::BOOL),
    Op::cast(STR_LIST, cast_str_list_to_bool, DataType::BOOL),
];
