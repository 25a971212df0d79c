// MAC address operations. Equality is exact over all six bytes.

use crate::ops::{binary_op, unary_op, Op};
use crate::values::DataType;

binary_op! { eq_mac {
    (Mac(a), Mac(b)) => Bool(a == b),
} }

binary_op! { ne_mac {
    (Mac(a), Mac(b)) => Bool(a != b),
} }

binary_op! { mac_in_list {
    (Mac(a), List(list)) => Bool(
        list.items.iter().any(|v| matches!(v, Mac(b) if b == a))
    ),
} }

unary_op! { cast_mac_to_bool {
    Mac(_) => Bool(true),
} }

unary_op! { cast_mac_list_to_bool {
    List(list) => Bool(!list.items.is_empty()),
} }

const MAC: DataType = DataType::MAC;
const MAC_LIST: DataType = DataType::list_of(DataType::MAC);

pub(crate) const OPS: &[Op] = &[
    Op::binary(MAC, "", MAC, eq_mac, DataType::BOOL),
    Op::binary(MAC, "==", MAC, eq_mac, DataType::BOOL),
    Op::binary(MAC, "!=", MAC, ne_mac, DataType::BOOL),

    Op::binary(MAC, "in", MAC_LIST, mac_in_list, DataType::BOOL),

    Op::cast(MAC, cast_mac_to_bool, DataType::BOOL),
    Op::cast(MAC_LIST, cast_mac_list_to_bool, DataType::BOOL),
];
