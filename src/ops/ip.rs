// IP address operations. All comparisons are prefix-aware: two
// prefixes match when their first min(prefixA, prefixB) bits agree.

use crate::ops::{binary_op, unary_op, Op};
use crate::values::{ip_prefix_eq, DataType};

binary_op! { eq_ip {
    (Ip(a), Ip(b)) => Bool(ip_prefix_eq(a, b)),
} }

binary_op! { ne_ip {
    (Ip(a), Ip(b)) => Bool(!ip_prefix_eq(a, b)),
} }

binary_op! { ip_in_list {
    (Ip(a), List(list)) => Bool(
        list.items.iter().any(|v| matches!(v, Ip(b) if ip_prefix_eq(b, a)))
    ),
} }

unary_op! { cast_ip_to_bool {
    Ip(ip) => Bool(ip.version != 0),
} }

unary_op! { cast_ip_list_to_bool {
    List(list) => Bool(!list.items.is_empty()),
} }

const IP: DataType = DataType::IP;
const IP_LIST: DataType = DataType::list_of(DataType::IP);

pub(crate) const OPS: &[Op] = &[
    Op::binary(IP, "", IP, eq_ip, DataType::BOOL),
    Op::binary(IP, "==", IP, eq_ip, DataType::BOOL),
    Op::binary(IP, "!=", IP, ne_ip, DataType::BOOL),

    Op::binary(IP, "in", IP_LIST, ip_in_list, DataType::BOOL),

    Op::cast(IP, cast_ip_to_bool, DataType::BOOL),
    Op::cast(IP_LIST, cast_ip_list_to_bool, DataType::BOOL),
];
