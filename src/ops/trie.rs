// Trie acceleration: folds a literal IP list into a longest-prefix
// trie at generation time and answers `in` against it.

use crate::ops::{binary_op, Op};
use crate::trie::IpTrie;
use crate::values::{DataType, Value};

fn ip_list_to_trie(value: Value) -> Value {
    match value {
        Value::List(list) => {
            let mut trie = IpTrie::new();
            for item in &list.items {
                if let Value::Ip(ip) = item {
                    trie.add(ip);
                }
            }
            Value::Trie(trie)
        }
        other => other,
    }
}

binary_op! { ip_in_trie {
    (Ip(ip), Trie(trie)) => Bool(trie.contains(ip)),
} }

pub(crate) const OPS: &[Op] = &[
    Op::constructor(DataType::list_of(DataType::IP), ip_list_to_trie,
                    DataType::TRIE),
    Op::binary(DataType::IP, "in", DataType::TRIE, ip_in_trie,
               DataType::BOOL),
];
