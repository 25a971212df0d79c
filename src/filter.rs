// The compiled filter: scanner, parser, resolver and generator run
// once at compile; evaluate walks the eval tree per record.

use crate::ast::AstNode;
use crate::error::FilterError;
use crate::eval::{self, EvalTree};
use crate::opts::{Host, Opts};
use crate::parser;
use crate::scanner::Scanner;
use crate::semantic;

pub struct Filter<H: Host> {
    opts: Opts<H>,
    ast: AstNode,
    eval: EvalTree,
}

impl<H: Host + Clone> Filter<H> {
    // Compile an expression against a snapshot of the options. The
    // caller's options stay untouched and may be reused or dropped.
    pub fn compile(expression: &str, opts: &Opts<H>)
                   -> Result<Filter<H>, FilterError> {
        let opts = opts.clone();

        let mut scanner = Scanner::new(expression);
        let mut ast = parser::parse(&mut scanner)?;
        semantic::resolve_types(&mut ast, &opts)?;
        trace!("resolved ast:\n{}", ast);
        let eval = eval::generate(&mut ast, &opts)?;

        Ok(Filter { opts, ast, eval })
    }
}

impl<H: Host> Filter<H> {
    // Does this record match? Not safe to share across threads: the
    // eval tree mutates its value slots in place.
    pub fn evaluate(&mut self, record: &H::Record) -> bool {
        let Filter { opts, eval, .. } = self;
        let host = opts.host_mut();
        let mut data_cb = |reset: bool, id: u32| host.data(reset, id, record);
        eval.evaluate(&mut data_cb)
    }

    // The resolved syntax tree, for diagnostics.
    pub fn ast(&self) -> &AstNode {
        &self.ast
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::trie_ops;
    use crate::opts::{DataResult, FieldInfo};
    use crate::values::{ipv4, DataType, Value};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use pretty_assertions::assert_eq;

    type Record = HashMap<u32, Vec<Value>>;

    const PORT: u32 = 1;
    const PROTO: u32 = 2;
    const IP: u32 = 3;
    const NAME: u32 = 4;
    const TCPFLAGS: u32 = 5;
    const LIMIT: u32 = 6;

    #[derive(Clone, Default)]
    struct TestHost {
        // shared with clones, so tests can inspect callback order
        calls: Rc<RefCell<Vec<u32>>>,
        pos: HashMap<u32, usize>,
    }

    impl Host for TestHost {
        type Record = Record;

        fn lookup(&self, name: &str) -> Option<FieldInfo> {
            match name {
                "port" | "dst port" => Some(FieldInfo::field(PORT, DataType::UINT)),
                "proto" => Some(FieldInfo::field(PROTO, DataType::UINT)),
                "ip" | "src ip" => Some(FieldInfo::field(IP, DataType::IP)),
                "name" => Some(FieldInfo::field(NAME, DataType::STR)),
                "tcpflags" => Some(FieldInfo::field(TCPFLAGS, DataType::FLAGS)),
                "limit" => Some(FieldInfo::constant(LIMIT, DataType::UINT)),
                _ => None,
            }
        }

        fn const_value(&self, id: u32) -> Value {
            assert_eq!(id, LIMIT);
            Value::Uint(1024)
        }

        fn data(&mut self, reset: bool, id: u32, record: &Record) -> DataResult {
            self.calls.borrow_mut().push(id);
            let values = match record.get(&id) {
                Some(values) if !values.is_empty() => values,
                _ => return DataResult::NotFound,
            };
            let pos = if reset {
                0
            } else {
                self.pos.get(&id).copied().unwrap_or(0) + 1
            };
            self.pos.insert(id, pos);
            match values.get(pos) {
                Some(value) if pos + 1 < values.len() => {
                    DataResult::More(value.clone())
                }
                Some(value) => DataResult::Value(value.clone()),
                None => DataResult::NotFound,
            }
        }
    }

    fn record(fields: &[(u32, Vec<Value>)]) -> Record {
        fields.iter().cloned().collect()
    }

    fn compile(expr: &str) -> (Filter<TestHost>, Rc<RefCell<Vec<u32>>>) {
        let host = TestHost::default();
        let calls = host.calls.clone();
        let opts = Opts::new(host);
        let filter = Filter::compile(expr, &opts).expect("compile failed");
        (filter, calls)
    }

    fn matches(expr: &str, rec: &Record) -> bool {
        compile(expr).0.evaluate(rec)
    }

    #[test]
    fn test_simple_match() {
        let rec = record(&[(PORT, vec![Value::Uint(80)])]);
        assert!(matches("port == 80", &rec));
        assert!(!matches("port == 81", &rec));
        assert!(matches("port 80", &rec));
        assert!(matches("port != 81", &rec));
    }

    #[test]
    fn test_const_expression_makes_no_data_calls() {
        let (mut filter, calls) = compile("1 + 1 == 2");
        assert!(filter.evaluate(&record(&[])));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_and_short_circuits() {
        let rec = record(&[
            (PROTO, vec![Value::Uint(17)]),
            (PORT, vec![Value::Uint(80)]),
        ]);
        let (mut filter, calls) = compile("proto == 6 and port == 80");
        assert!(!filter.evaluate(&rec));
        assert_eq!(*calls.borrow(), vec![PROTO]);
    }

    #[test]
    fn test_or_short_circuits() {
        let rec = record(&[
            (PROTO, vec![Value::Uint(6)]),
            (PORT, vec![Value::Uint(80)]),
        ]);
        let (mut filter, calls) = compile("proto == 6 or port == 80");
        assert!(filter.evaluate(&rec));
        assert_eq!(*calls.borrow(), vec![PROTO]);
    }

    #[test]
    fn test_any_quantifier_over_multiple_values() {
        let rec = record(&[(PORT, vec![
            Value::Uint(21), Value::Uint(80), Value::Uint(443),
        ])]);
        assert!(matches("port == 80", &rec));
        assert!(matches("port == 443", &rec));
        assert!(!matches("port == 8080", &rec));

        // every value is offered before giving up
        let (mut filter, calls) = compile("port == 8080");
        assert!(!filter.evaluate(&rec));
        assert_eq!(*calls.borrow(), vec![PORT, PORT, PORT]);
    }

    #[test]
    fn test_missing_field_collapses_to_false() {
        let rec = record(&[]);
        assert!(!matches("port == 80", &rec));
        // the negation of a collapsed quantifier is true
        assert!(matches("not port == 80", &rec));
        // and the other side of an or is still tried
        let rec = record(&[(PROTO, vec![Value::Uint(6)])]);
        assert!(matches("port == 80 or proto == 6", &rec));
    }

    #[test]
    fn test_exists() {
        let rec = record(&[(PORT, vec![Value::Uint(80)])]);
        assert!(matches("exists port", &rec));
        assert!(!matches("exists proto", &rec));
    }

    #[test]
    fn test_both_sides_multi_valued() {
        let rec = record(&[
            (PORT, vec![Value::Uint(21), Value::Uint(80)]),
            (PROTO, vec![Value::Uint(6)]),
        ]);
        assert!(matches("port == 80 and proto == 6", &rec));
        assert!(!matches("port == 80 and proto == 17", &rec));
    }

    #[test]
    fn test_const_identifier() {
        let rec = record(&[(PORT, vec![Value::Uint(2048)])]);
        assert!(matches("port > limit", &rec));
        assert!(!matches("port < limit", &rec));
    }

    #[test]
    fn test_unit_suffix() {
        let rec = record(&[(PORT, vec![Value::Uint(2048)])]);
        assert!(matches("port > 1k", &rec));
        assert!(!matches("port > 2k", &rec));
    }

    #[test]
    fn test_in_list() {
        let rec = record(&[(PROTO, vec![Value::Uint(6)])]);
        assert!(matches("proto in [6, 17]", &rec));
        let rec = record(&[(PROTO, vec![Value::Uint(1)])]);
        assert!(!matches("proto in [6, 17]", &rec));
    }

    #[test]
    fn test_string_contains() {
        let rec = record(&[(NAME, vec![Value::Str("http-proxy".into())])]);
        assert!(matches("name contains \"http\"", &rec));
        let rec = record(&[(NAME, vec![Value::Str("dns".into())])]);
        assert!(!matches("name contains \"http\"", &rec));
    }

    #[test]
    fn test_flags_masked_comparison() {
        // SYN|ACK against the SYN mask
        let rec = record(&[(TCPFLAGS, vec![Value::Uint(0b0001_0010)])]);
        assert!(matches("tcpflags 0x02", &rec));
        assert!(!matches("tcpflags 0x04", &rec));
    }

    #[test]
    fn test_ip_prefix_match() {
        let rec = record(&[(IP, vec![Value::Ip(ipv4(192, 168, 1, 42, 32))])]);
        assert!(matches("src ip 192.168.1.0/24", &rec));
        assert!(!matches("src ip 10.0.0.0/8", &rec));
    }

    #[test]
    fn test_ip_list_with_trie_acceleration() {
        let host = TestHost::default();
        let mut opts = Opts::new(host);
        opts.extend_ops(trie_ops());
        let mut filter =
            Filter::compile("ip in [192.168.1.0/24, 10.0.0.0/8]", &opts)
                .expect("compile failed");

        let rec = record(&[(IP, vec![Value::Ip(ipv4(10, 1, 2, 3, 32))])]);
        assert!(filter.evaluate(&rec));
        let rec = record(&[(IP, vec![Value::Ip(ipv4(172, 16, 0, 1, 32))])]);
        assert!(!filter.evaluate(&rec));
    }

    #[test]
    fn test_ip_list_without_trie() {
        let rec = record(&[(IP, vec![Value::Ip(ipv4(10, 1, 2, 3, 32))])]);
        assert!(matches("ip in [192.168.1.0/24, 10.0.0.0/8]", &rec));
    }

    #[test]
    fn test_filter_is_reusable() {
        let (mut filter, _) = compile("port == 80");
        let hit = record(&[(PORT, vec![Value::Uint(80)])]);
        let miss = record(&[(PORT, vec![Value::Uint(22)])]);
        assert!(filter.evaluate(&hit));
        assert!(!filter.evaluate(&miss));
        assert!(filter.evaluate(&hit));
    }

    #[test]
    fn test_arithmetic_and_precedence() {
        let rec = record(&[(PORT, vec![Value::Uint(80)])]);
        assert!(matches("port * 2 == 160", &rec));
        assert!(matches("port + 1 * 2 == 82", &rec));
        assert!(matches("(port + 1) * 2 == 162", &rec));
        assert!(matches("port - 79 == 1", &rec));
    }

    #[test]
    fn test_bitwise_operators() {
        let rec = record(&[(PORT, vec![Value::Uint(0b1010)])]);
        assert!(matches("port & 0b10 == 0b10", &rec));
        assert!(matches("port | 0b101 == 0b1111", &rec));
        assert!(matches("port >> 1 == 0b101", &rec));
    }

    #[test]
    fn test_compile_error_is_latched_before_evaluation() {
        let opts = Opts::new(TestHost::default());
        let err = Filter::compile("port 80 and", &opts)
            .err()
            .expect("expected a compile error");
        assert_eq!(err.msg, "unexpected end of input");
    }
}
