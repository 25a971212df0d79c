// End-to-end scenarios against a small IPFIX-flavoured host.

use std::cell::RefCell;
use std::rc::Rc;

use flowfilter::error::ErrorKind;
use flowfilter::filter::Filter;
use flowfilter::ops::trie_ops;
use flowfilter::opts::{DataResult, FieldInfo, Host, Opts};
use flowfilter::values::{ipv4, ipv6, DataType, Ip, Value};

const SRC_IP: u32 = 1;
const DST_PORT: u32 = 2;
const PROTOCOL: u32 = 3;
const BYTES: u32 = 4;
const APP_NAME: u32 = 5;
const ANY_IP: u32 = 6;

#[derive(Clone, Debug, Default)]
struct FlowRecord {
    src_ip: Option<Ip>,
    dst_ip: Option<Ip>,
    dst_port: Option<u64>,
    protocol: Option<u64>,
    bytes: Option<u64>,
    app_name: Option<&'static str>,
}

// Exposes the obvious IPFIX fields; "ip" yields every address in the
// record, one value at a time.
#[derive(Clone, Default)]
struct IpfixHost {
    calls: Rc<RefCell<Vec<u32>>>,
    ip_pos: usize,
}

impl Host for IpfixHost {
    type Record = FlowRecord;

    fn lookup(&self, name: &str) -> Option<FieldInfo> {
        match name {
            "src ip" => Some(FieldInfo::field(SRC_IP, DataType::IP)),
            "dst port" | "port" => Some(FieldInfo::field(DST_PORT, DataType::UINT)),
            "protocol" => Some(FieldInfo::field(PROTOCOL, DataType::UINT)),
            "bytes" => Some(FieldInfo::field(BYTES, DataType::UINT)),
            "name" => Some(FieldInfo::field(APP_NAME, DataType::STR)),
            "ip" => Some(FieldInfo::field(ANY_IP, DataType::IP)),
            _ => None,
        }
    }

    fn const_value(&self, _id: u32) -> Value {
        Value::None
    }

    fn data(&mut self, reset: bool, id: u32, record: &FlowRecord) -> DataResult {
        self.calls.borrow_mut().push(id);
        let uint = |v: Option<u64>| match v {
            Some(v) => DataResult::Value(Value::Uint(v)),
            None => DataResult::NotFound,
        };
        match id {
            SRC_IP => match record.src_ip {
                Some(ip) => DataResult::Value(Value::Ip(ip)),
                None => DataResult::NotFound,
            },
            DST_PORT => uint(record.dst_port),
            PROTOCOL => uint(record.protocol),
            BYTES => uint(record.bytes),
            APP_NAME => match record.app_name {
                Some(name) => DataResult::Value(Value::Str(name.to_owned())),
                None => DataResult::NotFound,
            },
            ANY_IP => {
                let addrs: Vec<Ip> =
                    [record.src_ip, record.dst_ip].iter().flatten().copied().collect();
                if reset {
                    self.ip_pos = 0;
                } else {
                    self.ip_pos += 1;
                }
                match addrs.get(self.ip_pos) {
                    Some(ip) if self.ip_pos + 1 < addrs.len() => {
                        DataResult::More(Value::Ip(*ip))
                    }
                    Some(ip) => DataResult::Value(Value::Ip(*ip)),
                    None => DataResult::NotFound,
                }
            }
            _ => DataResult::NotFound,
        }
    }
}

fn compile(expr: &str) -> (Filter<IpfixHost>, Rc<RefCell<Vec<u32>>>) {
    let host = IpfixHost::default();
    let calls = host.calls.clone();
    let opts = Opts::new(host);
    let filter = Filter::compile(expr, &opts).expect("compile failed");
    (filter, calls)
}

fn matches(expr: &str, record: &FlowRecord) -> bool {
    compile(expr).0.evaluate(record)
}

#[test]
fn src_prefix_and_port() {
    let expr = "src ip 192.168.1.0/24 and dst port 80";
    let record = FlowRecord {
        src_ip: Some(ipv4(192, 168, 1, 42, 32)),
        dst_port: Some(80),
        ..FlowRecord::default()
    };
    assert!(matches(expr, &record));
}

#[test]
fn src_prefix_miss_short_circuits() {
    let expr = "src ip 192.168.1.0/24 and dst port 80";
    let record = FlowRecord {
        src_ip: Some(ipv4(10, 0, 0, 1, 32)),
        dst_port: Some(80),
        ..FlowRecord::default()
    };
    let (mut filter, calls) = compile(expr);
    assert!(!filter.evaluate(&record));
    // the dst port callback must never fire
    assert_eq!(*calls.borrow(), vec![SRC_IP]);
}

#[test]
fn protocol_in_list() {
    let expr = "protocol in [6, 17]";
    let tcp = FlowRecord { protocol: Some(6), ..FlowRecord::default() };
    let icmp = FlowRecord { protocol: Some(1), ..FlowRecord::default() };
    assert!(matches(expr, &tcp));
    assert!(!matches(expr, &icmp));
}

#[test]
fn bytes_with_unit_suffix() {
    let record = FlowRecord { bytes: Some(2048), ..FlowRecord::default() };
    assert!(matches("bytes > 1k", &record));
    assert!(!matches("bytes > 2k", &record));
}

#[test]
fn ip_longest_prefix_over_multivalued_field() {
    let record = FlowRecord {
        src_ip: Some(ipv6([0x2001, 0xdb8, 0xabcd, 0, 0, 0, 0, 1], 128)),
        dst_ip: Some(ipv4(10, 0, 0, 1, 32)),
        ..FlowRecord::default()
    };
    // plain prefix-aware equality on the multi-valued "ip" field
    assert!(matches("ip 2001:db8::/32", &record));
    assert!(matches("ip 10.0.0.0/8", &record));
    assert!(!matches("ip 172.16.0.0/12", &record));
}

#[test]
fn ip_list_membership_with_trie() {
    let host = IpfixHost::default();
    let mut opts = Opts::new(host);
    opts.extend_ops(trie_ops());
    let mut filter =
        Filter::compile("ip in [2001:db8::/32, 192.168.0.0/16]", &opts)
            .expect("compile failed");

    let record = FlowRecord {
        src_ip: Some(ipv6([0x2001, 0xdb8, 0xabcd, 0, 0, 0, 0, 1], 128)),
        ..FlowRecord::default()
    };
    assert!(filter.evaluate(&record));

    let record = FlowRecord {
        src_ip: Some(ipv4(172, 16, 0, 1, 32)),
        ..FlowRecord::default()
    };
    assert!(!filter.evaluate(&record));
}

#[test]
fn application_name_contains() {
    let expr = "name contains \"http\"";
    let proxy = FlowRecord { app_name: Some("http-proxy"), ..FlowRecord::default() };
    let dns = FlowRecord { app_name: Some("dns"), ..FlowRecord::default() };
    assert!(matches(expr, &proxy));
    assert!(!matches(expr, &dns));
}

#[test]
fn any_quantifier_completeness() {
    // the predicate holds iff it holds for some value of the field
    let both = FlowRecord {
        src_ip: Some(ipv4(10, 0, 0, 1, 32)),
        dst_ip: Some(ipv4(192, 168, 1, 7, 32)),
        ..FlowRecord::default()
    };
    assert!(matches("ip == 192.168.1.7", &both));
    assert!(matches("ip == 10.0.0.1", &both));
    assert!(!matches("ip == 172.16.0.1", &both));
}

#[test]
fn malformed_expression_points_at_end_of_input() {
    let expr = "port 80 and";
    let opts = Opts::new(IpfixHost::default());
    let err = Filter::compile(expr, &opts)
        .err()
        .expect("expected a compile error");
    assert_eq!(err.kind, ErrorKind::Syntax);
    let span = err.span.expect("span missing");
    assert_eq!(span.begin, expr.len());
}

#[test]
fn evaluation_order_is_deterministic() {
    let record = FlowRecord {
        src_ip: Some(ipv4(192, 168, 1, 1, 32)),
        dst_ip: Some(ipv4(10, 0, 0, 9, 32)),
        dst_port: Some(80),
        ..FlowRecord::default()
    };
    let (mut filter, calls) = compile("ip 10.0.0.0/8 and dst port 80");
    assert!(filter.evaluate(&record));
    // the ip field is retried until it matches, then the port fires
    assert_eq!(*calls.borrow(), vec![ANY_IP, ANY_IP, DST_PORT]);
}
