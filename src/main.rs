// flowfilter command line: evaluate a filter expression against flow
// records read from a RON file, with ad-hoc field overrides.
//
// The record file holds a list of records, each a map from field name
// to a list of value literals (multi-valued fields list several):
//
//   [
//       { "src ip": ["192.168.1.42"], "dst port": ["80"] },
//       { "proto": ["17"], "dst port": ["53"] },
//   ]

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::process::exit;

use clap::Parser;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use flowfilter::error::FilterError;
use flowfilter::filter::Filter;
use flowfilter::ops::trie_ops;
use flowfilter::opts::{DataResult, FieldInfo, Host, Opts};
use flowfilter::scanner::{Scanner, TokenKind};
use flowfilter::values::Value;

#[derive(Parser)]
#[command(name = "flowfilter")]
#[command(about = "Evaluate a filter expression against flow records")]
struct Cli {
    /// Filter expression, eg. 'src ip 192.168.1.0/24 and dst port 80'
    expression: String,

    /// RON file with a list of records
    records: Option<PathBuf>,

    /// Set a field on every record, eg. --set 'dst port=80'
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    set: Vec<String>,

    /// Print the resolved syntax tree
    #[arg(long)]
    dump_ast: bool,

    /// Accelerate IP lists with the longest-prefix-match trie
    #[arg(long)]
    trie: bool,
}

// Records as read from the file: field names mapped to value literals.
#[derive(Deserialize, Debug, Clone)]
struct RawRecord(HashMap<String, Vec<String>>);

type Record = HashMap<u32, Vec<Value>>;

// A host over name-keyed records: field ids are interned positions,
// types are inferred from the first value seen for each name.
#[derive(Clone, Default)]
struct MapHost {
    fields: HashMap<String, FieldInfo>,
    pos: HashMap<u32, usize>,
}

impl MapHost {
    fn intern(&mut self, name: &str, sample: &Value) -> u32 {
        if let Some(info) = self.fields.get(name) {
            return info.id;
        }
        let id = self.fields.len() as u32;
        self.fields.insert(
            name.to_owned(),
            FieldInfo::field(id, sample.data_type()),
        );
        id
    }
}

impl Host for MapHost {
    type Record = Record;

    fn lookup(&self, name: &str) -> Option<FieldInfo> {
        self.fields.get(name).copied()
    }

    fn const_value(&self, _id: u32) -> Value {
        Value::None
    }

    fn data(&mut self, reset: bool, id: u32, record: &Record) -> DataResult {
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

// Parse one value literal with the filter's own scanner.
fn scan_value(text: &str) -> Result<Value, FilterError> {
    let mut scanner = Scanner::new(text);
    let token = scanner.peek()?;
    scanner.consume();
    let value = match token.kind {
        TokenKind::Literal(value) => value,
        _ => {
            return Err(FilterError::lexical(0, format!(
                "expected a value literal, got {:?}", text)));
        }
    };
    if !scanner.peek()?.is_end() {
        return Err(FilterError::lexical(0, format!(
            "trailing input after value literal in {:?}", text)));
    }
    Ok(value)
}

fn parse_set(arg: &str) -> Result<(String, String), String> {
    lazy_static! {
        static ref SET_REGEX: Regex =
            Regex::new("^([A-Za-z][A-Za-z0-9:@._ -]*?) *= *(.+)$").unwrap();
    }
    match SET_REGEX.captures(arg) {
        Some(captures) => Ok((
            captures.get(1).unwrap().as_str().to_owned(),
            captures.get(2).unwrap().as_str().to_owned(),
        )),
        None => Err(format!("malformed --set argument {:?}", arg)),
    }
}

// Print the error with a caret line under the offending span.
fn report(expression: &str, err: &FilterError) {
    eprintln!("{}", err);
    if let Some(span) = err.span {
        let width = span.end.min(expression.len()).saturating_sub(span.begin);
        eprintln!("  {}", expression);
        eprintln!("  {}{}", " ".repeat(span.begin), "^".repeat(width.max(1)));
    }
}

fn load_records(cli: &Cli) -> Result<Vec<HashMap<String, Vec<Value>>>, String> {
    let mut raw: Vec<RawRecord> = match &cli.records {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|err| format!("{}: {}", path.display(), err))?;
            ron::from_str(&text)
                .map_err(|err| format!("{}: {}", path.display(), err))?
        }
        None => vec![RawRecord(HashMap::new())],
    };

    for arg in &cli.set {
        let (name, text) = parse_set(arg)?;
        for record in &mut raw {
            record.0.insert(name.clone(), vec![text.clone()]);
        }
    }

    let mut records = Vec::new();
    for record in raw {
        let mut fields = HashMap::new();
        for (name, texts) in record.0 {
            let mut values = Vec::new();
            for text in texts {
                values.push(scan_value(&text).map_err(|err| {
                    format!("field {:?}: {}", name, err)
                })?);
            }
            fields.insert(name, values);
        }
        records.push(fields);
    }
    Ok(records)
}

fn main() {
    let cli = Cli::parse();

    let named_records = match load_records(&cli) {
        Ok(records) => records,
        Err(err) => {
            eprintln!("{}", err);
            exit(2);
        }
    };

    // intern every field name so lookups during compile can see the
    // whole schema
    let mut host = MapHost::default();
    for record in &named_records {
        for (name, values) in record {
            if let Some(sample) = values.first() {
                host.intern(name, sample);
            }
        }
    }

    let records: Vec<Record> = named_records
        .iter()
        .map(|record| {
            record
                .iter()
                .filter_map(|(name, values)| {
                    host.lookup(name).map(|info| (info.id, values.clone()))
                })
                .collect()
        })
        .collect();

    let mut opts = Opts::new(host);
    if cli.trie {
        opts.extend_ops(trie_ops());
    }

    let mut filter = match Filter::compile(&cli.expression, &opts) {
        Ok(filter) => filter,
        Err(err) => {
            report(&cli.expression, &err);
            exit(2);
        }
    };

    if cli.dump_ast {
        print!("{}", filter.ast());
    }

    let mut any_match = false;
    for (i, record) in records.iter().enumerate() {
        let verdict = filter.evaluate(record);
        any_match = any_match || verdict;
        println!("record {}: {}", i, if verdict { "match" } else { "no match" });
    }
    exit(if any_match { 0 } else { 1 });
}
