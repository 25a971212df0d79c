// Longest-match tokeniser.
//
// Every recogniser runs against a copy of the cursor; the successful
// one with the longest lexeme wins, ties going to the recogniser
// declared first. When nothing succeeds, the error that advanced
// furthest is surfaced. The scanner keeps one token of lookahead.

use chrono::{FixedOffset, Local, LocalResult, NaiveDate, TimeZone, Utc};

use crate::error::{FilterError, Span};
use crate::values::{Ip, Mac, Value};

// Strings treated as symbols. Declaration order breaks length ties.
pub const SYMBOLS: &[&str] = &[
    "~", "not", "*", "/", "+", "-", "|", "&", "^", "%",
    "and", "or", "in", "contains", "exists", "[", "]", "(", ")", ",",
    "<", ">", "==", "!=", ">=", "<=", "<<", ">>",
    "out", "ingress", "egress", "src", "dst",
];

// Suffixes recognised on number literals, longest match first. Sizes
// are 1024-based, times are nanosecond-based.
const NUMBER_UNITS: &[(&str, u64)] = &[
    ("B", 1),
    ("k", 1 << 10),
    ("M", 1 << 20),
    ("G", 1 << 30),
    ("T", 1 << 40),
    ("ns", 1),
    ("us", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60 * 1_000_000_000),
    ("h", 60 * 60 * 1_000_000_000),
    ("d", 24 * 60 * 60 * 1_000_000_000),
];

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Literal(Value),
    Symbol(&'static str),
    Name(String),
    End,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn is_symbol(&self, symbol: &str) -> bool {
        matches!(&self.kind, TokenKind::Symbol(s) if *s == symbol)
    }

    pub fn is_end(&self) -> bool {
        matches!(self.kind, TokenKind::End)
    }
}

// A symbol counts as non-word if it contains no letters or digits.
// Two adjacent tokens with no whitespace between them are only legal
// when one of them is a non-word symbol; this is what keeps `port80`
// a single name while `port>80` splits.
fn is_nonword_symbol(symbol: &str) -> bool {
    !symbol.bytes().any(|b| b.is_ascii_alphanumeric())
}


// A byte cursor. Reads past the end yield 0, which no recogniser
// accepts, so end-of-input falls out of the normal match paths.
#[derive(Copy, Clone)]
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        *self.bytes.get(self.pos + offset).unwrap_or(&0)
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn starts_with(&self, s: &str) -> bool {
        self.bytes[self.pos.min(self.bytes.len())..].starts_with(s.as_bytes())
    }
}

// matched-but-malformed is Some(Err); no match at all is None
type ScanResult = Option<Result<Token, FilterError>>;

fn literal(value: Value, begin: usize, end: usize) -> Token {
    Token {
        kind: TokenKind::Literal(value),
        span: Span::new(begin, end),
    }
}

fn xdigit_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => 10 + b - b'a',
        _ => 10 + b - b'A',
    }
}

fn scan_symbol(cur: &mut Cursor) -> ScanResult {
    let mut best: Option<&'static str> = None;
    for &symbol in SYMBOLS {
        if cur.starts_with(symbol) && best.map_or(true, |b| b.len() < symbol.len()) {
            best = Some(symbol);
        }
    }
    let symbol = best?;
    let begin = cur.pos;
    cur.pos += symbol.len();
    Some(Ok(Token {
        kind: TokenKind::Symbol(symbol),
        span: Span::new(begin, cur.pos),
    }))
}

// Up to three decimal digits; the caller checks the range.
fn scan_ipv4_octet(cur: &mut Cursor) -> Option<u16> {
    if !cur.peek().is_ascii_digit() {
        return None;
    }
    let mut value: u16 = 0;
    for _ in 0..3 {
        if !cur.peek().is_ascii_digit() {
            break;
        }
        value = value * 10 + (cur.peek() - b'0') as u16;
        cur.bump();
    }
    Some(value)
}

fn scan_ipv4(cur: &mut Cursor) -> ScanResult {
    if !cur.peek().is_ascii_digit() {
        return None;
    }
    let begin = cur.pos;
    let mut addr = [0u8; 16];

    for i in 0..4 {
        match scan_ipv4_octet(cur) {
            None => {
                return Some(Err(FilterError::lexical(
                    cur.pos, "invalid octet value in ipv4 address")));
            }
            Some(value) if value > 255 => {
                return Some(Err(FilterError::lexical(
                    cur.pos, "octet value > 255 in ipv4 address")));
            }
            Some(value) => addr[i] = value as u8,
        }
        if i < 3 {
            if cur.peek() != b'.' {
                return Some(Err(FilterError::lexical(
                    cur.pos, "expected . while scanning ipv4 address")));
            }
            cur.bump();
        }
    }

    let mut prefix: u16 = 32;
    if cur.peek() == b'/' {
        cur.bump();
        if !cur.peek().is_ascii_digit() {
            return Some(Err(FilterError::lexical(
                cur.pos, "expected prefix length after / in ipv4 address")));
        }
        prefix = (cur.peek() - b'0') as u16;
        cur.bump();
        if cur.peek().is_ascii_digit() {
            prefix = prefix * 10 + (cur.peek() - b'0') as u16;
            cur.bump();
        }
        if prefix > 32 || cur.peek().is_ascii_digit() {
            return Some(Err(FilterError::lexical(
                cur.pos, "prefix length > 32 in ipv4 address")));
        }
    }

    let ip = Ip { version: 4, prefix: prefix as u8, addr };
    Some(Ok(literal(Value::Ip(ip), begin, cur.pos)))
}

// Up to four hex digits, stored as two network-order bytes.
fn scan_ipv6_hextet(cur: &mut Cursor) -> Option<[u8; 2]> {
    if !cur.peek().is_ascii_hexdigit() {
        return None;
    }
    let mut value: u16 = 0;
    for _ in 0..4 {
        if !cur.peek().is_ascii_hexdigit() {
            break;
        }
        value = value * 16 + xdigit_value(cur.peek()) as u16;
        cur.bump();
    }
    Some([(value >> 8) as u8, value as u8])
}

fn scan_ipv6(cur: &mut Cursor) -> ScanResult {
    if !cur.peek().is_ascii_hexdigit() && cur.peek() != b':' {
        return None;
    }
    let begin = cur.pos;
    let mut addr = [0u8; 16];
    // byte index where :: zero-fills, if seen
    let mut double_colon: Option<usize> = None;
    let mut n = 0;

    if cur.peek() == b':' && cur.peek_at(1) == b':' {
        double_colon = Some(0);
        cur.bump();
        cur.bump();
    }

    loop {
        match scan_ipv6_hextet(cur) {
            None => {
                if double_colon != Some(n) {
                    return Some(Err(FilterError::lexical(
                        cur.pos, "expected hextet in ipv6 address")));
                }
                // the address ends with ::
                break;
            }
            Some(bytes) => {
                addr[n] = bytes[0];
                addr[n + 1] = bytes[1];
                n += 2;
            }
        }
        if n == 16 {
            break;
        }
        if cur.peek() != b':' {
            if double_colon.is_none() {
                return Some(Err(FilterError::lexical(
                    cur.pos, "expected : in ipv6 address")));
            }
            // a :: appeared earlier, short form ends here
            break;
        }
        cur.bump();
        if cur.peek() == b':' {
            if double_colon.is_some() {
                return Some(Err(FilterError::lexical(
                    cur.pos, "multiple :: in ipv6 address")));
            }
            double_colon = Some(n);
            cur.bump();
        }
    }

    if let Some(dc) = double_colon {
        // slide the tail to the end and zero-fill the gap
        let tail = n - dc;
        addr.copy_within(dc..n, 16 - tail);
        for byte in &mut addr[dc..16 - tail] {
            *byte = 0;
        }
    }

    let mut prefix: u16 = 128;
    if cur.peek() == b'/' {
        cur.bump();
        if !cur.peek().is_ascii_digit() {
            return Some(Err(FilterError::lexical(
                cur.pos, "expected prefix length after / in ipv6 address")));
        }
        prefix = 0;
        for _ in 0..3 {
            if !cur.peek().is_ascii_digit() {
                break;
            }
            prefix = prefix * 10 + (cur.peek() - b'0') as u16;
            cur.bump();
        }
        if prefix > 128 || cur.peek().is_ascii_digit() {
            return Some(Err(FilterError::lexical(
                cur.pos, "prefix length > 128 in ipv6 address")));
        }
    }

    let ip = Ip { version: 6, prefix: prefix as u8, addr };
    Some(Ok(literal(Value::Ip(ip), begin, cur.pos)))
}

fn scan_mac(cur: &mut Cursor) -> ScanResult {
    if !cur.peek().is_ascii_hexdigit() {
        return None;
    }
    let begin = cur.pos;
    let mut addr = [0u8; 6];

    for i in 0..6 {
        if !cur.peek().is_ascii_hexdigit() || !cur.peek_at(1).is_ascii_hexdigit() {
            return Some(Err(FilterError::lexical(
                cur.pos, "expected hex in mac address")));
        }
        addr[i] = xdigit_value(cur.peek()) * 16 + xdigit_value(cur.peek_at(1));
        cur.bump();
        cur.bump();
        if i < 5 {
            if cur.peek() != b':' {
                return Some(Err(FilterError::lexical(
                    cur.pos, "expected : in mac address")));
            }
            cur.bump();
        }
    }

    Some(Ok(literal(Value::Mac(Mac { addr }), begin, cur.pos)))
}

fn scan_decimal(cur: &mut Cursor) -> Option<u64> {
    if !cur.peek().is_ascii_digit() {
        return None;
    }
    let mut value: u64 = 0;
    while cur.peek().is_ascii_digit() {
        value = value.wrapping_mul(10).wrapping_add((cur.peek() - b'0') as u64);
        cur.bump();
    }
    Some(value)
}

enum ScannedZone {
    Utc,
    Offset(i32),
    LocalTime,
}

fn scan_datetime(cur: &mut Cursor) -> ScanResult {
    let begin = cur.pos;

    let year = scan_decimal(cur)?;
    if cur.peek() != b'-' {
        return None;
    }
    cur.bump();
    let month = scan_decimal(cur)?;
    if cur.peek() != b'-' {
        return None;
    }
    cur.bump();
    let day = scan_decimal(cur)?;

    let mut hour = 0;
    let mut min = 0;
    let mut sec = 0;
    if cur.peek() == b'T' {
        cur.bump();
        hour = scan_decimal(cur)?;
        if cur.peek() != b':' {
            return None;
        }
        cur.bump();
        min = scan_decimal(cur)?;
        if cur.peek() == b':' {
            cur.bump();
            sec = scan_decimal(cur)?;
        }
    }

    let zone = if cur.peek() == b'Z' {
        cur.bump();
        ScannedZone::Utc
    } else if cur.peek() == b'+' || cur.peek() == b'-' {
        let sign: i32 = if cur.peek() == b'-' { -1 } else { 1 };
        cur.bump();
        let offset_hour = scan_decimal(cur)?;
        let mut offset_min = 0;
        if cur.peek() == b':' {
            cur.bump();
            offset_min = scan_decimal(cur)?;
        }
        ScannedZone::Offset(sign * (offset_hour * 3600 + offset_min * 60) as i32)
    } else {
        ScannedZone::LocalTime
    };

    let invalid = || {
        Some(Err(FilterError::lexical(cur.pos, "invalid datetime")))
    };

    let date = match NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32) {
        Some(date) => date,
        None => return invalid(),
    };
    let naive = match date.and_hms_opt(hour as u32, min as u32, sec as u32) {
        Some(naive) => naive,
        None => return invalid(),
    };

    let epoch_secs = match zone {
        ScannedZone::Utc => Utc.from_utc_datetime(&naive).timestamp(),
        ScannedZone::Offset(secs) => {
            let offset = match FixedOffset::east_opt(secs) {
                Some(offset) => offset,
                None => return invalid(),
            };
            match offset.from_local_datetime(&naive) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                    dt.timestamp()
                }
                LocalResult::None => return invalid(),
            }
        }
        ScannedZone::LocalTime => match Local.from_local_datetime(&naive) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                dt.timestamp()
            }
            LocalResult::None => return invalid(),
        },
    };
    if epoch_secs < 0 {
        return invalid();
    }

    let epoch_nanos = (epoch_secs as u64).wrapping_mul(1_000_000_000);
    Some(Ok(literal(Value::Uint(epoch_nanos), begin, cur.pos)))
}

fn scan_number(cur: &mut Cursor) -> ScanResult {
    let begin = cur.pos;

    // hex literal
    if cur.starts_with("0x") {
        cur.bump();
        cur.bump();
        if !cur.peek().is_ascii_hexdigit() {
            return Some(Err(FilterError::lexical(
                cur.pos, "expected hex digit while scanning hex literal")));
        }
        let mut value: u64 = 0;
        while cur.peek().is_ascii_hexdigit() {
            value = value.wrapping_mul(16)
                .wrapping_add(xdigit_value(cur.peek()) as u64);
            cur.bump();
        }
        return Some(Ok(literal(Value::Int(value as i64), begin, cur.pos)));
    }

    // binary literal
    if cur.starts_with("0b") {
        cur.bump();
        cur.bump();
        if cur.peek() != b'0' && cur.peek() != b'1' {
            return Some(Err(FilterError::lexical(
                cur.pos, "expected bin digit while scanning bin literal")));
        }
        let mut value: u64 = 0;
        while cur.peek() == b'0' || cur.peek() == b'1' {
            value = value.wrapping_mul(2).wrapping_add((cur.peek() - b'0') as u64);
            cur.bump();
        }
        return Some(Ok(literal(Value::Int(value as i64), begin, cur.pos)));
    }

    let mut is_float = false;
    let mut any_digit = false;

    let mut value: u64 = 0;
    while cur.peek().is_ascii_digit() {
        any_digit = true;
        value = value.wrapping_mul(10).wrapping_add((cur.peek() - b'0') as u64);
        cur.bump();
    }

    // fraction
    let mut fraction = 0.0;
    if cur.peek() == b'.' {
        is_float = true;
        let mut divisor = 10.0;
        cur.bump();
        while cur.peek().is_ascii_digit() {
            any_digit = true;
            fraction += (cur.peek() - b'0') as f64 / divisor;
            divisor *= 10.0;
            cur.bump();
        }
    }

    if !any_digit {
        return None;
    }

    // exponent
    let mut exp: f64 = 0.0;
    if cur.peek() == b'e' || cur.peek() == b'E' {
        is_float = true;
        cur.bump();
        let mut exp_sign = 1.0;
        if cur.peek() == b'+' || cur.peek() == b'-' {
            if cur.peek() == b'-' {
                exp_sign = -1.0;
            }
            cur.bump();
        }
        if !cur.peek().is_ascii_digit() {
            return Some(Err(FilterError::lexical(
                cur.pos, "expected digit in exponent")));
        }
        while cur.peek().is_ascii_digit() {
            exp = exp * 10.0 + (cur.peek() - b'0') as f64;
            cur.bump();
        }
        exp *= exp_sign;
    }

    // unit suffix, longest match
    let mut scale: u64 = 1;
    let mut best_unit: Option<&(&str, u64)> = None;
    for unit in NUMBER_UNITS {
        if cur.starts_with(unit.0)
            && best_unit.map_or(true, |b| b.0.len() < unit.0.len()) {
            best_unit = Some(unit);
        }
    }
    if let Some((suffix, unit_scale)) = best_unit {
        scale = *unit_scale;
        cur.pos += suffix.len();
    }

    // unsigned suffix
    let mut is_unsigned = false;
    if cur.peek() == b'u' || cur.peek() == b'U' {
        if is_float {
            return Some(Err(FilterError::lexical(
                cur.pos, "float cannot be unsigned")));
        }
        is_unsigned = true;
        cur.bump();
    }

    let value = if is_unsigned {
        Value::Uint(value.wrapping_mul(scale))
    } else if is_float {
        Value::Float((value as f64 + fraction) * 10f64.powf(exp) * scale as f64)
    } else {
        Value::Int((value as i64).wrapping_mul(scale as i64))
    };
    Some(Ok(literal(value, begin, cur.pos)))
}

fn scan_string(cur: &mut Cursor) -> ScanResult {
    if cur.peek() != b'"' {
        return None;
    }
    let begin = cur.pos;
    cur.bump();

    let mut bytes = Vec::new();
    loop {
        match cur.peek() {
            b'"' => {
                cur.bump();
                break;
            }
            0 => {
                return Some(Err(FilterError::lexical(
                    cur.pos, "unterminated string")));
            }
            b'\\' => {
                cur.bump();
                let b = cur.peek();
                match b {
                    0 => {
                        return Some(Err(FilterError::lexical(
                            cur.pos, "unterminated string")));
                    }
                    b't' => {
                        bytes.push(b'\t');
                        cur.bump();
                    }
                    b'n' => {
                        bytes.push(b'\n');
                        cur.bump();
                    }
                    b'r' => {
                        bytes.push(b'\r');
                        cur.bump();
                    }
                    b'"' => {
                        bytes.push(b'"');
                        cur.bump();
                    }
                    b'\\' => {
                        bytes.push(b'\\');
                        cur.bump();
                    }
                    b'0'..=b'7' if (b'0'..=b'7').contains(&cur.peek_at(1))
                        && (b'0'..=b'7').contains(&cur.peek_at(2)) => {
                        // three octal digits, eg. \042; overlong
                        // values truncate to a byte
                        let value = (b - b'0') as u16 * 64
                            + (cur.peek_at(1) - b'0') as u16 * 8
                            + (cur.peek_at(2) - b'0') as u16;
                        bytes.push(value as u8);
                        cur.pos += 3;
                    }
                    b'x' if cur.peek_at(1).is_ascii_hexdigit()
                        && cur.peek_at(2).is_ascii_hexdigit() => {
                        // two hex digits, eg. \xff
                        bytes.push(xdigit_value(cur.peek_at(1)) * 16
                                   + xdigit_value(cur.peek_at(2)));
                        cur.pos += 3;
                    }
                    _ => {
                        // unknown escape passes through with the backslash
                        bytes.push(b'\\');
                    }
                }
            }
            b => {
                bytes.push(b);
                cur.bump();
            }
        }
    }

    let s = String::from_utf8_lossy(&bytes).into_owned();
    Some(Ok(literal(Value::Str(s), begin, cur.pos)))
}

fn scan_bool(cur: &mut Cursor) -> ScanResult {
    let begin = cur.pos;
    if cur.starts_with("true") {
        cur.pos += 4;
        Some(Ok(literal(Value::Bool(true), begin, cur.pos)))
    } else if cur.starts_with("false") {
        cur.pos += 5;
        Some(Ok(literal(Value::Bool(false), begin, cur.pos)))
    } else {
        None
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b':' | b'@' | b'-' | b'.' | b'_')
}

fn scan_name(cur: &mut Cursor) -> ScanResult {
    if !cur.peek().is_ascii_alphabetic() {
        return None;
    }
    let begin = cur.pos;
    cur.bump();
    while is_name_byte(cur.peek()) {
        cur.bump();
    }
    let name = String::from_utf8_lossy(&cur.bytes[begin..cur.pos]).into_owned();
    Some(Ok(Token {
        kind: TokenKind::Name(name),
        span: Span::new(begin, cur.pos),
    }))
}

type ScanFn = fn(&mut Cursor) -> ScanResult;

const SCAN_FNS: &[ScanFn] = &[
    scan_symbol,
    scan_ipv4,
    scan_ipv6,
    scan_mac,
    scan_datetime,
    scan_number,
    scan_string,
    scan_bool,
    scan_name,
];

// Run every recogniser at `pos` and pick the longest success; failing
// that, remember the error that got furthest.
fn scan_token(bytes: &[u8], pos: usize)
              -> (Option<Token>, Option<FilterError>) {
    if pos >= bytes.len() {
        let token = Token {
            kind: TokenKind::End,
            span: Span::new(pos, pos),
        };
        return (Some(token), None);
    }

    let mut best_token: Option<Token> = None;
    let mut best_err: Option<(FilterError, usize)> = None;
    for scan in SCAN_FNS {
        let mut cur = Cursor { bytes, pos };
        match scan(&mut cur) {
            None => {}
            Some(Ok(token)) => {
                let len = token.span.end - token.span.begin;
                if best_token.as_ref()
                    .map_or(true, |b| b.span.end - b.span.begin < len) {
                    best_token = Some(token);
                }
            }
            Some(Err(err)) => {
                if best_err.as_ref().map_or(true, |(_, at)| *at < cur.pos) {
                    best_err = Some((err, cur.pos));
                }
            }
        }
    }
    (best_token, best_err.map(|(err, _)| err))
}


pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    token: Option<Token>,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Scanner<'a> {
        Scanner { input, pos: 0, token: None }
    }

    // Return the next token without consuming it. Scans at most once;
    // repeated peeks return the cached token.
    pub fn peek(&mut self) -> Result<Token, FilterError> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }

        let bytes = self.input.as_bytes();
        let mut pos = self.pos;
        while bytes.get(pos).map_or(false, |b| b.is_ascii_whitespace()) {
            pos += 1;
        }

        let (token, err) = scan_token(bytes, pos);
        let token = match token {
            Some(token) => token,
            None => {
                return Err(err.unwrap_or_else(|| {
                    FilterError::lexical(pos, "invalid syntax")
                }));
            }
        };

        // Valid adjacencies:
        //   <any token><whitespace or end>
        //   <non-word symbol><anything>
        //   <anything><non-word symbol>
        let end = token.span.end;
        let after = *bytes.get(end).unwrap_or(&0);
        let mut valid = after == 0 || after.is_ascii_whitespace();
        if !valid {
            if let TokenKind::Symbol(s) = &token.kind {
                valid = is_nonword_symbol(s);
            }
        }
        if !valid {
            let (next, _) = scan_token(bytes, end);
            valid = matches!(
                next,
                Some(Token { kind: TokenKind::Symbol(s), .. })
                    if is_nonword_symbol(s)
            );
        }
        if !valid {
            return Err(err.unwrap_or_else(|| {
                FilterError::lexical(end, "invalid syntax")
            }));
        }

        self.pos = end;
        self.token = Some(token.clone());
        Ok(token)
    }

    // Invalidate the cached token so the next peek scans again.
    pub fn consume(&mut self) {
        self.token = None;
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::ipv4;
    use pretty_assertions::assert_eq;

    fn scan_all(input: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::new(input);
        let mut kinds = Vec::new();
        loop {
            let token = scanner.peek().expect("scan failed");
            scanner.consume();
            if token.is_end() {
                return kinds;
            }
            kinds.push(token.kind);
        }
    }

    fn scan_one(input: &str) -> TokenKind {
        let mut kinds = scan_all(input);
        assert_eq!(kinds.len(), 1, "expected a single token in {:?}", input);
        kinds.pop().unwrap()
    }

    fn scan_err(input: &str) -> FilterError {
        let mut scanner = Scanner::new(input);
        loop {
            match scanner.peek() {
                Err(err) => return err,
                Ok(token) if token.is_end() => {
                    panic!("expected a scan error in {:?}", input)
                }
                Ok(_) => scanner.consume(),
            }
        }
    }

    fn lit(value: Value) -> TokenKind {
        TokenKind::Literal(value)
    }

    #[test]
    fn test_numbers() {
        assert_eq!(scan_one("80"), lit(Value::Int(80)));
        assert_eq!(scan_one("80u"), lit(Value::Uint(80)));
        assert_eq!(scan_one("1k"), lit(Value::Int(1024)));
        assert_eq!(scan_one("2M"), lit(Value::Int(2 * 1024 * 1024)));
        assert_eq!(scan_one("1.5"), lit(Value::Float(1.5)));
        assert_eq!(scan_one("2e3"), lit(Value::Float(2000.0)));
        assert_eq!(scan_one("2.5e-1"), lit(Value::Float(0.25)));
        assert_eq!(scan_one("0x1f"), lit(Value::Int(31)));
        assert_eq!(scan_one("0b101"), lit(Value::Int(5)));
        assert_eq!(scan_one("10ms"), lit(Value::Int(10_000_000)));
        assert_eq!(scan_one("1h"), lit(Value::Int(3_600_000_000_000)));
        assert_eq!(scan_one("5s"), lit(Value::Int(5_000_000_000)));
    }

    #[test]
    fn test_unsigned_float_is_an_error() {
        let err = scan_err("1.5u");
        assert_eq!(err.msg, "float cannot be unsigned");
    }

    #[test]
    fn test_ipv4() {
        assert_eq!(scan_one("192.168.1.0/24"),
                   lit(Value::Ip(ipv4(192, 168, 1, 0, 24))));
        // prefix defaults to 32
        assert_eq!(scan_one("10.0.0.1"), lit(Value::Ip(ipv4(10, 0, 0, 1, 32))));

        let err = scan_err("256.1.1.1");
        assert_eq!(err.msg, "octet value > 255 in ipv4 address");
        let err = scan_err("1.2.3.4/33");
        assert_eq!(err.msg, "prefix length > 32 in ipv4 address");
    }

    #[test]
    fn test_ipv6() {
        let kind = scan_one("2001:db8::/32");
        match kind {
            TokenKind::Literal(Value::Ip(ip)) => {
                assert_eq!(ip.version, 6);
                assert_eq!(ip.prefix, 32);
                assert_eq!(&ip.addr[..4], &[0x20, 0x01, 0x0d, 0xb8]);
                assert_eq!(&ip.addr[4..], &[0; 12]);
            }
            other => panic!("expected ipv6 literal, got {:?}", other),
        }

        let kind = scan_one("::1");
        match kind {
            TokenKind::Literal(Value::Ip(ip)) => {
                assert_eq!(ip.version, 6);
                assert_eq!(ip.prefix, 128);
                assert_eq!(ip.addr[15], 1);
                assert_eq!(&ip.addr[..15], &[0; 15]);
            }
            other => panic!("expected ipv6 literal, got {:?}", other),
        }
    }

    #[test]
    fn test_mac() {
        assert_eq!(
            scan_one("aa:bb:cc:dd:ee:ff"),
            lit(Value::Mac(Mac { addr: [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff] }))
        );
    }

    #[test]
    fn test_datetime() {
        // 2020-01-01T00:00:00Z is 1577836800 seconds since the epoch
        assert_eq!(scan_one("2020-01-01T00:00Z"),
                   lit(Value::Uint(1_577_836_800_000_000_000)));
        assert_eq!(scan_one("2020-01-01T01:00+01:00"),
                   lit(Value::Uint(1_577_836_800_000_000_000)));
        assert_eq!(scan_one("2020-01-01T02:30:15Z"),
                   lit(Value::Uint(1_577_845_815_000_000_000)));
    }

    #[test]
    fn test_strings() {
        assert_eq!(scan_one(r#""http-proxy""#),
                   lit(Value::Str("http-proxy".into())));
        assert_eq!(scan_one(r#""a\tb\n\"c\"""#),
                   lit(Value::Str("a\tb\n\"c\"".into())));
        assert_eq!(scan_one(r#""\101\x42""#), lit(Value::Str("AB".into())));
        // unknown escapes pass through with the backslash
        assert_eq!(scan_one(r#""a\qb""#), lit(Value::Str("a\\qb".into())));

        let err = scan_err(r#""unterminated"#);
        assert_eq!(err.msg, "unterminated string");
    }

    #[test]
    fn test_symbols_longest_match() {
        assert_eq!(scan_all("<= < == >>"), vec![
            TokenKind::Symbol("<="),
            TokenKind::Symbol("<"),
            TokenKind::Symbol("=="),
            TokenKind::Symbol(">>"),
        ]);
    }

    #[test]
    fn test_symbols_and_names() {
        assert_eq!(scan_all("not port80"), vec![
            TokenKind::Symbol("not"),
            TokenKind::Name("port80".into()),
        ]);
        // "index" is a name, not the symbol "in" + "dex"
        assert_eq!(scan_one("index"), TokenKind::Name("index".into()));
        // bools win over names of the same length
        assert_eq!(scan_one("true"), lit(Value::Bool(true)));
        assert_eq!(scan_one("truely"), TokenKind::Name("truely".into()));
    }

    #[test]
    fn test_adjacency() {
        // a word token directly followed by another word token is a
        // lexical error; punctuation splits fine
        assert_eq!(scan_all("port>80").len(), 3);
        assert_eq!(scan_all("(port)").len(), 3);
        scan_err("80port");
    }

    #[test]
    fn test_peek_caches() {
        let mut scanner = Scanner::new("a b");
        let first = scanner.peek().unwrap();
        assert_eq!(first, scanner.peek().unwrap());
        scanner.consume();
        assert_ne!(first, scanner.peek().unwrap());
    }
}
