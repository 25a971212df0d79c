// Precedence-climbing parser over the scanner's token stream.

use crate::ast::{self, AstNode};
use crate::error::{FilterError, Span};
use crate::scanner::{Scanner, Token, TokenKind};

#[derive(Copy, Clone, Debug, PartialEq)]
enum OpKind {
    // prefix unary operation, eg. -1
    Prefix,
    // infix binary operation, eg. 1 + 1
    Infix,
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Assoc {
    // unary operators have no associativity
    None,
    Left,
}

struct Operator {
    symbol: &'static str,
    // higher binds first
    prec: u8,
    kind: OpKind,
    assoc: Assoc,
}

const fn prefix(symbol: &'static str, prec: u8) -> Operator {
    Operator { symbol, prec, kind: OpKind::Prefix, assoc: Assoc::None }
}

const fn infix(symbol: &'static str, prec: u8) -> Operator {
    Operator { symbol, prec, kind: OpKind::Infix, assoc: Assoc::Left }
}

// The supported operators and how to parse them. The empty symbol is
// the implicit comparison inserted between two adjacent operands, as
// in "port 80" or "src ip 10.0.0.0/8".
const OPERATORS: &[Operator] = &[
    prefix("+", 7),
    prefix("-", 7),

    infix("*", 6),
    infix("/", 6),
    infix("%", 6),

    infix("+", 5),
    infix("-", 5),

    infix("<<", 4),
    infix(">>", 4),

    prefix("~", 3),
    infix("&", 3),
    infix("|", 3),
    infix("^", 3),

    prefix("exists", 2),
    infix("in", 2),
    infix("contains", 2),

    infix("", 1),
    infix("==", 1),
    infix("!=", 1),
    infix("<", 1),
    infix(">", 1),
    infix("<=", 1),
    infix(">=", 1),

    prefix("not", 0),
    infix("and", 0),
    infix("or", 0),
];

// Keywords that may qualify a field name, eg. "src ip". Names cannot
// contain spaces, so the parser fuses the pair into one identifier.
const NAME_PREFIXES: &[&str] = &["in", "out", "ingress", "egress", "src", "dst"];

fn find_operator(kind: OpKind, symbol: &str) -> Option<&'static Operator> {
    OPERATORS.iter().find(|op| op.kind == kind && op.symbol == symbol)
}

fn name_prefix_of(token: &Token) -> Option<&'static str> {
    NAME_PREFIXES.iter().find(|p| token.is_symbol(p)).copied()
}

// Parse a whole filter expression and wrap it in a __root__ node.
pub fn parse(scanner: &mut Scanner) -> Result<AstNode, FilterError> {
    let expr = parse_infix(scanner, 0)?;
    let token = scanner.peek()?;
    if !token.is_end() {
        return Err(FilterError::syntax(token.span, "expected end of input"));
    }
    Ok(AstNode::unary(ast::ROOT, expr))
}

fn parse_infix(scanner: &mut Scanner, prec: u8) -> Result<AstNode, FilterError> {
    let mut expr = parse_prefix(scanner)?;

    loop {
        let token = scanner.peek()?;

        let declared = match &token.kind {
            TokenKind::Symbol(s) => find_operator(OpKind::Infix, s),
            _ => None,
        };
        let op = match declared {
            Some(op) => {
                // a lower-precedence operator belongs to a caller
                // further down the recursion
                if op.prec < prec {
                    break;
                }
                scanner.consume();
                op
            }
            None => {
                // the right boundary of the expression
                if token.is_end() || token.is_symbol(")")
                    || token.is_symbol(",") || token.is_symbol("]") {
                    break;
                }
                // anything else tries the implicit operator, which
                // consumes no token of its own
                match find_operator(OpKind::Infix, "") {
                    Some(op) if op.prec >= prec => op,
                    _ => break,
                }
            }
        };

        // left-associative: the recursive call may only bind operators
        // with strictly higher precedence, leaving equal-precedence
        // ones to this loop
        let right = match op.assoc {
            Assoc::Left => parse_infix(scanner, op.prec + 1)?,
            Assoc::None => parse_infix(scanner, op.prec)?,
        };
        expr = AstNode::binary(op.symbol, expr, right);
    }

    Ok(expr)
}

fn parse_prefix(scanner: &mut Scanner) -> Result<AstNode, FilterError> {
    let token = scanner.peek()?;

    // parenthesised expression
    if token.is_symbol("(") {
        let begin = token.span.begin;
        scanner.consume();

        let mut expr = parse_infix(scanner, 0)?;

        let token = scanner.peek()?;
        if !token.is_symbol(")") {
            return Err(FilterError::syntax(token.span, "expected )"));
        }
        expr.span = Span::new(begin, token.span.end);
        scanner.consume();
        return Ok(expr);
    }

    // qualified field name, eg. "dst port"
    if let Some(prefix) = name_prefix_of(&token) {
        scanner.consume();

        let name_token = scanner.peek()?;
        let end = name_token.span.end;
        let name = match name_token.kind {
            TokenKind::Name(name) => name,
            _ => {
                return Err(FilterError::syntax(name_token.span, "expected name"));
            }
        };
        scanner.consume();

        let mut node = AstNode::new(ast::NAME, Span::new(token.span.begin, end));
        node.name = Some(format!("{} {}", prefix, name));
        return Ok(node);
    }

    // list literal, with an optional trailing comma
    if token.is_symbol("[") {
        let begin = token.span.begin;
        scanner.consume();

        let mut items = Vec::new();
        let mut next = scanner.peek()?;
        while !next.is_symbol("]") {
            items.push(parse_infix(scanner, 0)?);

            next = scanner.peek()?;
            if next.is_symbol(",") {
                scanner.consume();
                next = scanner.peek()?;
            } else if !next.is_symbol("]") {
                return Err(FilterError::syntax(next.span, "expected , or ]"));
            }
        }
        scanner.consume();

        // build the __listitem__ chain back to front
        let mut chain: Option<Box<AstNode>> = None;
        for expr in items.into_iter().rev() {
            let mut item = AstNode::new(ast::LIST_ITEM, expr.span);
            item.left = Some(Box::new(expr));
            item.right = chain;
            chain = Some(Box::new(item));
        }

        let mut list = AstNode::new(ast::LIST, Span::new(begin, next.span.end));
        list.left = chain;
        return Ok(list);
    }

    // prefix operator
    if let TokenKind::Symbol(s) = &token.kind {
        if let Some(op) = find_operator(OpKind::Prefix, s) {
            scanner.consume();
            let operand = parse_infix(scanner, op.prec + 1)?;
            let mut node = AstNode::unary(op.symbol, operand);
            node.span = Span::new(token.span.begin, node.span.end);
            return Ok(node);
        }
    }

    // bare field name
    if matches!(token.kind, TokenKind::Name(_)) {
        scanner.consume();
        let mut node = AstNode::new(ast::NAME, token.span);
        if let TokenKind::Name(name) = token.kind {
            node.name = Some(name);
        }
        return Ok(node);
    }

    // literal value
    if matches!(token.kind, TokenKind::Literal(_)) {
        scanner.consume();
        let mut node = AstNode::new(ast::LITERAL, token.span);
        if let TokenKind::Literal(value) = token.kind {
            node.data_type = value.data_type();
            node.value = Some(value);
        }
        return Ok(node);
    }

    if token.is_end() {
        return Err(FilterError::syntax(token.span, "unexpected end of input"));
    }
    Err(FilterError::syntax(token.span, "unexpected token"))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    // Compact s-expression rendering of the parse tree; the implicit
    // operator prints as ~.
    fn shape(node: &AstNode) -> String {
        match node.symbol {
            ast::LITERAL => node.value.as_ref().unwrap().to_string(),
            ast::NAME => format!("<{}>", node.name.as_ref().unwrap()),
            symbol => {
                let mut s = String::from("(");
                s.push_str(if symbol.is_empty() { "~" } else { symbol });
                if let Some(left) = &node.left {
                    s.push(' ');
                    s.push_str(&shape(left));
                }
                if let Some(right) = &node.right {
                    s.push(' ');
                    s.push_str(&shape(right));
                }
                s.push(')');
                s
            }
        }
    }

    fn assert_parses_to(text: &str, expected: &str) {
        let mut scanner = Scanner::new(text);
        let root = parse(&mut scanner).expect("parse failed");
        assert_eq!(root.symbol, ast::ROOT);
        assert_eq!(shape(root.operand().unwrap()), expected, "input: {:?}", text);
    }

    fn parse_err(text: &str) -> FilterError {
        let mut scanner = Scanner::new(text);
        parse(&mut scanner).expect_err("expected a parse error")
    }

    #[test]
    fn test_terms() {
        assert_parses_to("42", "42");
        assert_parses_to("(42)", "42");
        assert_parses_to("foo", "<foo>");
        assert_parses_to("\"x\"", "\"x\"");
    }

    #[test]
    fn test_precedence() {
        assert_parses_to("1 + 2 * 3", "(+ 1 (* 2 3))");
        assert_parses_to("1 * 2 + 3", "(+ (* 1 2) 3)");
        assert_parses_to("(1 + 2) * 3", "(* (+ 1 2) 3)");
        assert_parses_to("3 + 4 < 3 * 4", "(< (+ 3 4) (* 3 4))");
        assert_parses_to("1 << 2 + 3", "(<< 1 (+ 2 3))");
    }

    #[test]
    fn test_left_associativity() {
        assert_parses_to("1 + 2 + 3", "(+ (+ 1 2) 3)");
        assert_parses_to("1 - 2 - 3", "(- (- 1 2) 3)");
    }

    #[test]
    fn test_boolean_operators() {
        assert_parses_to("a and b or c", "(or (and <a> <b>) <c>)");
        assert_parses_to("not a and b", "(and (not <a>) <b>)");
    }

    #[test]
    fn test_implicit_operator() {
        assert_parses_to("port 80", "(~ <port> 80)");
        assert_parses_to("port 80 and proto 6", "(and (~ <port> 80) (~ <proto> 6))");
    }

    #[test]
    fn test_name_prefixes() {
        assert_parses_to("src ip 10.0.0.0/8", "(~ <src ip> 10.0.0.0/8)");
        assert_parses_to("dst port 80", "(~ <dst port> 80)");
        // "in" doubles as an infix operator when a value precedes it
        assert_parses_to("6 in [6, 17]",
                         "(in 6 (__list__ (__listitem__ 6 (__listitem__ 17))))");
    }

    #[test]
    fn test_prefix_operators() {
        assert_parses_to("-1 + 2", "(+ (- 1) 2)");
        assert_parses_to("~port & 0xff", "(& (~ <port>) 255)");
        assert_parses_to("exists foo", "(exists <foo>)");
        assert_parses_to("not port 80", "(not (~ <port> 80))");
    }

    #[test]
    fn test_lists() {
        assert_parses_to("[]", "(__list__)");
        assert_parses_to(
            "[1, 2, 3,]",
            "(__list__ (__listitem__ 1 (__listitem__ 2 (__listitem__ 3))))");
    }

    #[test]
    fn test_trailing_garbage() {
        let err = parse_err("port 80 and");
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(err.msg, "unexpected end of input");
        // the span points at end-of-input
        assert_eq!(err.span.unwrap().begin, "port 80 and".len());
    }

    #[test]
    fn test_unbalanced_parens() {
        let err = parse_err("(port 80");
        assert_eq!(err.msg, "expected )");

        let err = parse_err("[1, 2");
        assert_eq!(err.msg, "expected , or ]");
    }
}
