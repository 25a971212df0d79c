// Abstract syntax tree of symbolic nodes.
//
// Operators keep their source symbol; structural nodes use reserved
// __xxx__ symbols. A list is a __list__ node whose left child is a
// chain of __listitem__ nodes (left = the item expression, right =
// the next item).

use std::fmt;

use enumflags2::BitFlags;

use crate::error::Span;
use crate::values::{DataType, Value};

pub const ROOT: &str = "__root__";
pub const LITERAL: &str = "__literal__";
pub const NAME: &str = "__name__";
pub const LIST: &str = "__list__";
pub const LIST_ITEM: &str = "__listitem__";
pub const CAST: &str = "__cast__";

#[derive(BitFlags, Copy, Clone, Debug, PartialEq)]
#[repr(u8)]
pub enum AstFlag {
    // the subtree evaluates to the same value for every record
    ConstSubtree = 0b01,
    // the subtree contains a field that may yield several values
    MultiEvalSubtree = 0b10,
}

pub type AstFlags = BitFlags<AstFlag>;

#[derive(Clone, Debug)]
pub struct AstNode {
    pub symbol: &'static str,
    pub left: Option<Box<AstNode>>,
    pub right: Option<Box<AstNode>>,
    // owned identifier text, for __name__ nodes
    pub name: Option<String>,
    // literal payload, until the generator moves it out
    pub value: Option<Value>,
    pub data_type: DataType,
    // identifier id assigned by the host lookup
    pub id: u32,
    pub flags: AstFlags,
    pub span: Span,
}

impl AstNode {
    pub fn new(symbol: &'static str, span: Span) -> AstNode {
        AstNode {
            symbol,
            left: None,
            right: None,
            name: None,
            value: None,
            data_type: DataType::NONE,
            id: 0,
            flags: BitFlags::empty(),
            span,
        }
    }

    pub fn binary(symbol: &'static str, left: AstNode, right: AstNode) -> AstNode {
        let span = Span::new(left.span.begin, right.span.end);
        let mut node = AstNode::new(symbol, span);
        node.left = Some(Box::new(left));
        node.right = Some(Box::new(right));
        node
    }

    pub fn unary(symbol: &'static str, child: AstNode) -> AstNode {
        let mut node = AstNode::new(symbol, child.span);
        node.left = Some(Box::new(child));
        node
    }

    pub fn is_symbol(&self, symbol: &str) -> bool {
        self.symbol == symbol
    }

    pub fn is_binary(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }

    pub fn is_unary(&self) -> bool {
        self.left.is_some() && self.right.is_none()
    }

    // The single child of a unary node.
    pub fn operand(&self) -> Option<&AstNode> {
        self.left.as_deref()
    }

    // Iterate the __listitem__ chain of a __list__ node.
    pub fn list_items(&self) -> ListItems {
        ListItems(self.left.as_deref())
    }
}

pub struct ListItems<'a>(Option<&'a AstNode>);

impl<'a> Iterator for ListItems<'a> {
    type Item = &'a AstNode;

    fn next(&mut self) -> Option<&'a AstNode> {
        let item = self.0?;
        self.0 = item.right.as_deref();
        Some(item)
    }
}

fn fmt_node(node: &AstNode, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        write!(f, "  ")?;
    }
    write!(f, "({}, type: {}", node.symbol, node.data_type)?;
    if let Some(name) = &node.name {
        write!(f, ", name: {}", name)?;
    }
    if let Some(value) = &node.value {
        write!(f, ", value: {}", value)?;
    }
    if node.flags.contains(AstFlag::ConstSubtree) {
        write!(f, " (const subtree)")?;
    }
    if node.flags.contains(AstFlag::MultiEvalSubtree) {
        write!(f, " (multi eval subtree)")?;
    }
    if node.left.is_some() || node.right.is_some() {
        writeln!(f)?;
        if let Some(left) = &node.left {
            fmt_node(left, f, depth + 1)?;
        }
        if let Some(right) = &node.right {
            fmt_node(right, f, depth + 1)?;
        }
        for _ in 0..depth {
            write!(f, "  ")?;
        }
    }
    writeln!(f, ")")
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt_node(self, f, 0)
    }
}
