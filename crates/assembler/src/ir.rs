//! Intermediate representation: one node per source line.
//!
//! Each node carries enough to emit its object code and to reprint the line
//! in the program listing. Addresses are assigned by the code generator;
//! before that pass every `address` is `None`.

use std::rc::Rc;

use pep10_isa::{AddressingMode, Mnemonic};

use crate::argument::Argument;
use crate::symbol::SymbolEntry;

/// Per-line payload.
#[derive(Debug, Clone)]
pub enum IrKind {
    /// A blank line.
    Empty,
    /// A whole-line comment; the text lives in the node's `comment` field.
    Comment,
    /// A line that failed to parse, with an optional message.
    Error(Option<String>),
    /// A one-byte instruction of family U or R.
    Unary(Mnemonic),
    /// A three-byte instruction: opcode byte plus 16-bit operand.
    NonUnary {
        mnemonic: Mnemonic,
        argument: Argument,
        mode: AddressingMode,
    },
    /// `.ASCII` — the string payload verbatim.
    Ascii(Argument),
    /// `.BYTE` or `.WORD` — a 1- or 2-byte literal.
    Literal { argument: Argument, width: u8 },
    /// `.BLOCK` — N zero bytes.
    Block(Argument),
    /// `.EQUATE` — zero length; binds the declared symbol at parse time.
    Equate(Argument),
    /// A macro invocation owning the parse of its expanded body.
    Macro {
        name: String,
        arguments: Vec<Argument>,
        body: Vec<IrNode>,
    },
}

/// A single source line.
#[derive(Debug, Clone)]
pub struct IrNode {
    pub kind: IrKind,
    /// The symbol this line defines, if any.
    pub symbol_decl: Option<Rc<SymbolEntry>>,
    /// Trailing comment text, without the `;`.
    pub comment: Option<String>,
    /// Assigned once, during code generation.
    pub address: Option<usize>,
}

impl IrNode {
    pub fn new(kind: IrKind) -> Self {
        IrNode {
            kind,
            symbol_decl: None,
            comment: None,
            address: None,
        }
    }

    pub fn empty() -> Self {
        IrNode::new(IrKind::Empty)
    }

    pub fn comment_line(text: String) -> Self {
        let mut node = IrNode::new(IrKind::Comment);
        node.comment = Some(text);
        node
    }

    pub fn error(message: Option<String>) -> Self {
        IrNode::new(IrKind::Error(message))
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, IrKind::Error(_))
    }

    /// The rendered diagnostic for an Error node.
    pub fn error_message(&self) -> Option<String> {
        match &self.kind {
            IrKind::Error(message) => Some(
                message
                    .clone()
                    .unwrap_or_else(|| "Failed to parse line".to_string()),
            ),
            _ => None,
        }
    }

    /// The line's argument, when its variant carries one.
    pub fn argument(&self) -> Option<&Argument> {
        match &self.kind {
            IrKind::NonUnary { argument, .. }
            | IrKind::Ascii(argument)
            | IrKind::Literal { argument, .. }
            | IrKind::Block(argument)
            | IrKind::Equate(argument) => Some(argument),
            _ => None,
        }
    }

    /// Object-code length in bytes. The emitted unit's total length is the
    /// sum of these in declaration order.
    pub fn byte_size(&self) -> usize {
        match &self.kind {
            IrKind::Empty | IrKind::Comment | IrKind::Error(_) | IrKind::Equate(_) => 0,
            IrKind::Unary(_) => 1,
            IrKind::NonUnary { .. } => 3,
            IrKind::Ascii(argument) => match argument {
                Argument::StringConstant(bytes) => bytes.len(),
                _ => 0,
            },
            IrKind::Literal { width, .. } => *width as usize,
            IrKind::Block(argument) => argument.int().max(0) as usize,
            IrKind::Macro { body, .. } => body.iter().map(IrNode::byte_size).sum(),
        }
    }

    /// This line's object code. Operands are big-endian 16 bits, encoded
    /// two's-complement when negative.
    pub fn object_code(&self) -> Vec<u8> {
        match &self.kind {
            IrKind::Empty | IrKind::Comment | IrKind::Error(_) | IrKind::Equate(_) => Vec::new(),
            IrKind::Unary(mnemonic) => vec![mnemonic.to_byte(None)],
            IrKind::NonUnary {
                mnemonic,
                argument,
                mode,
            } => {
                let mut code = vec![mnemonic.to_byte(Some(*mode))];
                code.extend_from_slice(&(argument.int() as u16).to_be_bytes());
                code
            }
            IrKind::Ascii(argument) => match argument {
                Argument::StringConstant(bytes) => bytes.clone(),
                _ => Vec::new(),
            },
            IrKind::Literal { argument, width } => {
                if *width == 1 {
                    vec![argument.int() as u8]
                } else {
                    (argument.int() as u16).to_be_bytes().to_vec()
                }
            }
            IrKind::Block(_) => vec![0; self.byte_size()],
            IrKind::Macro { body, .. } => body.iter().flat_map(IrNode::object_code).collect(),
        }
    }

    /// Reconstructed source text: 7-character symbol column, 7-character
    /// mnemonic column, 12-character argument column, then the comment.
    pub fn source(&self) -> String {
        match &self.kind {
            IrKind::Error(_) => {
                let message = self
                    .error_message()
                    .unwrap_or_else(|| "Failed to parse line".to_string());
                format!(";ERROR: {}", message)
            }
            IrKind::Empty => source_line("", &[], None, None),
            IrKind::Comment => source_line("", &[], None, self.comment.as_deref()),
            IrKind::Unary(mnemonic) => source_line(
                mnemonic.as_str(),
                &[],
                self.symbol_decl.as_ref(),
                self.comment.as_deref(),
            ),
            IrKind::NonUnary {
                mnemonic,
                argument,
                mode,
            } => source_line(
                mnemonic.as_str(),
                &[argument.to_string(), mode.to_string()],
                self.symbol_decl.as_ref(),
                self.comment.as_deref(),
            ),
            IrKind::Ascii(argument) => source_line(
                ".ASCII",
                &[argument.to_string()],
                self.symbol_decl.as_ref(),
                self.comment.as_deref(),
            ),
            IrKind::Literal { argument, width } => source_line(
                if *width == 1 { ".BYTE" } else { ".WORD" },
                &[argument.to_string()],
                self.symbol_decl.as_ref(),
                self.comment.as_deref(),
            ),
            IrKind::Block(argument) => source_line(
                ".BLOCK",
                &[argument.to_string()],
                self.symbol_decl.as_ref(),
                self.comment.as_deref(),
            ),
            IrKind::Equate(argument) => source_line(
                ".EQUATE",
                &[argument.to_string()],
                self.symbol_decl.as_ref(),
                self.comment.as_deref(),
            ),
            IrKind::Macro {
                name, arguments, ..
            } => {
                let args: Vec<String> = arguments.iter().map(Argument::to_string).collect();
                source_line(&format!("@{}", name), &args, None, self.comment.as_deref())
            }
        }
    }
}

fn source_line(
    op: &str,
    args: &[String],
    symbol: Option<&Rc<SymbolEntry>>,
    comment: Option<&str>,
) -> String {
    let sym = symbol.map(|s| format!("{}:", s)).unwrap_or_default();
    let comment = comment.map(|c| format!(";{}", c)).unwrap_or_default();
    format!("{:<7}{:<7}{:<12}{}", sym, op, args.join(","), comment)
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Formats one node as listing lines.
///
/// The first line holds the address (4 uppercase hex digits, or blanks for
/// address-less lines), up to three object-code bytes, and the source text.
/// Longer object code continues in groups of three bytes on lines that omit
/// the source column.
pub fn listing(node: &IrNode) -> Vec<String> {
    let object_code = node.object_code();
    let (first, rest): (&[u8], &[u8]) = if object_code.len() <= 3 {
        (&object_code, &[])
    } else {
        object_code.split_at(2)
    };
    let address = match node.address {
        Some(address) => format!("{:04X}", address),
        None => "    ".to_string(),
    };
    let mut lines = vec![format!(
        "{} {:<6} {}",
        address,
        hex_bytes(first),
        node.source()
    )];
    for chunk in rest.chunks(3) {
        lines.push(format!("{:4} {:<6}", "", hex_bytes(chunk)));
    }
    lines
}
