//! Recursive-descent parser producing one IR node per source line.
//!
//! The parser pulls from the lexer through a one-token pushback queue.
//! A syntax error converts the offending line into a single Error node and
//! resynchronizes at the next line boundary; parsing never aborts.

use std::collections::VecDeque;
use std::rc::Rc;
use std::str::FromStr;

use pep10_isa::{AddressingMode, Mnemonic};

use crate::argument::Argument;
use crate::ir::{IrKind, IrNode};
use crate::lexer::{Lexer, Token};
use crate::macros::MacroRegistry;
use crate::symbol::{SymbolEntry, SymbolTable};

/// Internal parse failure; surfaces as an Error node at the line level.
#[derive(Debug, Clone)]
struct SyntaxError {
    message: Option<String>,
}

impl SyntaxError {
    fn new(message: impl Into<String>) -> Self {
        SyntaxError {
            message: Some(message.into()),
        }
    }

    fn unspecified() -> Self {
        SyntaxError { message: None }
    }
}

type ParseResult<T> = Result<T, SyntaxError>;

/// Parses `text` into one IR node per logical line.
///
/// Trailing whitespace is trimmed and the input is `\n`-terminated before
/// lexing, so every line — including the last — ends at an EMPTY token.
pub fn parse(text: &str, symbols: &SymbolTable, macros: &MacroRegistry) -> Vec<IrNode> {
    let normalized = format!("{}\n", text.trim_end());
    Parser::new(&normalized, symbols, macros).collect()
}

/// Parser state over one translation unit (or one macro body).
pub struct Parser<'a> {
    lexer: Lexer,
    buffer: VecDeque<Token>,
    symbols: &'a SymbolTable,
    macros: &'a MacroRegistry,
}

impl<'a> Parser<'a> {
    pub fn new(text: &str, symbols: &'a SymbolTable, macros: &'a MacroRegistry) -> Self {
        Parser {
            lexer: Lexer::new(text),
            buffer: VecDeque::new(),
            symbols,
            macros,
        }
    }

    fn peek(&mut self) -> Option<&Token> {
        if self.buffer.is_empty() {
            if let Some(token) = self.lexer.next_token() {
                self.buffer.push_back(token);
            }
        }
        self.buffer.front()
    }

    fn push_back(&mut self, token: Token) {
        self.buffer.push_front(token);
    }

    fn take_empty(&mut self) -> bool {
        if matches!(self.peek(), Some(Token::Empty)) {
            self.buffer.pop_front();
            return true;
        }
        false
    }

    fn take_comma(&mut self) -> bool {
        if matches!(self.peek(), Some(Token::Comma)) {
            self.buffer.pop_front();
            return true;
        }
        false
    }

    fn take_comment(&mut self) -> Option<String> {
        if matches!(self.peek(), Some(Token::Comment(_))) {
            if let Some(Token::Comment(text)) = self.buffer.pop_front() {
                return Some(text);
            }
        }
        None
    }

    fn take_identifier(&mut self) -> Option<String> {
        if matches!(self.peek(), Some(Token::Identifier(_))) {
            if let Some(Token::Identifier(name)) = self.buffer.pop_front() {
                return Some(name);
            }
        }
        None
    }

    fn take_symbol(&mut self) -> Option<String> {
        if matches!(self.peek(), Some(Token::Symbol(_))) {
            if let Some(Token::Symbol(name)) = self.buffer.pop_front() {
                return Some(name);
            }
        }
        None
    }

    fn take_decimal(&mut self) -> Option<i64> {
        if matches!(self.peek(), Some(Token::Decimal(_))) {
            if let Some(Token::Decimal(value)) = self.buffer.pop_front() {
                return Some(value);
            }
        }
        None
    }

    fn take_hex(&mut self) -> Option<i64> {
        if matches!(self.peek(), Some(Token::Hex(_))) {
            if let Some(Token::Hex(value)) = self.buffer.pop_front() {
                return Some(value);
            }
        }
        None
    }

    fn take_string(&mut self) -> Option<Vec<u8>> {
        if matches!(self.peek(), Some(Token::String(_))) {
            if let Some(Token::String(bytes)) = self.buffer.pop_front() {
                return Some(bytes);
            }
        }
        None
    }

    fn take_dot(&mut self) -> Option<String> {
        if matches!(self.peek(), Some(Token::Dot(_))) {
            if let Some(Token::Dot(name)) = self.buffer.pop_front() {
                return Some(name);
            }
        }
        None
    }

    fn take_macro(&mut self) -> Option<String> {
        if matches!(self.peek(), Some(Token::Macro(_))) {
            if let Some(Token::Macro(name)) = self.buffer.pop_front() {
                return Some(name);
            }
        }
        None
    }

    /// Discards tokens through the end of the current line. A buffered
    /// INVALID token means the lexer stopped mid-line, so the raw remainder
    /// of the line is skipped as well.
    fn skip_to_next_line(&mut self) {
        loop {
            match self.peek() {
                None => return,
                Some(Token::Empty) => {
                    self.buffer.pop_front();
                    return;
                }
                Some(Token::Invalid) => {
                    self.buffer.pop_front();
                    self.lexer.skip_to_next_line();
                    return;
                }
                Some(_) => {
                    self.buffer.pop_front();
                }
            }
        }
    }

    /// Parses one source line.
    fn statement(&mut self) -> ParseResult<IrNode> {
        let line = if self.take_empty() {
            return Ok(IrNode::empty());
        } else if let Some(text) = self.take_comment() {
            IrNode::comment_line(text)
        } else if let Some(name) = self.take_symbol() {
            let symbol = self.symbols.define(&name);
            match self.code_line(Some(symbol))? {
                Some(node) => node,
                None => {
                    return Err(SyntaxError::new(
                        "Symbol declaration must be followed by instruction or dot command",
                    ))
                }
            }
        } else if let Some(node) = self.code_line(None)? {
            node
        } else {
            return Err(SyntaxError::unspecified());
        };

        if !self.take_empty() {
            return Err(SyntaxError::unspecified());
        }
        Ok(line)
    }

    /// A code line is exactly one of: nonunary instruction, unary
    /// instruction, dot directive, or macro invocation, optionally trailed
    /// by a comment.
    fn code_line(&mut self, symbol: Option<Rc<SymbolEntry>>) -> ParseResult<Option<IrNode>> {
        let mut node = if let Some(node) = self.nonunary_instruction()? {
            node
        } else if let Some(node) = self.unary_instruction()? {
            node
        } else if let Some(node) = self.directive(symbol.as_ref())? {
            node
        } else if let Some(node) = self.macro_invocation(symbol.as_ref())? {
            node
        } else {
            return Ok(None);
        };

        node.symbol_decl = symbol;
        if let Some(text) = self.take_comment() {
            node.comment = Some(text);
        }
        Ok(Some(node))
    }

    /// In priority order: HEX, DECIMAL, IDENTIFIER, STRING.
    fn argument(&mut self) -> Option<Argument> {
        if let Some(value) = self.take_hex() {
            return Some(Argument::Hexadecimal(value));
        }
        if let Some(value) = self.take_decimal() {
            return Some(Argument::Decimal(value));
        }
        if let Some(name) = self.take_identifier() {
            return Some(Argument::Identifier(self.symbols.reference(&name)));
        }
        if let Some(bytes) = self.take_string() {
            return Some(Argument::StringConstant(bytes));
        }
        None
    }

    fn integer_argument(&mut self) -> Option<Argument> {
        if let Some(value) = self.take_decimal() {
            return Some(Argument::Decimal(value));
        }
        if let Some(value) = self.take_hex() {
            return Some(Argument::Hexadecimal(value));
        }
        None
    }

    fn unary_instruction(&mut self) -> ParseResult<Option<IrNode>> {
        let Some(name) = self.take_identifier() else {
            return Ok(None);
        };
        let mnemonic = Mnemonic::from_str(&name)
            .map_err(|err| SyntaxError::new(format!("Unrecognized mnemonic: {}", err.0)))?;
        if mnemonic.family().is_unary() {
            Ok(Some(IrNode::new(IrKind::Unary(mnemonic))))
        } else {
            Ok(None)
        }
    }

    fn nonunary_instruction(&mut self) -> ParseResult<Option<IrNode>> {
        let Some(name) = self.take_identifier() else {
            return Ok(None);
        };
        let mnemonic = Mnemonic::from_str(&name)
            .map_err(|err| SyntaxError::new(format!("Unrecognized mnemonic: {}", err.0)))?;
        if mnemonic.family().is_unary() {
            self.push_back(Token::Identifier(name));
            return Ok(None);
        }
        let Some(argument) = self.argument() else {
            // Not an argument form we recognize; hand the mnemonic back so
            // the failure is reported against the whole line.
            self.push_back(Token::Identifier(name));
            return Ok(None);
        };

        if let Argument::StringConstant(bytes) = &argument {
            if bytes.len() > 2 {
                return Err(SyntaxError::new("String too large"));
            }
        }
        let value = argument.int();
        if !(-32768..=65535).contains(&value) {
            return Err(SyntaxError::new("Number too large"));
        }

        let mode = if self.take_comma() {
            let Some(mode_name) = self.take_identifier() else {
                return Err(SyntaxError::unspecified());
            };
            let mode = AddressingMode::from_str(&mode_name)
                .map_err(|_| SyntaxError::unspecified())?;
            if !mnemonic.family().allows(mode) {
                return Err(SyntaxError::unspecified());
            }
            mode
        } else if let Some(default) = mnemonic.default_addressing_mode() {
            default
        } else {
            return Err(SyntaxError::unspecified());
        };

        Ok(Some(IrNode::new(IrKind::NonUnary {
            mnemonic,
            argument,
            mode,
        })))
    }

    fn directive(&mut self, symbol: Option<&Rc<SymbolEntry>>) -> ParseResult<Option<IrNode>> {
        let Some(name) = self.take_dot() else {
            return Ok(None);
        };
        let directive = name.to_ascii_uppercase();
        match directive.as_str() {
            "BYTE" | "WORD" => {
                let argument = self.integer_argument().ok_or_else(|| {
                    SyntaxError::new(format!("{} requires an integer argument", directive))
                })?;
                let width = if directive == "BYTE" { 1 } else { 2 };
                Ok(Some(IrNode::new(IrKind::Literal { argument, width })))
            }
            "ASCII" => {
                let Some(bytes) = self.take_string() else {
                    return Err(SyntaxError::unspecified());
                };
                Ok(Some(IrNode::new(IrKind::Ascii(Argument::StringConstant(
                    bytes,
                )))))
            }
            "BLOCK" => {
                let argument = self.integer_argument().ok_or_else(|| {
                    SyntaxError::new(format!("{} requires an integer argument", directive))
                })?;
                Ok(Some(IrNode::new(IrKind::Block(argument))))
            }
            "EQUATE" => {
                let Some(symbol) = symbol else {
                    return Err(SyntaxError::new(".EQUATE requires a symbol declaration"));
                };
                let Some(argument) = self.argument() else {
                    return Err(SyntaxError::new(".EQUATE requires an argument"));
                };
                match &argument {
                    Argument::Identifier(target) => {
                        symbol.point_to(Rc::clone(target)).map_err(|_| {
                            SyntaxError::new(format!("Cyclical symbol declaration: {}", symbol))
                        })?;
                    }
                    other => symbol.set_constant(other.int()),
                }
                Ok(Some(IrNode::new(IrKind::Equate(argument))))
            }
            _ => Err(SyntaxError::new(format!(
                "Unrecognized dot command {}",
                directive
            ))),
        }
    }

    /// `@name arg, arg, ...` — instantiates the template and re-parses the
    /// body in the enclosing symbol scope.
    fn macro_invocation(&mut self, symbol: Option<&Rc<SymbolEntry>>) -> ParseResult<Option<IrNode>> {
        let Some(name) = self.take_macro() else {
            return Ok(None);
        };
        if symbol.is_some() {
            return Err(SyntaxError::new("Macros do not support symbol declarations"));
        }

        let mut arguments = Vec::new();
        if let Some(argument) = self.argument() {
            arguments.push(argument);
            while self.take_comma() {
                let Some(argument) = self.argument() else {
                    return Err(SyntaxError::new("Expected argument after comma"));
                };
                arguments.push(argument);
            }
        }

        let args: Vec<String> = arguments.iter().map(Argument::to_string).collect();
        let body = self
            .macros
            .instantiate(&name, &args)
            .map_err(|err| SyntaxError::new(err.to_string()))?;
        let body_tree = parse(&body, self.symbols, self.macros);
        Ok(Some(IrNode::new(IrKind::Macro {
            name,
            arguments,
            body: body_tree,
        })))
    }
}

impl Iterator for Parser<'_> {
    type Item = IrNode;

    fn next(&mut self) -> Option<IrNode> {
        self.peek()?;
        match self.statement() {
            Ok(node) => Some(node),
            Err(error) => {
                self.skip_to_next_line();
                Some(IrNode::error(error.message))
            }
        }
    }
}
