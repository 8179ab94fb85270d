//! Assembly to object code translator for the Pep/10 machine.
//!
//! # Example
//!
//! ```
//! use pep10_assembler::assemble;
//!
//! let assembly = assemble("cat:BR 3,i\ndog:ADDA 0x10,d\nCALL cat,i\n")
//!     .expect("failed to assemble");
//! assert_eq!(assembly.object_code[0], 0x24); // BR, immediate
//! println!("{}", assembly.listing.join("\n"));
//! ```
//!
//! # Pipeline
//!
//! 1. **Lexer** — a character-level state machine producing a token stream
//! 2. **Parser** — recursive descent over a one-token pushback queue,
//!    yielding one IR node per source line; macro invocations re-parse
//!    their expanded bodies in the enclosing symbol scope
//! 3. **Code generator** — a single forward pass assigning addresses,
//!    resolving symbols, and emitting object code plus a formatted listing
//!
//! Parse failures are in-band: each bad line becomes one Error node, and
//! parsing continues at the next line. The listing is produced even for
//! programs with errors; object code is withheld.

pub mod argument;
pub mod codegen;
pub mod ir;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod symbol;

use thiserror::Error;
use tracing::debug;

// Re-export commonly used types at the crate root
pub use argument::Argument;
pub use codegen::{
    generate_code, program_listing, program_object_code, program_source, GenerateError,
};
pub use ir::{listing, IrKind, IrNode};
pub use lexer::{Lexer, Token};
pub use macros::{add_os_macros, MacroError, MacroRegistry};
pub use parser::{parse, Parser};
pub use symbol::{add_os_symbols, CycleError, SymbolEntry, SymbolTable, SymbolValue};

/// The products of a successful assembly.
#[derive(Debug, Clone)]
pub struct Assembly {
    /// In-order concatenation of every line's encoding.
    pub object_code: Vec<u8>,
    /// The formatted program listing.
    pub listing: Vec<String>,
    /// Reconstructed source, one line per IR node.
    pub source: Vec<String>,
}

/// Why a translation unit failed.
///
/// Both variants carry the listing: it is produced even when object code is
/// withheld, with parse failures rendered as `;ERROR:` lines.
#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("failed to parse program")]
    Parse {
        errors: Vec<String>,
        listing: Vec<String>,
    },

    #[error("failed to generate object code")]
    Generate {
        errors: Vec<GenerateError>,
        listing: Vec<String>,
    },
}

impl AssembleError {
    /// The listing of the failed unit.
    pub fn listing(&self) -> &[String] {
        match self {
            AssembleError::Parse { listing, .. } | AssembleError::Generate { listing, .. } => {
                listing
            }
        }
    }

    /// Every diagnostic, rendered for the error stream.
    pub fn messages(&self) -> Vec<String> {
        match self {
            AssembleError::Parse { errors, .. } => errors.clone(),
            AssembleError::Generate { errors, .. } => {
                errors.iter().map(GenerateError::to_string).collect()
            }
        }
    }
}

/// Assembles one translation unit.
///
/// Constructs a fresh symbol table and macro registry, registers the OS
/// symbols and macros, parses, and generates code. Any error — a parse
/// failure anywhere (including inside expanded macro bodies) or a
/// generation diagnostic — fails the unit.
pub fn assemble(text: &str) -> Result<Assembly, AssembleError> {
    let symbols = SymbolTable::new();
    let mut macros = MacroRegistry::new();
    add_os_symbols(&symbols);
    add_os_macros(&mut macros);

    let parse_tree = parse(text, &symbols, &macros);
    debug!(lines = parse_tree.len(), "parsed translation unit");

    let (ir, generate_errors) = generate_code(parse_tree);
    let listing = program_listing(&ir);

    // Macro bodies were flattened by generation, so this sweep sees every
    // Error node, nested or not.
    let parse_errors: Vec<String> = ir.iter().filter_map(|node| node.error_message()).collect();
    if !parse_errors.is_empty() {
        return Err(AssembleError::Parse {
            errors: parse_errors,
            listing,
        });
    }
    if !generate_errors.is_empty() {
        return Err(AssembleError::Generate {
            errors: generate_errors,
            listing,
        });
    }

    let object_code = program_object_code(&ir);
    debug!(bytes = object_code.len(), "emitted object code");
    Ok(Assembly {
        object_code,
        listing,
        source: program_source(&ir),
    })
}
