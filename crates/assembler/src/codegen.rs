//! Code generation: a single forward pass over the parse tree.
//!
//! The pass assigns addresses, binds label symbols, checks symbol
//! definedness, and flattens macro bodies between sentinel comment lines.
//! Generation never halts on an error; diagnostics accumulate so the driver
//! can report every problem at once.

use thiserror::Error;
use tracing::debug;

use crate::argument::Argument;
use crate::ir::{listing, IrKind, IrNode};

/// Diagnostics produced during generation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("Multiply defined symbol: {0}")]
    MultiplyDefined(String),

    #[error("Undefined symbol: {0}")]
    UndefinedSymbol(String),
}

/// Assigns addresses and collects diagnostics, returning the flattened IR
/// in emission order. Error nodes pass through with no address so they can
/// still render in the listing.
pub fn generate_code(parse_tree: Vec<IrNode>) -> (Vec<IrNode>, Vec<GenerateError>) {
    let (ir, errors) = generate_from(parse_tree, 0);
    debug!(
        nodes = ir.len(),
        errors = errors.len(),
        "code generation complete"
    );
    (ir, errors)
}

fn generate_from(
    parse_tree: Vec<IrNode>,
    base_address: usize,
) -> (Vec<IrNode>, Vec<GenerateError>) {
    let mut ir: Vec<IrNode> = Vec::new();
    let mut errors: Vec<GenerateError> = Vec::new();
    let mut address = base_address;

    for mut node in parse_tree {
        if node.is_error() {
            ir.push(node);
            continue;
        }

        if matches!(node.kind, IrKind::Macro { .. }) {
            let start = IrNode::comment_line(node.source().trim_start().to_string());
            if let IrKind::Macro { name, body, .. } = node.kind {
                let (inner, inner_errors) = generate_from(body, address);
                let length: usize = inner.iter().map(IrNode::byte_size).sum();
                ir.push(start);
                ir.extend(inner);
                ir.push(IrNode::comment_line(format!("End @{}", name)));
                errors.extend(inner_errors);
                address += length;
            }
            continue;
        }

        // The size of a line may depend on its address, so assignment
        // precedes the advance.
        node.address = Some(address);

        if let Some(symbol) = &node.symbol_decl {
            if symbol.is_multiply_defined() {
                errors.push(GenerateError::MultiplyDefined(symbol.name().to_string()));
            } else if node.byte_size() > 0 {
                // .EQUATE keeps its parser-assigned value.
                symbol.set_constant(address as i64);
            }
        }

        if let Some(Argument::Identifier(symbol)) = node.argument() {
            if symbol.is_undefined() {
                errors.push(GenerateError::UndefinedSymbol(symbol.name().to_string()));
            }
        }

        address += node.byte_size();
        ir.push(node);
    }

    (ir, errors)
}

/// The raw object byte stream: per-line encodings concatenated in order.
pub fn program_object_code(program: &[IrNode]) -> Vec<u8> {
    program.iter().flat_map(IrNode::object_code).collect()
}

/// Reconstructed source text, one line per node.
pub fn program_source(program: &[IrNode]) -> Vec<String> {
    program.iter().map(IrNode::source).collect()
}

/// The formatted program listing.
pub fn program_listing(program: &[IrNode]) -> Vec<String> {
    program.iter().flat_map(|node| listing(node)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::{add_os_macros, MacroRegistry};
    use crate::parser::parse;
    use crate::symbol::{add_os_symbols, SymbolTable};

    fn generate(text: &str) -> (Vec<IrNode>, Vec<GenerateError>, SymbolTable) {
        let symbols = SymbolTable::new();
        let macros = MacroRegistry::new();
        let tree = parse(text, &symbols, &macros);
        let (ir, errors) = generate_code(tree);
        (ir, errors, symbols)
    }

    #[test]
    fn test_unary_object_code() {
        let (ir, errors, _) = generate("NOTA\nNOTA\nRET\n");
        assert!(errors.is_empty());
        assert_eq!(ir.len(), 3);
        assert_eq!(program_object_code(&ir), vec![0x18, 0x18, 0x01]);
        assert_eq!(ir[0].address, Some(0));
        assert_eq!(ir[1].address, Some(1));
        assert_eq!(ir[2].address, Some(2));
    }

    #[test]
    fn test_nonunary_object_code() {
        let (ir, errors, symbols) = generate("cat:BR 3,i\ndog:ADDA 0x10,d\nCALL cat,i\n");
        assert!(errors.is_empty());
        assert!(symbols.contains("cat") && symbols.contains("dog"));
        assert_eq!(symbols.reference("cat").int(), 0);
        assert_eq!(symbols.reference("dog").int(), 3);
        assert_eq!(ir.len(), 3);
        assert_eq!(
            program_object_code(&ir),
            vec![0x24, 0x00, 0x03, 0x51, 0x00, 0x10, 0x36, 0x00, 0x00]
        );
        assert_eq!(ir[0].address, Some(0));
        assert_eq!(ir[1].address, Some(3));
        assert_eq!(ir[2].address, Some(6));
    }

    #[test]
    fn test_comment_empty() {
        let (ir, errors, _) = generate("\n;hello\n");
        assert!(errors.is_empty());
        assert_eq!(ir.len(), 2);
        assert!(program_object_code(&ir).is_empty());
        assert!(matches!(ir[0].kind, IrKind::Empty));
        assert!(matches!(ir[1].kind, IrKind::Comment));
    }

    #[test]
    fn test_default_mode_encoding() {
        let (ir, errors, _) = generate("BR 10\n");
        assert!(errors.is_empty());
        assert_eq!(program_object_code(&ir), vec![0x24, 0x00, 0x0A]);
    }

    #[test]
    fn test_forward_reference() {
        let (ir, errors, symbols) = generate("BR cat,i\ncat: RET\n");
        assert!(errors.is_empty());
        assert_eq!(symbols.reference("cat").int(), 3);
        assert_eq!(program_object_code(&ir), vec![0x24, 0x00, 0x03, 0x01]);
    }

    #[test]
    fn test_multiply_defined_symbol() {
        let (_, errors, _) = generate("cat: .EQUATE 0x10\ncat: .EQUATE 0x20\n");
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| *e == GenerateError::MultiplyDefined("cat".to_string())));
        assert_eq!(errors[0].to_string(), "Multiply defined symbol: cat");
    }

    #[test]
    fn test_undefined_symbol() {
        let (_, errors, _) = generate("BR dog,i\n");
        assert_eq!(
            errors,
            vec![GenerateError::UndefinedSymbol("dog".to_string())]
        );
        assert_eq!(errors[0].to_string(), "Undefined symbol: dog");
    }

    #[test]
    fn test_equate_keeps_parser_value() {
        let (ir, errors, symbols) = generate("RET\ncat: .EQUATE 0x10\n");
        assert!(errors.is_empty());
        // Not reassigned to the line address.
        assert_eq!(symbols.reference("cat").int(), 0x10);
        assert_eq!(ir[1].address, Some(1));
    }

    #[test]
    fn test_label_addresses_through_block() {
        let (_, errors, symbols) = generate("buf: .BLOCK 4\nend: RET\n");
        assert!(errors.is_empty());
        assert_eq!(symbols.reference("buf").int(), 0);
        assert_eq!(symbols.reference("end").int(), 4);
    }

    #[test]
    fn test_macro_expansion() {
        let symbols = SymbolTable::new();
        let mut macros = MacroRegistry::new();
        add_os_symbols(&symbols);
        add_os_macros(&mut macros);
        let tree = parse("@DECO 0xFC16,d\n", &symbols, &macros);
        let (ir, errors) = generate_code(tree);
        assert!(errors.is_empty());

        // Sentinel comments bracket the expanded body.
        assert_eq!(ir.len(), 4);
        assert!(matches!(ir[0].kind, IrKind::Comment));
        assert!(matches!(ir[3].kind, IrKind::Comment));
        assert_eq!(ir[0].comment.as_deref().map(str::trim_end), Some("@DECO  0xfc16,d"));
        assert_eq!(ir[3].comment.as_deref(), Some("End @DECO"));

        // LDWA DECO,i then SCALL 0xFC16,d.
        assert_eq!(ir[1].address, Some(0));
        assert_eq!(ir[2].address, Some(3));
        assert_eq!(
            program_object_code(&ir),
            vec![0xC0, 0x00, 0x01, 0x39, 0xFC, 0x16]
        );
    }

    #[test]
    fn test_macro_labels_visible_outside() {
        let symbols = SymbolTable::new();
        let mut macros = MacroRegistry::new();
        macros.register("HALTLOOP", 0, "spin: BR spin,i\n");
        let tree = parse("RET\n@HALTLOOP\nBR spin,i\n", &symbols, &macros);
        let (ir, errors) = generate_code(tree);
        assert!(errors.is_empty());
        assert_eq!(symbols.reference("spin").int(), 1);
        assert_eq!(
            program_object_code(&ir),
            vec![0x01, 0x24, 0x00, 0x01, 0x24, 0x00, 0x01]
        );
    }

    #[test]
    fn test_addresses_continue_after_macro() {
        let symbols = SymbolTable::new();
        let mut macros = MacroRegistry::new();
        add_os_symbols(&symbols);
        add_os_macros(&mut macros);
        let tree = parse("RET\n@SNOP\nstop: RET\n", &symbols, &macros);
        let (ir, errors) = generate_code(tree);
        assert!(errors.is_empty());
        // RET, 6 bytes of @SNOP, then the labelled RET.
        assert_eq!(symbols.reference("stop").int(), 7);
        assert_eq!(program_object_code(&ir).len(), 8);
        assert_eq!(ir.last().and_then(|n| n.address), Some(7));
    }

    #[test]
    fn test_error_node_passthrough() {
        let (ir, errors, _) = generate("RETS\nRET\n");
        assert!(errors.is_empty());
        assert_eq!(ir.len(), 2);
        assert!(ir[0].is_error());
        assert_eq!(ir[0].address, None);
        // The error contributes no bytes; the RET still lands at 0.
        assert_eq!(program_object_code(&ir), vec![0x01]);
        assert_eq!(ir[1].address, Some(0));
        let lines = program_listing(&ir);
        assert!(lines[0].contains(";ERROR: Unrecognized mnemonic: RETS"));
    }

    #[test]
    fn test_source_round_trip() {
        // Reassembling the reconstructed source reproduces the program.
        let text = "cat:BR 3,i ;go\ndog:ADDA 0x10,d\n.ASCII \"hi\"\nbuf: .BLOCK 2\nCALL cat,i\n";
        let (ir, errors, _) = generate(text);
        assert!(errors.is_empty());
        let source = program_source(&ir).join("\n");
        let (reparsed, errors2, _) = generate(&source);
        assert!(errors2.is_empty());
        assert_eq!(reparsed.len(), ir.len());
        assert_eq!(program_object_code(&reparsed), program_object_code(&ir));
        assert_eq!(program_source(&reparsed), program_source(&ir));
    }

    #[test]
    fn test_listing_shape() {
        let (ir, _, _) = generate("cat:BR 3,i ;go\n");
        let lines = program_listing(&ir);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].trim_end(), "0000 240003 cat:   BR     3,i         ;go");
    }
}
