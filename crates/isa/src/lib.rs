//! Pep/10 instruction-set primitives.
//!
//! This crate provides the fundamental types shared by anything that speaks
//! the Pep/10 instruction set:
//! - Addressing modes and their bit encodings
//! - Instruction families and permitted-addressing-mode masks
//! - The mnemonic catalog with base opcode bytes

pub mod addressing;
pub mod mnemonic;

// Re-export commonly used types at the crate root
pub use addressing::{AddressingMode, AddressingModeError};
pub use mnemonic::{InstructionFamily, Mnemonic, MnemonicError};
