//! The mnemonic catalog: instruction families, base opcode bytes, and
//! opcode-byte composition.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::addressing::AddressingMode;

/// Raised when text names no catalog mnemonic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized mnemonic: {0}")]
pub struct MnemonicError(pub String);

/// Instruction families. The family fixes an instruction's byte size and
/// its permitted addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionFamily {
    /// Unary, 1 byte, no addressing mode.
    U,
    /// Register unary, 1 byte, no addressing mode.
    R,
    /// 3 bytes, single-bit A field: immediate or indexed only.
    AIx,
    /// 3 bytes, three-bit AAA field, all eight modes.
    AaaAll,
    /// 3 bytes, three-bit AAA field, immediate only.
    AaaI,
    /// Register variant of [`InstructionFamily::AaaAll`].
    RaaaAll,
    /// 3 bytes, three-bit AAA field, every mode except immediate.
    RaaaNoi,
}

impl InstructionFamily {
    /// Permitted-addressing-mode mask. One bit per mode, in
    /// [`AddressingMode`] mask positions.
    pub fn address_mask(self) -> u8 {
        match self {
            InstructionFamily::U | InstructionFamily::R => 0,
            InstructionFamily::AIx => AddressingMode::I.mask() | AddressingMode::X.mask(),
            InstructionFamily::AaaAll | InstructionFamily::RaaaAll => 0xFF,
            InstructionFamily::AaaI => AddressingMode::I.mask(),
            InstructionFamily::RaaaNoi => 0xFF & !AddressingMode::I.mask(),
        }
    }

    /// Whether `am` is a legal addressing mode for this family.
    pub fn allows(self, am: AddressingMode) -> bool {
        self.address_mask() & am.mask() != 0
    }

    /// Whether instructions of this family take no operand.
    pub fn is_unary(self) -> bool {
        matches!(self, InstructionFamily::U | InstructionFamily::R)
    }

    /// Instruction size in bytes.
    pub fn byte_size(self) -> usize {
        if self.is_unary() {
            1
        } else {
            3
        }
    }
}

/// All catalog mnemonics.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    // Unary (0x01-0x07)
    RET,
    SRET,
    MOVFLGA,
    MOVAFLG,
    MOVSPA,
    MOVASP,
    NOP,

    // Register unary (0x18-0x23)
    NOTA,
    NOTX,
    NEGA,
    NEGX,
    ASLA,
    ASLX,
    ASRA,
    ASRX,
    ROLA,
    ROLX,
    RORA,
    RORX,

    // Branches and call (0x24-0x37)
    BR,
    BRLE,
    BRLT,
    BREQ,
    BRNE,
    BRGE,
    BRGT,
    BRV,
    BRC,
    CALL,

    // System call and stack adjustment (0x38-0x4F)
    SCALL,
    ADDSP,
    SUBSP,

    // Register arithmetic, logic, loads, compares (0x50-0xDF)
    ADDA,
    ADDX,
    SUBA,
    SUBX,
    ANDA,
    ANDX,
    ORA,
    ORX,
    XORA,
    XORX,
    CPBA,
    CPBX,
    CPWA,
    CPWX,
    LDWA,
    LDWX,
    LDBA,
    LDBX,

    // Stores (0xE0-0xFF)
    STWA,
    STWX,
    STBA,
    STBX,
}

impl Mnemonic {
    /// The instruction family this mnemonic belongs to.
    pub fn family(self) -> InstructionFamily {
        use Mnemonic::*;
        match self {
            RET | SRET | MOVFLGA | MOVAFLG | MOVSPA | MOVASP | NOP => InstructionFamily::U,
            NOTA | NOTX | NEGA | NEGX | ASLA | ASLX | ASRA | ASRX | ROLA | ROLX | RORA | RORX => {
                InstructionFamily::R
            }
            BR | BRLE | BRLT | BREQ | BRNE | BRGE | BRGT | BRV | BRC | CALL => {
                InstructionFamily::AIx
            }
            SCALL | ADDSP | SUBSP => InstructionFamily::AaaAll,
            ADDA | ADDX | SUBA | SUBX | ANDA | ANDX | ORA | ORX | XORA | XORX | CPBA | CPBX
            | CPWA | CPWX | LDWA | LDWX | LDBA | LDBX => InstructionFamily::RaaaAll,
            STWA | STWX | STBA | STBX => InstructionFamily::RaaaNoi,
        }
    }

    /// Base bit pattern of the opcode byte, before mode bits are OR-ed in.
    pub fn bit_pattern(self) -> u8 {
        use Mnemonic::*;
        match self {
            RET => 0x01,
            SRET => 0x02,
            MOVFLGA => 0x03,
            MOVAFLG => 0x04,
            MOVSPA => 0x05,
            MOVASP => 0x06,
            NOP => 0x07,

            NOTA => 0x18,
            NOTX => 0x19,
            NEGA => 0x1A,
            NEGX => 0x1B,
            ASLA => 0x1C,
            ASLX => 0x1D,
            ASRA => 0x1E,
            ASRX => 0x1F,
            ROLA => 0x20,
            ROLX => 0x21,
            RORA => 0x22,
            RORX => 0x23,

            BR => 0x24,
            BRLE => 0x26,
            BRLT => 0x28,
            BREQ => 0x2A,
            BRNE => 0x2C,
            BRGE => 0x2E,
            BRGT => 0x30,
            BRV => 0x32,
            BRC => 0x34,
            CALL => 0x36,

            SCALL => 0x38,
            ADDSP => 0x40,
            SUBSP => 0x48,

            ADDA => 0x50,
            ADDX => 0x58,
            SUBA => 0x60,
            SUBX => 0x68,
            ANDA => 0x70,
            ANDX => 0x78,
            ORA => 0x80,
            ORX => 0x88,
            XORA => 0x90,
            XORX => 0x98,
            CPBA => 0xA0,
            CPBX => 0xA8,
            CPWA => 0xB0,
            CPWX => 0xB8,
            LDWA => 0xC0,
            LDWX => 0xC8,
            LDBA => 0xD0,
            LDBX => 0xD8,

            STWA => 0xE0,
            STWX => 0xE8,
            STBA => 0xF0,
            STBX => 0xF8,
        }
    }

    /// Composes the opcode byte for this mnemonic under `am`.
    ///
    /// Unary families ignore the mode; an absent mode contributes zero bits,
    /// matching the immediate encoding.
    pub fn to_byte(self, am: Option<AddressingMode>) -> u8 {
        let bits = self.bit_pattern();
        match self.family() {
            InstructionFamily::U | InstructionFamily::R => bits,
            InstructionFamily::AIx => bits | am.and_then(|m| m.as_a().ok()).unwrap_or(0),
            _ => bits | am.map(|m| m.as_aaa()).unwrap_or(0),
        }
    }

    /// The addressing mode applied when a source line omits the `,mode`
    /// clause, if this mnemonic has one. Branch-family instructions default
    /// to immediate.
    pub fn default_addressing_mode(self) -> Option<AddressingMode> {
        match self.family() {
            InstructionFamily::AIx => Some(AddressingMode::I),
            _ => None,
        }
    }

    /// Mnemonic text as it appears in listings.
    pub fn as_str(self) -> &'static str {
        use Mnemonic::*;
        match self {
            RET => "RET",
            SRET => "SRET",
            MOVFLGA => "MOVFLGA",
            MOVAFLG => "MOVAFLG",
            MOVSPA => "MOVSPA",
            MOVASP => "MOVASP",
            NOP => "NOP",
            NOTA => "NOTA",
            NOTX => "NOTX",
            NEGA => "NEGA",
            NEGX => "NEGX",
            ASLA => "ASLA",
            ASLX => "ASLX",
            ASRA => "ASRA",
            ASRX => "ASRX",
            ROLA => "ROLA",
            ROLX => "ROLX",
            RORA => "RORA",
            RORX => "RORX",
            BR => "BR",
            BRLE => "BRLE",
            BRLT => "BRLT",
            BREQ => "BREQ",
            BRNE => "BRNE",
            BRGE => "BRGE",
            BRGT => "BRGT",
            BRV => "BRV",
            BRC => "BRC",
            CALL => "CALL",
            SCALL => "SCALL",
            ADDSP => "ADDSP",
            SUBSP => "SUBSP",
            ADDA => "ADDA",
            ADDX => "ADDX",
            SUBA => "SUBA",
            SUBX => "SUBX",
            ANDA => "ANDA",
            ANDX => "ANDX",
            ORA => "ORA",
            ORX => "ORX",
            XORA => "XORA",
            XORX => "XORX",
            CPBA => "CPBA",
            CPBX => "CPBX",
            CPWA => "CPWA",
            CPWX => "CPWX",
            LDWA => "LDWA",
            LDWX => "LDWX",
            LDBA => "LDBA",
            LDBX => "LDBX",
            STWA => "STWA",
            STWX => "STWX",
            STBA => "STBA",
            STBX => "STBX",
        }
    }
}

impl FromStr for Mnemonic {
    type Err = MnemonicError;

    /// Parses a mnemonic, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Mnemonic::*;
        match s.to_ascii_uppercase().as_str() {
            "RET" => Ok(RET),
            "SRET" => Ok(SRET),
            "MOVFLGA" => Ok(MOVFLGA),
            "MOVAFLG" => Ok(MOVAFLG),
            "MOVSPA" => Ok(MOVSPA),
            "MOVASP" => Ok(MOVASP),
            "NOP" => Ok(NOP),
            "NOTA" => Ok(NOTA),
            "NOTX" => Ok(NOTX),
            "NEGA" => Ok(NEGA),
            "NEGX" => Ok(NEGX),
            "ASLA" => Ok(ASLA),
            "ASLX" => Ok(ASLX),
            "ASRA" => Ok(ASRA),
            "ASRX" => Ok(ASRX),
            "ROLA" => Ok(ROLA),
            "ROLX" => Ok(ROLX),
            "RORA" => Ok(RORA),
            "RORX" => Ok(RORX),
            "BR" => Ok(BR),
            "BRLE" => Ok(BRLE),
            "BRLT" => Ok(BRLT),
            "BREQ" => Ok(BREQ),
            "BRNE" => Ok(BRNE),
            "BRGE" => Ok(BRGE),
            "BRGT" => Ok(BRGT),
            "BRV" => Ok(BRV),
            "BRC" => Ok(BRC),
            "CALL" => Ok(CALL),
            "SCALL" => Ok(SCALL),
            "ADDSP" => Ok(ADDSP),
            "SUBSP" => Ok(SUBSP),
            "ADDA" => Ok(ADDA),
            "ADDX" => Ok(ADDX),
            "SUBA" => Ok(SUBA),
            "SUBX" => Ok(SUBX),
            "ANDA" => Ok(ANDA),
            "ANDX" => Ok(ANDX),
            "ORA" => Ok(ORA),
            "ORX" => Ok(ORX),
            "XORA" => Ok(XORA),
            "XORX" => Ok(XORX),
            "CPBA" => Ok(CPBA),
            "CPBX" => Ok(CPBX),
            "CPWA" => Ok(CPWA),
            "CPWX" => Ok(CPWX),
            "LDWA" => Ok(LDWA),
            "LDWX" => Ok(LDWX),
            "LDBA" => Ok(LDBA),
            "LDBX" => Ok(LDBX),
            "STWA" => Ok(STWA),
            "STWX" => Ok(STWX),
            "STBA" => Ok(STBA),
            "STBX" => Ok(STBX),
            _ => Err(MnemonicError(s.to_ascii_uppercase())),
        }
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_masks() {
        assert_eq!(InstructionFamily::AIx.address_mask(), 33);
        assert!(InstructionFamily::AIx.allows(AddressingMode::I));
        assert!(InstructionFamily::AIx.allows(AddressingMode::X));
        assert!(!InstructionFamily::AIx.allows(AddressingMode::D));
        assert!(!InstructionFamily::U.allows(AddressingMode::I));
        assert!(!InstructionFamily::RaaaNoi.allows(AddressingMode::I));
        assert!(InstructionFamily::RaaaNoi.allows(AddressingMode::Sfx));
        assert!(InstructionFamily::AaaI.allows(AddressingMode::I));
        assert!(!InstructionFamily::AaaI.allows(AddressingMode::X));
    }

    #[test]
    fn test_u_mnemonics() {
        assert_eq!(Mnemonic::RET.to_byte(None), 0x01);
        assert_eq!(Mnemonic::NOP.to_byte(None), 0x07);
    }

    #[test]
    fn test_r_mnemonics() {
        assert_eq!(Mnemonic::NOTA.to_byte(None), 0x18);
        assert_eq!(Mnemonic::RORX.to_byte(None), 0x23);
    }

    #[test]
    fn test_a_mnemonics() {
        assert_eq!(Mnemonic::CALL.to_byte(None), 0x36);
        assert_eq!(Mnemonic::CALL.to_byte(Some(AddressingMode::I)), 0x36);
        assert_eq!(Mnemonic::CALL.to_byte(Some(AddressingMode::X)), 0x37);
        assert_eq!(Mnemonic::BR.to_byte(Some(AddressingMode::X)), 0x25);
    }

    #[test]
    fn test_aaa_mnemonics() {
        assert_eq!(Mnemonic::SCALL.to_byte(Some(AddressingMode::I)), 0x38);
        assert_eq!(Mnemonic::SCALL.to_byte(Some(AddressingMode::Sfx)), 0x3F);
        assert_eq!(Mnemonic::ADDA.to_byte(Some(AddressingMode::D)), 0x51);
        assert_eq!(Mnemonic::LDWA.to_byte(Some(AddressingMode::X)), 0xC5);
        assert_eq!(Mnemonic::STBX.to_byte(Some(AddressingMode::Sfx)), 0xFF);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("call".parse(), Ok(Mnemonic::CALL));
        assert_eq!("Adda".parse(), Ok(Mnemonic::ADDA));
        assert_eq!("STWX".parse(), Ok(Mnemonic::STWX));
        assert!(matches!(
            "RETS".parse::<Mnemonic>(),
            Err(MnemonicError(ref s)) if s == "RETS"
        ));
    }

    #[test]
    fn test_default_addressing_modes() {
        assert_eq!(
            Mnemonic::BR.default_addressing_mode(),
            Some(AddressingMode::I)
        );
        assert_eq!(
            Mnemonic::BRC.default_addressing_mode(),
            Some(AddressingMode::I)
        );
        assert_eq!(
            Mnemonic::CALL.default_addressing_mode(),
            Some(AddressingMode::I)
        );
        assert_eq!(Mnemonic::ADDA.default_addressing_mode(), None);
        assert_eq!(Mnemonic::SCALL.default_addressing_mode(), None);
    }

    #[test]
    fn test_byte_sizes() {
        assert_eq!(Mnemonic::RET.family().byte_size(), 1);
        assert_eq!(Mnemonic::NOTA.family().byte_size(), 1);
        assert_eq!(Mnemonic::BR.family().byte_size(), 3);
        assert_eq!(Mnemonic::STWA.family().byte_size(), 3);
    }
}
