//! Script opcodes.
//!
//! Direct pushes (`0x01..=0x4b`) and the small integers `OP_1..=OP_16` carry
//! their operand in the variant; every other known opcode is a unit variant.
//! Bytes with no mapping are not representable here and surface as invalid
//! elements during lenient parsing.

use std::fmt;

macro_rules! named_opcodes {
    ($( $variant:ident = $byte:literal => $name:literal, )*) => {
        /// A known script opcode.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum OpCode {
            /// `OP_0` / `OP_FALSE`: pushes an empty vector.
            Zero,
            /// Direct push of 1 to 75 bytes.
            PushBytes(u8),
            PushData1,
            PushData2,
            PushData4,
            /// `OP_1NEGATE`
            OneNegate,
            /// `OP_1` through `OP_16`.
            Num(u8),
            $( $variant, )*
        }

        impl OpCode {
            /// Decode one opcode byte. `None` for bytes with no opcode.
            pub fn from_byte(byte: u8) -> Option<Self> {
                match byte {
                    0x00 => Some(OpCode::Zero),
                    0x01..=0x4b => Some(OpCode::PushBytes(byte)),
                    0x4c => Some(OpCode::PushData1),
                    0x4d => Some(OpCode::PushData2),
                    0x4e => Some(OpCode::PushData4),
                    0x4f => Some(OpCode::OneNegate),
                    0x51..=0x60 => Some(OpCode::Num(byte - 0x50)),
                    $( $byte => Some(OpCode::$variant), )*
                    _ => None,
                }
            }

            /// Encode as the opcode byte.
            pub fn to_byte(self) -> u8 {
                match self {
                    OpCode::Zero => 0x00,
                    OpCode::PushBytes(n) => n,
                    OpCode::PushData1 => 0x4c,
                    OpCode::PushData2 => 0x4d,
                    OpCode::PushData4 => 0x4e,
                    OpCode::OneNegate => 0x4f,
                    OpCode::Num(n) => 0x50 + n,
                    $( OpCode::$variant => $byte, )*
                }
            }

            fn named(self) -> Option<&'static str> {
                match self {
                    $( OpCode::$variant => Some($name), )*
                    _ => None,
                }
            }
        }
    };
}

named_opcodes! {
    Reserved = 0x50 => "OP_RESERVED",
    Nop = 0x61 => "OP_NOP",
    Ver = 0x62 => "OP_VER",
    If = 0x63 => "OP_IF",
    NotIf = 0x64 => "OP_NOTIF",
    VerIf = 0x65 => "OP_VERIF",
    VerNotIf = 0x66 => "OP_VERNOTIF",
    Else = 0x67 => "OP_ELSE",
    EndIf = 0x68 => "OP_ENDIF",
    Verify = 0x69 => "OP_VERIFY",
    Return = 0x6a => "OP_RETURN",
    ToAltStack = 0x6b => "OP_TOALTSTACK",
    FromAltStack = 0x6c => "OP_FROMALTSTACK",
    TwoDrop = 0x6d => "OP_2DROP",
    TwoDup = 0x6e => "OP_2DUP",
    ThreeDup = 0x6f => "OP_3DUP",
    TwoOver = 0x70 => "OP_2OVER",
    TwoRot = 0x71 => "OP_2ROT",
    TwoSwap = 0x72 => "OP_2SWAP",
    IfDup = 0x73 => "OP_IFDUP",
    Depth = 0x74 => "OP_DEPTH",
    Drop = 0x75 => "OP_DROP",
    Dup = 0x76 => "OP_DUP",
    Nip = 0x77 => "OP_NIP",
    Over = 0x78 => "OP_OVER",
    Pick = 0x79 => "OP_PICK",
    Roll = 0x7a => "OP_ROLL",
    Rot = 0x7b => "OP_ROT",
    Swap = 0x7c => "OP_SWAP",
    Tuck = 0x7d => "OP_TUCK",
    Cat = 0x7e => "OP_CAT",
    Substr = 0x7f => "OP_SUBSTR",
    Left = 0x80 => "OP_LEFT",
    Right = 0x81 => "OP_RIGHT",
    Size = 0x82 => "OP_SIZE",
    Invert = 0x83 => "OP_INVERT",
    And = 0x84 => "OP_AND",
    Or = 0x85 => "OP_OR",
    Xor = 0x86 => "OP_XOR",
    Equal = 0x87 => "OP_EQUAL",
    EqualVerify = 0x88 => "OP_EQUALVERIFY",
    Reserved1 = 0x89 => "OP_RESERVED1",
    Reserved2 = 0x8a => "OP_RESERVED2",
    OneAdd = 0x8b => "OP_1ADD",
    OneSub = 0x8c => "OP_1SUB",
    TwoMul = 0x8d => "OP_2MUL",
    TwoDiv = 0x8e => "OP_2DIV",
    Negate = 0x8f => "OP_NEGATE",
    Abs = 0x90 => "OP_ABS",
    Not = 0x91 => "OP_NOT",
    ZeroNotEqual = 0x92 => "OP_0NOTEQUAL",
    Add = 0x93 => "OP_ADD",
    Sub = 0x94 => "OP_SUB",
    Mul = 0x95 => "OP_MUL",
    Div = 0x96 => "OP_DIV",
    Mod = 0x97 => "OP_MOD",
    LShift = 0x98 => "OP_LSHIFT",
    RShift = 0x99 => "OP_RSHIFT",
    BoolAnd = 0x9a => "OP_BOOLAND",
    BoolOr = 0x9b => "OP_BOOLOR",
    NumEqual = 0x9c => "OP_NUMEQUAL",
    NumEqualVerify = 0x9d => "OP_NUMEQUALVERIFY",
    NumNotEqual = 0x9e => "OP_NUMNOTEQUAL",
    LessThan = 0x9f => "OP_LESSTHAN",
    GreaterThan = 0xa0 => "OP_GREATERTHAN",
    LessThanOrEqual = 0xa1 => "OP_LESSTHANOREQUAL",
    GreaterThanOrEqual = 0xa2 => "OP_GREATERTHANOREQUAL",
    Min = 0xa3 => "OP_MIN",
    Max = 0xa4 => "OP_MAX",
    Within = 0xa5 => "OP_WITHIN",
    Ripemd160 = 0xa6 => "OP_RIPEMD160",
    Sha1 = 0xa7 => "OP_SHA1",
    Sha256 = 0xa8 => "OP_SHA256",
    Hash160 = 0xa9 => "OP_HASH160",
    Hash256 = 0xaa => "OP_HASH256",
    CodeSeparator = 0xab => "OP_CODESEPARATOR",
    CheckSig = 0xac => "OP_CHECKSIG",
    CheckSigVerify = 0xad => "OP_CHECKSIGVERIFY",
    CheckMultisig = 0xae => "OP_CHECKMULTISIG",
    CheckMultisigVerify = 0xaf => "OP_CHECKMULTISIGVERIFY",
    Nop1 = 0xb0 => "OP_NOP1",
    CheckLockTimeVerify = 0xb1 => "OP_CHECKLOCKTIMEVERIFY",
    CheckSequenceVerify = 0xb2 => "OP_CHECKSEQUENCEVERIFY",
    Nop4 = 0xb3 => "OP_NOP4",
    Nop5 = 0xb4 => "OP_NOP5",
    Nop6 = 0xb5 => "OP_NOP6",
    Nop7 = 0xb6 => "OP_NOP7",
    Nop8 = 0xb7 => "OP_NOP8",
    Nop9 = 0xb8 => "OP_NOP9",
    Nop10 = 0xb9 => "OP_NOP10",
    PubkeyHash = 0xfd => "OP_PUBKEYHASH",
    Pubkey = 0xfe => "OP_PUBKEY",
    InvalidOpcode = 0xff => "OP_INVALIDOPCODE",
}

/// Width of the explicit length prefix that follows a push opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushPrefix {
    /// Not a push, or a push whose length is implied by the opcode.
    None,
    /// Length is the opcode itself (`0x01..=0x4b`).
    Direct(usize),
    /// An explicit little-endian length of this many bytes follows.
    Explicit(usize),
}

impl OpCode {
    /// How the data length of this opcode is encoded.
    pub fn push_prefix(self) -> PushPrefix {
        match self {
            OpCode::PushBytes(n) => PushPrefix::Direct(usize::from(n)),
            OpCode::PushData1 => PushPrefix::Explicit(1),
            OpCode::PushData2 => PushPrefix::Explicit(2),
            OpCode::PushData4 => PushPrefix::Explicit(4),
            _ => PushPrefix::None,
        }
    }

    /// True for opcodes that carry a data payload.
    pub fn is_data_push(self) -> bool {
        !matches!(self.push_prefix(), PushPrefix::None)
    }

    /// True for opcodes that only place a value on the stack.
    pub fn is_push_only(self) -> bool {
        matches!(self, OpCode::Zero | OpCode::OneNegate | OpCode::Num(_)) || self.is_data_push()
    }

    /// `OP_1..=OP_16` value, if this is one.
    pub fn small_int(self) -> Option<u8> {
        match self {
            OpCode::Num(n) => Some(n),
            _ => None,
        }
    }

    /// Smallest opcode able to push `len` bytes.
    pub fn minimal_push(len: usize) -> Self {
        match len {
            0 => OpCode::Zero,
            1..=0x4b => OpCode::PushBytes(len as u8),
            0x4c..=0xff => OpCode::PushData1,
            0x100..=0xffff => OpCode::PushData2,
            _ => OpCode::PushData4,
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpCode::Zero => f.write_str("OP_0"),
            OpCode::PushBytes(n) => write!(f, "OP_PUSHBYTES_{n}"),
            OpCode::PushData1 => f.write_str("OP_PUSHDATA1"),
            OpCode::PushData2 => f.write_str("OP_PUSHDATA2"),
            OpCode::PushData4 => f.write_str("OP_PUSHDATA4"),
            OpCode::OneNegate => f.write_str("OP_1NEGATE"),
            OpCode::Num(n) => write!(f, "OP_{n}"),
            other => f.write_str(other.named().unwrap_or("OP_UNKNOWN")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_roundtrip_for_every_known_opcode() {
        let mut known = 0;
        for byte in 0u8..=255 {
            if let Some(op) = OpCode::from_byte(byte) {
                assert_eq!(op.to_byte(), byte, "{op}");
                known += 1;
            }
        }
        // 0xba..=0xfc are unassigned.
        assert_eq!(known, 256 - (0xfc - 0xba + 1));
    }

    #[test]
    fn test_small_ints() {
        assert_eq!(OpCode::from_byte(0x51), Some(OpCode::Num(1)));
        assert_eq!(OpCode::from_byte(0x60), Some(OpCode::Num(16)));
        assert_eq!(OpCode::Num(3).small_int(), Some(3));
        assert_eq!(OpCode::Dup.small_int(), None);
    }

    #[test]
    fn test_push_prefix() {
        assert_eq!(OpCode::PushBytes(20).push_prefix(), PushPrefix::Direct(20));
        assert_eq!(OpCode::PushData2.push_prefix(), PushPrefix::Explicit(2));
        assert_eq!(OpCode::Dup.push_prefix(), PushPrefix::None);
        assert!(OpCode::Num(2).is_push_only());
        assert!(!OpCode::CheckSig.is_push_only());
    }

    #[test]
    fn test_minimal_push() {
        assert_eq!(OpCode::minimal_push(0), OpCode::Zero);
        assert_eq!(OpCode::minimal_push(33), OpCode::PushBytes(33));
        assert_eq!(OpCode::minimal_push(76), OpCode::PushData1);
        assert_eq!(OpCode::minimal_push(520), OpCode::PushData2);
        assert_eq!(OpCode::minimal_push(70_000), OpCode::PushData4);
    }

    #[test]
    fn test_display() {
        assert_eq!(OpCode::CheckMultisig.to_string(), "OP_CHECKMULTISIG");
        assert_eq!(OpCode::Num(16).to_string(), "OP_16");
        assert_eq!(OpCode::PushBytes(20).to_string(), "OP_PUSHBYTES_20");
    }
}
