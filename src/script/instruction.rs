//! This module contains the representation of a single NWScript bytecode
//! instruction as the disassembler hands it to the analysis.

use std::fmt::{Display, Formatter};

use crate::{
    constant::MAX_ARGUMENT_COUNT,
    script::{BlockId, InstructionId},
    stack::Stack,
    variable::VariableType,
};

/// An instruction opcode, defining what the instruction does.
///
/// The discriminants are the opcode bytes of the compiled wire format.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Opcode {
    CpDownSp = 0x01,
    RsAdd = 0x02,
    CpTopSp = 0x03,
    Const = 0x04,
    Action = 0x05,
    LogAnd = 0x06,
    LogOr = 0x07,
    IncOr = 0x08,
    ExcOr = 0x09,
    BoolAnd = 0x0A,
    Eq = 0x0B,
    Neq = 0x0C,
    Geq = 0x0D,
    Gt = 0x0E,
    Lt = 0x0F,
    Leq = 0x10,
    ShLeft = 0x11,
    ShRight = 0x12,
    UShRight = 0x13,
    Add = 0x14,
    Sub = 0x15,
    Mul = 0x16,
    Div = 0x17,
    Mod = 0x18,
    Neg = 0x19,
    Comp = 0x1A,
    MovSp = 0x1B,
    StoreStateAll = 0x1C,
    Jmp = 0x1D,
    Jsr = 0x1E,
    Jz = 0x1F,
    Retn = 0x20,
    Destruct = 0x21,
    Not = 0x22,
    DecSp = 0x23,
    IncSp = 0x24,
    Jnz = 0x25,
    CpDownBp = 0x26,
    CpTopBp = 0x27,
    DecBp = 0x28,
    IncBp = 0x29,
    SaveBp = 0x2A,
    RestoreBp = 0x2B,
    StoreState = 0x2C,
    Nop = 0x2D,
    WriteArray = 0x30,
    ReadArray = 0x32,
    GetRef = 0x37,
    GetRefArray = 0x39,
    ScriptSize = 0x42,
}

impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mnemonic = match self {
            Opcode::CpDownSp => "CPDOWNSP",
            Opcode::RsAdd => "RSADD",
            Opcode::CpTopSp => "CPTOPSP",
            Opcode::Const => "CONST",
            Opcode::Action => "ACTION",
            Opcode::LogAnd => "LOGAND",
            Opcode::LogOr => "LOGOR",
            Opcode::IncOr => "INCOR",
            Opcode::ExcOr => "EXCOR",
            Opcode::BoolAnd => "BOOLAND",
            Opcode::Eq => "EQ",
            Opcode::Neq => "NEQ",
            Opcode::Geq => "GEQ",
            Opcode::Gt => "GT",
            Opcode::Lt => "LT",
            Opcode::Leq => "LEQ",
            Opcode::ShLeft => "SHLEFT",
            Opcode::ShRight => "SHRIGHT",
            Opcode::UShRight => "USHRIGHT",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Neg => "NEG",
            Opcode::Comp => "COMP",
            Opcode::MovSp => "MOVSP",
            Opcode::StoreStateAll => "STORESTATEALL",
            Opcode::Jmp => "JMP",
            Opcode::Jsr => "JSR",
            Opcode::Jz => "JZ",
            Opcode::Retn => "RETN",
            Opcode::Destruct => "DESTRUCT",
            Opcode::Not => "NOT",
            Opcode::DecSp => "DECSP",
            Opcode::IncSp => "INCSP",
            Opcode::Jnz => "JNZ",
            Opcode::CpDownBp => "CPDOWNBP",
            Opcode::CpTopBp => "CPTOPBP",
            Opcode::DecBp => "DECBP",
            Opcode::IncBp => "INCBP",
            Opcode::SaveBp => "SAVEBP",
            Opcode::RestoreBp => "RESTOREBP",
            Opcode::StoreState => "STORESTATE",
            Opcode::Nop => "NOP",
            Opcode::WriteArray => "WRITEARRAY",
            Opcode::ReadArray => "READARRAY",
            Opcode::GetRef => "GETREF",
            Opcode::GetRefArray => "GETREFARRAY",
            Opcode::ScriptSize => "SCRIPTSIZE",
        };
        write!(f, "{mnemonic}")
    }
}

/// An instruction type tag, defining what operands the instruction works on.
///
/// The discriminants are the type bytes of the compiled wire format. Unary
/// tags describe a single operand, binary tags describe the pair of operands
/// an arithmetic or comparison instruction consumes, and the array tags only
/// appear on the array opcodes that the analysis treats as no-ops.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum InstructionType {
    // Unary
    None = 0,
    Direct = 1,
    Int = 3,
    Float = 4,
    String = 5,
    Object = 6,
    Resource = 96,
    EngineType0 = 16,
    EngineType1 = 17,
    EngineType2 = 18,
    EngineType3 = 19,
    EngineType4 = 20,
    EngineType5 = 21,

    // Arrays
    IntArray = 64,
    FloatArray = 65,
    StringArray = 66,
    ObjectArray = 67,
    ResourceArray = 68,
    EngineType0Array = 80,
    EngineType1Array = 81,
    EngineType2Array = 82,
    EngineType3Array = 83,
    EngineType4Array = 84,
    EngineType5Array = 85,

    // Binary
    IntInt = 32,
    FloatFloat = 33,
    ObjectObject = 34,
    StringString = 35,
    StructStruct = 36,
    IntFloat = 37,
    FloatInt = 38,
    EngineType0EngineType0 = 48,
    EngineType1EngineType1 = 49,
    EngineType2EngineType2 = 50,
    EngineType3EngineType3 = 51,
    EngineType4EngineType4 = 52,
    EngineType5EngineType5 = 53,
    VectorVector = 58,
    VectorFloat = 59,
    FloatVector = 60,
}

impl InstructionType {
    /// Gets the variable type this tag pushes or operates on.
    ///
    /// Tags that do not describe a value, including the array tags, map to
    /// [`VariableType::Void`].
    #[must_use]
    pub fn variable_type(self) -> VariableType {
        match self {
            InstructionType::Int | InstructionType::IntInt => VariableType::Int,
            InstructionType::Float
            | InstructionType::FloatFloat
            | InstructionType::IntFloat
            | InstructionType::FloatInt => VariableType::Float,
            InstructionType::String | InstructionType::StringString => VariableType::String,
            InstructionType::Object | InstructionType::ObjectObject => VariableType::Object,
            InstructionType::Resource => VariableType::ResourceRef,
            InstructionType::EngineType0 | InstructionType::EngineType0EngineType0 => {
                VariableType::EngineType0
            }
            InstructionType::EngineType1 | InstructionType::EngineType1EngineType1 => {
                VariableType::EngineType1
            }
            InstructionType::EngineType2 | InstructionType::EngineType2EngineType2 => {
                VariableType::EngineType2
            }
            InstructionType::EngineType3 | InstructionType::EngineType3EngineType3 => {
                VariableType::EngineType3
            }
            InstructionType::EngineType4 | InstructionType::EngineType4EngineType4 => {
                VariableType::EngineType4
            }
            InstructionType::EngineType5 | InstructionType::EngineType5EngineType5 => {
                VariableType::EngineType5
            }
            InstructionType::VectorVector
            | InstructionType::VectorFloat
            | InstructionType::FloatVector => VariableType::Vector,
            _ => VariableType::Void,
        }
    }
}

impl Display for InstructionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// An NWScript bytecode instruction.
///
/// Only the fields the stack analysis observes are represented; constant
/// payloads and argument encodings stay with the disassembler.
#[derive(Clone, Debug)]
pub struct Instruction {
    /// The address of this instruction within the compiled script.
    pub address: u32,

    /// The opcode of this instruction.
    pub opcode: Opcode,

    /// The type tag of this instruction.
    pub itype: InstructionType,

    /// The direct arguments of this instruction.
    pub args: [i32; MAX_ARGUMENT_COUNT],

    /// The number of direct arguments this instruction carries (0-3).
    pub arg_count: usize,

    /// The destinations of the branches this instruction takes, if any.
    ///
    /// For `JSR` the first branch is the entry instruction of the callee.
    pub branches: Vec<InstructionId>,

    /// The block this instruction belongs to.
    pub block: Option<BlockId>,

    /// The abstract stack before this instruction executes, truncated to the
    /// current subroutine's frame.
    ///
    /// Written by the analysis; `None` until the instruction has been
    /// visited.
    pub stack: Option<Stack>,
}

impl Instruction {
    /// Creates an instruction at `address` with the provided `opcode` and
    /// type tag, without direct arguments or branches.
    #[must_use]
    pub fn new(address: u32, opcode: Opcode, itype: InstructionType) -> Self {
        Self {
            address,
            opcode,
            itype,
            args: [0; MAX_ARGUMENT_COUNT],
            arg_count: 0,
            branches: Vec::new(),
            block: None,
            stack: None,
        }
    }

    /// Sets the direct arguments of the instruction.
    ///
    /// # Panics
    ///
    /// Panics if more than [`MAX_ARGUMENT_COUNT`] arguments are provided.
    /// This is a programmer bug.
    #[must_use]
    pub fn with_args(mut self, args: &[i32]) -> Self {
        assert!(
            args.len() <= MAX_ARGUMENT_COUNT,
            "An instruction carries at most {MAX_ARGUMENT_COUNT} arguments"
        );

        self.args[..args.len()].copy_from_slice(args);
        self.arg_count = args.len();
        self
    }
}

#[cfg(test)]
mod test {
    use crate::{
        script::instruction::{Instruction, InstructionType, Opcode},
        variable::VariableType,
    };

    #[test]
    fn maps_unary_tags_to_their_value_types() {
        assert_eq!(
            InstructionType::Int.variable_type(),
            VariableType::Int
        );
        assert_eq!(
            InstructionType::Resource.variable_type(),
            VariableType::ResourceRef
        );
        assert_eq!(
            InstructionType::EngineType3.variable_type(),
            VariableType::EngineType3
        );
    }

    #[test]
    fn maps_binary_tags_to_their_result_side() {
        assert_eq!(
            InstructionType::IntFloat.variable_type(),
            VariableType::Float
        );
        assert_eq!(
            InstructionType::VectorFloat.variable_type(),
            VariableType::Vector
        );
    }

    #[test]
    fn maps_valueless_tags_to_void() {
        assert_eq!(InstructionType::None.variable_type(), VariableType::Void);
        assert_eq!(
            InstructionType::StructStruct.variable_type(),
            VariableType::Void
        );
        assert_eq!(
            InstructionType::IntArray.variable_type(),
            VariableType::Void
        );
    }

    #[test]
    fn with_args_tracks_the_argument_count() {
        let instruction =
            Instruction::new(0, Opcode::CpTopSp, InstructionType::None).with_args(&[-4, 4]);

        assert_eq!(instruction.arg_count, 2);
        assert_eq!(instruction.args[0], -4);
        assert_eq!(instruction.args[1], 4);
    }
}
