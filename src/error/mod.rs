//! This module contains the error types reported by the stack analysis.
//!
//! All errors are fatal to the analysis that raised them: the analyzer stops
//! at the first failure and callers discard any partially-enriched state.
//! Every error carries the address of the instruction (or subroutine) it was
//! raised for via the [`container::Located`] wrapper.

pub mod container;

use thiserror::Error;

use crate::{
    script::instruction::{InstructionType, Opcode},
    variable::VariableType,
};

/// The result type for the analysis interface.
///
/// Any function considered to be part of the public interface of the library
/// returns this result type.
pub type Result<T> = std::result::Result<T, LocatedError>;

/// An analysis error with an associated address in the compiled script.
pub type LocatedError = container::Located<Error>;

/// The errors that can occur while analyzing the stack behaviour of a script.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    /// An opcode carried direct arguments that violate its encoding rules
    /// (offsets must be negative multiples of four, sizes non-negative
    /// multiples of four).
    #[error("Invalid arguments {arguments:?} for opcode {opcode}")]
    InvalidArguments { opcode: Opcode, arguments: Vec<i32> },

    /// An opcode required more stack depth than was present, outside the
    /// calling-convention cases that treat underflow as signal.
    #[error("The stack holds {available} cells but the operation needs {requested}")]
    StackUnderrun { requested: usize, available: usize },

    /// A global-variable access reached beyond the attached globals array.
    #[error("The globals array holds {available} cells but the operation needs {requested}")]
    GlobalsUnderrun { requested: usize, available: usize },

    /// A global-variable access was made with no globals array attached to
    /// the analysis.
    #[error("Globals access without an attached globals array")]
    NoGlobals,

    /// Two concrete types disagreed where the opcode requires equality.
    #[error("Expected a value of type {expected} but found {found}")]
    TypeMismatch {
        expected: VariableType,
        found: VariableType,
    },

    /// A block or subroutine was re-entered while still being analyzed.
    #[error("Recursion detected")]
    Recursion,

    /// More than one `SAVEBP` was encountered during a globals analysis.
    #[error("Encountered multiple SAVEBP instructions")]
    MultipleSaveBp,

    /// A `SAVEBP` instruction was encountered outside of a globals analysis.
    #[error("Found SAVEBP outside of globals analysis")]
    SaveBpOutsideGlobals,

    /// An arithmetic instruction carried a type tag that does not describe
    /// its operands.
    #[error("Invalid instruction type {itype}")]
    InvalidInstructionType { itype: InstructionType },
}

/// Make it possible to attach locations to these errors.
impl container::Locatable for Error {
    type Located = LocatedError;

    fn locate(self, address: u32) -> Self::Located {
        container::Located {
            location: address,
            payload: self,
        }
    }
}
