//! This library implements an analysis of [NWScript](https://nwn.wiki/display/NWN1/NCS)
//! bytecode — the scripting format of BioWare's Aurora engine — that aims to
//! reconstruct the stack state at every instruction, the types of the
//! variables the script manipulates, and the parameter and return-value
//! signatures of its subroutines. It is a _best effort_ analysis.
//!
//! Note that this library is not intended to be nor expected to evolve into a
//! full decompiler for NWScript bytecode.
//!
//! # How it Works
//!
//! NWScript declares no calling convention: a subroutine's signature exists
//! only in how it behaves. From a very high level, the discovery process is
//! performed as follows:
//!
//! 1. A disassembler (external to this library) produces a [`script::Script`]:
//!    instructions grouped into basic blocks and subroutines, with all
//!    branches resolved.
//! 2. The analysis walks the control-flow graph depth-first, carrying an
//!    abstract [`stack::Stack`] whose cells reference inferred
//!    [`variable::Variable`]s rather than runtime values. Each opcode's
//!    handler applies its stack effect and refines types.
//! 3. When a callee pops below its own frame it is clearing its parameters,
//!    and when it writes above its frame it is filling a caller-allocated
//!    return slot; both observations become the subroutine's signature.
//! 4. Copy instructions link original and copy as duplicates; a fixup pass
//!    afterwards collapses every duplicate group onto one concrete type.
//! 5. In globals mode, the stack contents at `SAVEBP` are the
//!    global-variable layout, recovered into a caller-provided array.
//!
//! # Basic Usage
//!
//! For the most basic usage of the library, it is sufficient to assemble a
//! [`script::Script`] (normally a disassembler's job) and hand it to one of
//! the two entry points.
//!
//! ```
//! use nwscript_stack_analyzer::{
//!     analyze_subroutine_stack,
//!     game::{EmptySignatures, GameId},
//!     script::{
//!         block::Block,
//!         instruction::{Instruction, InstructionType, Opcode},
//!         subroutine::SubRoutine,
//!         Script,
//!     },
//!     variable::{VariableSpace, VariableType, VariableUse},
//! };
//!
//! // main() { int a = 7; } compiles to a push, a frame cleanup and a return.
//! let mut script = Script::new();
//! let sub = script.add_subroutine(SubRoutine::new(0x0d));
//! let block = script.add_block(Block::new(0x0d, sub));
//! script.subroutine_mut(sub).blocks.push(block);
//!
//! let program = [
//!     Instruction::new(0x0d, Opcode::Const, InstructionType::Int),
//!     Instruction::new(0x13, Opcode::MovSp, InstructionType::None).with_args(&[-4]),
//!     Instruction::new(0x19, Opcode::Retn, InstructionType::None),
//! ];
//! for instruction in program {
//!     let id = script.add_instruction(instruction);
//!     script.instruction_mut(id).block = Some(block);
//!     script.block_mut(block).instructions.push(id);
//! }
//!
//! let mut variables = VariableSpace::new();
//! analyze_subroutine_stack(
//!     &mut script,
//!     sub,
//!     &mut variables,
//!     GameId::Nwn,
//!     &EmptySignatures,
//!     None,
//! )
//! .unwrap();
//!
//! // The pushed constant was typed from the instruction's type tag.
//! let pushed = variables.iter().last().unwrap();
//! assert_eq!(pushed.typ, VariableType::Int);
//! assert_eq!(pushed.usage, VariableUse::Local);
//!
//! // The subroutine takes no parameters and returns nothing.
//! assert!(script.subroutine(sub).params.is_empty());
//! assert!(script.subroutine(sub).returns.is_empty());
//! ```

#![warn(clippy::all, clippy::cargo, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Allows for better API naming

pub mod analysis;
pub mod constant;
pub mod error;
pub mod game;
pub mod script;
pub mod stack;
pub mod variable;

// Re-exports to provide the library interface.
pub use analysis::{analyze_globals, analyze_subroutine_stack};
