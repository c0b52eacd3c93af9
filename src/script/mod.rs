//! This module contains the intermediate representation of a disassembled
//! script: instructions grouped into basic blocks, blocks grouped into
//! subroutines, all owned by a [`Script`] arena and referencing each other
//! by id.
//!
//! The representation is produced by a disassembler (not part of this
//! library) and consumed by the analysis, which enriches it in place with
//! per-instruction stack snapshots and per-subroutine signatures.

pub mod block;
pub mod instruction;
pub mod subroutine;

use std::fmt::{Display, Formatter};

use crate::script::{block::Block, instruction::Instruction, subroutine::SubRoutine};

/// A stable identifier for an [`Instruction`] within its [`Script`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct InstructionId(pub usize);

/// A stable identifier for a [`Block`] within its [`Script`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BlockId(pub usize);

/// A stable identifier for a [`SubRoutine`] within its [`Script`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SubRoutineId(pub usize);

impl Display for InstructionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "i[{}]", self.0)
    }
}

/// The traversal state of a block or subroutine.
///
/// States only move forward: `Pending → InProgress → Finished`. Observing
/// `InProgress` on entry is how the analysis detects recursion.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum AnalyzeState {
    /// Not yet visited.
    #[default]
    Pending,
    /// Currently on the traversal path.
    InProgress,
    /// Completely analyzed; revisits reconcile instead of re-traversing.
    Finished,
}

/// The owning arena for the intermediate representation of one compiled
/// script.
#[derive(Clone, Debug, Default)]
pub struct Script {
    instructions: Vec<Instruction>,
    blocks: Vec<Block>,
    subroutines: Vec<SubRoutine>,
}

impl Script {
    /// Creates a new, empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the provided `instruction` to the script, returning its id.
    pub fn add_instruction(&mut self, instruction: Instruction) -> InstructionId {
        let id = InstructionId(self.instructions.len());
        self.instructions.push(instruction);
        id
    }

    /// Adds the provided `block` to the script, returning its id.
    pub fn add_block(&mut self, block: Block) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(block);
        id
    }

    /// Adds the provided `subroutine` to the script, returning its id.
    pub fn add_subroutine(&mut self, subroutine: SubRoutine) -> SubRoutineId {
        let id = SubRoutineId(self.subroutines.len());
        self.subroutines.push(subroutine);
        id
    }

    /// Gets a reference to the instruction identified by `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this script. This is a programmer
    /// bug.
    #[must_use]
    pub fn instruction(&self, id: InstructionId) -> &Instruction {
        &self.instructions[id.0]
    }

    /// Gets a mutable reference to the instruction identified by `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this script. This is a programmer
    /// bug.
    pub fn instruction_mut(&mut self, id: InstructionId) -> &mut Instruction {
        &mut self.instructions[id.0]
    }

    /// Gets a reference to the block identified by `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this script. This is a programmer
    /// bug.
    #[must_use]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0]
    }

    /// Gets a mutable reference to the block identified by `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this script. This is a programmer
    /// bug.
    pub fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.0]
    }

    /// Gets a reference to the subroutine identified by `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this script. This is a programmer
    /// bug.
    #[must_use]
    pub fn subroutine(&self, id: SubRoutineId) -> &SubRoutine {
        &self.subroutines[id.0]
    }

    /// Gets a mutable reference to the subroutine identified by `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this script. This is a programmer
    /// bug.
    pub fn subroutine_mut(&mut self, id: SubRoutineId) -> &mut SubRoutine {
        &mut self.subroutines[id.0]
    }

    /// Gets the number of instructions in the script.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Gets the number of subroutines in the script.
    #[must_use]
    pub fn subroutine_count(&self) -> usize {
        self.subroutines.len()
    }
}
