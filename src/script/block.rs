//! This module contains the basic-block representation of the control-flow
//! graph.

use crate::script::{AnalyzeState, BlockId, InstructionId, SubRoutineId};

/// The kind of edge connecting a block to one of its children.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BlockEdgeType {
    /// The child always follows the block.
    Unconditional,
    /// Taken when the conditional at the end of the block holds.
    ConditionalTrue,
    /// Taken when the conditional at the end of the block does not hold.
    ConditionalFalse,
    /// The child is the entry of a called subroutine; never followed by the
    /// stack traversal, which handles calls at the `JSR` instruction
    /// instead.
    FunctionCall,
    /// The child is the entry of a `STORESTATE` closure; never followed.
    StoreState,
    /// The continuation of the block after a subroutine call returns.
    SubRoutineTail,
    /// The child is unreachable.
    Dead,
}

impl BlockEdgeType {
    /// Checks whether the stack traversal follows this edge when recursing
    /// from a block to its children.
    #[must_use]
    pub fn is_followed(self) -> bool {
        !matches!(self, BlockEdgeType::FunctionCall | BlockEdgeType::StoreState)
    }
}

/// A basic block: a maximal straight-line run of instructions with a single
/// entry and a single exit.
#[derive(Clone, Debug)]
pub struct Block {
    /// The address of the first instruction in the block.
    pub address: u32,

    /// The instructions of the block, in execution order.
    pub instructions: Vec<InstructionId>,

    /// The successor blocks.
    ///
    /// Invariant: `children.len() == children_types.len()`.
    pub children: Vec<BlockId>,

    /// The edge kinds of the successors, positionally matching `children`.
    pub children_types: Vec<BlockEdgeType>,

    /// The subroutine this block belongs to.
    pub subroutine: SubRoutineId,

    /// The traversal state of the block during stack analysis.
    pub analyze_state: AnalyzeState,
}

impl Block {
    /// Creates an empty block at `address` belonging to `subroutine`.
    #[must_use]
    pub fn new(address: u32, subroutine: SubRoutineId) -> Self {
        Self {
            address,
            instructions: Vec::new(),
            children: Vec::new(),
            children_types: Vec::new(),
            subroutine,
            analyze_state: AnalyzeState::Pending,
        }
    }
}
