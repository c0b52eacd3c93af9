//! This module contains the subroutine representation of the control-flow
//! graph.

use crate::{
    script::{AnalyzeState, BlockId},
    variable::VariableId,
};

/// A callable unit: the set of blocks reachable from one entry block.
///
/// Subroutines carry no declared signature; `params` and `returns` are
/// discovered by the stack analysis from the callee's own behaviour.
#[derive(Clone, Debug)]
pub struct SubRoutine {
    /// The address of the entry block.
    pub address: u32,

    /// The blocks of the subroutine, entry block first.
    pub blocks: Vec<BlockId>,

    /// The parameters of the subroutine, in the order the callee cleans them
    /// off the stack.
    ///
    /// Filled by the analysis.
    pub params: Vec<VariableId>,

    /// The return slots of the subroutine: caller-allocated cells the callee
    /// writes into above its own frame.
    ///
    /// Filled by the analysis. While the subroutine is being analyzed the
    /// list may contain gaps for slots whose write has not been seen yet;
    /// the entries surviving the `RETN` fixup are the actual return values.
    pub returns: Vec<Option<VariableId>>,

    /// The traversal state of the subroutine during stack analysis.
    pub analyze_state: AnalyzeState,
}

impl SubRoutine {
    /// Creates a subroutine at `address` without any blocks.
    #[must_use]
    pub fn new(address: u32) -> Self {
        Self {
            address,
            blocks: Vec::new(),
            params: Vec::new(),
            returns: Vec::new(),
            analyze_state: AnalyzeState::Pending,
        }
    }

    /// Iterates over the resolved return slots, skipping any gaps.
    pub fn return_values(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.returns.iter().copied().flatten()
    }
}
