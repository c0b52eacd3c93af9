//! This module contains the stack analysis itself: a depth-first traversal
//! of the control-flow graph that tracks an abstract stack through every
//! instruction, infers variable types, and discovers the calling convention
//! of each subroutine by watching it interact with its caller's stack.
//!
//! # Modes
//!
//! The analysis runs in one of two modes. *Globals* mode analyzes the
//! `_global` subroutine in isolation, without following calls, to recover
//! the global-variable layout finalized by `SAVEBP`. *Whole-program* mode
//! starts from `main` and recurses through every `JSR`, carrying the caller
//! stack into each callee so that parameter pops and return-slot writes can
//! be observed.

pub(crate) mod context;
pub(crate) mod effects;
pub(crate) mod fixup;

use std::mem;

use itertools::Itertools;

use crate::{
    analysis::{
        context::{AnalysisContext, AnalysisMode},
        effects::stack_effect,
        fixup::fixup_duplicate_types,
    },
    error::{container::Locatable, Error, Result},
    game::{FunctionSignatures, GameId},
    script::{AnalyzeState, BlockId, Script, SubRoutineId},
    stack::Stack,
    variable::VariableSpace,
};

/// Analyzes the stack of the `_global` subroutine `sub` in isolation,
/// recovering the global-variable layout into `globals`.
///
/// A dummy frame of unknown cells is seeded below the subroutine to stand in
/// for whatever the runtime arranges before `_global` runs; `SAVEBP` strips
/// it again, so after a successful return `globals` holds exactly the
/// inferred global variables. Subroutine calls are not followed.
///
/// # Errors
///
/// If the script's stack behaviour is malformed; see [`crate::error::Error`]
/// for the failure cases. Callers should discard all partially-enriched
/// state on error.
pub fn analyze_globals(
    script: &mut Script,
    sub: SubRoutineId,
    variables: &mut VariableSpace,
    game: GameId,
    functions: &dyn FunctionSignatures,
    globals: &mut Stack,
) -> Result<()> {
    let mut ctx = AnalysisContext::new(
        AnalysisMode::Globals,
        script,
        variables,
        game,
        functions,
        Some(globals),
        sub,
    );

    ctx.seed_dummy_frame();

    analyze_subroutine(&mut ctx, sub)
}

/// Analyzes the stack during complete script control flow, starting from
/// the subroutine `sub` (usually `main`).
///
/// `globals` carries the layout recovered by a previous
/// [`analyze_globals`] pass, if the script has one; global-variable accesses
/// fail without it. The same dummy frame as in globals mode is seeded below
/// the entry point.
///
/// # Errors
///
/// If the script's stack behaviour is malformed; see [`crate::error::Error`]
/// for the failure cases. Callers should discard all partially-enriched
/// state on error.
pub fn analyze_subroutine_stack(
    script: &mut Script,
    sub: SubRoutineId,
    variables: &mut VariableSpace,
    game: GameId,
    functions: &dyn FunctionSignatures,
    globals: Option<&mut Stack>,
) -> Result<()> {
    let mut ctx = AnalysisContext::new(
        AnalysisMode::SubRoutine,
        script,
        variables,
        game,
        functions,
        globals,
        sub,
    );

    ctx.seed_dummy_frame();

    analyze_subroutine(&mut ctx, sub)
}

/// Analyzes the subroutine `sub` on the current caller stack.
///
/// A subroutine is traversed at most once. Later calls only reconcile: the
/// recorded parameters are unified with (and popped off) the caller's stack
/// top, and the recorded return slots are unified with the cells that remain
/// after the call.
pub(crate) fn analyze_subroutine(ctx: &mut AnalysisContext, sub: SubRoutineId) -> Result<()> {
    match ctx.script.subroutine(sub).analyze_state {
        AnalyzeState::Finished => return reconcile_finished_call(ctx, sub),
        AnalyzeState::InProgress => {
            let address = ctx.script.subroutine(sub).address;
            return Err(Error::Recursion.locate(address));
        }
        AnalyzeState::Pending => {}
    }

    ctx.script.subroutine_mut(sub).analyze_state = AnalyzeState::InProgress;

    if let Some(entry) = ctx.script.subroutine(sub).blocks.first().copied() {
        // The callee starts with an empty frame of its own on top of the
        // caller's stack; everything it reaches below that is signal about
        // its calling convention.
        let saved_sub = ctx.sub;
        let saved_sub_stack = ctx.sub_stack;
        let saved_sub_retn = ctx.sub_retn;
        let saved_return_stack = mem::take(&mut ctx.return_stack);

        ctx.sub = sub;
        ctx.sub_stack = 0;
        ctx.sub_retn = false;

        analyze_block(ctx, entry)?;

        // The callee's exit state becomes the caller's stack: parameters
        // popped, return slots written.
        ctx.stack = mem::take(&mut ctx.return_stack);

        ctx.sub = saved_sub;
        ctx.sub_stack = saved_sub_stack;
        ctx.sub_retn = saved_sub_retn;
        ctx.return_stack = saved_return_stack;

        let params = ctx.script.subroutine(sub).params.len();
        ctx.sub_stack = ctx.sub_stack.saturating_sub(params);
    }

    ctx.script.subroutine_mut(sub).analyze_state = AnalyzeState::Finished;

    // Collapse every chain of duplicated variables onto a single type.
    fixup_duplicate_types(ctx.variables);

    Ok(())
}

/// Re-applies an already-analyzed subroutine's stack effect to the current
/// caller, unifying types between the recorded signature and the caller's
/// cells.
fn reconcile_finished_call(ctx: &mut AnalysisContext, sub: SubRoutineId) -> Result<()> {
    let address = ctx.address();

    let params = ctx.script.subroutine(sub).params.clone();
    for recorded in params {
        let passed = ctx.stack.variable_at(0).locate(address)?;
        ctx.same_variable_type(recorded, passed);
        ctx.pop_variable(false).locate(address)?;
    }

    let returns = ctx.script.subroutine(sub).returns.clone();
    let count = returns.len();
    for (i, slot) in returns.into_iter().enumerate() {
        let Some(recorded) = slot else { continue };

        let receiving = ctx.stack.variable_at(count - 1 - i).locate(address)?;
        ctx.same_variable_type(recorded, receiving);
    }

    Ok(())
}

/// Analyzes one basic block and recurses into its children.
///
/// Each child runs on its own clone of the stack so that sibling branches
/// do not interfere. A `RETN` seen anywhere below propagates upward, and the
/// last non-empty return-state wins.
fn analyze_block(ctx: &mut AnalysisContext, block: BlockId) -> Result<()> {
    match ctx.script.block(block).analyze_state {
        AnalyzeState::Finished => return Ok(()),
        AnalyzeState::InProgress => {
            let address = ctx.script.block(block).address;
            return Err(Error::Recursion.locate(address));
        }
        AnalyzeState::Pending => {}
    }

    ctx.script.block_mut(block).analyze_state = AnalyzeState::InProgress;

    let instructions = ctx.script.block(block).instructions.clone();
    for instruction in instructions {
        ctx.instruction = Some(instruction);
        analyze_instruction(ctx)?;
        ctx.instruction = None;
    }

    ctx.script.block_mut(block).analyze_state = AnalyzeState::Finished;

    let (children, edges) = {
        let block = ctx.script.block(block);
        (block.children.clone(), block.children_types.clone())
    };

    // Children and edge types match positionally; a disassembler that breaks
    // this invariant is a programmer bug, which zip_eq turns into a panic.
    for (child, edge) in children.into_iter().zip_eq(edges) {
        // Calls and closures are not control flow here; JSR handles the
        // former and the latter is out of analysis scope.
        if !edge.is_followed() {
            continue;
        }

        let saved_stack = ctx.stack.clone();
        let saved_sub_stack = ctx.sub_stack;
        let saved_sub_retn = ctx.sub_retn;
        let saved_return_stack = ctx.return_stack.clone();

        analyze_block(ctx, child)?;

        ctx.sub_retn = saved_sub_retn || ctx.sub_retn;
        if ctx.return_stack.is_empty() {
            ctx.return_stack = saved_return_stack;
        }
        ctx.stack = saved_stack;
        ctx.sub_stack = saved_sub_stack;
    }

    Ok(())
}

/// Analyzes a single instruction: snapshots the stack it sees, then applies
/// its stack effect.
fn analyze_instruction(ctx: &mut AnalysisContext) -> Result<()> {
    let instruction = ctx.current();

    // The stored snapshot keeps only the current subroutine's frame, not the
    // caller frames above it.
    let snapshot = ctx.stack.top_frame(ctx.sub_stack);
    ctx.script.instruction_mut(instruction).stack = Some(snapshot);

    let opcode = ctx.script.instruction(instruction).opcode;
    match stack_effect(opcode) {
        Some(effect) => effect(ctx),
        None => Ok(()),
    }
}
