//! This module contains common testing utilities for testing this library.
#![cfg(test)]

use nwscript_stack_analyzer::{
    analyze_subroutine_stack,
    error::Result,
    game::{EmptySignatures, FunctionSignatures, GameId},
    script::{
        block::{Block, BlockEdgeType},
        instruction::{Instruction, InstructionType, Opcode},
        subroutine::SubRoutine,
        BlockId,
        Script,
        SubRoutineId,
    },
    stack::Stack,
    variable::{VariableSpace, VariableType},
};

/// Creates an instruction without direct arguments.
#[allow(unused)] // It is actually
pub fn instr(address: u32, opcode: Opcode, itype: InstructionType) -> Instruction {
    Instruction::new(address, opcode, itype)
}

/// Creates an instruction with the provided direct arguments.
#[allow(unused)] // It is actually
pub fn instr_args(
    address: u32,
    opcode: Opcode,
    itype: InstructionType,
    args: &[i32],
) -> Instruction {
    Instruction::new(address, opcode, itype).with_args(args)
}

/// Appends a block holding `instructions` to `sub`, wiring the instruction
/// backrefs the disassembler would provide.
#[allow(unused)] // It is actually
pub fn add_block(
    script: &mut Script,
    sub: SubRoutineId,
    address: u32,
    instructions: Vec<Instruction>,
) -> BlockId {
    let block = script.add_block(Block::new(address, sub));
    script.subroutine_mut(sub).blocks.push(block);

    for instruction in instructions {
        let id = script.add_instruction(instruction);
        script.instruction_mut(id).block = Some(block);
        script.block_mut(block).instructions.push(id);
    }

    block
}

/// Appends a subroutine whose body is a single block holding
/// `instructions`.
#[allow(unused)] // It is actually
pub fn add_single_block_sub(
    script: &mut Script,
    address: u32,
    instructions: Vec<Instruction>,
) -> SubRoutineId {
    let sub = script.add_subroutine(SubRoutine::new(address));
    add_block(script, sub, address, instructions);
    sub
}

/// Connects `parent` to `child` with the provided edge type.
#[allow(unused)] // It is actually
pub fn link_edge(script: &mut Script, parent: BlockId, child: BlockId, edge: BlockEdgeType) {
    let parent = script.block_mut(parent);
    parent.children.push(child);
    parent.children_types.push(edge);
}

/// Wires a subroutine call: the `JSR` ending `caller_block` branches to the
/// entry instruction of `callee`, and the block edges a disassembler would
/// emit (`FunctionCall` to the callee, `SubRoutineTail` to the
/// continuation, when there is one) are added.
#[allow(unused)] // It is actually
pub fn link_call(
    script: &mut Script,
    caller_block: BlockId,
    callee: SubRoutineId,
    tail: Option<BlockId>,
) {
    let callee_entry = script.subroutine(callee).blocks[0];
    let entry_instruction = script.block(callee_entry).instructions[0];

    let jsr = *script
        .block(caller_block)
        .instructions
        .last()
        .expect("The calling block ends with its JSR");
    script.instruction_mut(jsr).branches.push(entry_instruction);

    link_edge(script, caller_block, callee_entry, BlockEdgeType::FunctionCall);
    if let Some(tail) = tail {
        link_edge(script, caller_block, tail, BlockEdgeType::SubRoutineTail);
    }
}

/// Runs a whole-program analysis over `sub` with no engine functions and no
/// globals, returning the populated variable space.
#[allow(unused)] // It is actually
pub fn analyze(script: &mut Script, sub: SubRoutineId) -> Result<VariableSpace> {
    let mut variables = VariableSpace::new();
    analyze_subroutine_stack(
        script,
        sub,
        &mut variables,
        GameId::Nwn,
        &EmptySignatures,
        None,
    )?;

    Ok(variables)
}

/// Runs a whole-program analysis over `sub` against the provided engine
/// function `signatures`, returning the populated variable space.
#[allow(unused)] // It is actually
pub fn analyze_with_signatures(
    script: &mut Script,
    sub: SubRoutineId,
    signatures: &dyn FunctionSignatures,
) -> Result<VariableSpace> {
    let mut variables = VariableSpace::new();
    analyze_subroutine_stack(script, sub, &mut variables, GameId::Nwn, signatures, None)?;

    Ok(variables)
}

/// Runs a whole-program analysis over `sub` with a previously recovered
/// globals layout attached.
#[allow(unused)] // It is actually
pub fn analyze_with_globals(
    script: &mut Script,
    sub: SubRoutineId,
    globals: &mut Stack,
) -> Result<VariableSpace> {
    let mut variables = VariableSpace::new();
    analyze_subroutine_stack(
        script,
        sub,
        &mut variables,
        GameId::Nwn,
        &EmptySignatures,
        Some(globals),
    )?;

    Ok(variables)
}

/// A hand-written engine-function table for testing, indexed by function
/// number.
#[allow(unused)] // It is actually
pub struct TestSignatures {
    functions: Vec<(Vec<VariableType>, VariableType)>,
}

#[allow(unused)] // It is actually
impl TestSignatures {
    /// Creates a table from `(parameter types, return type)` entries; the
    /// position of an entry is its function number.
    pub fn new(functions: Vec<(Vec<VariableType>, VariableType)>) -> Self {
        Self { functions }
    }
}

impl FunctionSignatures for TestSignatures {
    fn parameter_count(&self, _game: GameId, function: u32) -> usize {
        self.functions[function as usize].0.len()
    }

    fn parameter_types(&self, _game: GameId, function: u32) -> &[VariableType] {
        &self.functions[function as usize].0
    }

    fn return_type(&self, _game: GameId, function: u32) -> VariableType {
        self.functions[function as usize].1
    }
}
