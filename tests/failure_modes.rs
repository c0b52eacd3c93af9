//! Tests of the analysis failure model: malformed direct arguments, stack
//! underruns outside the calling-convention cases, and conflicting types.

mod common;

use nwscript_stack_analyzer::{
    error::Error,
    script::{
        instruction::{InstructionType, Opcode},
        Script,
    },
    variable::VariableType,
};

use crate::common::{add_single_block_sub, analyze, instr, instr_args};

#[test]
fn movsp_rejects_a_positive_offset() {
    let mut script = Script::new();
    let main = add_single_block_sub(
        &mut script,
        0x0d,
        vec![
            instr_args(0x0d, Opcode::MovSp, InstructionType::None, &[4]),
            instr(0x13, Opcode::Retn, InstructionType::None),
        ],
    );

    let error = analyze(&mut script, main).expect_err("A positive MOVSP did not error");

    assert_eq!(error.location, 0x0d);
    assert!(matches!(
        error.payload,
        Error::InvalidArguments {
            opcode: Opcode::MovSp,
            ..
        }
    ));
}

#[test]
fn movsp_rejects_an_unaligned_offset() {
    let mut script = Script::new();
    let main = add_single_block_sub(
        &mut script,
        0x0d,
        vec![
            instr_args(0x0d, Opcode::MovSp, InstructionType::None, &[-3]),
            instr(0x13, Opcode::Retn, InstructionType::None),
        ],
    );

    let error = analyze(&mut script, main).expect_err("An unaligned MOVSP did not error");

    assert!(matches!(error.payload, Error::InvalidArguments { .. }));
}

#[test]
fn copy_rejects_a_zero_offset() {
    let mut script = Script::new();
    let main = add_single_block_sub(
        &mut script,
        0x0d,
        vec![
            instr_args(0x0d, Opcode::CpTopSp, InstructionType::None, &[0, 4]),
            instr(0x15, Opcode::Retn, InstructionType::None),
        ],
    );

    let error = analyze(&mut script, main).expect_err("A zero-offset copy did not error");

    assert!(matches!(error.payload, Error::InvalidArguments { .. }));
}

#[test]
fn copy_rejects_a_negative_size() {
    let mut script = Script::new();
    let main = add_single_block_sub(
        &mut script,
        0x0d,
        vec![
            instr_args(0x0d, Opcode::CpDownSp, InstructionType::None, &[-8, -4]),
            instr(0x15, Opcode::Retn, InstructionType::None),
        ],
    );

    let error = analyze(&mut script, main).expect_err("A negative-size copy did not error");

    assert!(matches!(error.payload, Error::InvalidArguments { .. }));
}

#[test]
fn copy_past_the_stack_bottom_underruns() {
    let mut script = Script::new();
    let main = add_single_block_sub(
        &mut script,
        0x0d,
        vec![
            // The dummy frame is 32 cells; depth 39 does not exist.
            instr_args(0x0d, Opcode::CpTopSp, InstructionType::None, &[-160, 4]),
            instr(0x15, Opcode::Retn, InstructionType::None),
        ],
    );

    let error = analyze(&mut script, main).expect_err("A copy from below the stack did not error");

    assert_eq!(error.location, 0x0d);
    assert!(matches!(error.payload, Error::StackUnderrun { .. }));
}

#[test]
fn popping_an_empty_stack_underruns() {
    // Pop more cells than the dummy frame can absorb as parameters.
    let mut script = Script::new();
    let main = add_single_block_sub(
        &mut script,
        0x0d,
        vec![
            instr_args(0x0d, Opcode::MovSp, InstructionType::None, &[-136]),
            instr(0x13, Opcode::Retn, InstructionType::None),
        ],
    );

    let error = analyze(&mut script, main).expect_err("Draining the whole stack did not error");

    assert!(matches!(error.payload, Error::StackUnderrun { .. }));
}

#[test]
fn conflicting_operand_types_fail() {
    // float + int under an int/int tag.
    let mut script = Script::new();
    let main = add_single_block_sub(
        &mut script,
        0x0d,
        vec![
            instr(0x0d, Opcode::Const, InstructionType::Float),
            instr(0x13, Opcode::Const, InstructionType::Int),
            instr(0x19, Opcode::Add, InstructionType::IntInt),
            instr(0x1b, Opcode::Retn, InstructionType::None),
        ],
    );

    let error = analyze(&mut script, main).expect_err("Conflicting operands did not error");

    assert_eq!(error.location, 0x19);
    assert!(matches!(
        error.payload,
        Error::TypeMismatch {
            expected: VariableType::Int,
            found: VariableType::Float,
        }
    ));
}

#[test]
fn boolean_ops_require_ints() {
    let mut script = Script::new();
    let main = add_single_block_sub(
        &mut script,
        0x0d,
        vec![
            instr(0x0d, Opcode::Const, InstructionType::String),
            instr(0x13, Opcode::Const, InstructionType::Int),
            instr(0x19, Opcode::BoolAnd, InstructionType::IntInt),
            instr(0x1b, Opcode::Retn, InstructionType::None),
        ],
    );

    let error = analyze(&mut script, main).expect_err("A string BOOLAND operand did not error");

    assert!(matches!(error.payload, Error::TypeMismatch { .. }));
}

#[test]
fn arithmetic_rejects_a_valueless_type_tag() {
    let mut script = Script::new();
    let main = add_single_block_sub(
        &mut script,
        0x0d,
        vec![
            instr(0x0d, Opcode::Const, InstructionType::Int),
            instr(0x13, Opcode::Const, InstructionType::Int),
            instr(0x19, Opcode::Add, InstructionType::StructStruct),
            instr(0x1b, Opcode::Retn, InstructionType::None),
        ],
    );

    let error = analyze(&mut script, main).expect_err("A struct ADD did not error");

    assert!(matches!(
        error.payload,
        Error::InvalidInstructionType {
            itype: InstructionType::StructStruct,
        }
    ));
}

#[test]
fn unary_arithmetic_rejects_a_missing_type_tag() {
    let mut script = Script::new();
    let main = add_single_block_sub(
        &mut script,
        0x0d,
        vec![
            instr(0x0d, Opcode::Const, InstructionType::Int),
            instr(0x13, Opcode::Neg, InstructionType::None),
            instr(0x15, Opcode::Retn, InstructionType::None),
        ],
    );

    let error = analyze(&mut script, main).expect_err("An untyped NEG did not error");

    assert!(matches!(error.payload, Error::InvalidInstructionType { .. }));
}

#[test]
fn equality_rejects_a_negative_size() {
    let mut script = Script::new();
    let main = add_single_block_sub(
        &mut script,
        0x0d,
        vec![
            instr_args(0x0d, Opcode::Eq, InstructionType::StructStruct, &[-4]),
            instr(0x11, Opcode::Retn, InstructionType::None),
        ],
    );

    let error = analyze(&mut script, main).expect_err("A negative EQ size did not error");

    assert!(matches!(error.payload, Error::InvalidArguments { .. }));
}

#[test]
fn a_call_without_a_target_is_malformed() {
    let mut script = Script::new();
    let main = add_single_block_sub(
        &mut script,
        0x0d,
        vec![
            // A JSR whose branch list the disassembler never filled in.
            instr(0x0d, Opcode::Jsr, InstructionType::None),
            instr(0x13, Opcode::Retn, InstructionType::None),
        ],
    );

    let error = analyze(&mut script, main).expect_err("A targetless JSR did not error");

    assert_eq!(error.location, 0x0d);
    assert!(matches!(
        error.payload,
        Error::InvalidArguments {
            opcode: Opcode::Jsr,
            ..
        }
    ));
}

#[test]
fn mixed_arithmetic_checks_operand_order() -> anyhow::Result<()> {
    // int + float: the float is on top under the IntFloat tag.
    let mut script = Script::new();
    let main = add_single_block_sub(
        &mut script,
        0x0d,
        vec![
            instr(0x0d, Opcode::Const, InstructionType::Int),
            instr(0x13, Opcode::Const, InstructionType::Float),
            instr(0x19, Opcode::Add, InstructionType::IntFloat),
            instr_args(0x1b, Opcode::MovSp, InstructionType::None, &[-4]),
            instr(0x21, Opcode::Retn, InstructionType::None),
        ],
    );

    let variables = analyze(&mut script, main)?;

    // The result is a float.
    let result = variables.iter().last().unwrap();
    assert_eq!(result.typ, VariableType::Float);

    Ok(())
}

#[test]
fn vector_arithmetic_consumes_component_floats() -> anyhow::Result<()> {
    let mut script = Script::new();
    let mut instructions = Vec::new();
    for i in 0..6 {
        instructions.push(instr(0x0d + i * 6, Opcode::Const, InstructionType::Float));
    }
    instructions.push(instr(0x31, Opcode::Add, InstructionType::VectorVector));
    instructions.push(instr_args(0x33, Opcode::MovSp, InstructionType::None, &[-12]));
    instructions.push(instr(0x39, Opcode::Retn, InstructionType::None));

    let main = add_single_block_sub(&mut script, 0x0d, instructions);

    let _ = analyze(&mut script, main)?;

    // Six components in, three out, and the frame drains to empty.
    let block = script.subroutine(main).blocks[0];
    let movsp = script.block(block).instructions[7];
    assert_eq!(script.instruction(movsp).stack.as_ref().unwrap().size(), 3);

    let retn = script.block(block).instructions[8];
    assert_eq!(script.instruction(retn).stack.as_ref().unwrap().size(), 0);

    Ok(())
}
