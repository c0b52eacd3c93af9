//! This module contains the abstract stack semantics of each NWScript
//! opcode, together with the dispatch table mapping opcodes onto their
//! handlers.
//!
//! The handlers do not execute anything; they track how each instruction
//! moves and types cells on the abstract stack. Two of them double as the
//! calling-convention inference: a `MOVSP` that pops below the current frame
//! is a callee clearing its parameters, and a `CPDOWNSP` that writes above
//! the current frame is a callee storing a return value.

use itertools::Itertools;

use crate::{
    analysis::{
        analyze_subroutine,
        context::{AnalysisContext, AnalysisMode},
    },
    constant::{CELL_SIZE, DUMMY_STACK_FRAME_SIZE, MAX_ARGUMENT_COUNT, VECTOR_CELL_COUNT},
    error::{container::Locatable, Error, Result},
    script::{instruction::{InstructionType, Opcode}, InstructionId},
    stack::StackCell,
    variable::{VariableId, VariableType, VariableUse},
};

/// The handler type for one opcode's stack effect.
pub(crate) type StackEffect = fn(&mut AnalysisContext) -> Result<()>;

/// Gets the stack-effect handler for `opcode`, or [`None`] for opcodes that
/// have no effect the analysis tracks (`JMP`, `NOP`, the `STORESTATE`
/// family, the array opcodes, `GETREF` and `SCRIPTSIZE`).
pub(crate) fn stack_effect(opcode: Opcode) -> Option<StackEffect> {
    match opcode {
        Opcode::RsAdd | Opcode::Const => Some(push),
        Opcode::MovSp => Some(pop),
        Opcode::Jsr => Some(jump_subroutine),
        Opcode::Retn => Some(retn),
        Opcode::CpTopSp => Some(copy_top_sp),
        Opcode::CpDownSp => Some(copy_down_sp),
        Opcode::CpTopBp => Some(copy_top_bp),
        Opcode::CpDownBp => Some(copy_down_bp),
        Opcode::Action => Some(action),
        Opcode::LogAnd
        | Opcode::LogOr
        | Opcode::IncOr
        | Opcode::ExcOr
        | Opcode::BoolAnd
        | Opcode::ShLeft
        | Opcode::ShRight
        | Opcode::UShRight => Some(boolean),
        Opcode::Eq | Opcode::Neq | Opcode::Geq | Opcode::Gt | Opcode::Lt | Opcode::Leq => {
            Some(equality)
        }
        Opcode::Neg | Opcode::Not | Opcode::Comp => Some(unary_arithmetic),
        Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod => {
            Some(binary_arithmetic)
        }
        Opcode::Jz | Opcode::Jnz => Some(conditional),
        Opcode::Destruct => Some(destruct),
        Opcode::SaveBp => Some(save_bp),
        Opcode::RestoreBp => Some(restore_bp),
        Opcode::DecSp | Opcode::IncSp => Some(modify_sp),
        Opcode::DecBp | Opcode::IncBp => Some(modify_bp),
        Opcode::StoreStateAll
        | Opcode::Jmp
        | Opcode::StoreState
        | Opcode::Nop
        | Opcode::WriteArray
        | Opcode::ReadArray
        | Opcode::GetRef
        | Opcode::GetRefArray
        | Opcode::ScriptSize => None,
    }
}

/// The fields of the current instruction an opcode handler works from.
struct Current {
    id: InstructionId,
    address: u32,
    opcode: Opcode,
    itype: InstructionType,
    args: [i32; MAX_ARGUMENT_COUNT],
    arg_count: usize,
}

/// Copies the scalar fields of the current instruction out of the script.
fn current(ctx: &AnalysisContext) -> Current {
    let id = ctx.current();
    let instruction = ctx.script.instruction(id);

    Current {
        id,
        address: instruction.address,
        opcode: instruction.opcode,
        itype: instruction.itype,
        args: instruction.args,
        arg_count: instruction.arg_count,
    }
}

/// Builds the error for direct arguments violating an opcode's encoding
/// rules.
fn invalid_arguments(this: &Current, arguments: &[i32]) -> crate::error::LocatedError {
    Error::InvalidArguments {
        opcode: this.opcode,
        arguments: arguments.to_vec(),
    }
    .locate(this.address)
}

/// Checks that a bytecode stack offset is a negative multiple of the cell
/// size and converts it into a depth from the top of the stack.
fn normalize_offset(this: &Current, offset: i32) -> Result<usize> {
    if offset > -(CELL_SIZE as i32) || offset % CELL_SIZE as i32 != 0 {
        return Err(invalid_arguments(this, &[offset]));
    }

    Ok((offset / -(CELL_SIZE as i32) - 1) as usize)
}

/// Checks that a bytecode size argument is a non-negative multiple of the
/// cell size and converts it into a cell count.
fn normalize_size(this: &Current, size: i32) -> Result<usize> {
    if size < 0 || size % CELL_SIZE as i32 != 0 {
        return Err(invalid_arguments(this, &[size]));
    }

    Ok((size / CELL_SIZE as i32) as usize)
}

/// A stack push, from a `RSADD` or `CONST` instruction.
fn push(ctx: &mut AnalysisContext) -> Result<()> {
    let this = current(ctx);
    let typ = this.itype.variable_type();

    ctx.push_variable(typ, VariableUse::Local);

    Ok(())
}

/// A stack pop, from a `MOVSP` instruction.
///
/// Popping below the current frame is the calling convention showing
/// itself: the subroutine is clearing its parameters off the stack, so each
/// underflowing cell is recorded as a parameter.
fn pop(ctx: &mut AnalysisContext) -> Result<()> {
    let this = current(ctx);

    let offset = this.args[0];
    if offset > 0 || offset % CELL_SIZE as i32 != 0 {
        return Err(invalid_arguments(&this, &[offset]));
    }

    let mut count = (offset / -(CELL_SIZE as i32)) as usize;
    while count > 0 {
        if ctx.sub_stack == 0 {
            let parameter = ctx.stack.variable_at(0).locate(this.address)?;

            ctx.sub_stack += 1;
            ctx.variables.variable_mut(parameter).usage = VariableUse::Parameter;
            let sub = ctx.sub;
            ctx.script.subroutine_mut(sub).params.push(parameter);
        }

        ctx.pop_variable(false).locate(this.address)?;
        count -= 1;
    }

    Ok(())
}

/// A `JSR` instruction, calling into a subroutine.
fn jump_subroutine(ctx: &mut AnalysisContext) -> Result<()> {
    // Globals analysis does not cross calls.
    if ctx.mode == AnalysisMode::Globals {
        return Ok(());
    }

    let this = current(ctx);

    let target = ctx
        .script
        .instruction(this.id)
        .branches
        .first()
        .copied()
        .ok_or_else(|| invalid_arguments(&this, &[]))?;
    let block = ctx
        .script
        .instruction(target)
        .block
        .ok_or_else(|| invalid_arguments(&this, &[]))?;
    let callee = ctx.script.block(block).subroutine;

    analyze_subroutine(ctx, callee)
}

/// A `RETN` instruction, returning from a subroutine.
///
/// Writes above the frame land in the same stack space as the parameters,
/// so the first `min(|params|, |returns|)` recorded return slots are
/// parameter writes and get removed here. The current stack becomes the
/// subroutine's canonical exit state; further `RETN`s change nothing.
fn retn(ctx: &mut AnalysisContext) -> Result<()> {
    if ctx.sub_retn {
        return Ok(());
    }

    let sub = ctx.script.subroutine_mut(ctx.sub);
    let parameter_writes = sub.params.len().min(sub.returns.len());
    sub.returns.drain(..parameter_writes);

    let survivors: Vec<VariableId> = sub.returns.iter().copied().flatten().collect();
    for variable in survivors {
        ctx.variables.variable_mut(variable).usage = VariableUse::Return;
    }

    ctx.return_stack = ctx.stack.clone();
    ctx.sub_retn = true;

    Ok(())
}

/// A `CPTOPSP` instruction, duplicating stack cells onto the top of the
/// stack.
fn copy_top_sp(ctx: &mut AnalysisContext) -> Result<()> {
    let this = current(ctx);

    let depth = normalize_offset(&this, this.args[0])?;
    let mut count = normalize_size(&this, this.args[1])?;

    ctx.stack.check_depth(depth).locate(this.address)?;

    // Each push shifts the source one cell deeper, so the fixed depth keeps
    // addressing the next cell of the copied region.
    while count > 0 {
        ctx.duplicate_variable(depth).locate(this.address)?;
        count -= 1;
    }

    Ok(())
}

/// A `CPDOWNSP` instruction, copying the value of top cells down the stack.
///
/// The stack itself does not change; types flow between source and
/// destination, and a destination above the current frame is recorded as a
/// return slot of the subroutine.
fn copy_down_sp(ctx: &mut AnalysisContext) -> Result<()> {
    let this = current(ctx);

    let start = normalize_offset(&this, this.args[0])?;
    let cells = normalize_size(&this, this.args[1])?;

    let available = ctx.stack.size();
    if cells > available || start >= available || cells > start + 1 {
        return Err(Error::StackUnderrun {
            requested: cells.max(start + 1),
            available,
        }
        .locate(this.address));
    }

    for i in 0..cells {
        let pos = cells - 1 - i;
        let depth = start - i;

        let source = ctx.stack.variable_at(pos).locate(this.address)?;
        let mut typ = ctx.read_variable(pos).locate(this.address)?;

        if typ == VariableType::Any {
            let destination = ctx.stack.variable_at(depth).locate(this.address)?;
            typ = ctx.variables.variable(destination).typ;
            ctx.variables.variable_mut(source).typ = typ;
        }

        ctx.write_variable_typed(depth, typ).locate(this.address)?;

        if !ctx.sub_retn && depth >= ctx.sub_stack {
            // A write above the frame goes into either the return
            // placeholder or a parameter, both created by the caller. Record
            // it as a return slot for now; the RETN handler strips the
            // parameter writes once the parameter count is known.
            let underrun = depth - ctx.sub_stack + 1;
            let destination = ctx.stack.variable_at(depth).locate(this.address)?;

            let sub = ctx.script.subroutine_mut(ctx.sub);
            if sub.returns.len() < underrun {
                sub.returns.resize(underrun, None);
            }
            sub.returns[underrun - 1] = Some(destination);
        }
    }

    Ok(())
}

/// A `CPTOPBP` instruction, duplicating global variables onto the top of
/// the stack.
fn copy_top_bp(ctx: &mut AnalysisContext) -> Result<()> {
    let this = current(ctx);

    let start = normalize_offset(&this, this.args[0])?;
    let count = normalize_size(&this, this.args[1])?;

    let available = ctx.globals().locate(this.address)?.size();
    if start >= available || count > start + 1 {
        return Err(Error::GlobalsUnderrun {
            requested: (start + 1).max(count),
            available,
        }
        .locate(this.address));
    }

    for i in 0..count {
        let depth = start - i;

        let global = ctx
            .globals()
            .locate(this.address)?
            .variable_at(depth)
            .locate(this.address)?;

        let global_var = ctx.variables.variable_mut(global);
        global_var.readers.push(this.id);
        let typ = global_var.typ;

        ctx.push_variable(typ, VariableUse::Unknown);
    }

    Ok(())
}

/// A `CPDOWNBP` instruction, copying the value of top cells into the
/// global-variable array.
fn copy_down_bp(ctx: &mut AnalysisContext) -> Result<()> {
    let this = current(ctx);

    let start = normalize_offset(&this, this.args[0])?;
    let cells = normalize_size(&this, this.args[1])?;

    let available = ctx.globals().locate(this.address)?.size();
    if start >= available || cells > start + 1 {
        return Err(Error::GlobalsUnderrun {
            requested: (start + 1).max(cells),
            available,
        }
        .locate(this.address));
    }

    for i in 0..cells {
        let pos = cells - 1 - i;
        let depth = start - i;

        let source = ctx.stack.variable_at(pos).locate(this.address)?;
        let global = ctx
            .globals()
            .locate(this.address)?
            .variable_at(depth)
            .locate(this.address)?;

        let mut typ = ctx.read_variable(pos).locate(this.address)?;
        if typ == VariableType::Any {
            typ = ctx.variables.variable(global).typ;
            ctx.variables.variable_mut(source).typ = typ;
        }

        let global_var = ctx.variables.variable_mut(global);
        global_var.writers.push(this.id);
        global_var.typ = typ;
    }

    Ok(())
}

/// An `ACTION` instruction, calling a game-specific engine function.
fn action(ctx: &mut AnalysisContext) -> Result<()> {
    let this = current(ctx);

    let function = this.args[0];
    let param_count = this.args[1];
    if function < 0 || param_count < 0 {
        return Err(invalid_arguments(&this, &[function, param_count]));
    }

    let function = function as u32;
    let param_count = param_count as usize;

    // Trailing parameters may be defaulted away, but a call can never pass
    // more than the function declares.
    let declared = ctx.functions.parameter_count(ctx.game, function);
    if declared < param_count {
        return Err(invalid_arguments(&this, &[this.args[0], this.args[1]]));
    }

    let parameter_types = ctx.functions.parameter_types(ctx.game, function).to_vec();
    for i in 0..param_count {
        let Some(&parameter) = parameter_types.get(i) else {
            return Err(invalid_arguments(&this, &[this.args[0], this.args[1]]));
        };

        // Script state ("action") parameters are not kept on the stack.
        if parameter == VariableType::ScriptState {
            continue;
        }

        let (cell_type, cells) = if parameter == VariableType::Vector {
            (VariableType::Float, VECTOR_CELL_COUNT)
        } else {
            (parameter, 1)
        };

        for _ in 0..cells {
            if ctx.stack.is_empty() {
                return Err(Error::StackUnderrun {
                    requested: 1,
                    available: 0,
                }
                .locate(this.address));
            }

            ctx.coerce_variable_type(0, cell_type).locate(this.address)?;
            ctx.pop_variable(true).locate(this.address)?;
        }
    }

    match ctx.functions.return_type(ctx.game, function) {
        VariableType::Void => {}
        VariableType::Vector => {
            for _ in 0..VECTOR_CELL_COUNT {
                ctx.push_variable(VariableType::Float, VariableUse::Local);
            }
        }
        returned => {
            ctx.push_variable(returned, VariableUse::Local);
        }
    }

    Ok(())
}

/// A binary boolean or shift instruction: both operands unify to `Int` and
/// an `Int` is pushed.
fn boolean(ctx: &mut AnalysisContext) -> Result<()> {
    let this = current(ctx);

    let available = ctx.stack.size();
    if available < 2 {
        return Err(Error::StackUnderrun {
            requested: 2,
            available,
        }
        .locate(this.address));
    }

    ctx.coerce_variable_type(0, VariableType::Int).locate(this.address)?;
    ctx.coerce_variable_type(1, VariableType::Int).locate(this.address)?;

    for _ in 0..2 {
        ctx.pop_variable(true).locate(this.address)?;
    }

    ctx.push_variable(VariableType::Int, VariableUse::Local);

    Ok(())
}

/// An equality or comparison instruction.
///
/// `EQ` and `NEQ` may carry a size argument, in which case they compare two
/// compounds of `size / 4` cells; operands pair up by position and each pair
/// must share a type.
fn equality(ctx: &mut AnalysisContext) -> Result<()> {
    let this = current(ctx);

    if this.arg_count == 1 && (this.args[0] < 0 || this.args[0] % CELL_SIZE as i32 != 0) {
        return Err(invalid_arguments(&this, &[this.args[0]]));
    }

    let size = if this.arg_count == 1 {
        (this.args[0] / CELL_SIZE as i32) as usize
    } else {
        1
    };

    let available = ctx.stack.size();
    if available < size * 2 {
        return Err(Error::StackUnderrun {
            requested: size * 2,
            available,
        }
        .locate(this.address));
    }

    let mut first = Vec::with_capacity(size);
    let mut second = Vec::with_capacity(size);

    for _ in 0..size {
        first.push(ctx.pop_variable(true).locate(this.address)?);
    }
    for _ in 0..size {
        second.push(ctx.pop_variable(true).locate(this.address)?);
    }

    for (a, b) in first.into_iter().zip_eq(second) {
        ctx.same_variable_type(a, b);
    }

    ctx.push_variable(VariableType::Int, VariableUse::Local);

    Ok(())
}

/// A unary arithmetic instruction: `NEG`, `NOT` or `COMP`.
fn unary_arithmetic(ctx: &mut AnalysisContext) -> Result<()> {
    let this = current(ctx);

    let available = ctx.stack.size();
    if available < 1 {
        return Err(Error::StackUnderrun {
            requested: 1,
            available,
        }
        .locate(this.address));
    }

    let typ = this.itype.variable_type();
    if typ == VariableType::Void {
        return Err(Error::InvalidInstructionType { itype: this.itype }.locate(this.address));
    }

    ctx.coerce_variable_type(0, typ).locate(this.address)?;
    ctx.pop_variable(true).locate(this.address)?;
    ctx.push_variable(typ, VariableUse::Local);

    Ok(())
}

/// A binary arithmetic instruction: `ADD`, `SUB`, `MUL`, `DIV` or `MOD`.
///
/// The instruction's type tag encodes both operand types; vectors are
/// consumed and produced as their constituent floats.
fn binary_arithmetic(ctx: &mut AnalysisContext) -> Result<()> {
    let this = current(ctx);

    let available = ctx.stack.size();
    if available < 2 {
        return Err(Error::StackUnderrun {
            requested: 2,
            available,
        }
        .locate(this.address));
    }

    let typ = this.itype.variable_type();
    if typ == VariableType::Void {
        return Err(Error::InvalidInstructionType { itype: this.itype }.locate(this.address));
    }

    match this.itype {
        InstructionType::IntInt
        | InstructionType::FloatFloat
        | InstructionType::StringString
        | InstructionType::EngineType0EngineType0
        | InstructionType::EngineType1EngineType1
        | InstructionType::EngineType2EngineType2
        | InstructionType::EngineType3EngineType3
        | InstructionType::EngineType4EngineType4
        | InstructionType::EngineType5EngineType5 => {
            ctx.coerce_variable_type(0, typ).locate(this.address)?;
            ctx.coerce_variable_type(1, typ).locate(this.address)?;

            for _ in 0..2 {
                ctx.pop_variable(true).locate(this.address)?;
            }

            ctx.push_variable(typ, VariableUse::Local);
        }

        InstructionType::IntFloat => {
            binary_mixed(ctx, &this, VariableType::Float, VariableType::Int)?;
        }
        InstructionType::FloatInt => {
            binary_mixed(ctx, &this, VariableType::Int, VariableType::Float)?;
        }

        InstructionType::VectorVector => {
            binary_floats(ctx, &this, 2 * VECTOR_CELL_COUNT)?;
        }
        InstructionType::VectorFloat | InstructionType::FloatVector => {
            binary_floats(ctx, &this, VECTOR_CELL_COUNT + 1)?;
        }

        _ => {
            return Err(Error::InvalidInstructionType { itype: this.itype }.locate(this.address));
        }
    }

    Ok(())
}

/// The mixed `Int`/`Float` arithmetic case: `top` and `below` name the
/// expected operand types from the top of the stack down; the result is
/// always a `Float`.
fn binary_mixed(
    ctx: &mut AnalysisContext,
    this: &Current,
    top: VariableType,
    below: VariableType,
) -> Result<()> {
    ctx.coerce_variable_type(0, top).locate(this.address)?;
    ctx.coerce_variable_type(1, below).locate(this.address)?;

    for _ in 0..2 {
        ctx.pop_variable(true).locate(this.address)?;
    }

    ctx.push_variable(VariableType::Float, VariableUse::Local);

    Ok(())
}

/// The vector arithmetic cases: `operands` float cells are consumed and a
/// vector's worth of floats is produced.
fn binary_floats(ctx: &mut AnalysisContext, this: &Current, operands: usize) -> Result<()> {
    let available = ctx.stack.size();
    if available < operands {
        return Err(Error::StackUnderrun {
            requested: operands,
            available,
        }
        .locate(this.address));
    }

    for depth in 0..operands {
        ctx.coerce_variable_type(depth, VariableType::Float)
            .locate(this.address)?;
    }

    for _ in 0..operands {
        ctx.pop_variable(true).locate(this.address)?;
    }

    for _ in 0..VECTOR_CELL_COUNT {
        ctx.push_variable(VariableType::Float, VariableUse::Local);
    }

    Ok(())
}

/// A conditional jump, `JZ` or `JNZ`: pops its `Int` condition.
///
/// Control flow is not affected here; the graph already encodes the
/// branches.
fn conditional(ctx: &mut AnalysisContext) -> Result<()> {
    let this = current(ctx);

    let available = ctx.stack.size();
    if available < 1 {
        return Err(Error::StackUnderrun {
            requested: 1,
            available,
        }
        .locate(this.address));
    }

    ctx.coerce_variable_type(0, VariableType::Int).locate(this.address)?;
    ctx.pop_variable(true).locate(this.address)?;

    Ok(())
}

/// A `DESTRUCT` instruction, clearing cells from the stack while keeping a
/// window of them.
///
/// The preserved window is measured in bytes from the bottom of the
/// destructed region; preserved cells return to the stack in their original
/// relative order.
fn destruct(ctx: &mut AnalysisContext) -> Result<()> {
    let this = current(ctx);

    let stack_size = this.args[0];
    let keep_offset = this.args[1];
    let keep_size = this.args[2];

    let cell = CELL_SIZE as i32;
    if stack_size % cell != 0
        || keep_offset % cell != 0
        || keep_size % cell != 0
        || stack_size < 0
        || keep_offset < 0
        || keep_size < 0
    {
        return Err(invalid_arguments(&this, &[stack_size, keep_offset, keep_size]));
    }

    let total = (stack_size / cell) as usize;
    let available = ctx.stack.size();
    if total > available {
        return Err(Error::StackUnderrun {
            requested: total,
            available,
        }
        .locate(this.address));
    }

    let mut kept: Vec<StackCell> = Vec::new();
    let mut remaining = stack_size;
    while remaining > 0 {
        let popped = ctx.stack.pop().locate(this.address)?;

        if remaining <= keep_offset + keep_size && remaining > keep_offset {
            kept.push(popped);
        }

        ctx.sub_stack = ctx.sub_stack.saturating_sub(1);
        remaining -= cell;
    }

    for preserved in kept.into_iter().rev() {
        ctx.sub_stack += 1;
        ctx.stack.push(preserved.variable);
    }

    Ok(())
}

/// A `SAVEBP` instruction, setting the value of BP. This finalizes the
/// global variables.
fn save_bp(ctx: &mut AnalysisContext) -> Result<()> {
    let this = current(ctx);

    if ctx.mode != AnalysisMode::Globals {
        return Err(Error::SaveBpOutsideGlobals.locate(this.address));
    }

    if !ctx.globals().locate(this.address)?.is_empty() {
        return Err(Error::MultipleSaveBp.locate(this.address));
    }

    // At this point, the current stack frame holds every global variable the
    // script will have access to, plus the dummy frame underneath it.
    let mut layout = ctx.stack.clone();
    layout.strip_bottom(DUMMY_STACK_FRAME_SIZE);

    let globals: Vec<VariableId> = layout.iter_from_top().map(|c| c.variable).collect();
    for global in globals {
        ctx.variables.variable_mut(global).usage = VariableUse::Global;
    }

    *ctx.globals().locate(this.address)? = layout;

    // SAVEBP pushes the saved BP value onto the stack.
    ctx.push_variable(VariableType::Int, VariableUse::Local);

    Ok(())
}

/// A `RESTOREBP` instruction, restoring an old value of BP.
fn restore_bp(ctx: &mut AnalysisContext) -> Result<()> {
    let this = current(ctx);

    let available = ctx.stack.size();
    if available < 1 {
        return Err(Error::StackUnderrun {
            requested: 1,
            available,
        }
        .locate(this.address));
    }

    ctx.pop_variable(true).locate(this.address)?;

    Ok(())
}

/// A `DECSP` or `INCSP` instruction, modifying an `Int` cell of the current
/// frame in place.
fn modify_sp(ctx: &mut AnalysisContext) -> Result<()> {
    let this = current(ctx);

    let depth = normalize_offset(&this, this.args[0])?;

    ctx.stack.check_depth(depth).locate(this.address)?;
    ctx.coerce_variable_type(depth, VariableType::Int).locate(this.address)?;

    ctx.read_variable(depth).locate(this.address)?;
    ctx.write_variable(depth).locate(this.address)?;

    Ok(())
}

/// A `DECBP` or `INCBP` instruction, modifying an `Int` global variable in
/// place.
fn modify_bp(ctx: &mut AnalysisContext) -> Result<()> {
    let this = current(ctx);

    let depth = normalize_offset(&this, this.args[0])?;

    let available = ctx.globals().locate(this.address)?.size();
    if depth >= available {
        return Err(Error::GlobalsUnderrun {
            requested: depth + 1,
            available,
        }
        .locate(this.address));
    }

    let global = ctx
        .globals()
        .locate(this.address)?
        .variable_at(depth)
        .locate(this.address)?;

    ctx.coerce_variable(global, VariableType::Int).locate(this.address)?;

    let global_var = ctx.variables.variable_mut(global);
    global_var.readers.push(this.id);
    global_var.writers.push(this.id);

    Ok(())
}
