//! This module contains the mutable state threaded through a stack
//! analysis: the current traversal position, the frame accounting for the
//! subroutine being analyzed, and the helpers every opcode handler uses to
//! manipulate variables on the abstract stack.

use crate::{
    constant::DUMMY_STACK_FRAME_SIZE,
    error::Error,
    game::{FunctionSignatures, GameId},
    script::{InstructionId, Script, SubRoutineId},
    stack::Stack,
    variable::{VariableId, VariableSpace, VariableType, VariableUse},
};

/// The two modes a stack analysis can run in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum AnalysisMode {
    /// Analyze the stack of the `_global` subroutine in isolation; no
    /// subroutine call is followed.
    Globals,
    /// Analyze complete script control flow, following subroutine calls.
    SubRoutine,
}

/// The context of one running stack analysis.
///
/// The driver owns one context per entry-point invocation and threads it
/// through the whole traversal. The stack is cloned per branch by the
/// driver; everything else is shared mutable state.
pub(crate) struct AnalysisContext<'a> {
    /// The mode the analysis runs in.
    pub mode: AnalysisMode,

    /// The script being analyzed, enriched in place.
    pub script: &'a mut Script,

    /// The arena receiving every variable the analysis infers.
    pub variables: &'a mut VariableSpace,

    /// The engine-function signature tables.
    pub functions: &'a dyn FunctionSignatures,

    /// The game the script was compiled for.
    pub game: GameId,

    /// The global-variable array, when one is attached.
    ///
    /// In globals mode this is filled by `SAVEBP`; in whole-program mode it
    /// carries the layout of a previous globals pass, if any.
    pub globals: Option<&'a mut Stack>,

    /// The abstract stack along the current traversal path.
    pub stack: Stack,

    /// The instruction currently being analyzed, if any.
    pub instruction: Option<InstructionId>,

    /// The subroutine currently being analyzed.
    pub sub: SubRoutineId,

    /// How many cells of the stack belong to the current subroutine's own
    /// frame.
    pub sub_stack: usize,

    /// Whether a `RETN` has been seen in the current subroutine.
    pub sub_retn: bool,

    /// The canonical exit-state stack of the current subroutine, snapshot at
    /// its first `RETN`.
    pub return_stack: Stack,
}

impl<'a> AnalysisContext<'a> {
    /// Creates a context for analyzing `sub` in the provided `mode`.
    pub fn new(
        mode: AnalysisMode,
        script: &'a mut Script,
        variables: &'a mut VariableSpace,
        game: GameId,
        functions: &'a dyn FunctionSignatures,
        globals: Option<&'a mut Stack>,
        sub: SubRoutineId,
    ) -> Self {
        Self {
            mode,
            script,
            variables,
            functions,
            game,
            globals,
            stack: Stack::new(),
            instruction: None,
            sub,
            sub_stack: 0,
            sub_retn: false,
            return_stack: Stack::new(),
        }
    }

    /// Pushes the dummy stack frame: [`DUMMY_STACK_FRAME_SIZE`] cells of
    /// unknown type standing in for whatever the runtime arranges before the
    /// entry point runs.
    pub fn seed_dummy_frame(&mut self) {
        for _ in 0..DUMMY_STACK_FRAME_SIZE {
            self.push_variable(VariableType::Any, VariableUse::Unknown);
        }
    }

    /// Gets the instruction currently being analyzed.
    ///
    /// # Panics
    ///
    /// Panics when called outside of an opcode handler. This is a programmer
    /// bug.
    pub fn current(&self) -> InstructionId {
        self.instruction
            .expect("Opcode handlers only run with a current instruction")
    }

    /// Gets the address the analysis is currently at, for error reporting.
    pub fn address(&self) -> u32 {
        match self.instruction {
            Some(id) => self.script.instruction(id).address,
            None => self.script.subroutine(self.sub).address,
        }
    }

    /// Creates a fresh variable of the provided `typ` and `usage`, credited
    /// to the current instruction.
    pub fn add_variable(&mut self, typ: VariableType, usage: VariableUse) -> VariableId {
        self.variables.add(typ, usage, self.instruction)
    }

    /// Pushes a fresh variable onto the stack, growing the current frame.
    pub fn push_variable(&mut self, typ: VariableType, usage: VariableUse) -> VariableId {
        let variable = self.add_variable(typ, usage);
        self.sub_stack += 1;
        self.stack.push(variable);
        variable
    }

    /// Pops the top cell, shrinking the current frame.
    ///
    /// When `reading` is set, the pop counts as a read of the popped
    /// variable.
    ///
    /// # Errors
    ///
    /// If the stack is empty.
    pub fn pop_variable(&mut self, reading: bool) -> Result<VariableId, Error> {
        if reading {
            self.read_variable(0)?;
        }

        let cell = self.stack.pop()?;
        self.sub_stack = self.sub_stack.saturating_sub(1);

        Ok(cell.variable)
    }

    /// Records a read of the variable at `depth` by the current instruction
    /// and returns its type.
    ///
    /// # Errors
    ///
    /// If `depth` does not exist in the stack.
    pub fn read_variable(&mut self, depth: usize) -> Result<VariableType, Error> {
        let variable = self.stack.variable_at(depth)?;
        let instruction = self.current();

        let variable = self.variables.variable_mut(variable);
        variable.readers.push(instruction);

        Ok(variable.typ)
    }

    /// Records a write of the variable at `depth` by the current
    /// instruction.
    ///
    /// # Errors
    ///
    /// If `depth` does not exist in the stack.
    pub fn write_variable(&mut self, depth: usize) -> Result<(), Error> {
        let variable = self.stack.variable_at(depth)?;
        let instruction = self.current();

        self.variables.variable_mut(variable).writers.push(instruction);

        Ok(())
    }

    /// Records a write of the variable at `depth`, refining its type to
    /// `typ` unless `typ` is `Any`.
    ///
    /// # Errors
    ///
    /// If `depth` does not exist in the stack.
    pub fn write_variable_typed(&mut self, depth: usize, typ: VariableType) -> Result<(), Error> {
        if typ != VariableType::Any {
            let variable = self.stack.variable_at(depth)?;
            self.variables.variable_mut(variable).typ = typ;
        }

        self.write_variable(depth)
    }

    /// Requires the variable at `depth` to be of type `typ`, refining an
    /// `Any`-typed variable toward it.
    ///
    /// # Errors
    ///
    /// If `depth` does not exist in the stack, or the variable already has a
    /// different concrete type.
    pub fn coerce_variable_type(&mut self, depth: usize, typ: VariableType) -> Result<(), Error> {
        let variable = self.stack.variable_at(depth)?;
        self.coerce_variable(variable, typ)
    }

    /// Requires `variable` to be of type `typ`, refining an `Any`-typed
    /// variable toward it.
    ///
    /// # Errors
    ///
    /// If the variable already has a different concrete type.
    pub fn coerce_variable(&mut self, variable: VariableId, typ: VariableType) -> Result<(), Error> {
        let current = self.variables.variable(variable).typ;
        if current != VariableType::Any && current != typ {
            return Err(Error::TypeMismatch {
                expected: typ,
                found: current,
            });
        }

        if typ != VariableType::Any {
            self.variables.variable_mut(variable).typ = typ;
        }

        Ok(())
    }

    /// Makes `first` and `second` share a type: if exactly one side is
    /// concrete, the other is refined toward it.
    pub fn same_variable_type(&mut self, first: VariableId, second: VariableId) {
        let mut typ = self.variables.variable(first).typ;
        if typ == VariableType::Any {
            typ = self.variables.variable(second).typ;
        }

        self.variables.variable_mut(first).typ = typ;
        self.variables.variable_mut(second).typ = typ;
    }

    /// Duplicates the variable at `depth` onto the top of the stack,
    /// linking original and copy as duplicates.
    ///
    /// # Errors
    ///
    /// If `depth` does not exist in the stack.
    pub fn duplicate_variable(&mut self, depth: usize) -> Result<(), Error> {
        let source = self.stack.variable_at(depth)?;
        let instruction = self.current();

        let source_var = self.variables.variable_mut(source);
        source_var.readers.push(instruction);
        let typ = source_var.typ;

        let duplicate = self.push_variable(typ, VariableUse::Unknown);
        self.variables.link_duplicates(source, duplicate);

        Ok(())
    }

    /// Gets the attached globals array.
    ///
    /// # Errors
    ///
    /// If no globals array is attached to this analysis.
    pub fn globals(&mut self) -> Result<&mut Stack, Error> {
        self.globals.as_deref_mut().ok_or(Error::NoGlobals)
    }
}
