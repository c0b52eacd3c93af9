//! This module contains the variable model built up by the analysis: the
//! types a stack slot can take, the inferred [`Variable`]s themselves, and
//! the [`VariableSpace`] arena that owns them.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::script::InstructionId;

/// The type of an NWScript variable as far as the analysis can tell.
///
/// `Any` is the top element of the lattice: a slot whose type has not been
/// constrained yet. `Void` is not a value type at all; it marks engine
/// functions without a return value and instruction type tags that do not
/// describe a value.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum VariableType {
    /// An unconstrained slot; refined toward a concrete type as evidence
    /// accumulates.
    Any,
    Int,
    Float,
    String,
    Object,
    /// Three consecutive `Float` cells on the stack.
    Vector,
    EngineType0,
    EngineType1,
    EngineType2,
    EngineType3,
    EngineType4,
    EngineType5,
    /// A suspended action; never kept on the stack.
    ScriptState,
    ResourceRef,
    /// Not a value.
    Void,
}

impl Display for VariableType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VariableType::Any => "any",
            VariableType::Int => "int",
            VariableType::Float => "float",
            VariableType::String => "string",
            VariableType::Object => "object",
            VariableType::Vector => "vector",
            VariableType::EngineType0 => "engine_type_0",
            VariableType::EngineType1 => "engine_type_1",
            VariableType::EngineType2 => "engine_type_2",
            VariableType::EngineType3 => "engine_type_3",
            VariableType::EngineType4 => "engine_type_4",
            VariableType::EngineType5 => "engine_type_5",
            VariableType::ScriptState => "script_state",
            VariableType::ResourceRef => "resource",
            VariableType::Void => "void",
        };
        write!(f, "{name}")
    }
}

/// How a variable is used within the program, as far as the analysis has
/// classified it.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum VariableUse {
    /// No classification has been made yet.
    #[default]
    Unknown,
    /// A local of the subroutine that created it.
    Local,
    /// Part of the global-variable array set up by `_global`.
    Global,
    /// A caller-provided argument discovered through callee stack cleanup.
    Parameter,
    /// A caller-allocated slot the callee writes its result into.
    Return,
}

/// A stable identifier for a [`Variable`] within its [`VariableSpace`].
///
/// Identifiers are dense: the variable with id `n` is the `n`th variable
/// created in the space, and indexes it directly.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct VariableId(pub usize);

impl Display for VariableId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "v[{}]", self.0)
    }
}

/// A slot inferred to exist at some program point.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Variable {
    /// The dense identifier of this variable, equal to its position in the
    /// owning space.
    pub id: VariableId,

    /// The best-known type of the variable.
    pub typ: VariableType,

    /// The best-known use classification of the variable.
    pub usage: VariableUse,

    /// The instruction that first pushed the variable, if any.
    ///
    /// Dummy-frame seeds have no creator.
    pub creator: Option<InstructionId>,

    /// Every instruction observed reading this variable.
    pub readers: Vec<InstructionId>,

    /// Every instruction observed writing this variable.
    pub writers: Vec<InstructionId>,

    /// Variables that must share a type with this one.
    ///
    /// The relation is symmetric and transitively closed at the moment a
    /// duplicate is created; the type fixup pass collapses each group onto
    /// one concrete type and clears the links.
    pub duplicates: Vec<VariableId>,
}

/// The append-only arena owning every [`Variable`] inferred by an analysis.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VariableSpace {
    variables: Vec<Variable>,
}

impl VariableSpace {
    /// Creates a new space without any variables in it.
    #[must_use]
    pub fn new() -> Self {
        let variables = Vec::new();
        Self { variables }
    }

    /// Adds a fresh variable of the provided `typ` and `usage`, created by
    /// `creator`, and returns its identifier.
    pub fn add(
        &mut self,
        typ: VariableType,
        usage: VariableUse,
        creator: Option<InstructionId>,
    ) -> VariableId {
        let id = VariableId(self.variables.len());
        self.variables.push(Variable {
            id,
            typ,
            usage,
            creator,
            readers: Vec::new(),
            writers: Vec::new(),
            duplicates: Vec::new(),
        });

        id
    }

    /// Gets a reference to the variable identified by `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this space. This is a programmer bug.
    #[must_use]
    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.0]
    }

    /// Gets a mutable reference to the variable identified by `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this space. This is a programmer bug.
    pub fn variable_mut(&mut self, id: VariableId) -> &mut Variable {
        &mut self.variables[id.0]
    }

    /// Gets the number of variables in the space.
    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Checks if the space is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Iterates over the variables in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    /// The identifiers of all variables, in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = VariableId> {
        (0..self.variables.len()).map(VariableId)
    }

    /// Links `first` and `second` as duplicates of each other.
    ///
    /// Both variables inherit the other side's existing duplicates, keeping
    /// the relation transitively closed at the moment of linking.
    pub fn link_duplicates(&mut self, first: VariableId, second: VariableId) {
        let first_links = self.variables[first.0].duplicates.clone();
        let second_links = self.variables[second.0].duplicates.clone();

        let first_var = &mut self.variables[first.0];
        first_var.duplicates.push(second);
        first_var.duplicates.extend(second_links);

        let second_var = &mut self.variables[second.0];
        second_var.duplicates.push(first);
        second_var.duplicates.extend(first_links);
    }
}

impl<'a> IntoIterator for &'a VariableSpace {
    type IntoIter = std::slice::Iter<'a, Variable>;
    type Item = &'a Variable;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.iter()
    }
}
