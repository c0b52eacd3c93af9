//! This module contains the type fixup pass that runs after a subroutine
//! has been analyzed.
//!
//! Copy instructions link variables into duplicate groups that must share a
//! type, but the concrete type often only becomes known after the copies
//! were made. The fixup walks the variable space and writes the
//! most-recently discovered concrete type back across each group.

use crate::variable::{VariableId, VariableSpace, VariableType};

/// Makes the types of all variables that have been duplicated the same.
///
/// For each variable in insertion order, any concrete type found among its
/// duplicates wins (later links win within the group) and is written back to
/// every duplicate. The group's links are cleared as it is processed; the
/// links were transitively closed at creation time, so a plain walk settles
/// the whole group.
pub(crate) fn fixup_duplicate_types(variables: &mut VariableSpace) {
    for index in 0..variables.len() {
        let id = VariableId(index);
        let duplicates = variables.variable(id).duplicates.clone();

        let mut typ = variables.variable(id).typ;
        for duplicate in &duplicates {
            let candidate = variables.variable(*duplicate).typ;
            if candidate != VariableType::Any {
                typ = candidate;
            }
        }

        variables.variable_mut(id).typ = typ;
        for duplicate in &duplicates {
            variables.variable_mut(*duplicate).typ = typ;
        }

        variables.variable_mut(id).duplicates.clear();
    }
}
