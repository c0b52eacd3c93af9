//! This module contains constants that are needed throughout the codebase.

/// The size in bytes of one cell on the NWScript stack.
///
/// Every value the script virtual machine manipulates is addressed in
/// multiples of this size; wider values (such as vectors) occupy several
/// consecutive cells.
pub const CELL_SIZE: usize = 4;

/// The number of `Any`-typed cells seeded onto the stack before analyzing
/// `_global` or `main`.
///
/// The runtime arranges an unknown amount of data on the stack before the
/// entry point runs; this over-approximates it. 32 slots is sufficient in
/// practice.
pub const DUMMY_STACK_FRAME_SIZE: usize = 32;

/// The maximum number of direct arguments an NWScript instruction can carry.
pub const MAX_ARGUMENT_COUNT: usize = 3;

/// The number of `Float` cells a `Vector` value occupies on the stack.
pub const VECTOR_CELL_COUNT: usize = 3;
