use std::fmt::Formatter;

use thiserror::Error;

/// An error that is localised to a particular byte-offset location in the
/// bytecode.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub struct Located<E>
where
    E: Clone,
{
    /// The address in the compiled script where the error occurred.
    pub location: u32,

    /// The error data
    pub payload: E,
}

/// Displays the error associated with the address in the compiled script
/// where the error occurred.
impl<E> std::fmt::Display for Located<E>
where
    E: std::fmt::Display + Clone,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{:08x}: {}", self.location, self.payload)
    }
}

/// A trait for types that can have a bytecode address attached to them.
pub trait Locatable
where
    Self: Sized,
{
    /// The return type with the attached address.
    type Located;

    /// Attach the location described by `address` (a byte offset in the
    /// compiled script) to the error.
    fn locate(self, address: u32) -> Self::Located;
}

/// A blanket implementation that allows for attaching a location to any
/// result.
impl<T, E> Locatable for Result<T, E>
where
    E: std::error::Error + Clone,
{
    type Located = Result<T, Located<E>>;

    fn locate(self, address: u32) -> Self::Located {
        self.map_err(|e| Located {
            location: address,
            payload: e,
        })
    }
}
