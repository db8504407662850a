//! Building mock implementations of interfaces.
//!
//! Mock generation runs in two halves. [`extract`] turns the requested
//! interfaces of a loaded [`Env`](crate::env::Env) into [`Contract`]s, whose
//! types are already rendered as text by an [`ImportQualifier`]. [`render`]
//! then turns those contracts into a Go document without consulting the
//! environment again.

pub mod extract;
pub mod qualifier;
pub mod render;

pub use extract::{Contract, ExtractError, MethodDesc, Param, extract};
pub use qualifier::{Import, ImportQualifier, ImportSet};
pub use render::{Initialisms, render};
