//! Field resolution and cell formatting
//!
//! - [`resolver`] - walks a field path across relation hops
//! - [`value`] - turns a resolved value into cell text

pub mod resolver;
pub mod value;

pub use resolver::{resolve, try_resolve, LookupError};
pub use value::format_value;
