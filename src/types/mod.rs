//! Data types shared by the grid subsystems.

mod cell;
mod column;
mod selection;
mod validation;

pub use cell::*;
pub use column::*;
pub use selection::*;
pub use validation::*;
