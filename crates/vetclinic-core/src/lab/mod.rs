//! Lab exam helpers.

mod differential;

pub use differential::*;
