//! Mobile bindings for the exercise session manager.

pub mod errors;
pub mod logging;
pub mod objects;
pub mod session;
