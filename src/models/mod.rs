//! Domain model module declarations.

pub mod board;
pub mod queue;
