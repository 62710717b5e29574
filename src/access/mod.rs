//! Access control: who may do what to which model and which row.

pub mod evaluator;
pub mod ownership;

pub use evaluator::*;
pub use ownership::*;

use crate::definition::Role;

/// Authenticated caller as supplied by the upstream identity provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(id: i64, role: Role) -> Self {
        Actor { id, role }
    }
}
