//! Schema compilation and identifier safety for published tables.

pub mod compiler;
pub mod ident;
pub mod resolved;

pub use compiler::*;
pub use ident::*;
pub use resolved::*;
