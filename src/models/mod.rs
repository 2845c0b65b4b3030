//! Model functions.
//!
//! Models are small, pure functions of `(x, θ)` so that fitting code can stay
//! generic over both the built-in kinds and caller-supplied closures.

pub mod guess;
pub mod model;

pub use guess::*;
pub use model::*;
