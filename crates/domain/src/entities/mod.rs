//! Immutable quiz subjects.

mod municipality;

pub use municipality::Municipality;
