//! Progress storage for keyflow.
//!
//! This module provides persistent storage for learner progress,
//! supporting file-based and in-memory backends.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileProgressStore;
pub use memory::MemoryProgressStore;
pub use traits::ProgressStore;
