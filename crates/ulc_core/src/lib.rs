//! ulc_core: Core utilities shared by the ULC spec compiler.
//!
//! Provides the growable byte buffer that backs transient strings, the
//! process-wide buffer free-list and byte-level character helpers.

pub mod buffer;
pub mod chars;
pub mod pool;

// Re-export commonly used types
pub use buffer::GrowableBuffer;
pub use pool::BufferPool;
