//! Chunked scanning of monotonic key spaces.

pub mod memory;
pub mod pipeline;
pub mod window;

pub use memory::{MemoryProbe, ScriptedMemoryProbe, SystemMemoryProbe};
pub use pipeline::{ChunkStrategy, ChunkedPipeline, PipelineStats};
pub use window::{KeyWindow, WindowBounds, WindowPlan};
