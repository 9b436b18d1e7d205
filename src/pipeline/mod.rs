//! Server-side chunk pipeline: raw model text in, transport-ready chunks out.

pub mod adapter;
pub mod buffer;
pub mod chunk;
pub mod detector;
pub mod format;
pub mod repair;

pub use adapter::{ChatAdapter, ChunkPipeline, ChunkStream};
pub use buffer::{DEFAULT_CHUNK_THRESHOLD, DEFAULT_DELIMITERS, DelimiterSet, TokenBuffer};
pub use chunk::{Chunk, ChunkKind, TOOL_RESULT_CLOSE, TOOL_RESULT_OPEN, concat_text};
pub use detector::{DEFAULT_SCAN_WINDOW, DIRECTIVE_MARKER, DetectorState, ToolCallDetector};
pub use format::{Passthrough, PostProcessor};
pub use repair::{ToolCall, parse_tool_call};
