//! Wire framing on the server side and reassembly plus fence classification
//! on the client side.

pub mod encoder;
pub mod fence;
pub mod reassembler;

pub use encoder::{
    DONE_SENTINEL, ERROR_PREFIX, EncoderState, FRAME_PREFIX, FRAME_TERMINATOR, FrameEncoder, encode,
    frame,
};
pub use fence::{DEFAULT_LANGUAGE, FENCE, FenceMode, FenceParseState, FenceParser, Segment, classify};
pub use reassembler::Reassembler;
