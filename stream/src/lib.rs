//! Stream Framer — the wire protocol between the pipeline and its consumer.
//!
//! Frames are newline-delimited, tag-prefixed JSON records:
//!
//! ```text
//! LOADING: [{"line":11},{"line":40}]
//! FINAL: [{"file":"demo.c","line":11,"col":4,"summary":"...","fix":"..."}]
//! ```
//!
//! The producer side ([`FrameWriter`]) serializes one frame per line and
//! flushes after each. The consumer side ([`FrameDecoder`]) makes the
//! protocol robust over an unreliable byte transport: it accepts arbitrary
//! chunks, reassembles complete lines, and reports malformed frames
//! per-line without giving up on the stream.

mod decoder;
mod writer;

pub use decoder::{DecodeError, FrameDecoder, MAX_LINE_BYTES};
pub use writer::{FrameWriter, encode_frame};
