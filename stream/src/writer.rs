//! Producer-side framing: one tagged JSON line per frame.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use leakscope_types::StreamFrame;

/// Serialize a frame to its wire form, including the trailing newline.
///
/// Serialization of placeholder/diagnostic payloads cannot fail: the types
/// contain only strings and integers.
#[must_use]
pub fn encode_frame(frame: &StreamFrame) -> String {
    let payload = match frame {
        StreamFrame::Loading(items) => serde_json::to_string(items),
        StreamFrame::Final(diagnostics) => serde_json::to_string(diagnostics),
    }
    .unwrap_or_else(|_| "[]".to_string());
    format!("{}: {payload}\n", frame.tag())
}

/// Writes frames to an async byte sink, flushing after every frame so the
/// consumer's placeholder rendering is not held hostage to buffering.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn write_frame(&mut self, frame: &StreamFrame) -> std::io::Result<()> {
        let line = encode_frame(frame);
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await
    }
}
