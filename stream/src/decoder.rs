//! Consumer-side reassembly of frames from arbitrary byte chunks.

use leakscope_types::{EnrichedDiagnostic, PlaceholderItem, StreamFrame};

/// Maximum bytes a single pending line may occupy before the decoder gives
/// up on it. Keeps a misbehaving producer from growing the buffer without
/// bound.
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

/// A frame that arrived but could not be decoded. Non-fatal: the decoder
/// drops the line and keeps going.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("frame line is not valid UTF-8")]
    NotUtf8,
    #[error("unrecognized frame tag {0:?}")]
    UnknownTag(String),
    #[error("frame payload does not parse as the declared type: {0}")]
    BadPayload(#[from] serde_json::Error),
    #[error("frame line exceeded {MAX_LINE_BYTES} bytes")]
    Oversized,
}

/// Incremental frame decoder.
///
/// Feed it byte chunks in arrival order; each call returns every frame (or
/// per-line decode error) completed by that chunk. Trailing bytes without a
/// terminator are retained and prefixed to the next chunk, so any chunking
/// of the same byte stream decodes to the same sequence.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    pending: Vec<u8>,
    /// Set after an oversized line is abandoned: drop bytes until the next
    /// terminator so resynchronization happens on a frame boundary.
    skipping: bool,
}

impl FrameDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes buffered while waiting for a line terminator.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Append a chunk and drain every complete line it finishes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<StreamFrame, DecodeError>> {
        let mut out = Vec::new();
        self.pending.extend_from_slice(chunk);

        loop {
            let Some(pos) = self.pending.iter().position(|&b| b == b'\n') else {
                if self.pending.len() > MAX_LINE_BYTES {
                    self.pending.clear();
                    if !self.skipping {
                        self.skipping = true;
                        out.push(Err(DecodeError::Oversized));
                    }
                }
                break;
            };

            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = &line[..line.len() - 1];

            if std::mem::take(&mut self.skipping) {
                // Tail of the abandoned oversized line; already reported.
                continue;
            }
            if line.is_empty() {
                continue;
            }
            out.push(decode_line(line));
        }

        out
    }
}

fn decode_line(line: &[u8]) -> Result<StreamFrame, DecodeError> {
    let Ok(text) = std::str::from_utf8(line) else {
        return Err(DecodeError::NotUtf8);
    };

    let (tag, payload) = text.split_once(':').ok_or_else(|| {
        tracing::warn!(line = %text, "frame line has no tag separator");
        DecodeError::UnknownTag(text.to_string())
    })?;

    let payload = payload.trim_start();
    match tag {
        "LOADING" => {
            let items: Vec<PlaceholderItem> = serde_json::from_str(payload)?;
            Ok(StreamFrame::Loading(items))
        }
        "FINAL" => {
            let diagnostics: Vec<EnrichedDiagnostic> = serde_json::from_str(payload)?;
            Ok(StreamFrame::Final(diagnostics))
        }
        other => Err(DecodeError::UnknownTag(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::encode_frame;

    fn sample_frames() -> Vec<StreamFrame> {
        vec![
            StreamFrame::Loading(vec![
                PlaceholderItem { line: 11 },
                PlaceholderItem { line: 40 },
            ]),
            StreamFrame::Final(vec![
                EnrichedDiagnostic {
                    file: "demo.c".to_string(),
                    line: 11,
                    col: 4,
                    summary: "Leak of 'ptr'".to_string(),
                    fix: "free(ptr) before return".to_string(),
                },
                EnrichedDiagnostic {
                    file: "demo.c".to_string(),
                    line: 40,
                    col: 0,
                    summary: "Use after free of 'q'".to_string(),
                    fix: "null out 'q' after free".to_string(),
                },
            ]),
        ]
    }

    fn wire_bytes(frames: &[StreamFrame]) -> Vec<u8> {
        frames.iter().map(encode_frame).collect::<String>().into_bytes()
    }

    fn decode_all(decoder: &mut FrameDecoder, bytes: &[u8]) -> Vec<StreamFrame> {
        decoder
            .push(bytes)
            .into_iter()
            .map(|r| r.expect("well-formed frame"))
            .collect()
    }

    #[test]
    fn whole_stream_decodes() {
        let frames = sample_frames();
        let mut decoder = FrameDecoder::new();
        let decoded = decode_all(&mut decoder, &wire_bytes(&frames));
        assert_eq!(decoded, frames);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn one_byte_at_a_time_decodes_identically() {
        let frames = sample_frames();
        let bytes = wire_bytes(&frames);

        let mut decoder = FrameDecoder::new();
        let mut decoded = Vec::new();
        for byte in &bytes {
            decoded.extend(decode_all(&mut decoder, std::slice::from_ref(byte)));
        }
        assert_eq!(decoded, frames);
    }

    #[test]
    fn arbitrary_chunkings_decode_identically() {
        let frames = sample_frames();
        let bytes = wire_bytes(&frames);

        for chunk_size in [2usize, 3, 5, 7, 16, 64, 1024] {
            let mut decoder = FrameDecoder::new();
            let mut decoded = Vec::new();
            for chunk in bytes.chunks(chunk_size) {
                decoded.extend(decode_all(&mut decoder, chunk));
            }
            assert_eq!(decoded, frames, "chunk size {chunk_size}");
        }
    }

    #[test]
    fn partial_line_retained_across_pushes() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"LOADING: [{\"li").is_empty());
        assert!(decoder.pending_len() > 0);

        let rest = decoder.push(b"ne\":3}]\n");
        assert_eq!(rest.len(), 1);
        assert_eq!(
            rest[0].as_ref().unwrap(),
            &StreamFrame::Loading(vec![PlaceholderItem { line: 3 }])
        );
    }

    #[test]
    fn bad_payload_is_reported_and_stream_continues() {
        let mut decoder = FrameDecoder::new();
        let results = decoder.push(b"LOADING: {not json}\nFINAL: []\n");
        assert_eq!(results.len(), 2);
        assert!(matches!(results[0], Err(DecodeError::BadPayload(_))));
        assert_eq!(results[1].as_ref().unwrap(), &StreamFrame::Final(Vec::new()));
    }

    #[test]
    fn wrong_payload_shape_for_tag_is_bad_payload() {
        // A FINAL payload under a LOADING tag: objects lack "line".
        let mut decoder = FrameDecoder::new();
        let results =
            decoder.push(b"LOADING: [{\"file\":\"a.c\",\"summary\":\"s\",\"fix\":\"f\"}]\n");
        assert!(matches!(results[0], Err(DecodeError::BadPayload(_))));
    }

    #[test]
    fn unknown_tag_is_reported() {
        let mut decoder = FrameDecoder::new();
        let results = decoder.push(b"PROGRESS: []\n");
        assert!(matches!(results[0], Err(DecodeError::UnknownTag(_))));
    }

    #[test]
    fn missing_separator_is_reported() {
        let mut decoder = FrameDecoder::new();
        let results = decoder.push(b"no tag here\n");
        assert!(matches!(results[0], Err(DecodeError::UnknownTag(_))));
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let mut decoder = FrameDecoder::new();
        let results = decoder.push(b"LOADING: [\xff\xfe]\n");
        assert!(matches!(results[0], Err(DecodeError::NotUtf8)));
    }

    #[test]
    fn empty_lines_are_skipped() {
        let mut decoder = FrameDecoder::new();
        let results = decoder.push(b"\n\nFINAL: []\n");
        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
    }

    #[test]
    fn oversized_line_reported_once_then_resyncs() {
        let mut decoder = FrameDecoder::new();
        let mut results = Vec::new();

        let junk = vec![b'x'; MAX_LINE_BYTES / 2 + 1];
        results.extend(decoder.push(&junk));
        results.extend(decoder.push(&junk));
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(DecodeError::Oversized)));

        // Terminator ends the abandoned line; the next frame decodes.
        let after = decoder.push(b"tail of junk\nFINAL: []\n");
        assert_eq!(after.len(), 1);
        assert!(after[0].is_ok());
    }
}
