//! Frame reassembly: bytes in, complete protocol lines out.
//!
//! Transport chunks are not aligned with protocol lines, and not even with
//! UTF-8 character boundaries. The reassembler holds back whatever is
//! incomplete until a later chunk (or the end of the stream) resolves it.

/// Incremental UTF-8 decoder.
///
/// A multi-byte sequence split across chunks is held until the rest
/// arrives. Invalid sequences decode to U+FFFD instead of failing.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    /// Bytes of an incomplete trailing sequence.
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    /// Create an empty decoder.
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Decode `bytes`, appending complete characters to `out`.
    pub fn decode(&mut self, bytes: &[u8], out: &mut String) {
        let mut data = std::mem::take(&mut self.pending);
        data.extend_from_slice(bytes);

        let mut input = data.as_slice();
        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    out.push_str(text);
                    input = &[];
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&input[..valid]) {
                        out.push_str(text);
                    }
                    match err.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            input = &input[valid + bad..];
                        }
                        None => {
                            // Incomplete sequence at the end: wait for more bytes
                            input = &input[valid..];
                            break;
                        }
                    }
                }
            }
        }

        self.pending = input.to_vec();
    }

    /// Flush at end of stream. A dangling partial sequence becomes U+FFFD.
    pub fn finish(&mut self, out: &mut String) {
        if !self.pending.is_empty() {
            self.pending.clear();
            out.push(char::REPLACEMENT_CHARACTER);
        }
    }

    /// Number of bytes currently held back.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Splits a chunked text stream into trimmed, non-empty lines.
///
/// Lines are pulled lazily with [`LineReassembler::next_line`]; text after
/// the last `\n` stays buffered until more input or [`LineReassembler::finish`].
#[derive(Debug, Default)]
pub struct LineReassembler {
    decoder: Utf8StreamDecoder,
    /// Unconsumed text. Everything before `consumed` has been emitted.
    buffer: String,
    consumed: usize,
    finished: bool,
}

impl LineReassembler {
    /// Create an empty reassembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw transport chunk.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.decoder.decode(bytes, &mut self.buffer);
    }

    /// Feed already-decoded text.
    pub fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Signal end of stream. The residual buffer becomes the final line.
    pub fn finish(&mut self) {
        if !self.finished {
            self.decoder.finish(&mut self.buffer);
            self.finished = true;
        }
    }

    /// Whether [`finish`](Self::finish) has been called.
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Pull the next complete line, trimmed. Blank lines are skipped.
    pub fn next_line(&mut self) -> Option<String> {
        loop {
            let rest = &self.buffer[self.consumed..];
            if let Some(pos) = rest.find('\n') {
                let line = rest[..pos].trim().to_string();
                self.consumed += pos + 1;
                if line.is_empty() {
                    continue;
                }
                return Some(line);
            }

            if self.finished && self.consumed < self.buffer.len() {
                let line = rest.trim().to_string();
                self.consumed = self.buffer.len();
                self.compact();
                return if line.is_empty() { None } else { Some(line) };
            }

            self.compact();
            return None;
        }
    }

    /// Iterate over the lines available right now.
    pub fn lines(&mut self) -> impl Iterator<Item = String> + '_ {
        std::iter::from_fn(move || self.next_line())
    }

    /// Length in bytes of the buffered partial line.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len() - self.consumed + self.decoder.pending_len()
    }

    fn compact(&mut self) {
        if self.consumed > 0 {
            self.buffer.drain(..self.consumed);
            self.consumed = 0;
        }
    }
}
