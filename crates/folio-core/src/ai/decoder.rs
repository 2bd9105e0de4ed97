use crate::error::{ChatError, Result};

/// Incremental UTF-8 decoder for streamed bodies.
///
/// A character split across two chunks is held back until its remaining
/// bytes arrive.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning whatever text is now complete
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String> {
        self.pending.extend_from_slice(chunk);

        let valid = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(e) if e.error_len().is_some() => {
                self.pending.clear();
                return Err(ChatError::Decode(e.to_string()));
            }
            // Incomplete trailing sequence; keep it for the next chunk
            Err(e) => e.valid_up_to(),
        };

        let tail = self.pending.split_off(valid);
        let head = std::mem::replace(&mut self.pending, tail);
        String::from_utf8(head).map_err(|e| ChatError::Decode(e.to_string()))
    }

    /// Signal end of stream. Leftover bytes mean a truncated character.
    pub fn finish(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            let leftover = self.pending.len();
            self.pending.clear();
            Err(ChatError::Decode(format!(
                "stream ended inside a character ({} dangling bytes)",
                leftover
            )))
        }
    }
}
