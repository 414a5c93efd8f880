//! Reassembly of the relayed byte stream into quiz records.

use crate::models::Quiz;
use crate::Result;

pub const PARSE_ERROR_MESSAGE: &str =
    "Error parsing quiz data. The API response was not in the expected format.";

const FENCE_OPEN: &str = "```json";
const FENCE: &str = "```";

/// Remove markdown code-fence markers and surrounding whitespace.
pub fn strip_fences(text: &str) -> String {
    text.replace(FENCE_OPEN, "")
        .replace(FENCE, "")
        .trim()
        .to_string()
}

/// Parse the fully accumulated stream text as a quiz array.
pub fn parse_quizzes(text: &str) -> Result<Vec<Quiz>> {
    Ok(serde_json::from_str(&strip_fences(text))?)
}

/// Incremental UTF-8 decoding across network chunk boundaries.
///
/// An incomplete trailing sequence is held back until the next chunk;
/// invalid bytes become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                        None => {
                            self.pending.drain(..valid);
                            return out;
                        }
                    }
                }
            }
        }
    }

    /// Flush whatever is still held back at end of stream.
    pub fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}
