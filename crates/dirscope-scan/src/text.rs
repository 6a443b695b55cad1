//! Streaming line, word and character counting.

use std::borrow::Cow;

use dirscope_core::TextMetrics;

/// Counts lines, words and characters over UTF-8 input delivered in chunks.
///
/// Multi-byte sequences split across chunk boundaries are reassembled.
/// Invalid bytes are skipped and tallied.
#[derive(Debug, Default)]
pub struct TextCounter {
    metrics: TextMetrics,
    in_word: bool,
    /// Incomplete trailing sequence from the previous chunk (at most 3 bytes).
    pending: Vec<u8>,
    invalid_bytes: u64,
}

/// Final result of a [`TextCounter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextTally {
    pub metrics: TextMetrics,
    pub invalid_bytes: u64,
}

impl TextTally {
    /// Whether all input decoded cleanly.
    pub fn is_clean(&self) -> bool {
        self.invalid_bytes == 0
    }
}

impl TextCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk of bytes.
    pub fn update(&mut self, chunk: &[u8]) {
        let data: Cow<'_, [u8]> = if self.pending.is_empty() {
            Cow::Borrowed(chunk)
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(chunk);
            Cow::Owned(joined)
        };

        let mut input: &[u8] = &data;
        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    self.count(text);
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&input[..valid]) {
                        self.count(text);
                    }
                    match err.error_len() {
                        Some(bad) => {
                            self.invalid_bytes += bad as u64;
                            input = &input[valid + bad..];
                        }
                        None => {
                            // Truncated sequence at the end; wait for more input.
                            self.pending = input[valid..].to_vec();
                            break;
                        }
                    }
                }
            }
        }
    }

    fn count(&mut self, text: &str) {
        for c in text.chars() {
            self.metrics.chars += 1;
            if c == '\n' {
                self.metrics.lines += 1;
            }
            if c.is_whitespace() {
                self.in_word = false;
            } else if !self.in_word {
                self.in_word = true;
                self.metrics.words += 1;
            }
        }
    }

    /// Finish counting. A dangling partial sequence counts as invalid.
    pub fn finish(self) -> TextTally {
        TextTally {
            metrics: self.metrics,
            invalid_bytes: self.invalid_bytes + self.pending.len() as u64,
        }
    }
}

/// Count a complete buffer in one go.
pub fn count_text(bytes: &[u8]) -> TextTally {
    let mut counter = TextCounter::new();
    counter.update(bytes);
    counter.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_counts() {
        let tally = count_text(b"hello world\nsecond line\n");
        assert!(tally.is_clean());
        assert_eq!(tally.metrics.lines, 2);
        assert_eq!(tally.metrics.words, 4);
        assert_eq!(tally.metrics.chars, 24);
    }

    #[test]
    fn test_no_trailing_newline() {
        let tally = count_text(b"one two");
        assert_eq!(tally.metrics.lines, 0);
        assert_eq!(tally.metrics.words, 2);
    }

    #[test]
    fn test_word_split_across_chunks() {
        let mut counter = TextCounter::new();
        counter.update(b"hel");
        counter.update(b"lo wor");
        counter.update(b"ld");
        let tally = counter.finish();
        assert_eq!(tally.metrics.words, 2);
        assert_eq!(tally.metrics.chars, 11);
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let text = "héllo ✓".as_bytes();
        for split in 0..text.len() {
            let mut counter = TextCounter::new();
            counter.update(&text[..split]);
            counter.update(&text[split..]);
            let tally = counter.finish();
            assert!(tally.is_clean(), "split at {split}");
            assert_eq!(tally.metrics.chars, 7, "split at {split}");
            assert_eq!(tally.metrics.words, 2, "split at {split}");
        }
    }

    #[test]
    fn test_invalid_bytes_are_skipped() {
        let tally = count_text(b"ok \xff\xfe fine");
        assert_eq!(tally.invalid_bytes, 2);
        assert!(!tally.is_clean());
        assert_eq!(tally.metrics.words, 2);
    }

    #[test]
    fn test_truncated_tail_is_invalid() {
        let tally = count_text(&"✓".as_bytes()[..2]);
        assert_eq!(tally.invalid_bytes, 2);
        assert_eq!(tally.metrics.chars, 0);
    }
}
