//! # UTF-8 Code Point Reader
//!
//! Decodes an input byte sequence into Unicode scalar values one at a time.
//! Malformed sequences are reported as [`CodePoint::Invalid`] instead of
//! failing, so the lexer can turn them into `Unknown` tokens.

/// Length of the UTF-8 encoded byte order mark.
const BYTE_ORDER_MARK_LEN: usize = 3;

/// A single decoded unit of the input.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CodePoint {
    /// A decoded Unicode code point
    Scalar(u32),
    /// A malformed or truncated UTF-8 sequence
    Invalid,
    /// No bytes remain in the input
    EndOfStream,
}

/// Number of octets a UTF-8 sequence occupies, determined from its leading
/// octet.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum SequenceLength {
    One,
    Two,
    Three,
    Four,
    /// Continuation octet or an undecodable leading octet
    Unknown,
}

impl SequenceLength {
    const fn of(octet: u8) -> Self {
        if octet & 0b1000_0000 == 0 {
            Self::One
        } else if octet & 0b1110_0000 == 0b1100_0000 {
            // 110xxxxx
            Self::Two
        } else if octet & 0b1111_0000 == 0b1110_0000 {
            // 1110xxxx
            Self::Three
        } else if octet & 0b1111_1000 == 0b1111_0000 {
            // 11110xxx
            Self::Four
        } else {
            Self::Unknown
        }
    }
}

/// Forward-only reader of code points from a UTF-8 byte slice.
#[derive(Debug, Clone)]
pub struct CodepointReader<'a> {
    /// The input sequence of bytes
    input: &'a [u8],
    /// Offset of the next unread byte
    position: usize,
    /// Whether a leading byte order mark was consumed
    byte_order_mark: bool,
}

impl<'a> CodepointReader<'a> {
    /// Creates a reader over `input`, silently consuming a leading byte order
    /// mark (`EF BB BF`).
    #[must_use]
    pub fn new(input: &'a [u8]) -> Self {
        let byte_order_mark = input.starts_with(&[0xEF, 0xBB, 0xBF]);
        Self {
            input,
            position: if byte_order_mark { BYTE_ORDER_MARK_LEN } else { 0 },
            byte_order_mark,
        }
    }

    /// Returns whether the input started with a byte order mark.
    #[must_use]
    pub const fn had_byte_order_mark(&self) -> bool {
        self.byte_order_mark
    }

    /// Rewinds the reader to the first code point after the byte order mark.
    pub const fn reset(&mut self) {
        self.position = if self.byte_order_mark {
            BYTE_ORDER_MARK_LEN
        } else {
            0
        };
    }

    /// Returns the number of bytes consumed so far.
    #[must_use]
    pub const fn bytes_read(&self) -> usize {
        self.position
    }

    fn read_octet(&mut self) -> Option<u8> {
        let octet = self.input.get(self.position).copied()?;
        self.position += 1;
        Some(octet)
    }

    /// Reads a continuation octet (`10xxxxxx`) and returns its payload bits.
    fn read_continuation(&mut self) -> Option<u32> {
        let octet = self.read_octet()?;
        if octet & 0b1100_0000 == 0b1000_0000 {
            Some(u32::from(octet & 0b0011_1111))
        } else {
            None
        }
    }

    /// Decodes and consumes the next code point.
    pub fn try_read_next(&mut self) -> CodePoint {
        let Some(first) = self.read_octet() else {
            return CodePoint::EndOfStream;
        };
        let decoded = match SequenceLength::of(first) {
            SequenceLength::One => Some(u32::from(first)),
            SequenceLength::Two => self.read_continuation().map(|second| {
                // 110xxxxx 10xxxxxx
                (u32::from(first & 0b0001_1111) << 6) | second
            }),
            SequenceLength::Three => {
                // 1110xxxx 10xxxxxx 10xxxxxx
                self.read_continuation().and_then(|second| {
                    self.read_continuation().map(|third| {
                        (u32::from(first & 0b0000_1111) << 12)
                            | (second << 6)
                            | third
                    })
                })
            }
            SequenceLength::Four => {
                // 11110xxx 10xxxxxx 10xxxxxx 10xxxxxx
                self.read_continuation().and_then(|second| {
                    self.read_continuation().and_then(|third| {
                        self.read_continuation().map(|fourth| {
                            (u32::from(first & 0b0000_0111) << 18)
                                | (second << 12)
                                | (third << 6)
                                | fourth
                        })
                    })
                })
            }
            SequenceLength::Unknown => None,
        };
        decoded.map_or(CodePoint::Invalid, CodePoint::Scalar)
    }
}

impl Iterator for CodepointReader<'_> {
    type Item = CodePoint;

    fn next(&mut self) -> Option<Self::Item> {
        match self.try_read_next() {
            CodePoint::EndOfStream => None,
            code_point => Some(code_point),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &[u8]) -> Vec<CodePoint> {
        CodepointReader::new(input).collect()
    }

    #[test]
    fn empty_input() {
        let mut reader = CodepointReader::new(b"");
        assert_eq!(reader.try_read_next(), CodePoint::EndOfStream);
        assert_eq!(reader.try_read_next(), CodePoint::EndOfStream);
    }

    #[test]
    fn decodes_all_sequence_lengths() {
        let input = "$é€🙏".as_bytes();
        assert_eq!(
            decode(input),
            vec![
                CodePoint::Scalar('$' as u32),
                CodePoint::Scalar('é' as u32),
                CodePoint::Scalar('€' as u32),
                CodePoint::Scalar('🙏' as u32),
            ]
        );
    }

    #[test]
    fn skips_byte_order_mark() {
        let reader = CodepointReader::new(b"\xEF\xBB\xBF$");
        assert!(reader.had_byte_order_mark());
        assert_eq!(
            reader.collect::<Vec<_>>(),
            vec![CodePoint::Scalar('$' as u32)]
        );
    }

    #[test]
    fn invalid_continuation_octet() {
        // 0xC3 expects a continuation, '$' is not one
        assert_eq!(decode(b"\xC3$")[0], CodePoint::Invalid);
    }

    #[test]
    fn truncated_sequence_is_invalid() {
        assert_eq!(decode(b"\xE2\x82"), vec![CodePoint::Invalid]);
    }

    #[test]
    fn stray_continuation_octet() {
        assert_eq!(
            decode(b"\x80a"),
            vec![CodePoint::Invalid, CodePoint::Scalar('a' as u32)]
        );
    }

    #[test]
    fn reset_rewinds_after_bom() {
        let mut reader = CodepointReader::new(b"\xEF\xBB\xBFab");
        reader.try_read_next();
        reader.try_read_next();
        reader.reset();
        assert_eq!(reader.bytes_read(), 3);
        assert_eq!(reader.try_read_next(), CodePoint::Scalar('a' as u32));
    }
}
