//! Incremental UTF-8 decoder.
//!
//! A table-driven DFA after Björn Höhrmann's "Flexible and Economical UTF-8
//! Decoder". Overlong forms, surrogates and scalars above U+10FFFF are
//! rejected.

const ACCEPT: u8 = 0;
const REJECT: u8 = 12;

// Byte -> character class.
#[rustfmt::skip]
const CLASS: [u8; 256] = [
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1, 9,9,9,9,9,9,9,9,9,9,9,9,9,9,9,9,
    7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7, 7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,
    8,8,2,2,2,2,2,2,2,2,2,2,2,2,2,2, 2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,
    10,3,3,3,3,3,3,3,3,3,3,3,3,4,3,3, 11,6,6,6,5,8,8,8,8,8,8,8,8,8,8,8,
];

// (state + class) -> next state. States are multiples of 12.
#[rustfmt::skip]
const TRANSITION: [u8; 108] = [
    0,12,24,36,60,96,84,12,12,12,48,72, 12,12,12,12,12,12,12,12,12,12,12,12,
    12,0,12,12,12,12,12,0,12,0,12,12, 12,24,12,12,12,12,12,24,12,24,12,12,
    12,12,12,12,12,12,12,24,12,12,12,12, 12,24,12,12,12,12,12,12,12,24,12,12,
    12,12,12,12,12,12,12,36,12,36,12,12, 12,36,12,12,12,12,12,36,12,36,12,12,
    12,36,12,12,12,12,12,12,12,12,12,12,
];

/// Outcome of feeding one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utf8Step {
    /// A complete scalar.
    Char(char),
    /// More continuation bytes are needed.
    Pending,
    /// The byte cannot continue or start a sequence; the decoder was reset.
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Utf8Decoder {
    state: u8,
    codepoint: u32,
}

impl Utf8Decoder {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == ACCEPT
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn push(&mut self, byte: u8) -> Utf8Step {
        let class = CLASS[byte as usize];
        self.codepoint = if self.state == ACCEPT {
            (0xff >> class) & u32::from(byte)
        } else {
            (u32::from(byte) & 0x3f) | (self.codepoint << 6)
        };
        self.state = TRANSITION[(self.state + class) as usize];
        match self.state {
            ACCEPT => match char::from_u32(self.codepoint) {
                Some(ch) => Utf8Step::Char(ch),
                None => {
                    self.reset();
                    Utf8Step::Invalid
                }
            },
            REJECT => {
                self.reset();
                Utf8Step::Invalid
            }
            _ => Utf8Step::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Vec<Utf8Step> {
        let mut decoder = Utf8Decoder::default();
        bytes.iter().map(|&b| decoder.push(b)).collect()
    }

    #[test]
    fn multibyte_scalars() {
        for text in ["é", "中", "🎉"] {
            let steps = decode(text.as_bytes());
            let (last, rest) = steps.split_last().expect("non-empty");
            assert!(rest.iter().all(|s| *s == Utf8Step::Pending));
            assert_eq!(*last, Utf8Step::Char(text.chars().next().expect("char")));
        }
    }

    #[test]
    fn ascii_passes_through() {
        assert_eq!(decode(b"A"), vec![Utf8Step::Char('A')]);
    }

    #[test]
    fn overlong_and_surrogates_rejected() {
        assert_eq!(decode(&[0xC0])[0], Utf8Step::Invalid);
        assert_eq!(decode(&[0xE0, 0x80])[1], Utf8Step::Invalid);
        assert_eq!(decode(&[0xED, 0xA0])[1], Utf8Step::Invalid);
        assert_eq!(decode(&[0xF4, 0x90])[1], Utf8Step::Invalid);
    }

    #[test]
    fn decoder_recovers_after_invalid() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.push(0x80), Utf8Step::Invalid);
        assert!(decoder.is_idle());
        assert_eq!(decoder.push(0xC3), Utf8Step::Pending);
        assert!(!decoder.is_idle());
        assert_eq!(decoder.push(0xA9), Utf8Step::Char('é'));
    }
}
