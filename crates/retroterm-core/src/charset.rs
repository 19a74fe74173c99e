//! Character-set and code-page tables.
//!
//! Two kinds of mapping live here:
//!
//! - [`Charset`]: the 94/96-character sets a DEC terminal designates into
//!   G0-G3. Each is a 96-entry table indexed by `(byte & 0x7F) - 0x20`.
//! - [`Codepage`]: full 8-bit code pages used by the non-DEC emulations and
//!   by LINUX/XTERM for bytes >= 0x80.
//!
//! PETSCII and ATASCII glyph lookups are also defined here. All tables are
//! compile-time constants; entries for non-printable positions hold `'\0'`.

/// A character set that can be designated into G0-G3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Charset {
    #[default]
    Us,
    Uk,
    /// DEC special graphics (line drawing).
    Drawing,
    /// Alternate character ROM, standard characters.
    Rom,
    /// Alternate character ROM, special graphics.
    RomSpecial,
    DecSupplemental,
    NrcDutch,
    NrcFinnish,
    NrcFrench,
    NrcFrenchCa,
    NrcGerman,
    NrcItalian,
    NrcNorwegian,
    NrcSpanish,
    NrcSwedish,
    NrcSwiss,
}

type Bank = [char; 96];

const fn ascii_bank() -> Bank {
    let mut bank = ['\0'; 96];
    let mut i = 0;
    while i < 95 {
        bank[i] = (0x20 + i as u8) as char;
        i += 1;
    }
    bank
}

const fn patch(mut bank: Bank, pairs: &[(u8, char)]) -> Bank {
    let mut i = 0;
    while i < pairs.len() {
        let (byte, ch) = pairs[i];
        bank[(byte - 0x20) as usize] = ch;
        i += 1;
    }
    bank
}

const US: Bank = ascii_bank();

const UK: Bank = patch(ascii_bank(), &[(0x23, '£')]);

const DRAWING: Bank = patch(
    ascii_bank(),
    &[
        (0x5F, ' '),
        (0x60, '◆'),
        (0x61, '▒'),
        (0x62, '␉'),
        (0x63, '␌'),
        (0x64, '␍'),
        (0x65, '␊'),
        (0x66, '°'),
        (0x67, '±'),
        (0x68, '␤'),
        (0x69, '␋'),
        (0x6A, '┘'),
        (0x6B, '┐'),
        (0x6C, '┌'),
        (0x6D, '└'),
        (0x6E, '┼'),
        (0x6F, '⎺'),
        (0x70, '⎻'),
        (0x71, '─'),
        (0x72, '⎼'),
        (0x73, '⎽'),
        (0x74, '├'),
        (0x75, '┤'),
        (0x76, '┴'),
        (0x77, '┬'),
        (0x78, '│'),
        (0x79, '≤'),
        (0x7A, '≥'),
        (0x7B, 'π'),
        (0x7C, '≠'),
        (0x7D, '£'),
        (0x7E, '·'),
    ],
);

const fn latin1_upper_bank() -> Bank {
    let mut bank = ['\0'; 96];
    let mut i = 1;
    while i < 95 {
        bank[i] = (0xA0 + i as u8) as char;
        i += 1;
    }
    bank
}

// Differences from ISO 8859-1 in the DEC multinational upper half.
const DEC_SUPPLEMENTAL: Bank = patch(
    latin1_upper_bank(),
    &[
        (0x28, '¤'),
        (0x57, 'Œ'),
        (0x5D, 'Ÿ'),
        (0x77, 'œ'),
        (0x7D, 'ÿ'),
    ],
);

const NRC_DUTCH: Bank = patch(
    ascii_bank(),
    &[
        (0x23, '£'),
        (0x40, '¾'),
        (0x5B, 'ĳ'),
        (0x5C, '½'),
        (0x5D, '|'),
        (0x7B, '¨'),
        (0x7C, 'ƒ'),
        (0x7D, '¼'),
        (0x7E, '´'),
    ],
);

const NRC_FINNISH: Bank = patch(
    ascii_bank(),
    &[
        (0x5B, 'Ä'),
        (0x5C, 'Ö'),
        (0x5D, 'Å'),
        (0x5E, 'Ü'),
        (0x60, 'é'),
        (0x7B, 'ä'),
        (0x7C, 'ö'),
        (0x7D, 'å'),
        (0x7E, 'ü'),
    ],
);

const NRC_FRENCH: Bank = patch(
    ascii_bank(),
    &[
        (0x23, '£'),
        (0x40, 'à'),
        (0x5B, '°'),
        (0x5C, 'ç'),
        (0x5D, '§'),
        (0x7B, 'é'),
        (0x7C, 'ù'),
        (0x7D, 'è'),
        (0x7E, '¨'),
    ],
);

const NRC_FRENCH_CA: Bank = patch(
    ascii_bank(),
    &[
        (0x40, 'à'),
        (0x5B, 'â'),
        (0x5C, 'ç'),
        (0x5D, 'ê'),
        (0x5E, 'î'),
        (0x60, 'ô'),
        (0x7B, 'é'),
        (0x7C, 'ù'),
        (0x7D, 'è'),
        (0x7E, 'û'),
    ],
);

const NRC_GERMAN: Bank = patch(
    ascii_bank(),
    &[
        (0x40, '§'),
        (0x5B, 'Ä'),
        (0x5C, 'Ö'),
        (0x5D, 'Ü'),
        (0x7B, 'ä'),
        (0x7C, 'ö'),
        (0x7D, 'ü'),
        (0x7E, 'ß'),
    ],
);

const NRC_ITALIAN: Bank = patch(
    ascii_bank(),
    &[
        (0x23, '£'),
        (0x40, '§'),
        (0x5B, '°'),
        (0x5C, 'ç'),
        (0x5D, 'é'),
        (0x60, 'ù'),
        (0x7B, 'à'),
        (0x7C, 'ò'),
        (0x7D, 'è'),
        (0x7E, 'ì'),
    ],
);

const NRC_NORWEGIAN: Bank = patch(
    ascii_bank(),
    &[
        (0x40, 'Ä'),
        (0x5B, 'Æ'),
        (0x5C, 'Ø'),
        (0x5D, 'Å'),
        (0x5E, 'Ü'),
        (0x60, 'ä'),
        (0x7B, 'æ'),
        (0x7C, 'ø'),
        (0x7D, 'å'),
        (0x7E, 'ü'),
    ],
);

const NRC_SPANISH: Bank = patch(
    ascii_bank(),
    &[
        (0x23, '£'),
        (0x40, '§'),
        (0x5B, '¡'),
        (0x5C, 'Ñ'),
        (0x5D, '¿'),
        (0x7B, '°'),
        (0x7C, 'ñ'),
        (0x7D, 'ç'),
    ],
);

const NRC_SWEDISH: Bank = patch(
    ascii_bank(),
    &[
        (0x40, 'É'),
        (0x5B, 'Ä'),
        (0x5C, 'Ö'),
        (0x5D, 'Å'),
        (0x5E, 'Ü'),
        (0x60, 'é'),
        (0x7B, 'ä'),
        (0x7C, 'ö'),
        (0x7D, 'å'),
        (0x7E, 'ü'),
    ],
);

const NRC_SWISS: Bank = patch(
    ascii_bank(),
    &[
        (0x23, 'ù'),
        (0x40, 'à'),
        (0x5B, 'é'),
        (0x5C, 'ç'),
        (0x5D, 'ê'),
        (0x5E, 'î'),
        (0x5F, 'è'),
        (0x60, 'ô'),
        (0x7B, 'ä'),
        (0x7C, 'ö'),
        (0x7D, 'ü'),
        (0x7E, 'û'),
    ],
);

impl Charset {
    fn bank(self) -> &'static Bank {
        match self {
            Self::Us | Self::Rom => &US,
            Self::Uk => &UK,
            Self::Drawing | Self::RomSpecial => &DRAWING,
            Self::DecSupplemental => &DEC_SUPPLEMENTAL,
            Self::NrcDutch => &NRC_DUTCH,
            Self::NrcFinnish => &NRC_FINNISH,
            Self::NrcFrench => &NRC_FRENCH,
            Self::NrcFrenchCa => &NRC_FRENCH_CA,
            Self::NrcGerman => &NRC_GERMAN,
            Self::NrcItalian => &NRC_ITALIAN,
            Self::NrcNorwegian => &NRC_NORWEGIAN,
            Self::NrcSpanish => &NRC_SPANISH,
            Self::NrcSwedish => &NRC_SWEDISH,
            Self::NrcSwiss => &NRC_SWISS,
        }
    }

    /// Map a GL or GR byte through this set. The high bit is ignored so the
    /// same set can sit in either half. Bytes below 0x20 map to `'\0'`.
    #[must_use]
    pub fn map(self, byte: u8) -> char {
        let low = byte & 0x7F;
        if low < 0x20 {
            return '\0';
        }
        self.bank()[(low - 0x20) as usize]
    }

    /// Resolve the final byte of an SCS designation (`ESC ( F` and friends).
    ///
    /// `ninety_six` is true for the `-`, `.` and `/` intermediates, which only
    /// accept 96-character sets.
    #[must_use]
    pub fn from_designator(final_byte: u8, ninety_six: bool) -> Option<Self> {
        if ninety_six {
            return match final_byte {
                b'A' | b'<' => Some(Self::DecSupplemental),
                _ => None,
            };
        }
        let set = match final_byte {
            b'A' => Self::Uk,
            b'B' => Self::Us,
            b'0' => Self::Drawing,
            b'1' => Self::Rom,
            b'2' => Self::RomSpecial,
            b'<' => Self::DecSupplemental,
            b'4' => Self::NrcDutch,
            b'C' | b'5' => Self::NrcFinnish,
            b'R' => Self::NrcFrench,
            b'Q' => Self::NrcFrenchCa,
            b'K' => Self::NrcGerman,
            b'Y' => Self::NrcItalian,
            b'E' | b'6' => Self::NrcNorwegian,
            b'Z' => Self::NrcSpanish,
            b'H' | b'7' => Self::NrcSwedish,
            b'=' => Self::NrcSwiss,
            _ => return None,
        };
        Some(set)
    }
}

/// Code page 437 (original IBM PC), including the glyphs for 0x00-0x1F.
pub const CP437: [char; 256] = [
    ' ', '☺', '☻', '♥', '♦', '♣', '♠', '•', '◘', '○', '◙', '♂', '♀', '♪', '♫', '☼', //
    '►', '◄', '↕', '‼', '¶', '§', '▬', '↨', '↑', '↓', '→', '←', '∟', '↔', '▲', '▼', //
    ' ', '!', '"', '#', '$', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', //
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?', //
    '@', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', //
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '[', '\\', ']', '^', '_', //
    '`', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', //
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '{', '|', '}', '~', '⌂', //
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', //
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', //
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»', //
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', //
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', //
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀', //
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩', //
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{a0}',
];

// Windows-1252 0x80-0x9F; undefined positions fall back to the C1 scalar.
const CP1252_HIGH: [char; 32] = [
    '€', '\u{81}', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', '\u{8d}', 'Ž',
    '\u{8f}', '\u{90}', '‘', '’', '“', '”', '•', '–', '—', '˜', '™', 'š', '›', 'œ', '\u{9d}',
    'ž', 'Ÿ',
];

// ATASCII 0x00-0x1F graphics.
const ATASCII_LOW: [char; 32] = [
    '♥', '├', '│', '┘', '┤', '┐', '╱', '╲', '◢', '▗', '◣', '▝', '▘', '▔', '▁', '▖', //
    '♣', '┌', '─', '┼', '●', '▄', '▏', '┬', '┴', '▌', '└', '␛', '↑', '↓', '←', '→',
];

/// Glyph for the low seven bits of an ATASCII byte.
#[must_use]
pub fn atascii_glyph(byte: u8) -> char {
    let low = byte & 0x7F;
    match low {
        0x00..=0x1F => ATASCII_LOW[low as usize],
        0x60 => '◆',
        0x7B => '♠',
        0x7D => '↰',
        0x7E => '◀',
        0x7F => '▶',
        _ => low as char,
    }
}

/// Convert a printable PETSCII byte to its C64 screen code.
///
/// Returns `None` for the control ranges 0x00-0x1F and 0x80-0x9F.
#[must_use]
pub fn petscii_screen_code(byte: u8) -> Option<u8> {
    match byte {
        0x20..=0x3F => Some(byte),
        0x40..=0x5F => Some(byte - 0x40),
        0x60..=0x7F => Some(byte - 0x20),
        0xA0..=0xBF => Some(byte - 0x40),
        0xC0..=0xFE => Some(byte - 0x80),
        0xFF => Some(0x5E),
        _ => None,
    }
}

/// Base of the PETSCII glyph banks in the Private Use Area.
pub const PETSCII_PUA_BASE: u32 = 0xE000;

/// Map a printable PETSCII byte into one of four PUA banks:
/// uppercase/normal at `U+E000`, uppercase/reverse at `U+E080`,
/// lowercase/normal at `U+E100`, lowercase/reverse at `U+E180`.
#[must_use]
pub fn petscii_to_pua(byte: u8, lowercase: bool, reverse: bool) -> Option<char> {
    let screen = u32::from(petscii_screen_code(byte)?);
    let mut code = PETSCII_PUA_BASE + screen;
    if lowercase {
        code += 0x100;
    }
    if reverse {
        code += 0x80;
    }
    char::from_u32(code)
}

/// An 8-bit code page used to turn single bytes into Unicode scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Codepage {
    #[default]
    Cp437,
    Cp1252,
    Iso8859_1,
    /// DEC multinational: ASCII plus the DEC supplemental set in GR.
    DecMcs,
    Petscii,
    Atascii,
    /// Multi-byte UTF-8; single bytes decode as Latin-1.
    Utf8,
}

impl Codepage {
    /// Decode one byte.
    #[must_use]
    pub fn decode(self, byte: u8) -> char {
        match self {
            Self::Cp437 => CP437[byte as usize],
            Self::Cp1252 => match byte {
                0x80..=0x9F => CP1252_HIGH[(byte - 0x80) as usize],
                _ => byte as char,
            },
            Self::Iso8859_1 | Self::Utf8 => byte as char,
            Self::DecMcs => {
                if byte >= 0xA0 {
                    Charset::DecSupplemental.map(byte)
                } else {
                    byte as char
                }
            }
            Self::Petscii => {
                petscii_to_pua(byte, false, false).unwrap_or(byte as char)
            }
            Self::Atascii => atascii_glyph(byte),
        }
    }

    /// Find the byte that decodes to `ch`, if any.
    ///
    /// ASCII letters, digits and punctuation are preferred as themselves so
    /// the keyboard path never picks a CP437 control-glyph alias.
    #[must_use]
    pub fn encode(self, ch: char) -> Option<u8> {
        match self {
            Self::Petscii => petscii_encode(ch),
            Self::Utf8 | Self::Iso8859_1 => u8::try_from(u32::from(ch)).ok(),
            Self::Atascii => (0..=0x7F_u8).find(|&byte| atascii_glyph(byte) == ch),
            _ if ch.is_ascii() => Some(ch as u8),
            _ => (0x80..=0xFF_u8).find(|&byte| self.decode(byte) == ch),
        }
    }
}

// C64 keyboard in lowercase mode: unshifted letters are 0x41-0x5A, shifted
// letters are 0xC1-0xDA.
fn petscii_encode(ch: char) -> Option<u8> {
    match ch {
        'a'..='z' => Some(ch as u8 - b'a' + 0x41),
        'A'..='Z' => Some(ch as u8 - b'A' + 0xC1),
        ' '..='@' | '[' | ']' => Some(ch as u8),
        '£' => Some(0x5C),
        'π' => Some(0xFF),
        _ => None,
    }
}
