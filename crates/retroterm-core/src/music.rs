//! ANSI music: the BASIC `PLAY` language carried inside `CSI M … ^N`.
//!
//! The ANSI parser collects the string between the introducer and the
//! terminating 0x0E byte and hands it to [`MusicParser::parse`], which turns
//! it into a list of [`Tone`]s for the host to play. Tempo, length, octave and
//! articulation persist between strings, as they do in BASIC.

/// One note (or rest, when `frequency_hz` is 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub frequency_hz: u32,
    /// Time the note sounds.
    pub duration_ms: u32,
    /// Silence after the note (articulation gap).
    pub pause_ms: u32,
}

impl Tone {
    #[must_use]
    pub fn is_rest(&self) -> bool {
        self.frequency_hz == 0
    }
}

/// Articulation selected by `MN`, `ML` and `MS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MusicStyle {
    /// Note sounds for 7/8 of its length.
    #[default]
    Normal,
    /// Full length.
    Legato,
    /// 3/4 of its length.
    Staccato,
}

pub const DEFAULT_OCTAVE: u8 = 4;
pub const DEFAULT_LENGTH: u32 = 4;
pub const DEFAULT_TEMPO: u32 = 120;

const MAX_OCTAVE: u8 = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicParser {
    octave: u8,
    length: u32,
    tempo: u32,
    style: MusicStyle,
    background: bool,
}

impl Default for MusicParser {
    fn default() -> Self {
        Self::new()
    }
}

// Semitone offsets of C D E F G A B from C.
const NOTE_OFFSETS: [u32; 7] = [9, 11, 0, 2, 4, 5, 7];

/// Frequency of QBasic note number `n` (1 = C in octave 0, 58 = A4 = 440 Hz).
#[must_use]
pub fn note_frequency(n: u32) -> u32 {
    if n == 0 {
        return 0;
    }
    let semitones = f64::from(n) - 58.0;
    (440.0 * (semitones / 12.0).exp2()).round() as u32
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).map(u8::to_ascii_uppercase)
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn number(&mut self) -> Option<u32> {
        let start = self.pos;
        let mut value: u32 = 0;
        while let Some(byte) = self.peek()
            && byte.is_ascii_digit()
        {
            value = value.saturating_mul(10).saturating_add(u32::from(byte - b'0'));
            self.pos += 1;
        }
        (self.pos > start).then_some(value)
    }

    fn dots(&mut self) -> u32 {
        let mut dots = 0;
        while self.peek() == Some(b'.') {
            dots += 1;
            self.pos += 1;
        }
        dots
    }
}

impl MusicParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            octave: DEFAULT_OCTAVE,
            length: DEFAULT_LENGTH,
            tempo: DEFAULT_TEMPO,
            style: MusicStyle::Normal,
            background: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    #[must_use]
    pub fn octave(&self) -> u8 {
        self.octave
    }

    #[must_use]
    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    #[must_use]
    pub fn style(&self) -> MusicStyle {
        self.style
    }

    /// `MB` was seen: the host may play without blocking.
    #[must_use]
    pub fn background(&self) -> bool {
        self.background
    }

    /// Milliseconds for a note of length `1/length` with `dots` dots.
    fn note_ms(&self, length: u32, dots: u32) -> u32 {
        let length = length.clamp(1, 64);
        // A whole note is four beats; tempo is quarter notes per minute.
        let mut ms = 240_000 / (self.tempo * length);
        let mut extra = ms / 2;
        for _ in 0..dots {
            ms += extra;
            extra /= 2;
        }
        ms
    }

    fn tone(&self, frequency_hz: u32, total_ms: u32) -> Tone {
        if frequency_hz == 0 {
            return Tone {
                frequency_hz: 0,
                duration_ms: 0,
                pause_ms: total_ms,
            };
        }
        let duration_ms = match self.style {
            MusicStyle::Normal => total_ms * 7 / 8,
            MusicStyle::Legato => total_ms,
            MusicStyle::Staccato => total_ms * 3 / 4,
        };
        Tone {
            frequency_hz,
            duration_ms,
            pause_ms: total_ms - duration_ms,
        }
    }

    /// Parse one `PLAY` string. Unknown commands are skipped.
    pub fn parse(&mut self, play: &[u8]) -> Vec<Tone> {
        let mut tones = Vec::new();
        let mut cur = Cursor {
            bytes: play,
            pos: 0,
        };
        while let Some(cmd) = cur.bump() {
            match cmd {
                b'T' => {
                    if let Some(tempo) = cur.number() {
                        self.tempo = tempo.clamp(32, 255);
                    }
                }
                b'L' => {
                    if let Some(length) = cur.number() {
                        self.length = length.clamp(1, 64);
                    }
                }
                b'O' => {
                    if let Some(octave) = cur.number() {
                        self.octave = octave.min(u32::from(MAX_OCTAVE)) as u8;
                    }
                }
                b'<' => self.octave = self.octave.saturating_sub(1),
                b'>' => self.octave = (self.octave + 1).min(MAX_OCTAVE),
                b'A'..=b'G' => {
                    let mut n = u32::from(self.octave) * 12 + NOTE_OFFSETS[(cmd - b'A') as usize] + 1;
                    match cur.peek() {
                        Some(b'#' | b'+') => {
                            cur.bump();
                            n += 1;
                        }
                        Some(b'-') => {
                            cur.bump();
                            n = n.saturating_sub(1).max(1);
                        }
                        _ => {}
                    }
                    let length = cur.number().unwrap_or(self.length);
                    let dots = cur.dots();
                    tones.push(self.tone(note_frequency(n), self.note_ms(length, dots)));
                }
                b'N' => {
                    let Some(n) = cur.number() else {
                        continue;
                    };
                    let dots = cur.dots();
                    let ms = self.note_ms(self.length, dots);
                    tones.push(self.tone(note_frequency(n.min(84)), ms));
                }
                b'P' => {
                    let length = cur.number().unwrap_or(self.length);
                    let dots = cur.dots();
                    tones.push(self.tone(0, self.note_ms(length, dots)));
                }
                b'M' => match cur.peek() {
                    Some(b'N') => {
                        cur.bump();
                        self.style = MusicStyle::Normal;
                    }
                    Some(b'L') => {
                        cur.bump();
                        self.style = MusicStyle::Legato;
                    }
                    Some(b'S') => {
                        cur.bump();
                        self.style = MusicStyle::Staccato;
                    }
                    Some(b'F') => {
                        cur.bump();
                        self.background = false;
                    }
                    Some(b'B') => {
                        cur.bump();
                        self.background = true;
                    }
                    _ => {}
                },
                _ => {}
            }
        }
        tones
    }
}
