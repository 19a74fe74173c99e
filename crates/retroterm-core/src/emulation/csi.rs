//! Pieces shared by the ANSI and DEC control-sequence parsers.

use crate::cell::{AttrFlags, CellAttrs, Color};

/// Most parameters kept per sequence; extras are dropped.
pub const MAX_PARAMS: usize = 16;

// Digits beyond this per parameter are dropped.
const MAX_PARAM_DIGITS: u8 = 16;

/// Numeric parameters of a control sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: Vec<u16>,
    digits: u8,
    overflow: bool,
}

impl Params {
    pub fn clear(&mut self) {
        self.values.clear();
        self.digits = 0;
        self.overflow = false;
    }

    pub fn push_digit(&mut self, digit: u8) {
        if self.overflow || self.digits >= MAX_PARAM_DIGITS {
            return;
        }
        if self.values.is_empty() {
            self.values.push(0);
        }
        if let Some(last) = self.values.last_mut() {
            *last = last
                .saturating_mul(10)
                .saturating_add(u16::from(digit.saturating_sub(b'0')));
        }
        self.digits += 1;
    }

    pub fn separator(&mut self) {
        if self.values.is_empty() {
            self.values.push(0);
        }
        if self.values.len() >= MAX_PARAMS {
            self.overflow = true;
            return;
        }
        self.values.push(0);
        self.digits = 0;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Parameter `index` as given, 0 when absent.
    #[must_use]
    pub fn raw(&self, index: usize) -> u16 {
        self.values.get(index).copied().unwrap_or(0)
    }

    /// Parameter `index`, with 0 or absent meaning `default`.
    #[must_use]
    pub fn get(&self, index: usize, default: u16) -> u16 {
        match self.raw(index) {
            0 => default,
            value => value,
        }
    }

    /// All parameters; an empty list reads as a single 0.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        let implicit = self.values.is_empty().then_some(0);
        self.values.iter().copied().chain(implicit)
    }
}

/// One of the eight base colors, counted from the start of an SGR range.
fn base_color(offset: u16) -> Color {
    Color::from_index(u8::try_from(offset % 8).unwrap_or_default())
}

/// Apply SGR parameters. With `colors` false, color selections are ignored
/// (monochrome VT100).
pub fn apply_sgr(attrs: &mut CellAttrs, params: &Params, colors: bool) {
    let values: Vec<u16> = params.iter().collect();
    let mut i = 0;
    while i < values.len() {
        let value = values[i];
        i += 1;
        match value {
            0 => attrs.reset(),
            1 => attrs.flags.insert(AttrFlags::BOLD),
            2 | 21 | 22 => attrs.flags.remove(AttrFlags::BOLD),
            4 => attrs.flags.insert(AttrFlags::UNDERLINE),
            5 | 6 => attrs.flags.insert(AttrFlags::BLINK),
            7 => attrs.flags.insert(AttrFlags::REVERSE),
            8 => attrs.flags.insert(AttrFlags::INVISIBLE),
            24 => attrs.flags.remove(AttrFlags::UNDERLINE),
            25 => attrs.flags.remove(AttrFlags::BLINK),
            27 => attrs.flags.remove(AttrFlags::REVERSE),
            28 => attrs.flags.remove(AttrFlags::INVISIBLE),
            30..=37 if colors => attrs.fg = base_color(value - 30),
            39 if colors => attrs.fg = CellAttrs::default().fg,
            40..=47 if colors => attrs.bg = base_color(value - 40),
            49 if colors => attrs.bg = CellAttrs::default().bg,
            90..=97 if colors => {
                attrs.fg = base_color(value - 90);
                attrs.flags.insert(AttrFlags::BOLD);
            }
            100..=107 if colors => attrs.bg = base_color(value - 100),
            38 | 48 => {
                // Extended colors: 5;n or 2;r;g;b. Only the first 16
                // indexed entries have an equivalent here.
                let kind = values.get(i).copied().unwrap_or(0);
                let consumed = match kind {
                    5 => 2,
                    2 => 4,
                    _ => 1,
                };
                if kind == 5
                    && colors
                    && let Some(&index) = values.get(i + 1)
                    && index < 16
                {
                    let color = base_color(index);
                    if value == 38 {
                        attrs.fg = color;
                        if index >= 8 {
                            attrs.flags.insert(AttrFlags::BOLD);
                        }
                    } else {
                        attrs.bg = color;
                    }
                }
                i += consumed;
            }
            _ => {}
        }
    }
}
