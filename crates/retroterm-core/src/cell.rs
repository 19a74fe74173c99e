//! Terminal cell: the fundamental unit of the grid.
//!
//! Each cell stores one Unicode scalar, the attributes it was written with,
//! and the line-rendering flags of the row it belongs to. The color model is
//! the classic 8-color PC/ANSI palette where bold selects the bright half.

use bitflags::bitflags;

bitflags! {
    /// Text attribute flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttrFlags: u8 {
        const BOLD      = 1 << 0;
        const UNDERLINE = 1 << 1;
        const BLINK     = 1 << 2;
        const REVERSE   = 1 << 3;
        const INVISIBLE = 1 << 4;
        /// Set by DECSCA; selective erase (DECSED/DECSEL) skips these cells.
        const PROTECTED = 1 << 5;
    }
}

bitflags! {
    /// Line-rendering flags copied onto every cell of a row.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellFlags: u8 {
        const DOUBLE_WIDTH         = 1 << 0;
        const DOUBLE_HEIGHT_TOP    = 1 << 1;
        const DOUBLE_HEIGHT_BOTTOM = 1 << 2;
    }
}

/// One of the eight base colors, in ANSI (SGR 30-37) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    #[default]
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    pub const ALL: [Color; 8] = [
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Magenta,
        Color::Cyan,
        Color::White,
    ];

    /// Color for an SGR index (0-7). Higher bits are ignored.
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        Self::ALL[(index & 0x07) as usize]
    }

    /// Color for a PC/CGA attribute nibble (blue=1, green=2, red=4).
    #[must_use]
    pub const fn from_pc(index: u8) -> Self {
        const PC_TO_ANSI: [u8; 8] = [0, 4, 2, 6, 1, 5, 3, 7];
        Self::from_index(PC_TO_ANSI[(index & 0x07) as usize])
    }

    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// VGA palette entry, with `bright` selecting the high-intensity half.
    #[must_use]
    pub const fn rgb(self, bright: bool) -> (u8, u8, u8) {
        const NORMAL: [(u8, u8, u8); 8] = [
            (0x00, 0x00, 0x00),
            (0xaa, 0x00, 0x00),
            (0x00, 0xaa, 0x00),
            (0xaa, 0x55, 0x00),
            (0x00, 0x00, 0xaa),
            (0xaa, 0x00, 0xaa),
            (0x00, 0xaa, 0xaa),
            (0xaa, 0xaa, 0xaa),
        ];
        const BRIGHT: [(u8, u8, u8); 8] = [
            (0x55, 0x55, 0x55),
            (0xff, 0x55, 0x55),
            (0x55, 0xff, 0x55),
            (0xff, 0xff, 0x55),
            (0x55, 0x55, 0xff),
            (0xff, 0x55, 0xff),
            (0x55, 0xff, 0xff),
            (0xff, 0xff, 0xff),
        ];
        if bright {
            BRIGHT[self as usize]
        } else {
            NORMAL[self as usize]
        }
    }
}

/// Foreground, background and flags of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAttrs {
    pub fg: Color,
    pub bg: Color,
    pub flags: AttrFlags,
}

impl Default for CellAttrs {
    fn default() -> Self {
        Self {
            fg: Color::White,
            bg: Color::Black,
            flags: AttrFlags::empty(),
        }
    }
}

impl CellAttrs {
    /// Reset to white-on-black with no flags (SGR 0).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Build from a PC text attribute byte: low nibble foreground (bit 3 is
    /// intensity), bits 4-6 background, bit 7 blink.
    #[must_use]
    pub fn from_pc_attribute(byte: u8) -> Self {
        let mut flags = AttrFlags::empty();
        if byte & 0x08 != 0 {
            flags |= AttrFlags::BOLD;
        }
        if byte & 0x80 != 0 {
            flags |= AttrFlags::BLINK;
        }
        Self {
            fg: Color::from_pc(byte),
            bg: Color::from_pc(byte >> 4),
            flags,
        }
    }

    /// Foreground and background as they should be painted, after reverse.
    #[must_use]
    pub fn effective_colors(&self) -> (Color, Color) {
        if self.flags.contains(AttrFlags::REVERSE) {
            (self.bg, self.fg)
        } else {
            (self.fg, self.bg)
        }
    }
}

/// A single cell in the terminal grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub attrs: CellAttrs,
    pub flags: CellFlags,
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank(CellAttrs::default())
    }
}

impl Cell {
    #[must_use]
    pub fn new(ch: char, attrs: CellAttrs) -> Self {
        Self {
            ch,
            attrs,
            flags: CellFlags::empty(),
        }
    }

    /// A space carrying `attrs`. Erase operations fill with these.
    #[must_use]
    pub fn blank(attrs: CellAttrs) -> Self {
        Self::new(' ', attrs)
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.ch == ' '
    }

    #[must_use]
    pub fn is_protected(&self) -> bool {
        self.attrs.flags.contains(AttrFlags::PROTECTED)
    }

    /// Erase to a blank with the given attributes, keeping line flags.
    pub fn erase(&mut self, attrs: CellAttrs) {
        self.ch = ' ';
        self.attrs = CellAttrs {
            flags: attrs.flags & !AttrFlags::PROTECTED,
            ..attrs
        };
    }
}
