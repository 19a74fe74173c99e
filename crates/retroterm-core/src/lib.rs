#![forbid(unsafe_code)]

//! Host-agnostic multi-emulation terminal core.
//!
//! `retroterm-core` turns the byte stream from a BBS, shell or serial line
//! into a grid of attributed cells with scrollback, the way a period terminal
//! would have drawn it. It owns the parsers, the screen model and the
//! keyboard/mouse encoders; dialing, transports and file transfer live
//! outside.
//!
//! # Emulations
//!
//! - **TTY**, **DEBUG** (hex dump of the incoming stream)
//! - **ANSI** (ANSI.SYS with ANSI music), **AVATAR**
//! - **VT52**, **VT100**, **VT102**, **VT220**
//! - **LINUX** and **XTERM**, each with a UTF-8 variant
//! - **PETSCII** (Commodore 64), **ATASCII** (Atari 8-bit)
//!
//! # Primary responsibilities
//!
//! - **Emulator**: dispatcher feeding bytes to the selected parser and
//!   applying what it returns.
//! - **Screen**: cursor, scroll region, tab stops and the editing primitives
//!   every parser drives.
//! - **Charset**: DEC character sets (G0-G3) and 8-bit code pages.
//! - **Keyboard / Mouse**: per-emulation key tables and xterm mouse reports.
//! - **Capture**: optional copy of the stream as raw bytes, text or HTML.
//!
//! # Design principles
//!
//! - **No I/O**: the host supplies bytes and collects replies and events.
//! - **Deterministic**: identical byte sequences always produce identical
//!   state, however the stream is split.
//! - **Infallible byte path**: malformed input is dropped or displayed, never
//!   reported as an error.

pub mod capture;
pub mod cell;
pub mod charset;
pub mod config;
pub mod emulation;
pub mod emulator;
pub mod grid;
pub mod host;
pub mod keyboard;
pub mod mouse;
pub mod music;
pub mod reply;
pub mod row;
pub mod screen;
pub mod scrollback;
pub mod status;

pub use capture::{CaptureError, CaptureMode};
pub use cell::{AttrFlags, Cell, CellAttrs, CellFlags, Color};
pub use charset::{Charset, Codepage};
pub use config::{ConfigError, DEFAULT_SCROLLBACK_MAX, MAX_SCROLLBACK, MAX_WIDTH, TerminalConfig};
pub use emulation::{Emulation, LinuxBeep, ParseResult, ScanState};
pub use emulator::Emulator;
pub use grid::Grid;
pub use host::{HostEvent, HostQueue};
pub use keyboard::{Key, KeyboardState, KeypadKey, Modifiers};
pub use mouse::{MouseButton, MouseEncoding, MouseEvent, MouseEventKind, MouseMode, MouseProtocol};
pub use music::{MusicParser, MusicStyle, Tone};
pub use reply::{ReplyEngine, TerminalQuery};
pub use row::{DoubleHeight, Row};
pub use screen::Screen;
pub use scrollback::Scrollback;
pub use status::TerminalStatus;
