//! Output side of the core: bytes for the remote end and notifications for
//! the host UI.
//!
//! Parsers append to a [`HostQueue`]; the host drains it after feeding input.
//! Both queues preserve the order in which the triggering bytes arrived.

use crate::music::Tone;
use crate::mouse::{MouseEncoding, MouseProtocol};

/// Something the host should act on that is not a screen change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Bell,
    /// An ANSI music string, already parsed into tones.
    PlayMusic(Vec<Tone>),
    SetTitle(String),
    SetPalette { index: u8, rgb: (u8, u8, u8) },
    ResetPalette,
    /// DECCOLM changed the logical width; the renderer may resize.
    ColumnsChanged(u16),
    /// PETSCII wants a double-width font (40-column look).
    DoubleWidthFont(bool),
    MouseReportingChanged {
        protocol: MouseProtocol,
        encoding: MouseEncoding,
    },
    /// Linux console bell parameters changed (`CSI 10;n ]`, `CSI 11;n ]`).
    LinuxBeep { frequency: u16, duration: u16 },
}

#[derive(Debug, Default)]
pub struct HostQueue {
    replies: Vec<Vec<u8>>,
    events: Vec<HostEvent>,
}

impl HostQueue {
    pub fn reply(&mut self, bytes: impl Into<Vec<u8>>) {
        let bytes = bytes.into();
        if !bytes.is_empty() {
            self.replies.push(bytes);
        }
    }

    pub fn event(&mut self, event: HostEvent) {
        self.events.push(event);
    }

    pub fn drain_replies(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.replies)
    }

    pub fn drain_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.replies.is_empty() || !self.events.is_empty()
    }
}
