//! Construction-time configuration.
//!
//! The core never reads the environment or the filesystem; hosts build a
//! [`TerminalConfig`] from their own option store and hand it to
//! [`Emulator::new`](crate::Emulator::new).

use std::fmt;

use crate::emulation::Emulation;
use crate::keyboard::Key;

/// Default number of rows retained in scrollback.
pub const DEFAULT_SCROLLBACK_MAX: usize = 20_000;

/// Upper bound accepted for `scrollback_max`.
pub const MAX_SCROLLBACK: usize = 1_000_000;

/// Widest logical screen accepted (DECCOLM 132 plus headroom).
pub const MAX_WIDTH: u16 = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalConfig {
    /// Columns at 80-column mode.
    pub width: u16,
    /// Total rows, including the status area.
    pub height: u16,
    /// Rows reserved by the host for a status line; not addressable.
    pub status_height: u16,
    pub scrollback_max: usize,
    /// Emulation selected at construction.
    pub emulation: Emulation,
    /// Sent in response to ENQ.
    pub answerback: String,
    /// Language tag reported to hosts that ask; informational.
    pub utf8_lang: String,
    pub bracketed_paste_default: bool,
    /// Backspace key sends 0x08 instead of 0x7F.
    pub hard_backspace: bool,
    /// Play ANSI music sequences instead of treating `CSI M` as DL.
    pub ansi_music: bool,
    pub avatar_ansi_fallback: bool,
    pub petscii_ansi_fallback: bool,
    /// Map PETSCII color bytes to SGR colors (otherwise they are ignored).
    pub petscii_color_sgr: bool,
    /// The host font is already double width; no resize request is needed.
    pub petscii_wide_font: bool,
    /// Honor SGR color parameters in VT100/VT102/VT220.
    pub vt100_color: bool,
    /// The transport is newline-sensitive (telnet): ENTER sends CR LF.
    pub crlf_on_enter: bool,
    /// Keys sent as DOORWAY `NUL <scancode>` pairs.
    pub doorway_keys: Vec<Key>,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
            status_height: 0,
            scrollback_max: DEFAULT_SCROLLBACK_MAX,
            emulation: Emulation::Ansi,
            answerback: String::new(),
            utf8_lang: "en_US".to_string(),
            bracketed_paste_default: false,
            hard_backspace: false,
            ansi_music: true,
            avatar_ansi_fallback: true,
            petscii_ansi_fallback: true,
            petscii_color_sgr: true,
            petscii_wide_font: false,
            vt100_color: true,
            crlf_on_enter: false,
            doorway_keys: Vec::new(),
        }
    }
}

impl TerminalConfig {
    /// Convenience constructor for a given emulation with default options.
    #[must_use]
    pub fn for_emulation(emulation: Emulation) -> Self {
        Self {
            emulation,
            ..Self::default()
        }
    }

    /// Rows the cursor can address.
    #[must_use]
    pub fn visible_height(&self) -> u16 {
        self.height.saturating_sub(self.status_height)
    }

    /// Check dimension and capacity constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        if self.width > MAX_WIDTH {
            return Err(ConfigError::WidthTooLarge { width: self.width });
        }
        if self.height == 0 {
            return Err(ConfigError::ZeroHeight);
        }
        // At least two addressable rows so a scroll region is never empty.
        if self.visible_height() < 2 {
            return Err(ConfigError::StatusTooTall {
                height: self.height,
                status_height: self.status_height,
            });
        }
        if self.scrollback_max > MAX_SCROLLBACK {
            return Err(ConfigError::ScrollbackTooLarge {
                requested: self.scrollback_max,
                max: MAX_SCROLLBACK,
            });
        }
        Ok(())
    }
}

/// Rejected configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    ZeroWidth,
    ZeroHeight,
    WidthTooLarge { width: u16 },
    StatusTooTall { height: u16, status_height: u16 },
    ScrollbackTooLarge { requested: usize, max: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroWidth => write!(f, "width must be at least 1 column"),
            Self::ZeroHeight => write!(f, "height must be at least 1 row"),
            Self::WidthTooLarge { width } => {
                write!(f, "width {width} exceeds the maximum of {MAX_WIDTH} columns")
            }
            Self::StatusTooTall {
                height,
                status_height,
            } => write!(
                f,
                "status area of {status_height} rows leaves fewer than 2 usable rows out of {height}"
            ),
            Self::ScrollbackTooLarge { requested, max } => {
                write!(f, "scrollback of {requested} rows exceeds the maximum of {max}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TerminalConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.visible_height(), 24);
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let config = TerminalConfig {
            width: 0,
            ..TerminalConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroWidth));

        let config = TerminalConfig {
            height: 0,
            ..TerminalConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroHeight));
    }

    #[test]
    fn status_area_must_leave_room() {
        let config = TerminalConfig {
            height: 3,
            status_height: 2,
            ..TerminalConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::StatusTooTall {
                height: 3,
                status_height: 2
            }
        );
        assert!(err.to_string().contains("fewer than 2 usable rows"));
    }

    #[test]
    fn oversized_values_are_rejected() {
        let config = TerminalConfig {
            width: 1000,
            ..TerminalConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WidthTooLarge { width: 1000 })
        ));
        let config = TerminalConfig {
            scrollback_max: MAX_SCROLLBACK + 1,
            ..TerminalConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn error_is_std_error() {
        fn assert_error<E: std::error::Error>(_: &E) {}
        assert_error(&ConfigError::ZeroWidth);
    }
}
