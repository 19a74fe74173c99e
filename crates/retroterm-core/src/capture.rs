//! Capture sink: an optional write-through copy of terminal output.
//!
//! Three forms are supported: the raw inbound bytes, the decoded characters
//! as they are printed, and the printed characters wrapped in HTML spans that
//! carry colors and attributes. The sink is supplied by the host; the core
//! only writes to it and flushes it on [`Capture::finish`].

use std::fmt;
use std::io::{self, Write};

use tracing::{debug, warn};

use crate::cell::{AttrFlags, CellAttrs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaptureMode {
    /// Inbound bytes before any parsing.
    #[default]
    Raw,
    /// Printed characters as UTF-8, one line per linefeed.
    Normal,
    /// Printed characters as an HTML document.
    Html,
}

/// The sink failed; capture has been switched off.
#[derive(Debug)]
pub struct CaptureError {
    source: io::Error,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "capture sink write failed: {}", self.source)
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl From<io::Error> for CaptureError {
    fn from(source: io::Error) -> Self {
        Self { source }
    }
}

const HTML_HEADER: &str = "<html>\n<head><meta charset=\"utf-8\"></head>\n<body bgcolor=\"black\">\n<pre style=\"font-family: monospace\">";
const HTML_FOOTER: &str = "</pre>\n</body>\n</html>\n";

#[derive(Default)]
pub struct Capture {
    sink: Option<Box<dyn Write + Send>>,
    mode: CaptureMode,
    span: Option<CellAttrs>,
    error: Option<io::Error>,
}

impl fmt::Debug for Capture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capture")
            .field("enabled", &self.sink.is_some())
            .field("mode", &self.mode)
            .field("span", &self.span)
            .finish()
    }
}

impl Capture {
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    #[must_use]
    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    /// Start capturing into `sink`. A sink that is already attached is
    /// finished first.
    pub fn enable(&mut self, sink: Box<dyn Write + Send>, mode: CaptureMode) -> Result<(), CaptureError> {
        let previous = self.finish();
        debug!(?mode, "capture enabled");
        self.sink = Some(sink);
        self.mode = mode;
        if mode == CaptureMode::Html {
            self.write(HTML_HEADER.as_bytes());
        }
        previous
    }

    /// Close the current sink, flushing it. Returns the first I/O error seen
    /// since it was enabled. Calling this with no sink attached is a no-op.
    pub fn finish(&mut self) -> Result<(), CaptureError> {
        if let Some(mut sink) = self.sink.take() {
            let mut tail = String::new();
            if self.mode == CaptureMode::Html {
                if self.span.take().is_some() {
                    tail.push_str("</span>");
                }
                tail.push_str(HTML_FOOTER);
            }
            let result = sink.write_all(tail.as_bytes()).and_then(|()| sink.flush());
            if let Err(err) = result
                && self.error.is_none()
            {
                self.error = Some(err);
            }
            debug!("capture disabled");
        }
        self.span = None;
        match self.error.take() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    fn write(&mut self, bytes: &[u8]) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        if let Err(err) = sink.write_all(bytes) {
            warn!(error = %err, "capture sink failed, disabling capture");
            self.sink = None;
            self.span = None;
            self.error = Some(err);
        }
    }

    pub(crate) fn on_raw(&mut self, byte: u8) {
        if self.mode == CaptureMode::Raw {
            self.write(&[byte]);
        }
    }

    pub(crate) fn on_print(&mut self, ch: char, attrs: CellAttrs) {
        match self.mode {
            CaptureMode::Raw => {}
            CaptureMode::Normal => {
                let mut buf = [0u8; 4];
                self.write(ch.encode_utf8(&mut buf).as_bytes());
            }
            CaptureMode::Html => {
                if !self.is_enabled() {
                    return;
                }
                let mut out = String::new();
                if self.span != Some(attrs) {
                    if self.span.is_some() {
                        out.push_str("</span>");
                    }
                    out.push_str(&html_span(attrs));
                    self.span = Some(attrs);
                }
                match ch {
                    '<' => out.push_str("&lt;"),
                    '>' => out.push_str("&gt;"),
                    '&' => out.push_str("&amp;"),
                    '"' => out.push_str("&quot;"),
                    _ => out.push(ch),
                }
                self.write(out.as_bytes());
            }
        }
    }

    pub(crate) fn on_newline(&mut self) {
        if self.mode != CaptureMode::Raw {
            self.write(b"\n");
        }
    }
}

fn html_span(attrs: CellAttrs) -> String {
    let (fg, bg) = attrs.effective_colors();
    let bold = attrs.flags.contains(AttrFlags::BOLD);
    let reverse = attrs.flags.contains(AttrFlags::REVERSE);
    let fg_rgb = fg.rgb(bold && !reverse);
    let bg_rgb = bg.rgb(bold && reverse);
    let fg_rgb = if attrs.flags.contains(AttrFlags::INVISIBLE) {
        bg_rgb
    } else {
        fg_rgb
    };
    let mut style = format!(
        "color: #{:02x}{:02x}{:02x}; background-color: #{:02x}{:02x}{:02x};",
        fg_rgb.0, fg_rgb.1, fg_rgb.2, bg_rgb.0, bg_rgb.1, bg_rgb.2
    );
    if bold {
        style.push_str(" font-weight: bold;");
    }
    match (
        attrs.flags.contains(AttrFlags::UNDERLINE),
        attrs.flags.contains(AttrFlags::BLINK),
    ) {
        (true, true) => style.push_str(" text-decoration: underline blink;"),
        (true, false) => style.push_str(" text-decoration: underline;"),
        (false, true) => style.push_str(" text-decoration: blink;"),
        (false, false) => {}
    }
    format!("<span style=\"{style}\">")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Color;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("sink lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedSink {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().expect("sink lock").clone()).expect("utf8")
        }
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn raw_mode_ignores_printed_text() {
        let sink = SharedSink::default();
        let mut capture = Capture::default();
        capture
            .enable(Box::new(sink.clone()), CaptureMode::Raw)
            .expect("enable");
        capture.on_raw(0x1b);
        capture.on_print('x', CellAttrs::default());
        capture.on_raw(b'[');
        capture.finish().expect("finish");
        assert_eq!(sink.text(), "\x1b[");
    }

    #[test]
    fn normal_mode_writes_utf8_lines() {
        let sink = SharedSink::default();
        let mut capture = Capture::default();
        capture
            .enable(Box::new(sink.clone()), CaptureMode::Normal)
            .expect("enable");
        capture.on_raw(b'z');
        capture.on_print('╔', CellAttrs::default());
        capture.on_newline();
        capture.finish().expect("finish");
        assert_eq!(sink.text(), "╔\n");
    }

    #[test]
    fn html_mode_wraps_attribute_runs() {
        let sink = SharedSink::default();
        let mut capture = Capture::default();
        capture
            .enable(Box::new(sink.clone()), CaptureMode::Html)
            .expect("enable");
        let red = CellAttrs {
            fg: Color::Red,
            ..CellAttrs::default()
        };
        capture.on_print('<', red);
        capture.on_print('a', red);
        capture.on_print('b', CellAttrs::default());
        capture.finish().expect("finish");
        let text = sink.text();
        assert!(text.starts_with("<html>"));
        assert!(text.contains("color: #aa0000;"));
        assert!(text.contains("&lt;a</span>"));
        assert_eq!(text.matches("<span").count(), 2);
        assert!(text.ends_with("</html>\n"));
    }

    #[test]
    fn finish_is_idempotent() {
        let mut capture = Capture::default();
        assert!(capture.finish().is_ok());
        assert!(capture.finish().is_ok());
        assert!(!capture.is_enabled());
    }

    #[test]
    fn failing_sink_disables_and_reports() {
        let mut capture = Capture::default();
        capture
            .enable(Box::new(FailingSink), CaptureMode::Raw)
            .expect("enable");
        capture.on_raw(b'a');
        assert!(!capture.is_enabled());
        let err = capture.finish().expect_err("write error is reported");
        assert!(err.to_string().contains("disk full"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
