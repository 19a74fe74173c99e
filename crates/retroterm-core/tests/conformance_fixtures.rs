use std::path::{Path, PathBuf};

use retroterm_core::{AttrFlags, Color, Emulation, Emulator, TerminalConfig};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Fixture {
    name: String,
    #[allow(dead_code)]
    description: String,
    emulation: String,
    initial_size: [u16; 2],
    input_bytes_hex: String,
    expected: Expected,
}

#[derive(Debug, Deserialize)]
struct Expected {
    cursor: CursorPos,
    cells: Vec<CellExpectation>,
    /// Replies in the order they were queued, one hex string each.
    #[serde(default)]
    replies_hex: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct CursorPos {
    row: u16,
    col: u16,
}

#[derive(Debug, Deserialize)]
struct CellExpectation {
    row: u16,
    col: u16,
    #[serde(rename = "char")]
    ch: String,
    #[serde(default)]
    attrs: Option<AttrExpectation>,
}

#[derive(Debug, Deserialize, Default)]
struct AttrExpectation {
    #[serde(default)]
    bold: bool,
    #[serde(default)]
    underline: bool,
    #[serde(default)]
    blink: bool,
    #[serde(default)]
    reverse: bool,
    #[serde(default)]
    invisible: bool,
    #[serde(default)]
    protected: bool,
    #[serde(default)]
    fg: Option<ColorExpectation>,
    #[serde(default)]
    bg: Option<ColorExpectation>,
}

/// JSON-friendly color name for fixture expectations.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ColorExpectation {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl ColorExpectation {
    fn color(self) -> Color {
        match self {
            ColorExpectation::Black => Color::Black,
            ColorExpectation::Red => Color::Red,
            ColorExpectation::Green => Color::Green,
            ColorExpectation::Yellow => Color::Yellow,
            ColorExpectation::Blue => Color::Blue,
            ColorExpectation::Magenta => Color::Magenta,
            ColorExpectation::Cyan => Color::Cyan,
            ColorExpectation::White => Color::White,
        }
    }
}

#[test]
fn emulation_fixtures_replay() -> Result<(), String> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let mut paths = collect_fixture_paths(&root)?;
    paths.sort();
    if paths.is_empty() {
        return Err(format!("no fixtures found under {}", root.display()));
    }

    let mut failures = Vec::new();
    for path in paths {
        if let Err(err) = run_fixture(&path) {
            failures.push(format!("{}: {err}", path.display()));
        }
    }

    if !failures.is_empty() {
        return Err(format!("fixtures failed:\n{}", failures.join("\n")));
    }

    Ok(())
}

fn collect_fixture_paths(root: &Path) -> Result<Vec<PathBuf>, String> {
    let mut out = Vec::new();
    let rd = std::fs::read_dir(root)
        .map_err(|e| format!("failed to read fixture root {}: {e}", root.display()))?;
    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let sub_rd = std::fs::read_dir(&path)
            .map_err(|e| format!("failed to read fixture dir {}: {e}", path.display()))?;
        for sub_entry in sub_rd.flatten() {
            let sub_path = sub_entry.path();
            if sub_path.extension().and_then(|s| s.to_str()) == Some("json") {
                out.push(sub_path);
            }
        }
    }
    Ok(out)
}

fn lookup_emulation(name: &str) -> Result<Emulation, String> {
    Emulation::ALL
        .iter()
        .copied()
        .find(|e| e.name() == name)
        .ok_or_else(|| format!("unknown emulation {name:?}"))
}

fn run_fixture(path: &Path) -> Result<(), String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let fixture: Fixture = serde_json::from_str(&text).map_err(|e| e.to_string())?;

    let mut config = TerminalConfig::for_emulation(lookup_emulation(&fixture.emulation)?);
    config.width = fixture.initial_size[0];
    config.height = fixture.initial_size[1];
    let bytes = decode_hex(&fixture.input_bytes_hex)?;

    let mut term = Emulator::new(config).map_err(|e| format!("{}: {e}", fixture.name))?;
    term.feed_bytes(&bytes);

    let (row, col, _) = term.cursor();
    if row != fixture.expected.cursor.row || col != fixture.expected.cursor.col {
        return Err(format!(
            "{}: cursor mismatch: got ({row},{col}), expected ({},{})",
            fixture.name, fixture.expected.cursor.row, fixture.expected.cursor.col
        ));
    }

    for exp in &fixture.expected.cells {
        let got = term.screen().grid().cell(exp.row, exp.col).ok_or_else(|| {
            format!("{}: cell out of bounds ({},{})", fixture.name, exp.row, exp.col)
        })?;
        let mut expected_chars = exp.ch.chars();
        let expected_ch = expected_chars
            .next()
            .ok_or_else(|| format!("{}: empty expected char string", fixture.name))?;
        if expected_chars.next().is_some() {
            return Err(format!(
                "{}: expected char string must be 1 char, got {:?}",
                fixture.name, exp.ch
            ));
        }
        if got.ch != expected_ch {
            return Err(format!(
                "{}: char mismatch at ({},{}): got {:?}, expected {:?}",
                fixture.name, exp.row, exp.col, got.ch, expected_ch
            ));
        }

        if let Some(attrs) = &exp.attrs {
            let flags = got.attrs.flags;
            let checks = [
                ("bold", AttrFlags::BOLD, attrs.bold),
                ("underline", AttrFlags::UNDERLINE, attrs.underline),
                ("blink", AttrFlags::BLINK, attrs.blink),
                ("reverse", AttrFlags::REVERSE, attrs.reverse),
                ("invisible", AttrFlags::INVISIBLE, attrs.invisible),
                ("protected", AttrFlags::PROTECTED, attrs.protected),
            ];
            for (label, flag, expected) in checks {
                assert_flag(&fixture.name, exp.row, exp.col, label, flags, flag, expected)?;
            }

            if let Some(expected_fg) = attrs.fg
                && got.attrs.fg != expected_fg.color()
            {
                return Err(format!(
                    "{}: fg color mismatch at ({},{}): got {:?}, expected {:?}",
                    fixture.name, exp.row, exp.col, got.attrs.fg, expected_fg
                ));
            }
            if let Some(expected_bg) = attrs.bg
                && got.attrs.bg != expected_bg.color()
            {
                return Err(format!(
                    "{}: bg color mismatch at ({},{}): got {:?}, expected {:?}",
                    fixture.name, exp.row, exp.col, got.attrs.bg, expected_bg
                ));
            }
        }
    }

    if let Some(expected) = &fixture.expected.replies_hex {
        let expected = expected
            .iter()
            .map(|hex| decode_hex(hex))
            .collect::<Result<Vec<_>, _>>()?;
        let got = term.drain_replies();
        if got != expected {
            return Err(format!(
                "{}: replies mismatch: got {got:02x?}, expected {expected:02x?}",
                fixture.name
            ));
        }
    }

    Ok(())
}

fn assert_flag(
    fixture: &str,
    row: u16,
    col: u16,
    label: &str,
    flags: AttrFlags,
    flag: AttrFlags,
    expected: bool,
) -> Result<(), String> {
    let got = flags.contains(flag);
    if got == expected {
        return Ok(());
    }
    Err(format!(
        "{fixture}: attr mismatch at ({row},{col}) for {label}: got {got}, expected {expected}"
    ))
}

fn decode_hex(s: &str) -> Result<Vec<u8>, String> {
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if !compact.len().is_multiple_of(2) {
        return Err("hex string must have even length".to_string());
    }
    let mut out = Vec::with_capacity(compact.len() / 2);
    let bytes = compact.as_bytes();
    for i in (0..bytes.len()).step_by(2) {
        let hi = (bytes[i] as char)
            .to_digit(16)
            .ok_or_else(|| "bad hex".to_string())?;
        let lo = (bytes[i + 1] as char)
            .to_digit(16)
            .ok_or_else(|| "bad hex".to_string())?;
        out.push(((hi << 4) | lo) as u8);
    }
    Ok(out)
}
