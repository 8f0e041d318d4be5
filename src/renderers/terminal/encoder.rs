use crate::pipeline::Framebuffer;
use std::fmt::Write as _;
use std::io::{self, Write};

const CURSOR_HOME: &str = "\x1b[H";
const RESET: &str = "\x1b[0m";
/// U+2580 UPPER HALF BLOCK: foreground paints the top pixel, background
/// the bottom one, so each character cell carries two vertical pixels.
const UPPER_HALF: &str = "\u{2580}";

/// Serialize the framebuffer into one string of truecolor half-block
/// glyphs. Rows are consumed in pairs; a missing bottom row reads as black.
pub fn encode(fb: &Framebuffer) -> String {
    let char_rows = fb.height.div_ceil(2);
    // ~40 bytes per glyph cell; reserving up front keeps the hot loop free
    // of reallocation.
    let mut out = String::with_capacity(fb.width * char_rows * 40 + 16);

    out.push_str(CURSOR_HOME);
    for y in (0..fb.height as i32).step_by(2) {
        for x in 0..fb.width as i32 {
            let top = fb.pixel(x, y);
            let bottom = fb.pixel(x, y + 1);
            let _ = write!(
                out,
                "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m{UPPER_HALF}",
                top.r, top.g, top.b, bottom.r, bottom.g, bottom.b
            );
        }
        out.push_str(RESET);
        // Raw mode leaves LF as a bare line feed, so the carriage return
        // is explicit.
        out.push_str("\r\n");
    }
    out
}

/// Write the encoded frame to stdout in a single `write_all` + flush.
/// Splitting the write tears the frame and interleaves with the status
/// footer, so this is part of the contract, not a tuning choice.
pub fn present(fb: &Framebuffer) -> io::Result<()> {
    let frame = encode(fb);
    let mut stdout = io::stdout().lock();
    stdout.write_all(frame.as_bytes())?;
    stdout.flush()
}
