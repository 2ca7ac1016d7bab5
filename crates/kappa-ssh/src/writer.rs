//! Color-coded response writer.
//!
//! Responses are line-oriented:
//! `<color> <CodeName> (<numeric>)[: message]<reset>\r\n`

use crate::codes::StatusCode;
use std::io::Write;

/// ANSI escape sequences for terminal colors.
#[derive(Debug, Clone, Copy)]
pub struct ColorCodes {
    pub black: &'static [u8],
    pub red: &'static [u8],
    pub green: &'static [u8],
    pub yellow: &'static [u8],
    pub blue: &'static [u8],
    pub magenta: &'static [u8],
    pub cyan: &'static [u8],
    pub white: &'static [u8],

    pub light_grey: &'static [u8],
    pub light_red: &'static [u8],
    pub light_green: &'static [u8],
    pub light_yellow: &'static [u8],
    pub light_blue: &'static [u8],
    pub light_magenta: &'static [u8],
    pub light_cyan: &'static [u8],
    pub light_white: &'static [u8],

    pub reset: &'static [u8],
}

pub const DEFAULT_COLORS: ColorCodes = ColorCodes {
    black: b"\x1b[30m",
    red: b"\x1b[31m",
    green: b"\x1b[32m",
    yellow: b"\x1b[33m",
    blue: b"\x1b[34m",
    magenta: b"\x1b[35m",
    cyan: b"\x1b[36m",
    white: b"\x1b[37m",

    light_grey: b"\x1b[90m",
    light_red: b"\x1b[91m",
    light_green: b"\x1b[92m",
    light_yellow: b"\x1b[93m",
    light_blue: b"\x1b[94m",
    light_magenta: b"\x1b[95m",
    light_cyan: b"\x1b[96m",
    light_white: b"\x1b[97m",

    reset: b"\x1b[0m",
};

/// Writes status-coded responses to the client.
///
/// Output goes to an in-memory buffer that is flushed to the channel in one
/// piece; write errors surface there, so they are ignored here.
pub struct ResponseWriter<W: Write> {
    pub colors: ColorCodes,
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    pub fn new(colors: ColorCodes, writer: W) -> Self {
        Self { colors, writer }
    }

    fn color_code(&mut self, color: &[u8], code: StatusCode, message: &str) {
        let _ = self.writer.write_all(color);

        match code.name() {
            Some(name) => {
                let _ = write!(self.writer, " {} ({})", name, code.code());
            }
            None => {
                let _ = write!(self.writer, " Unknown ({})", code.code());
            }
        }

        if !message.is_empty() {
            let _ = write!(self.writer, ": {}", message);
        }

        let _ = self.writer.write_all(self.colors.reset);
        let _ = self.writer.write_all(b"\r\n");
    }

    /// Writes a success status line in light green.
    pub fn success(&mut self, code: StatusCode, message: impl AsRef<str>) {
        self.color_code(self.colors.light_green, code, message.as_ref());
    }

    /// Writes a failure status line in light red.
    pub fn fail(&mut self, code: StatusCode, message: impl AsRef<str>) {
        self.color_code(self.colors.light_red, code, message.as_ref());
    }

    /// Pass-through into the underlying writer.
    pub fn write(&mut self, data: &[u8]) {
        let _ = self.writer.write_all(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<F: FnOnce(&mut ResponseWriter<&mut Vec<u8>>)>(f: F) -> String {
        let mut buf = Vec::new();
        let mut writer = ResponseWriter::new(DEFAULT_COLORS, &mut buf);
        f(&mut writer);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_success_format() {
        let out = render(|w| w.success(StatusCode::OK, "namespace created"));
        assert_eq!(out, "\x1b[92m OK (2000): namespace created\x1b[0m\r\n");
    }

    #[test]
    fn test_success_without_message() {
        let out = render(|w| w.success(StatusCode::OK, ""));
        assert_eq!(out, "\x1b[92m OK (2000)\x1b[0m\r\n");
    }

    #[test]
    fn test_fail_format() {
        let out = render(|w| w.fail(StatusCode::UNAUTHORIZED, ""));
        assert_eq!(out, "\x1b[91m Unauthorized (4000)\x1b[0m\r\n");
    }

    #[test]
    fn test_duplicate_namespace_is_success_class() {
        let out = render(|w| w.success(StatusCode::NAMESPACE_ALREADY_EXISTS, "acme"));
        assert_eq!(out, "\x1b[92m NamespaceAlreadyExists (2001): acme\x1b[0m\r\n");
    }

    #[test]
    fn test_unknown_code() {
        let out = render(|w| w.fail(StatusCode(1234), "strange"));
        assert_eq!(out, "\x1b[91m Unknown (1234): strange\x1b[0m\r\n");
    }

    #[test]
    fn test_write_passthrough() {
        let out = render(|w| w.write(b"raw bytes"));
        assert_eq!(out, "raw bytes");
    }
}
