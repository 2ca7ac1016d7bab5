//! Line-editing terminal attached to a shell channel.
//!
//! Assembles incoming channel bytes into lines, echoing as it goes: printable
//! bytes echo back, backspace erases, carriage return completes the line.
//! ANSI escape sequences are consumed so cursor keys do not corrupt the
//! buffer. The prompt is editable; `USE` updates it through the executor.

/// Default REPL prompt.
pub const DEFAULT_PROMPT: &str = "kappa> ";

/// Events produced while feeding input bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// A completed input line, without its terminator.
    Line(String),
    /// Ctrl-D on an empty line.
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EscapeState {
    Plain,
    Escape,
    Csi,
}

/// Per-channel terminal state: prompt and the line under edit.
pub struct Terminal {
    default_prompt: String,
    prompt: String,
    line: Vec<u8>,
    escape: EscapeState,
    last_byte: u8,
}

impl Terminal {
    pub fn new(prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        Self {
            default_prompt: prompt.clone(),
            prompt,
            line: Vec::new(),
            escape: EscapeState::Plain,
            last_byte: 0,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn reset_prompt(&mut self) {
        self.prompt = self.default_prompt.clone();
    }

    /// Appends the current prompt to the output buffer.
    pub fn write_prompt(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.prompt.as_bytes());
    }

    /// Feeds raw channel bytes through the line editor.
    ///
    /// Echo bytes are appended to `out`; completed lines and EOF are
    /// returned in arrival order.
    pub fn feed(&mut self, input: &[u8], out: &mut Vec<u8>) -> Vec<TerminalEvent> {
        let mut events = Vec::new();

        for &byte in input {
            let last = self.last_byte;
            self.last_byte = byte;

            match self.escape {
                EscapeState::Escape => {
                    self.escape = if byte == b'[' {
                        EscapeState::Csi
                    } else {
                        EscapeState::Plain
                    };
                    continue;
                }
                EscapeState::Csi => {
                    // Final bytes of a CSI sequence are 0x40..=0x7e.
                    if (0x40..=0x7e).contains(&byte) {
                        self.escape = EscapeState::Plain;
                    }
                    continue;
                }
                EscapeState::Plain => {}
            }

            match byte {
                0x1b => self.escape = EscapeState::Escape,
                b'\r' => {
                    out.extend_from_slice(b"\r\n");
                    events.push(self.complete_line());
                }
                b'\n' => {
                    // Stand-alone newline; the tail of CRLF was already handled.
                    if last != b'\r' {
                        out.extend_from_slice(b"\r\n");
                        events.push(self.complete_line());
                    }
                }
                0x7f | 0x08 => {
                    if self.line.pop().is_some() {
                        out.extend_from_slice(b"\x08 \x08");
                    }
                }
                0x03 => {
                    // Ctrl-C abandons the line under edit.
                    out.extend_from_slice(b"^C\r\n");
                    self.line.clear();
                    self.write_prompt(out);
                }
                0x04 => {
                    if self.line.is_empty() {
                        events.push(TerminalEvent::Eof);
                    }
                }
                _ => {
                    self.line.push(byte);
                    out.push(byte);
                }
            }
        }

        events
    }

    fn complete_line(&mut self) -> TerminalEvent {
        let line = String::from_utf8_lossy(&self.line).into_owned();
        self.line.clear();
        TerminalEvent::Line(line)
    }
}
