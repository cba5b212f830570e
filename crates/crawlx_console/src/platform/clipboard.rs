use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use crawlx_core::ConsoleError;

pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ConsoleError>;
}

/// Sets the system clipboard through the terminal with an OSC 52 sequence.
/// Works over SSH and inside tmux when the terminal allows it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Osc52Clipboard;

impl Clipboard for Osc52Clipboard {
    fn write_text(&self, text: &str) -> Result<(), ConsoleError> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(osc52_sequence(text).as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text.as_bytes()))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_wraps_base64_payload() {
        assert_eq!(osc52_sequence("hi"), "\x1b]52;c;aGk=\x07");
    }

    #[test]
    fn multibyte_text_is_encoded_as_utf8() {
        let sequence = osc52_sequence("café");
        let payload = sequence
            .trim_start_matches("\x1b]52;c;")
            .trim_end_matches('\x07');
        assert_eq!(STANDARD.decode(payload).unwrap(), "café".as_bytes());
    }
}
