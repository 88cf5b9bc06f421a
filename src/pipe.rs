//! Producer-side command loop for the pipe process transport.
//!
//! The consumer drives the producer over two byte streams with one command
//! per newline-terminated line:
//!
//! - `run`: start the regeneration loop
//! - `r <format>`: read once and reply on the output stream
//!   (`json`, `str`, or `bin`)
//! - anything else, including `exit` or stream EOF: terminate the loop
//!
//! JSON and text replies are newline-terminated lines. Binary replies are
//! framed as a u32 little-endian length followed by the payload, because a
//! payload byte may itself be 0x0A and would corrupt line framing.

use std::io::{BufRead, Write};

use crate::codec::{self, WireFormat};
use crate::producer::Producer;

/// Serve the command loop until an unrecognized command or EOF.
///
/// Replies are flushed per command; the consumer blocks on each one.
pub fn run_command_loop<R: BufRead, W: Write>(
    producer: &Producer,
    input: R,
    mut output: W,
) -> std::io::Result<()> {
    for line in input.lines() {
        let line = line?;
        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some("run"), None) => {
                producer.start();
            }
            (Some("r"), Some(format)) => {
                let Ok(format) = format.parse::<WireFormat>() else {
                    tracing::warn!(format, "unrecognized read format, terminating");
                    break;
                };
                let record = producer.read();
                write_reply(&mut output, &codec::encode(&record, format), format)?;
            }
            _ => {
                tracing::debug!(command = line.as_str(), "terminating command loop");
                break;
            }
        }
    }
    Ok(())
}

fn write_reply<W: Write>(output: &mut W, payload: &[u8], format: WireFormat) -> std::io::Result<()> {
    match format {
        WireFormat::Binary => {
            output.write_all(&(payload.len() as u32).to_le_bytes())?;
            output.write_all(payload)?;
        }
        WireFormat::Json | WireFormat::Text => {
            output.write_all(payload)?;
            output.write_all(b"\n")?;
        }
    }
    output.flush()
}
