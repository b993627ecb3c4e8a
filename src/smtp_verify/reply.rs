//! Incremental SMTP reply parsing.
//!
//! Bytes arrive in whatever chunks the socket hands out; [`ReplyParser`]
//! buffers them, splits on `\n` and folds `250-...` continuation lines into a
//! single [`SmtpReply`].

use thiserror::Error;

use super::types::SmtpReply;

/// RFC 5321 caps reply lines at 512 octets; anything far beyond that is not
/// an SMTP server talking.
const MAX_LINE_LEN: usize = 4096;

/// Continuation lines folded into one reply before it is given up on.
const MAX_REPLY_LINES: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplyError {
    #[error("invalid SMTP reply: '{0}'")]
    Malformed(String),
    #[error("inconsistent SMTP reply codes: {0} vs {1}")]
    InconsistentCodes(u16, u16),
    #[error("SMTP reply line exceeds {MAX_LINE_LEN} bytes")]
    LineTooLong,
    #[error("SMTP reply exceeds {MAX_REPLY_LINES} lines")]
    TooManyLines,
}

#[derive(Debug)]
struct PendingReply {
    code: u16,
    lines: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ReplyParser {
    buffer: Vec<u8>,
    pending: Option<PendingReply>,
}

impl ReplyParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Next complete reply, or `None` when more bytes are needed.
    pub fn next_reply(&mut self) -> Option<Result<SmtpReply, ReplyError>> {
        loop {
            let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') else {
                if self.buffer.len() > MAX_LINE_LEN {
                    self.buffer.clear();
                    self.pending = None;
                    return Some(Err(ReplyError::LineTooLong));
                }
                return None;
            };

            let mut line = self.buffer.drain(..=pos).collect::<Vec<_>>();
            line.pop();
            if line.ends_with(b"\r") {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line).into_owned();

            match self.accept_line(&line) {
                Ok(Some(reply)) => return Some(Ok(reply)),
                Ok(None) => continue,
                Err(err) => {
                    self.pending = None;
                    return Some(Err(err));
                }
            }
        }
    }

    fn accept_line(&mut self, raw: &str) -> Result<Option<SmtpReply>, ReplyError> {
        let bytes = raw.as_bytes();
        if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
            return Err(ReplyError::Malformed(raw.to_string()));
        }
        let code = raw[..3]
            .parse::<u16>()
            .map_err(|_| ReplyError::Malformed(raw.to_string()))?;

        let continuation = match bytes.get(3) {
            None | Some(b' ') => false,
            Some(b'-') => true,
            Some(_) => return Err(ReplyError::Malformed(raw.to_string())),
        };
        let text = raw.get(4..).unwrap_or_default().to_string();

        let pending = self.pending.get_or_insert_with(|| PendingReply {
            code,
            lines: Vec::new(),
        });
        if pending.code != code {
            return Err(ReplyError::InconsistentCodes(pending.code, code));
        }
        pending.lines.push(text);

        if continuation {
            if pending.lines.len() >= MAX_REPLY_LINES {
                return Err(ReplyError::TooManyLines);
            }
            return Ok(None);
        }
        Ok(self.pending.take().map(|done| SmtpReply {
            code: done.code,
            message: done.lines.join("\n"),
        }))
    }
}
