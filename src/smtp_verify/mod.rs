//! SMTP deliverability probing.
//!
//! A probe opens one connection to a mail exchanger, walks
//! `greeting → HELO → MAIL FROM → RCPT TO`, reads the verdict, says `QUIT`
//! and closes. Nothing is ever sent past `RCPT TO`. Every failure is folded
//! into a [`ProbeOutcome`]; the connection is closed on every path.
//!
//! [`detect_catch_all`] reuses the same probe with a synthetic recipient.

mod catchall;
mod error;
mod machine;
mod options;
mod probe;
mod reply;
mod session;
mod types;
mod util;

pub use catchall::{CatchAllCheck, detect_catch_all, synthetic_local_part};
pub use error::ProbeError;
pub use options::{CatchAllOptions, ProbeOptions};
pub use probe::{MailboxProber, SmtpProber};
pub use reply::{ReplyError, ReplyParser};
pub use session::{Connector, TcpConnector};
pub use types::{ProbeOutcome, ProbeReport, ProbeStage, SmtpEvent, SmtpReply};
pub use util::random_token;
