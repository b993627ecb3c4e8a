//! DNS MX resolution.
//!
//! [`resolve_mail_exchange`] is what the prober and the finder use: it picks
//! the preferred exchange host or reports [`MailExchange::NoMailService`].
//! [`check_mx`] exposes the full ordered record list.

mod error;
mod resolver;
mod types;

pub use error::MxError as Error;
pub use resolver::{LookupMx, build_resolver, check_mx, resolve_mail_exchange, resolve_with};
pub(crate) use resolver::normalize_exchange;
pub use types::{DnsOptions, MailExchange, MxRecord, MxStatus, NoServiceReason};
