use async_trait::async_trait;
use trust_dns_resolver::TokioAsyncResolver;
use trust_dns_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::proto::op::ResponseCode;

use super::{DnsOptions, Error, MailExchange, MxRecord, MxStatus, NoServiceReason};
use crate::domain::Domain;

/// Builds the async resolver used for MX lookups.
///
/// Without explicit servers the system configuration is read; the lookup
/// timeout from `options` applies in both cases.
pub fn build_resolver(options: &DnsOptions) -> Result<TokioAsyncResolver, Error> {
    let (config, base) = if options.servers.is_empty() {
        trust_dns_resolver::system_conf::read_system_conf().map_err(Error::resolver_init)?
    } else {
        let group = NameServerConfigGroup::from_ips_clear(&options.servers, 53, true);
        (
            ResolverConfig::from_parts(None, Vec::new(), group),
            ResolverOpts::default(),
        )
    };
    Ok(TokioAsyncResolver::tokio(config, resolver_opts(base, options)))
}

/// A single attempt per query: a failed lookup is final, so neither the
/// library default nor resolv.conf may add retries.
pub(crate) fn resolver_opts(mut base: ResolverOpts, options: &DnsOptions) -> ResolverOpts {
    base.timeout = options.timeout;
    base.attempts = 1;
    base
}

/// Lookup MX records for `domain` using a resolver built from `options`.
///
/// The resulting [`MxStatus`] lists records by ascending preference.
pub async fn check_mx(domain: &Domain, options: &DnsOptions) -> Result<MxStatus, Error> {
    let resolver = build_resolver(options)?;
    resolve_with(&resolver, domain.as_str()).await
}

pub async fn resolve_with<R>(resolver: &R, ascii_domain: &str) -> Result<MxStatus, Error>
where
    R: LookupMx + ?Sized,
{
    let records = resolver.lookup_mx(ascii_domain).await?;
    Ok(order_records(records))
}

/// Resolves `domain` to the exchange host with the lowest preference value.
///
/// Lookup failures are an expected answer here, not an error: they come back
/// as [`MailExchange::NoMailService`] and are never retried.
pub async fn resolve_mail_exchange<R>(resolver: &R, domain: &Domain) -> MailExchange
where
    R: LookupMx + ?Sized,
{
    tracing::debug!(target: "mx", "resolving MX for {domain}");
    let reason = match resolve_with(resolver, domain.as_str()).await {
        Ok(status) => match status.preferred() {
            Some(record) => {
                tracing::debug!(
                    target: "mx",
                    "{domain}: preferred exchange {} (preference {})",
                    record.exchange,
                    record.preference
                );
                return MailExchange::Host(record.clone());
            }
            None => NoServiceReason::NoRecords,
        },
        Err(Error::NxDomain { .. }) => NoServiceReason::NxDomain,
        Err(Error::Timeout { .. }) => NoServiceReason::Timeout,
        Err(err) => NoServiceReason::LookupFailed(err.to_string()),
    };
    tracing::warn!(target: "mx", "{domain}: no mail service ({reason})");
    MailExchange::NoMailService(reason)
}

/// Drops null MX entries (RFC 7505) and exact duplicates, then sorts by
/// preference. The sort is stable so ties keep DNS answer order.
pub(crate) fn order_records(records: Vec<MxRecord>) -> MxStatus {
    let mut ordered: Vec<MxRecord> = Vec::with_capacity(records.len());
    for record in records {
        if record.exchange.is_empty() || ordered.contains(&record) {
            continue;
        }
        ordered.push(record);
    }
    ordered.sort_by_key(|record| record.preference);

    if ordered.is_empty() {
        MxStatus::NoRecords
    } else {
        MxStatus::Records(ordered)
    }
}

pub(crate) fn normalize_exchange(exchange: String) -> String {
    let trimmed = exchange.trim_end_matches('.');
    trimmed.to_ascii_lowercase()
}

/// DNS seam of the crate: anything able to answer an MX query.
#[async_trait]
pub trait LookupMx: Send + Sync {
    /// Records in DNS answer order. An existing domain without MX records
    /// answers `Ok(vec![])`.
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, Error>;
}

#[async_trait]
impl LookupMx for TokioAsyncResolver {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, Error> {
        // fully qualified so search domains never apply
        let fqdn = format!("{}.", domain.trim_end_matches('.'));
        match self.mx_lookup(fqdn.as_str()).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|mx| {
                    MxRecord::new(mx.preference(), normalize_exchange(mx.exchange().to_utf8()))
                })
                .collect()),
            Err(err) => classify_lookup_error(domain, err),
        }
    }
}

fn classify_lookup_error(domain: &str, err: ResolveError) -> Result<Vec<MxRecord>, Error> {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. }
            if *response_code == ResponseCode::NXDomain =>
        {
            Err(Error::nx_domain(domain))
        }
        ResolveErrorKind::NoRecordsFound { .. } => Ok(Vec::new()),
        ResolveErrorKind::Timeout => Err(Error::timeout(domain)),
        _ => Err(Error::lookup(err)),
    }
}
