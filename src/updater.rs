use log::{info, warn};

use crate::ip::IpResolver;
use crate::provider::DnsProvider;

/// Per-run tally, for the closing log line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct Updater<P> {
    resolver: IpResolver,
    provider: P,
}

impl<P: DnsProvider> Updater<P> {
    pub fn new(resolver: IpResolver, provider: P) -> Self {
        Self { resolver, provider }
    }

    /// Resolves the public IP once, then brings each subdomain's A record in line.
    ///
    /// Returns `None` without touching DNS when no IP source answered.
    pub async fn run(&self, subdomains: &[String]) -> Option<RunSummary> {
        let current_ip = self.resolver.resolve().await?;
        let mut summary = RunSummary::default();

        for rr in subdomains {
            let Some(record) = self.provider.get_record(rr).await else {
                warn!("No A record found for subdomain: {}", rr);
                summary.skipped += 1;
                continue;
            };

            if record.value == current_ip {
                info!("IP unchanged for {}, no update needed", rr);
                summary.unchanged += 1;
                continue;
            }

            info!("Updating {} from {} to {}", rr, record.value, current_ip);
            if self
                .provider
                .update_record(&record.record_id, rr, &current_ip)
                .await
            {
                summary.updated += 1;
            } else {
                summary.failed += 1;
            }
        }

        Some(summary)
    }
}
