pub mod aliyun;
mod sign;

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    pub record_id: String,
    pub rr: String,
    pub record_type: String,
    pub value: String,
}

/// Read and rewrite A records under one zone.
///
/// Failures are logged by the implementation; callers only see "nothing
/// found" or "not updated".
#[async_trait]
pub trait DnsProvider {
    async fn get_record(&self, rr: &str) -> Option<DnsRecord>;

    async fn update_record(&self, record_id: &str, rr: &str, ip: &str) -> bool;
}
