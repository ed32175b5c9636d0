use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::sign::signed_params;
use super::{DnsProvider, DnsRecord};
use crate::config::Config;

const RECORD_TYPE: &str = "A";

pub struct AliyunDns {
    client: Client,
    access_key_id: String,
    access_key_secret: String,
    region_id: String,
    domain_name: String,
    endpoint: String,
}

impl AliyunDns {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client for Alidns")?;

        Ok(Self {
            client,
            access_key_id: config.access_key_id.clone(),
            access_key_secret: config.access_key_secret.clone(),
            region_id: config.region_id.clone(),
            domain_name: config.domain_name.clone(),
            endpoint: config.endpoint.clone(),
        })
    }

    async fn call<T: DeserializeOwned>(&self, action: &str, params: &[(&str, &str)]) -> Result<T> {
        let query = signed_params(
            &self.access_key_id,
            &self.access_key_secret,
            &self.region_id,
            action,
            params,
        )?;

        let response = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to Alidns", action))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read {} response", action))?;

        if !status.is_success() {
            match serde_json::from_str::<AliyunError>(&body) {
                Ok(err) => bail!(
                    "Alidns API error: {}: {} (request {})",
                    err.code,
                    err.message,
                    err.request_id.as_deref().unwrap_or("-")
                ),
                Err(_) => bail!("Alidns HTTP error: {}", status),
            }
        }

        serde_json::from_str(&body).with_context(|| format!("Failed to parse {} response", action))
    }

    pub async fn describe_records(&self, rr: &str) -> Result<Vec<DnsRecord>> {
        let response: DescribeRecordsResponse = self
            .call(
                "DescribeDomainRecords",
                &[
                    ("DomainName", self.domain_name.as_str()),
                    ("RRKeyWord", rr),
                    ("Type", RECORD_TYPE),
                ],
            )
            .await?;

        Ok(response
            .domain_records
            .record
            .into_iter()
            .map(|r| DnsRecord {
                record_id: r.record_id,
                rr: r.rr,
                record_type: r.record_type,
                value: r.value,
            })
            .collect())
    }

    pub async fn update_domain_record(&self, record_id: &str, rr: &str, ip: &str) -> Result<()> {
        let response: UpdateRecordResponse = self
            .call(
                "UpdateDomainRecord",
                &[
                    ("RecordId", record_id),
                    ("RR", rr),
                    ("Type", RECORD_TYPE),
                    ("Value", ip),
                ],
            )
            .await?;

        debug!(
            "UpdateDomainRecord accepted for record {} (request {})",
            response.record_id,
            response.request_id.as_deref().unwrap_or("-")
        );
        Ok(())
    }
}

/// Picks the A record to compare against.
///
/// `RRKeyWord` matches fuzzily (`home` also finds `home2`), so an exact `RR`
/// wins over the provider's ordering; this deliberately departs from simply
/// taking the first record returned, which would rewrite the wrong host.
fn select_record(records: Vec<DnsRecord>, rr: &str) -> Option<DnsRecord> {
    let mut candidates: Vec<DnsRecord> = records
        .into_iter()
        .filter(|r| r.record_type == RECORD_TYPE)
        .collect();
    if candidates.is_empty() {
        return None;
    }
    let exact = candidates.iter().position(|r| r.rr == rr).unwrap_or(0);
    Some(candidates.swap_remove(exact))
}

#[async_trait]
impl DnsProvider for AliyunDns {
    async fn get_record(&self, rr: &str) -> Option<DnsRecord> {
        match self.describe_records(rr).await {
            Ok(records) => select_record(records, rr),
            Err(e) => {
                error!("Failed to get record for {}.{}: {:#}", rr, self.domain_name, e);
                None
            }
        }
    }

    async fn update_record(&self, record_id: &str, rr: &str, ip: &str) -> bool {
        match self.update_domain_record(record_id, rr, ip).await {
            Ok(()) => {
                info!("DNS record updated: {}.{} -> {}", rr, self.domain_name, ip);
                true
            }
            Err(e) => {
                error!("Failed to update {}.{}: {:#}", rr, self.domain_name, e);
                false
            }
        }
    }
}

// Alidns API types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AliyunError {
    code: String,
    message: String,
    request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeRecordsResponse {
    domain_records: DomainRecords,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DomainRecords {
    #[serde(default)]
    record: Vec<AliyunRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AliyunRecord {
    record_id: String,
    #[serde(rename = "RR")]
    rr: String,
    #[serde(rename = "Type")]
    record_type: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpdateRecordResponse {
    record_id: String,
    request_id: Option<String>,
}
