use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use log::{error, info, warn};
use reqwest::{Client, Method, StatusCode};

/// Per-source request timeout.
const SOURCE_TIMEOUT: Duration = Duration::from_secs(5);

/// How the IP address is extracted from a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseFormat {
    /// The whole body, trimmed.
    PlainText,
    /// The first whitespace-delimited token, e.g. `1.2.3.4 来自于：...`.
    FirstToken,
    /// A string field of a JSON object.
    JsonField(&'static str),
}

impl ResponseFormat {
    pub fn parse(&self, body: &str) -> Result<String> {
        let ip = match self {
            ResponseFormat::PlainText => body.trim().to_string(),
            ResponseFormat::FirstToken => body
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string(),
            ResponseFormat::JsonField(field) => {
                let value: serde_json::Value =
                    serde_json::from_str(body).context("Response is not valid JSON")?;
                value
                    .get(field)
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| anyhow!("JSON response has no string field `{}`", field))?
                    .trim()
                    .to_string()
            }
        };

        if ip.is_empty() {
            bail!("Response contained no IP address");
        }
        Ok(ip)
    }
}

#[derive(Debug, Clone)]
pub struct IpSource {
    pub url: String,
    pub method: Method,
    pub format: ResponseFormat,
}

impl IpSource {
    pub fn get(url: &str, format: ResponseFormat) -> Self {
        Self {
            url: url.to_string(),
            method: Method::GET,
            format,
        }
    }
}

/// Public IP services, tried in this order.
pub fn default_sources() -> Vec<IpSource> {
    vec![
        IpSource::get("https://ip.3322.net", ResponseFormat::PlainText),
        IpSource::get("https://myip.ipip.net", ResponseFormat::FirstToken),
        IpSource::get(
            "https://ip.chinaz.com/getip.aspx",
            ResponseFormat::JsonField("ip"),
        ),
    ]
}

pub struct IpResolver {
    client: Client,
    sources: Vec<IpSource>,
}

impl IpResolver {
    pub fn new() -> Result<Self> {
        Self::with_sources(default_sources())
    }

    pub fn with_sources(sources: Vec<IpSource>) -> Result<Self> {
        let client = Client::builder()
            .timeout(SOURCE_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for IP lookup")?;

        Ok(Self { client, sources })
    }

    /// Returns the first address any source reports, or `None` if all of them fail.
    pub async fn resolve(&self) -> Option<String> {
        for source in &self.sources {
            match self.fetch(source).await {
                Ok(ip) => {
                    info!("Current public IP is {} (via {})", ip, source.url);
                    return Some(ip);
                }
                Err(e) => warn!("Failed to get IP from {}: {:#}", source.url, e),
            }
        }

        error!("All public IP sources failed");
        None
    }

    async fn fetch(&self, source: &IpSource) -> Result<String> {
        let response = self
            .client
            .request(source.method.clone(), &source.url)
            .send()
            .await
            .context("Request failed")?;

        if response.status() != StatusCode::OK {
            bail!("HTTP error: {}", response.status());
        }

        let body = response.text().await.context("Failed to read response")?;
        source.format.parse(&body)
    }
}
