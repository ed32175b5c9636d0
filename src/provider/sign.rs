use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::Rng;
use sha1::Sha1;
use time::{macros::format_description, OffsetDateTime};

/// RFC 3986 unreserved characters stay as-is, everything else is escaped.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub const API_VERSION: &str = "2015-01-09";

pub fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, UNRESERVED).to_string()
}

/// Sorted, encoded `k=v&k=v` form of the parameters.
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn string_to_sign(method: &str, params: &BTreeMap<String, String>) -> String {
    format!(
        "{}&{}&{}",
        method,
        percent_encode("/"),
        percent_encode(&canonical_query(params))
    )
}

pub fn signature(secret: &str, string_to_sign: &str) -> Result<String> {
    let mut mac = Hmac::<Sha1>::new_from_slice(format!("{}&", secret).as_bytes())
        .map_err(|_| anyhow!("Invalid signing key"))?;
    mac.update(string_to_sign.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn timestamp() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second]Z"
        ))
        .context("Failed to format request timestamp")
}

fn nonce() -> String {
    let mut rng = rand::thread_rng();
    format!("{:016x}{:016x}", rng.gen::<u64>(), rng.gen::<u64>())
}

/// Full parameter set for a signed GET request: common parameters,
/// the action's own parameters, and `Signature`.
pub fn signed_params(
    access_key_id: &str,
    access_key_secret: &str,
    region_id: &str,
    action: &str,
    action_params: &[(&str, &str)],
) -> Result<BTreeMap<String, String>> {
    let mut params: BTreeMap<String, String> = [
        ("Format", "JSON"),
        ("Version", API_VERSION),
        ("AccessKeyId", access_key_id),
        ("SignatureMethod", "HMAC-SHA1"),
        ("SignatureVersion", "1.0"),
        ("RegionId", region_id),
        ("Action", action),
    ]
    .iter()
    .chain(action_params)
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    params.insert("SignatureNonce".to_string(), nonce());
    params.insert("Timestamp".to_string(), timestamp()?);

    let signature = signature(access_key_secret, &string_to_sign("GET", &params))?;
    params.insert("Signature".to_string(), signature);

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn published_example() -> BTreeMap<String, String> {
        [
            ("Format", "XML"),
            ("AccessKeyId", "testid"),
            ("Action", "DescribeDomainRecords"),
            ("SignatureMethod", "HMAC-SHA1"),
            ("DomainName", "example.com"),
            ("SignatureNonce", "f59ed6a9-83fc-473b-9cc6-99c95df3856e"),
            ("SignatureVersion", "1.0"),
            ("Version", "2015-01-09"),
            ("Timestamp", "2016-03-24T16:41:54Z"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn encodes_reserved_characters() {
        assert_eq!(percent_encode("a b*c~d"), "a%20b%2Ac~d");
        assert_eq!(percent_encode("2016-03-24T16:41:54Z"), "2016-03-24T16%3A41%3A54Z");
        assert_eq!(percent_encode("/"), "%2F");
    }

    #[test]
    fn string_to_sign_matches_published_example() {
        let expected = "GET&%2F&AccessKeyId%3Dtestid%26Action%3DDescribeDomainRecords\
            %26DomainName%3Dexample.com%26Format%3DXML%26SignatureMethod%3DHMAC-SHA1\
            %26SignatureNonce%3Df59ed6a9-83fc-473b-9cc6-99c95df3856e\
            %26SignatureVersion%3D1.0%26Timestamp%3D2016-03-24T16%253A41%253A54Z\
            %26Version%3D2015-01-09";

        assert_eq!(string_to_sign("GET", &published_example()), expected);
    }

    #[test]
    fn signature_matches_published_example() {
        let to_sign = string_to_sign("GET", &published_example());
        assert_eq!(
            signature("testsecret", &to_sign).unwrap(),
            "uRpHwaSEt3J+6KQD//svCh/x+pI="
        );
    }

    #[test]
    fn signed_params_carry_common_fields() {
        let params = signed_params(
            "id",
            "secret",
            "cn-hangzhou",
            "UpdateDomainRecord",
            &[("RR", "home"), ("Value", "1.2.3.4")],
        )
        .unwrap();

        assert_eq!(params["Action"], "UpdateDomainRecord");
        assert_eq!(params["RegionId"], "cn-hangzhou");
        assert_eq!(params["RR"], "home");
        assert_eq!(params["Timestamp"].len(), "2016-03-24T16:41:54Z".len());
        assert!(params["Timestamp"].ends_with('Z'));
        assert_eq!(params["SignatureNonce"].len(), 32);
        assert!(!params["Signature"].is_empty());
    }
}
