//! Loads the criteria catalogue from a local file or an S3 object.

use anyhow::{Context, Result};
use aws_config::Region;
use tracing::info;

use super::CriteriaStore;

/// Where the catalogue lives, parsed from `CRITERIA_SOURCE`.
#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaSource {
    File(String),
    S3 { bucket: String, key: String },
}

impl CriteriaSource {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        match raw.strip_prefix("s3://") {
            Some(rest) => {
                let (bucket, key) = rest
                    .split_once('/')
                    .filter(|(b, k)| !b.is_empty() && !k.is_empty())
                    .with_context(|| format!("S3 criteria source must be s3://bucket/key, got '{raw}'"))?;
                Ok(CriteriaSource::S3 {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
            }
            None => Ok(CriteriaSource::File(raw.to_string())),
        }
    }

    fn is_briefs(&self) -> bool {
        let name = match self {
            CriteriaSource::File(path) => path.as_str(),
            CriteriaSource::S3 { key, .. } => key.as_str(),
        };
        name.to_lowercase().ends_with(".txt")
    }
}

/// Reads and parses the catalogue. `.txt` sources use the brief format, anything
/// else is treated as a JSON array of records.
pub async fn load_criteria(raw_source: &str, s3_endpoint: Option<&str>) -> Result<CriteriaStore> {
    let source = CriteriaSource::parse(raw_source)?;

    let text = match &source {
        CriteriaSource::File(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read criteria file '{path}'"))?,
        CriteriaSource::S3 { bucket, key } => fetch_s3_object(bucket, key, s3_endpoint).await?,
    };

    let store = if source.is_briefs() {
        CriteriaStore::from_briefs(&text)
    } else {
        CriteriaStore::from_json(&text)
    }
    .with_context(|| format!("Invalid criteria catalogue at '{raw_source}'"))?;

    info!("Loaded {} school criteria records from {raw_source}", store.len());
    Ok(store)
}

/// Fetches an object body using the default AWS credential chain, or a custom
/// endpoint (MinIO) when one is configured.
async fn fetch_s3_object(bucket: &str, key: &str, endpoint: Option<&str>) -> Result<String> {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"));
    if let Some(endpoint) = endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    let s3_config = loader.load().await;

    let s3_conf = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(endpoint.is_some())
        .build();
    let client = aws_sdk_s3::Client::from_conf(s3_conf);

    let object = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("S3 download of s3://{bucket}/{key} failed: {e}"))?;

    let bytes = object
        .body
        .collect()
        .await
        .map_err(|e| anyhow::anyhow!("S3 body read failed: {e}"))?
        .into_bytes();

    String::from_utf8(bytes.to_vec()).context("Criteria object is not valid UTF-8")
}
