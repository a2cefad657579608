//! Blob container gateway.
//!
//! Talks to an Azure-style blob service over its REST surface: lazy container
//! creation, block-blob upload, XML blob enumeration, and delete with
//! snapshots. Requests are authorized with SharedKey signing (HMAC-SHA256
//! over a canonicalized request description).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::GatewayError;
use crate::models::StoredDocument;

const STORAGE_API_VERSION: &str = "2021-08-06";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug)]
pub struct BlobStore {
    client: reqwest::Client,
    account: String,
    key: Vec<u8>,
    endpoint: String,
    container: String,
}

impl BlobStore {
    /// Build the gateway from a container name and connection string. Both are
    /// required; absence is a configuration error at startup, not at call time.
    pub fn new(client: reqwest::Client, config: &StorageConfig) -> Result<Self, GatewayError> {
        let container = config
            .container_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                GatewayError::Configuration("storage container name is not set".to_string())
            })?
            .to_string();

        let connection_string = config.connection_string.as_deref().ok_or_else(|| {
            GatewayError::Configuration("storage connection string is not set".to_string())
        })?;

        let parsed = ConnectionString::parse(connection_string)?;
        let key = BASE64.decode(&parsed.account_key).map_err(|e| {
            GatewayError::Configuration(format!("storage account key is not valid base64: {e}"))
        })?;

        Ok(Self {
            client,
            account: parsed.account_name,
            key,
            endpoint: parsed.endpoint,
            container,
        })
    }

    /// Upload a payload as a new block blob. The blob name is a fresh random
    /// hex id prefixed to the original basename, so two uploads of the same
    /// file never collide and names are never reused.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<(String, String), GatewayError> {
        self.ensure_container().await?;

        let blob_name = generate_blob_name(filename);
        let url = self.blob_url(&blob_name);

        let date = rfc1123_now();
        let ms_headers = vec![
            ("x-ms-blob-type".to_string(), "BlockBlob".to_string()),
            ("x-ms-date".to_string(), date.clone()),
            ("x-ms-version".to_string(), STORAGE_API_VERSION.to_string()),
        ];
        let auth = self.authorization(
            "PUT",
            content_type,
            bytes.len() as u64,
            &ms_headers,
            &self.blob_resource(&blob_name),
            &[],
        )?;

        let resp = self
            .client
            .put(&url)
            .header("Authorization", auth)
            .header("x-ms-blob-type", "BlockBlob")
            .header("x-ms-date", date)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Backend(format!(
                "blob upload returned {status}: {body}"
            )));
        }

        tracing::info!("Uploaded blob {blob_name}");
        Ok((blob_name, url))
    }

    /// List all blobs in the container. A container that does not exist yet
    /// is an empty list, not an error.
    pub async fn list(&self) -> Result<Vec<StoredDocument>, GatewayError> {
        let url = format!(
            "{}/{}?restype=container&comp=list",
            self.endpoint, self.container
        );

        let date = rfc1123_now();
        let ms_headers = vec![
            ("x-ms-date".to_string(), date.clone()),
            ("x-ms-version".to_string(), STORAGE_API_VERSION.to_string()),
        ];
        let auth = self.authorization(
            "GET",
            "",
            0,
            &ms_headers,
            &self.container_resource(),
            &[("comp", "list"), ("restype", "container")],
        )?;

        let resp = self
            .client
            .get(&url)
            .header("Authorization", auth)
            .header("x-ms-date", date)
            .header("x-ms-version", STORAGE_API_VERSION)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Backend(format!(
                "blob listing returned {status}: {body}"
            )));
        }

        let body = resp.text().await?;
        parse_blob_listing(&body)
    }

    /// Delete a blob and its snapshots. Returns `false` when the blob (or the
    /// whole container) does not exist so the caller can map it to not-found.
    pub async fn delete(&self, blob_name: &str) -> Result<bool, GatewayError> {
        let url = self.blob_url(blob_name);

        let date = rfc1123_now();
        let ms_headers = vec![
            ("x-ms-date".to_string(), date.clone()),
            ("x-ms-delete-snapshots".to_string(), "include".to_string()),
            ("x-ms-version".to_string(), STORAGE_API_VERSION.to_string()),
        ];
        let auth = self.authorization(
            "DELETE",
            "",
            0,
            &ms_headers,
            &self.blob_resource(blob_name),
            &[],
        )?;

        let resp = self
            .client
            .delete(&url)
            .header("Authorization", auth)
            .header("x-ms-date", date)
            .header("x-ms-delete-snapshots", "include")
            .header("x-ms-version", STORAGE_API_VERSION)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Backend(format!(
                "blob delete returned {status}: {body}"
            )));
        }

        tracing::info!("Deleted blob {blob_name}");
        Ok(true)
    }

    /// Create the container if it is missing. An already-exists conflict is
    /// success for our purposes.
    async fn ensure_container(&self) -> Result<(), GatewayError> {
        let url = format!("{}/{}?restype=container", self.endpoint, self.container);

        let date = rfc1123_now();
        let ms_headers = vec![
            ("x-ms-date".to_string(), date.clone()),
            ("x-ms-version".to_string(), STORAGE_API_VERSION.to_string()),
        ];
        let auth = self.authorization(
            "PUT",
            "",
            0,
            &ms_headers,
            &self.container_resource(),
            &[("restype", "container")],
        )?;

        let resp = self
            .client
            .put(&url)
            .header("Authorization", auth)
            .header("x-ms-date", date)
            .header("x-ms-version", STORAGE_API_VERSION)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::CONFLICT || resp.status().is_success() {
            return Ok(());
        }

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(GatewayError::Backend(format!(
            "container create returned {status}: {body}"
        )))
    }

    fn blob_url(&self, blob_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint,
            self.container,
            urlencoding::encode(blob_name)
        )
    }

    fn container_resource(&self) -> String {
        format!("/{}/{}", self.account, self.container)
    }

    fn blob_resource(&self, blob_name: &str) -> String {
        format!(
            "/{}/{}/{}",
            self.account,
            self.container,
            urlencoding::encode(blob_name)
        )
    }

    fn authorization(
        &self,
        method: &str,
        content_type: &str,
        content_length: u64,
        ms_headers: &[(String, String)],
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<String, GatewayError> {
        let to_sign = string_to_sign(
            method,
            content_type,
            content_length,
            ms_headers,
            resource,
            query,
        );
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| GatewayError::Configuration(format!("storage key rejected: {e}")))?;
        mac.update(to_sign.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());
        Ok(format!("SharedKey {}:{}", self.account, signature))
    }
}

/// Assemble the SharedKey string-to-sign. Only the headers this gateway
/// actually sends participate; the unused standard header slots stay empty.
/// A zero content length is an empty field, per the 2015-02-21+ contract.
fn string_to_sign(
    method: &str,
    content_type: &str,
    content_length: u64,
    ms_headers: &[(String, String)],
    resource: &str,
    query: &[(&str, &str)],
) -> String {
    let length_field = if content_length == 0 {
        String::new()
    } else {
        content_length.to_string()
    };

    let mut sorted: Vec<&(String, String)> = ms_headers.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let canonical_headers: String = sorted
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();

    let mut canonical_resource = resource.to_string();
    for (name, value) in query {
        canonical_resource.push_str(&format!("\n{name}:{value}"));
    }

    format!(
        "{method}\n\n\n{length_field}\n\n{content_type}\n\n\n\n\n\n\n{canonical_headers}{canonical_resource}"
    )
}

/// `{random_hex}-{basename}`: the random prefix guarantees two uploads of the
/// same file get distinct identities; the basename keeps listings readable.
fn generate_blob_name(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("file");
    format!("{}-{}", Uuid::new_v4().simple(), base)
}

fn rfc1123_now() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

// ─── Listing XML ─────────────────────────────────────────

#[derive(Deserialize)]
struct EnumerationResults {
    #[serde(rename = "Blobs")]
    blobs: Option<BlobList>,
}

#[derive(Deserialize)]
struct BlobList {
    #[serde(rename = "Blob", default)]
    blobs: Vec<BlobEntry>,
}

#[derive(Deserialize)]
struct BlobEntry {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Properties")]
    properties: BlobProperties,
}

#[derive(Deserialize, Default)]
struct BlobProperties {
    #[serde(rename = "Content-Length", default)]
    content_length: Option<u64>,
    #[serde(rename = "Content-Type", default)]
    content_type: Option<String>,
    #[serde(rename = "Creation-Time", default)]
    creation_time: Option<String>,
}

fn parse_blob_listing(xml: &str) -> Result<Vec<StoredDocument>, GatewayError> {
    let listing: EnumerationResults = quick_xml::de::from_str(xml)
        .map_err(|e| GatewayError::Backend(format!("unreadable blob listing: {e}")))?;

    let entries = listing.blobs.map(|b| b.blobs).unwrap_or_default();
    Ok(entries
        .into_iter()
        .map(|entry| StoredDocument {
            name: entry.name,
            size_bytes: entry.properties.content_length.unwrap_or(0),
            format: entry
                .properties
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            uploaded_on: entry
                .properties
                .creation_time
                .as_deref()
                .and_then(parse_rfc1123),
        })
        .collect())
}

fn parse_rfc1123(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ─── Connection string ───────────────────────────────────

#[derive(Debug)]
struct ConnectionString {
    account_name: String,
    account_key: String,
    endpoint: String,
}

impl ConnectionString {
    /// Parse the semicolon-separated `Key=Value` form. `AccountName` and
    /// `AccountKey` are required; the endpoint is either an explicit
    /// `BlobEndpoint` or derived from the protocol and suffix.
    fn parse(raw: &str) -> Result<Self, GatewayError> {
        let mut account_name = None;
        let mut account_key = None;
        let mut blob_endpoint = None;
        let mut protocol = "https".to_string();
        let mut suffix = "core.windows.net".to_string();

        for part in raw.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            match key {
                "AccountName" => account_name = Some(value.to_string()),
                // Account keys are base64 and may themselves contain '='
                "AccountKey" => account_key = Some(part["AccountKey=".len()..].to_string()),
                "BlobEndpoint" => blob_endpoint = Some(value.trim_end_matches('/').to_string()),
                "DefaultEndpointsProtocol" => protocol = value.to_string(),
                "EndpointSuffix" => suffix = value.to_string(),
                _ => {}
            }
        }

        let account_name = account_name.ok_or_else(|| {
            GatewayError::Configuration("connection string is missing AccountName".to_string())
        })?;
        let account_key = account_key.ok_or_else(|| {
            GatewayError::Configuration("connection string is missing AccountKey".to_string())
        })?;
        let endpoint = blob_endpoint
            .unwrap_or_else(|| format!("{protocol}://{account_name}.blob.{suffix}"));

        Ok(Self {
            account_name,
            account_key,
            endpoint,
        })
    }
}
