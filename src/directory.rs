// Directory service client: lists sites and groups over HTTP.
// Every response is an envelope {"Code", "Message", "Data"}; success is Code == 200.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{info, instrument};

use crate::config::DirectoryConfig;
use crate::models::{Group, Site};
use crate::report::ReportKind;

const API_SUCCESS: i64 = 200;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("directory returned HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("directory rejected request: code={code}, message={message}")]
    Api { code: i64, message: String },
    #[error("directory returned no {0}")]
    Empty(&'static str),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SiteList {
    items: Option<Vec<SiteItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SiteItem {
    #[serde(default)]
    id: i64,
    name: String,
    #[serde(default)]
    chname: String,
    monitor: Option<Monitor>,
}

#[derive(Debug, Deserialize)]
struct Monitor {
    #[serde(rename = "Snmp_ip")]
    snmp_ip: Option<String>,
}

// Nil slices arrive as `null`, so list fields are optional on the wire.
#[derive(Debug, Deserialize)]
struct GroupItem {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Idc_name", default)]
    idc_name: String,
    #[serde(rename = "Rips")]
    rips: Option<Vec<String>>,
    #[serde(rename = "Vips")]
    vips: Option<Vec<String>>,
}

impl From<SiteItem> for Site {
    fn from(item: SiteItem) -> Self {
        let address = item
            .monitor
            .and_then(|m| m.snmp_ip)
            .filter(|ip| !ip.is_empty());
        Site {
            id: item.id,
            name: item.name,
            display_name: item.chname,
            address,
        }
    }
}

impl From<GroupItem> for Group {
    fn from(item: GroupItem) -> Self {
        Group {
            name: item.name,
            site_name: item.idc_name,
            members: item.rips.unwrap_or_default(),
            virtual_addresses: item.vips.unwrap_or_default(),
        }
    }
}

pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: String,
    sites_path: String,
    groups_path: String,
}

impl DirectoryClient {
    pub fn new(config: &DirectoryConfig) -> Result<Self, DirectoryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            sites_path: config.sites_path.clone(),
            groups_path: config.groups_path.clone(),
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, DirectoryError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DirectoryError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }
        let envelope: Envelope<T> = resp.json().await?;
        if envelope.code != API_SUCCESS {
            return Err(DirectoryError::Api {
                code: envelope.code,
                message: envelope.message,
            });
        }
        Ok(envelope.data)
    }

    #[instrument(skip(self), fields(operation = "list_sites"))]
    pub async fn list_sites(&self) -> Result<Vec<Site>, DirectoryError> {
        let items = self
            .fetch::<SiteList>(&self.sites_path)
            .await?
            .and_then(|list| list.items)
            .unwrap_or_default();
        if items.is_empty() {
            return Err(DirectoryError::Empty("sites"));
        }
        Ok(items.into_iter().map(Site::from).collect())
    }

    #[instrument(skip(self), fields(operation = "list_groups"))]
    pub async fn list_groups(&self) -> Result<Vec<Group>, DirectoryError> {
        let items = self
            .fetch::<Vec<GroupItem>>(&self.groups_path)
            .await?
            .unwrap_or_default();
        if items.is_empty() {
            return Err(DirectoryError::Empty("groups"));
        }
        Ok(items.into_iter().map(Group::from).collect())
    }
}

/// Sites and groups as plain in-memory lists, fetched once before any report runs.
#[derive(Debug, Clone, Default)]
pub struct DirectorySnapshot {
    pub sites: Vec<Site>,
    pub groups: Vec<Group>,
}

impl DirectorySnapshot {
    /// Fetches only what `kind` needs; an address-only report makes no requests.
    pub async fn fetch(client: &DirectoryClient, kind: ReportKind) -> Result<Self, DirectoryError> {
        let mut snapshot = Self::default();
        if kind.needs_sites() {
            snapshot.sites = client.list_sites().await?;
        }
        if kind.needs_groups() {
            snapshot.groups = client.list_groups().await?;
        }
        info!(
            sites = snapshot.sites.len(),
            groups = snapshot.groups.len(),
            "directory loaded"
        );
        Ok(snapshot)
    }
}
