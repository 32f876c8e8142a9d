// Proxmox VE API client: ticket auth, cluster resource listing, per-VM
// RRD series. Clusters run self-signed certificates by default, so
// verification is disabled.

use crate::models::{Aggregation, RrdRow, Timeframe, VmEntry};
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxmoxError {
    #[error("authentication rejected for {username} at {host}")]
    AuthFailed { host: String, username: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Every Proxmox response wraps its payload in a `data` field.
#[derive(Deserialize)]
struct ApiResponse<T> {
    data: T,
}

#[derive(Deserialize)]
struct TicketData {
    ticket: String,
}

#[derive(Debug)]
pub struct ProxmoxRepo {
    client: Client,
    base_url: String,
    ticket: String,
}

impl ProxmoxRepo {
    /// Authenticates against `host` (port 8006 unless the host carries one).
    pub async fn login(
        host: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, ProxmoxError> {
        let authority = if host.contains(':') {
            host.to_string()
        } else {
            format!("{host}:8006")
        };
        Self::login_with_base_url(&format!("https://{authority}/api2/json"), username, password)
            .await
    }

    /// Login against an explicit base URL (e.g. a plain-HTTP mock in tests).
    pub async fn login_with_base_url(
        base_url: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, ProxmoxError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;
        let url = format!("{base_url}/access/ticket");
        let resp = client
            .post(&url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(ProxmoxError::AuthFailed {
                host: base_url.to_string(),
                username: username.to_string(),
            });
        }
        if !resp.status().is_success() {
            return Err(ProxmoxError::Status {
                url,
                status: resp.status(),
            });
        }
        let body: ApiResponse<TicketData> =
            resp.json().await.map_err(|e| ProxmoxError::Malformed {
                url,
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            ticket: body.data.ticket,
        })
    }

    /// All cluster resource entries of type "vm", across every node.
    pub async fn list_vms(&self) -> Result<Vec<VmEntry>, ProxmoxError> {
        self.get_data("/cluster/resources", &[("type", "vm")]).await
    }

    /// Raw RRD rows for one VM over the given window.
    pub async fn rrddata(
        &self,
        node: &str,
        vmid: u32,
        timeframe: Timeframe,
        cf: Aggregation,
    ) -> Result<Vec<RrdRow>, ProxmoxError> {
        self.get_data(
            &format!("/nodes/{node}/qemu/{vmid}/rrddata"),
            &[("timeframe", timeframe.as_str()), ("cf", cf.as_str())],
        )
        .await
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProxmoxError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .header(header::COOKIE, format!("PVEAuthCookie={}", self.ticket))
            .query(query)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ProxmoxError::Status {
                url,
                status: resp.status(),
            });
        }
        let body: ApiResponse<T> = resp.json().await.map_err(|e| ProxmoxError::Malformed {
            url,
            reason: e.to_string(),
        })?;
        Ok(body.data)
    }
}
