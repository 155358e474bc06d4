//! InfluxDB 1.x HTTP 写入实现
//!
//! - `connect`：解析并校验地址，构造 HTTP 客户端（不发起网络请求）
//! - `write`：`POST {address}/write?db={db}&precision={p}`，Basic 认证，Line Protocol 请求体

use crate::error::SinkError;
use crate::line_protocol::BatchPoints;
use crate::traits::{SinkClient, SinkConnector};
use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

/// InfluxDB 连接器。
#[derive(Debug, Clone)]
pub struct InfluxConnector {
    address: String,
    username: String,
    password: String,
}

impl InfluxConnector {
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// 同步建立客户端（`SinkConnector::connect` 的实现体）
    pub fn open(&self) -> Result<InfluxClient, SinkError> {
        let invalid = |reason: String| SinkError::InvalidAddress {
            address: self.address.clone(),
            reason,
        };
        let mut base = Url::parse(&self.address).map_err(|err| invalid(err.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme `{}`", base.scheme())));
        }
        if base.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let write_url = base.join("write").map_err(|err| invalid(err.to_string()))?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| SinkError::Client(err.to_string()))?;
        Ok(InfluxClient {
            client,
            write_url,
            username: self.username.clone(),
            password: self.password.clone(),
        })
    }
}

#[async_trait]
impl SinkConnector for InfluxConnector {
    async fn connect(&self) -> Result<Box<dyn SinkClient>, SinkError> {
        Ok(Box::new(self.open()?))
    }
}

/// InfluxDB HTTP 客户端。
#[derive(Debug, Clone)]
pub struct InfluxClient {
    client: reqwest::Client,
    write_url: Url,
    username: String,
    password: String,
}

impl InfluxClient {
    pub fn write_url(&self) -> &Url {
        &self.write_url
    }
}

#[async_trait]
impl SinkClient for InfluxClient {
    async fn write(&self, batch: &BatchPoints) -> Result<(), SinkError> {
        if batch.is_empty() {
            debug!(target: "gaf.sink", database = %batch.database(), "empty_batch_not_sent");
            return Ok(());
        }
        let response = self
            .client
            .post(self.write_url.clone())
            .query(&[
                ("db", batch.database()),
                ("precision", batch.precision().as_str()),
            ])
            .basic_auth(&self.username, Some(&self.password))
            .body(batch.body())
            .send()
            .await
            .map_err(|err| SinkError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(SinkError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
