use async_trait::async_trait;
use domain::RawEvent;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::info;

/// 事件拉取错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("decode error: {0}")]
    Decode(String),
}

/// 组织事件源抽象。
///
/// 每次调用只做一次往返，不带分页游标，也不重试。
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch(&self, org: &str) -> Result<Vec<RawEvent>, IngestError>;
}

/// GitHub 事件源配置。
#[derive(Debug, Clone)]
pub struct GithubSourceConfig {
    pub api_url: String,
    pub token: Option<String>,
}

/// 基于 GitHub 公共 API 的事件源：`GET /orgs/{org}/events`。
#[derive(Debug, Clone)]
pub struct GithubEventSource {
    config: GithubSourceConfig,
    client: reqwest::Client,
}

impl GithubEventSource {
    pub fn new(config: GithubSourceConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &GithubSourceConfig {
        &self.config
    }

    fn events_url(&self, org: &str) -> String {
        format!(
            "{}/orgs/{}/events",
            self.config.api_url.trim_end_matches('/'),
            org
        )
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("gaf/", env!("CARGO_PKG_VERSION"))),
        );
        if let Some(token) = self.config.token.as_deref() {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }
}

#[async_trait]
impl EventSource for GithubEventSource {
    async fn fetch(&self, org: &str) -> Result<Vec<RawEvent>, IngestError> {
        info!(target: "gaf.ingest", func = "fetch", org = %org, "fetch_started");
        let response = self
            .client
            .get(self.events_url(org))
            .headers(self.headers())
            .send()
            .await
            .map_err(|err| IngestError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| IngestError::Transport(err.to_string()))?;
        let events = decode_events(&bytes)?;
        info!(target: "gaf.ingest", func = "fetch", org = %org, events = events.len(), "fetch_succeeded");
        Ok(events)
    }
}

/// GitHub 事件报文（只保留采集用到的字段）。
///
/// 每个字段独立宽松解码：类型不符的字段视为缺失，不连累同一记录的其它字段。
#[derive(Debug, Default, Deserialize)]
struct WireEvent {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    repo: Option<WireRepo>,
    #[serde(default, deserialize_with = "lenient_object")]
    actor: Option<WireActor>,
    #[serde(default, deserialize_with = "lenient_string")]
    created_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireRepo {
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireActor {
    #[serde(default, deserialize_with = "lenient_string")]
    login: Option<String>,
}

/// 仅接受 JSON 字符串，其余类型视为缺失。
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(value) => Some(value),
        _ => None,
    })
}

/// 嵌套对象形状不符时视为缺失。
fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl From<WireEvent> for RawEvent {
    fn from(wire: WireEvent) -> Self {
        RawEvent {
            id: wire.id,
            kind: wire.kind,
            repo_name: wire.repo.and_then(|repo| repo.name),
            actor_login: wire.actor.and_then(|actor| actor.login),
            created_at: wire.created_at,
        }
    }
}

/// 解码事件数组。
///
/// 字段类型不符只影响该字段；记录本身不是对象时降级为全空事件，由映射阶段跳过。
/// 只有整体不是数组才报错。
pub fn decode_events(body: &[u8]) -> Result<Vec<RawEvent>, IngestError> {
    let records: Vec<serde_json::Value> =
        serde_json::from_slice(body).map_err(|err| IngestError::Decode(err.to_string()))?;
    Ok(records
        .into_iter()
        .map(|record| {
            serde_json::from_value::<WireEvent>(record)
                .unwrap_or_default()
                .into()
        })
        .collect())
}
