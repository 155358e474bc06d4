//! 应用运行配置加载。
//!
//! 所有选项都有默认值：缺失、为空或无法解析的环境变量一律回退到默认值，
//! 因此加载过程没有错误路径。

use std::env;
use std::time::Duration;

pub const DEFAULT_LISTEN_PORT: &str = "9393";
pub const DEFAULT_TARGET_ORG: &str = "dcos";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_SINK_DATABASE: &str = "githuborgs";
pub const DEFAULT_SINK_ADDRESS: &str = "http://influxdb.marathon.l4lb.thisdcos.directory:8086";
/// 仅用于本地开发的默认凭据。
pub const DEFAULT_SINK_USERNAME: &str = "root";
pub const DEFAULT_SINK_PASSWORD: &str = "root";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// 时序存储连接配置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    pub address: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

/// 应用运行配置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub listen_port: String,
    pub http_addr: String,
    pub target_org: String,
    pub poll_interval: Duration,
    pub sink: SinkConfig,
    pub github_api_url: String,
    pub github_token: Option<String>,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源读取配置（测试时避免修改进程环境）。
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let listen_port = read("PORT0").unwrap_or_else(|| DEFAULT_LISTEN_PORT.to_string());
        let http_addr = format!("0.0.0.0:{}", listen_port);
        let target_org = read("GITHUB_TARGET_ORG").unwrap_or_else(|| DEFAULT_TARGET_ORG.to_string());
        let poll_interval = Duration::from_secs(
            read("FETCH_WAIT_SEC")
                .and_then(|value| parse_positive_secs(&value))
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
        );
        let sink = SinkConfig {
            address: read("INFLUX_API").unwrap_or_else(|| DEFAULT_SINK_ADDRESS.to_string()),
            database: read("INFLUX_TARGET_DB")
                .unwrap_or_else(|| DEFAULT_SINK_DATABASE.to_string()),
            username: read("INFLUX_USERNAME")
                .unwrap_or_else(|| DEFAULT_SINK_USERNAME.to_string()),
            password: read("INFLUX_PASSWORD")
                .unwrap_or_else(|| DEFAULT_SINK_PASSWORD.to_string()),
        };
        let github_api_url = read("GITHUB_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string());
        let github_token = read("GITHUB_TOKEN");

        Self {
            listen_port,
            http_addr,
            target_org,
            poll_interval,
            sink,
            github_api_url,
            github_token,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// 休眠间隔必须为正整数秒，其余情况返回 None。
fn parse_positive_secs(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|secs| *secs > 0)
}
