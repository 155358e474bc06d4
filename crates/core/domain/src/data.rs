use std::collections::BTreeMap;

/// 事件源返回的原始事件。
///
/// 上游记录可能缺失任意字段，因此全部为 `Option`；
/// 必填字段（`kind`、`repo_name`、`actor_login`）由映射阶段逐条校验。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEvent {
    pub id: Option<String>,
    /// 事件类型，例如 `PushEvent`。
    pub kind: Option<String>,
    pub repo_name: Option<String>,
    pub actor_login: Option<String>,
    pub created_at: Option<String>,
}

impl RawEvent {
    /// 构造三个必填字段齐全的事件。
    pub fn new(
        kind: impl Into<String>,
        repo_name: impl Into<String>,
        actor_login: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            kind: Some(kind.into()),
            repo_name: Some(repo_name.into()),
            actor_login: Some(actor_login.into()),
            created_at: None,
        }
    }
}

/// 字段值类型（对应 Line Protocol 的四种字段类型）。
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

/// 时序点位：measurement + tags + fields + 秒级时间戳。
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub timestamp_s: i64,
}

impl Point {
    pub fn new(measurement: impl Into<String>, timestamp_s: i64) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp_s,
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
}
