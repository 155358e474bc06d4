//! InfluxDB Line Protocol 批次。
//!
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp
//! ```
//!
//! tags 按 key 排序（`Point` 使用 `BTreeMap`），时间戳单位由 `Precision` 决定。

use crate::error::PointError;
use domain::{FieldValue, Point};

/// 时间戳精度（对应 `/write` 的 `precision` 参数）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    #[default]
    Seconds,
    Milliseconds,
    Nanoseconds,
}

impl Precision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Seconds => "s",
            Precision::Milliseconds => "ms",
            Precision::Nanoseconds => "ns",
        }
    }

    fn scale_seconds(&self, timestamp_s: i64) -> i64 {
        match self {
            Precision::Seconds => timestamp_s,
            Precision::Milliseconds => timestamp_s.saturating_mul(1_000),
            Precision::Nanoseconds => timestamp_s.saturating_mul(1_000_000_000),
        }
    }
}

/// 绑定到某个数据库的一批已编码点位。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPoints {
    database: String,
    precision: Precision,
    lines: Vec<String>,
}

impl BatchPoints {
    pub fn new(database: impl Into<String>, precision: Precision) -> Self {
        Self {
            database: database.into(),
            precision,
            lines: Vec::new(),
        }
    }

    /// 编码并追加一个点位；编码失败时批次保持不变。
    pub fn add_point(&mut self, point: &Point) -> Result<(), PointError> {
        let line = encode_point(point, self.precision)?;
        self.lines.push(line);
        Ok(())
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 请求体：每行一个点位。
    pub fn body(&self) -> String {
        self.lines.join("\n")
    }
}

/// 将点位编码为一行 Line Protocol。
pub fn encode_point(point: &Point, precision: Precision) -> Result<String, PointError> {
    if point.measurement.is_empty() {
        return Err(PointError::EmptyMeasurement);
    }
    ensure_single_line("measurement", &point.measurement)?;
    if point.fields.is_empty() {
        return Err(PointError::NoFields);
    }

    let mut line = escape_measurement(&point.measurement);

    for (key, value) in &point.tags {
        if key.is_empty() {
            return Err(PointError::EmptyTagKey);
        }
        if value.is_empty() {
            return Err(PointError::EmptyTagValue(key.clone()));
        }
        ensure_single_line(&format!("tag `{}`", key), key)?;
        ensure_single_line(&format!("tag `{}`", key), value)?;
        line.push(',');
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&escape_key(value));
    }

    line.push(' ');
    for (i, (key, value)) in point.fields.iter().enumerate() {
        if key.is_empty() {
            return Err(PointError::EmptyFieldKey);
        }
        ensure_single_line(&format!("field `{}`", key), key)?;
        if i > 0 {
            line.push(',');
        }
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&encode_field(key, value)?);
    }

    line.push(' ');
    line.push_str(&precision.scale_seconds(point.timestamp_s).to_string());
    Ok(line)
}

fn encode_field(key: &str, value: &FieldValue) -> Result<String, PointError> {
    Ok(match value {
        FieldValue::Integer(v) => format!("{}i", v),
        FieldValue::Float(v) => {
            if !v.is_finite() {
                return Err(PointError::NonFiniteField(key.to_string()));
            }
            format!("{}", v)
        }
        FieldValue::String(v) => {
            let escaped = v.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{}\"", escaped)
        }
        FieldValue::Boolean(v) => v.to_string(),
    })
}

fn ensure_single_line(what: &str, value: &str) -> Result<(), PointError> {
    if value.contains('\n') || value.contains('\r') {
        return Err(PointError::LineBreak(what.to_string()));
    }
    Ok(())
}

/// measurement 中逗号与空格需转义。
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// tag key/value 与 field key 中逗号、等号、空格需转义。
fn escape_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}
