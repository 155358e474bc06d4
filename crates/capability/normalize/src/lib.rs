//! RawEvent -> Point 映射。
//!
//! 纯转换，无 I/O。缺失必填字段的事件逐条跳过并记录，不影响同批其它事件。

use domain::{EVENT_MEASUREMENT, FieldValue, Point, RawEvent};
use gaf_telemetry::record_event_skipped;
use tracing::warn;

/// 映射错误（单条事件级别）。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error("event #{index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },
}

/// 一次映射的结果：成功的点位 + 被跳过的事件。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapOutput {
    pub points: Vec<Point>,
    pub skipped: Vec<MappingError>,
}

/// 以当前时间（秒）为时间戳映射整批事件。
pub fn map_events(events: Vec<RawEvent>) -> MapOutput {
    map_events_at(events, now_epoch_s())
}

/// 以指定时间戳映射整批事件。
pub fn map_events_at(events: Vec<RawEvent>, timestamp_s: i64) -> MapOutput {
    let mut output = MapOutput {
        points: Vec::with_capacity(events.len()),
        skipped: Vec::new(),
    };
    for (index, event) in events.into_iter().enumerate() {
        match map_event(index, event, timestamp_s) {
            Ok(point) => output.points.push(point),
            Err(err) => {
                record_event_skipped();
                warn!(target: "gaf.normalize", func = "map_events", error = %err, "event_skipped");
                output.skipped.push(err);
            }
        }
    }
    output
}

/// 映射单条事件：tags = {repo, action, actor}，fields = {count: 1}。
pub fn map_event(index: usize, event: RawEvent, timestamp_s: i64) -> Result<Point, MappingError> {
    let repo = required(index, "repo_name", event.repo_name)?;
    let action = required(index, "type", event.kind)?;
    let actor = required(index, "actor_login", event.actor_login)?;

    Ok(Point::new(EVENT_MEASUREMENT, timestamp_s)
        .tag("repo", repo)
        .tag("action", action)
        .tag("actor", actor)
        .field("count", FieldValue::Integer(1)))
}

fn required(
    index: usize,
    field: &'static str,
    value: Option<String>,
) -> Result<String, MappingError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(MappingError::MissingField { index, field }),
    }
}

fn now_epoch_s() -> i64 {
    let now = std::time::SystemTime::now();
    let duration = now
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_secs() as i64
}
