//! Average road speed per weekday and hour of day.
//!
//! Inputs:
//! - travel times: `{edge_id, enter_time, leave_time}` with timestamps such as
//!   `20171020T112238.723000` (UTC, fractional seconds optional);
//! - edge geometry: `{edge_id, start: [lon, lat], end: [lon, lat]}`.
//!
//! Every traversal is split at clock-hour boundaries. Each piece carries the
//! share (`part`) of the edge travelled in it, so a traversal spanning two hours
//! contributes proportionally to both. The speed of a `(weekday, hour)` bucket
//! is total distance over total time, in km/h.

use crate::graph::{Graph, Input};
use crate::operator::JoinKind;
use crate::pipeline::Pipeline;
use crate::record;
use crate::record::Record;
use chrono::{Duration, NaiveDateTime, Timelike};
use tracing::warn;

const EARTH_RADIUS_KM: f64 = 6371.0;
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y%m%dT%H%M%S%.f", "%Y%m%dT%H%M%S"];

/// Great-circle distance between two `(lon, lat)` points, in kilometres.
#[must_use]
pub fn haversine_km(origin: (f64, f64), destination: (f64, f64)) -> f64 {
    let (lon1, lat1) = origin;
    let (lon2, lat2) = destination;
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Parse a compact ISO-8601 timestamp.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn point(record: &Record, field: &str) -> Option<(f64, f64)> {
    match record.get(field)?.as_list()? {
        [lon, lat] => Some((lon.as_f64()?, lat.as_f64()?)),
        _ => None,
    }
}

/// Map callback: `{edge_id, distance}` from an edge geometry record.
#[must_use]
pub fn edge_length(record: Record) -> Option<Record> {
    let (Some(start), Some(end)) = (point(&record, "start"), point(&record, "end")) else {
        warn!(edge_id = ?record.get("edge_id"), "edge without valid start/end, skipped");
        return None;
    };
    Some(record! {
        "edge_id" => record.get("edge_id").cloned().unwrap_or_default(),
        "distance" => haversine_km(start, end),
    })
}

#[allow(clippy::cast_precision_loss)]
fn hours(d: Duration) -> f64 {
    d.num_microseconds().map_or(0.0, |us| us as f64 / 3_600_000_000.0)
}

/// Map callback: split one traversal into `{edge_id, weekday, hour, part, time}`
/// pieces, one per clock hour it touches. `time` is the piece's duration in hours.
///
/// Traversals with unparsable or non-increasing timestamps are skipped.
#[must_use]
pub fn split_by_hour(record: Record) -> Vec<Record> {
    let enter = record.get_str("enter_time").and_then(parse_timestamp);
    let leave = record.get_str("leave_time").and_then(parse_timestamp);
    let (Some(enter), Some(leave)) = (enter, leave) else {
        warn!(edge_id = ?record.get("edge_id"), "travel record with bad timestamps, skipped");
        return Vec::new();
    };
    if leave <= enter {
        return Vec::new();
    }

    let edge_id = record.get("edge_id").cloned().unwrap_or_default();
    let total = hours(leave - enter);
    let mut pieces = Vec::new();
    let mut start = enter;
    while start < leave {
        let next_hour = start
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .map_or(leave, |t| t + Duration::hours(1));
        let end = next_hour.min(leave);
        let time = hours(end - start);
        pieces.push(record! {
            "edge_id" => edge_id.clone(),
            "weekday" => start.format("%a").to_string(),
            "hour" => i64::from(start.hour()),
            "part" => time / total,
            "time" => time,
        });
        start = end;
    }
    pieces
}

/// Reduce callback over one `(weekday, hour)` bucket: `{weekday, hour, speed}`.
#[must_use]
pub fn bucket_speed(group: Vec<Record>) -> Option<Record> {
    let first = group.first()?;
    let (distance, time) = group.iter().fold((0.0, 0.0), |(d, t), r| {
        let part = r.get_f64("part").unwrap_or(0.0);
        (
            d + r.get_f64("distance").unwrap_or(0.0) * part,
            t + r.get_f64("time").unwrap_or(0.0),
        )
    });
    (time > 0.0).then(|| {
        record! {
            "weekday" => first.get("weekday").cloned().unwrap_or_default(),
            "hour" => first.get("hour").cloned().unwrap_or_default(),
            "speed" => distance / time,
        }
    })
}

/// Build the average speed graph over travel `times` and edge `lengths`.
pub fn average_speed_graph(
    p: &Pipeline,
    times: impl Into<Input>,
    lengths: impl Into<Input>,
) -> Graph {
    let lengths = Graph::new(p, lengths).map(edge_length);
    Graph::new(p, times)
        .map(split_by_hour)
        .join(&lengths, "edge_id", JoinKind::Inner)
        .sort(["weekday", "hour"])
        .reduce(bucket_speed, ["weekday", "hour"])
}
