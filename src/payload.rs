// LeGuardian Bracelet - Telemetry Payload
//
// JSON document sent on heartbeat and danger updates. The receiver accepts
// three timestamp shapes: ISO-8601 from the network clock, ISO-8601 rebuilt
// from the GPS date/time, or bare uptime seconds.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::events::{GpsData, ImuData, NetworkInfo, TelemetrySample, Vector3};

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
    NetworkClock,
    Gps,
    Uptime,
}

/// Pick the best timestamp available, in order of trust.
pub fn resolve_timestamp(
    network_time: Option<NaiveDateTime>,
    gps: &GpsData,
    uptime_secs: u64,
) -> (String, TimestampSource) {
    if let Some(utc) = network_time {
        return (utc.format(ISO_FORMAT).to_string(), TimestampSource::NetworkClock);
    }
    if let Some(utc) = gps_datetime(&gps.date_text, &gps.time_text) {
        return (utc.format(ISO_FORMAT).to_string(), TimestampSource::Gps);
    }
    (uptime_secs.to_string(), TimestampSource::Uptime)
}

/// GNSS `DDMMYY` + `hhmmss[.ss]` (already UTC).
pub fn gps_datetime(date: &str, time: &str) -> Option<NaiveDateTime> {
    if date.len() != 6 || time.len() < 6 || !date.is_ascii() || !time.is_ascii() {
        return None;
    }
    let day: u32 = date[0..2].parse().ok()?;
    let month: u32 = date[2..4].parse().ok()?;
    let year: i32 = date[4..6].parse().ok()?;
    let hour: u32 = time[0..2].parse().ok()?;
    let minute: u32 = time[2..4].parse().ok()?;
    let second: u32 = time[4..6].parse().ok()?;

    let date = NaiveDate::from_ymd_opt(2000 + year, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;
    Some(NaiveDateTime::new(date, time))
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

#[derive(Serialize)]
struct Axes {
    x: f64,
    y: f64,
    z: f64,
}

impl Axes {
    fn from_vector(v: Vector3) -> Self {
        Self {
            x: round_to(v.x as f64, 4),
            y: round_to(v.y as f64, 4),
            z: round_to(v.z as f64, 4),
        }
    }
}

#[derive(Serialize)]
struct GpsDoc<'a> {
    latitude: f64,
    longitude: f64,
    altitude: f64,
    satellites: u8,
    date: &'a str,
    time: &'a str,
}

#[derive(Serialize)]
struct NetworkDoc<'a> {
    signal_quality: u8,
    rsrp: &'a str,
    rsrq: &'a str,
    network_type: &'a str,
}

#[derive(Serialize)]
struct ImuDoc {
    accel: Axes,
    gyro: Axes,
    temperature: f64,
}

#[derive(Serialize)]
struct Payload<'a> {
    timestamp: &'a str,
    emergency_mode: bool,
    // Top-level copies read by the service's geofencing.
    #[serde(skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
    gps: GpsDoc<'a>,
    network: NetworkDoc<'a>,
    imu: Option<ImuDoc>,
}

impl<'a> GpsDoc<'a> {
    fn new(gps: &'a GpsData) -> Self {
        Self {
            latitude: round_to(gps.latitude, 6),
            longitude: round_to(gps.longitude, 6),
            altitude: round_to(gps.altitude_m, 2),
            satellites: gps.satellites,
            date: &gps.date_text,
            time: &gps.time_text,
        }
    }
}

impl<'a> NetworkDoc<'a> {
    fn new(network: &'a NetworkInfo) -> Self {
        Self {
            signal_quality: network.signal_quality,
            rsrp: &network.rsrp,
            rsrq: &network.rsrq,
            network_type: &network.network_type,
        }
    }
}

impl ImuDoc {
    fn new(imu: &ImuData) -> Option<Self> {
        imu.available.then(|| Self {
            accel: Axes::from_vector(imu.reading.accel),
            gyro: Axes::from_vector(imu.reading.gyro),
            temperature: round_to(imu.reading.temperature_c as f64, 2),
        })
    }
}

/// Serialize one sample with the current mode flag.
pub fn build_payload(
    sample: &TelemetrySample,
    emergency_mode: bool,
    timestamp: &str,
) -> Result<String, serde_json::Error> {
    let gps = GpsDoc::new(&sample.gps);
    let located = sample.gps.has_fix();

    serde_json::to_string(&Payload {
        timestamp,
        emergency_mode,
        latitude: located.then_some(gps.latitude),
        longitude: located.then_some(gps.longitude),
        gps,
        network: NetworkDoc::new(&sample.network),
        imu: ImuDoc::new(&sample.imu),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::events::MotionReading;

    fn located_sample() -> TelemetrySample {
        TelemetrySample {
            gps: GpsData {
                latitude: 48.852_056_67,
                longitude: -2.390_945_123,
                altitude_m: 123.456,
                satellites: 8,
                date_text: "251224".into(),
                time_text: "120000.00".into(),
            },
            network: NetworkInfo {
                signal_quality: 23,
                network_type: "4G".into(),
                ..NetworkInfo::default()
            },
            imu: ImuData {
                reading: MotionReading {
                    accel: Vector3 { x: 0.123_456, y: -9.806_65, z: 0.0 },
                    gyro: Vector3 { x: 1.5, y: -0.000_06, z: 250.0 },
                    temperature_c: 31.256,
                },
                available: true,
            },
        }
    }

    fn parse(json: &str) -> Value {
        serde_json::from_str(json).unwrap()
    }

    fn assert_close(value: &Value, expected: f64) {
        let actual = value.as_f64().unwrap_or(f64::NAN);
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn unavailable_imu_serializes_as_null() {
        let mut sample = located_sample();
        sample.imu.available = false;
        let json = build_payload(&sample, false, "2024-12-25T12:00:00Z").unwrap();

        assert!(json.contains("\"imu\":null"), "{json}");
        assert!(!json.contains("accel"));
        assert!(!json.contains("gyro"));
        assert!(!json.contains("temperature"));
    }

    #[test]
    fn precision_per_field() {
        let doc = parse(&build_payload(&located_sample(), true, "t").unwrap());

        assert_eq!(doc["emergency_mode"], Value::Bool(true));
        // Exact ddmm.mmmm conversion; 48.853957 / 2.390745 quoted for the same
        // reply elsewhere do not follow from its fields.
        assert_close(&doc["gps"]["latitude"], 48.852057);
        assert_close(&doc["gps"]["longitude"], -2.390945);
        assert_close(&doc["gps"]["altitude"], 123.46);
        assert_eq!(doc["gps"]["satellites"].as_u64(), Some(8));
        assert_close(&doc["imu"]["accel"]["x"], 0.1235);
        assert_close(&doc["imu"]["accel"]["y"], -9.8067);
        assert_close(&doc["imu"]["gyro"]["y"], -0.0001);
        assert_close(&doc["imu"]["temperature"], 31.26);
        assert_eq!(doc["latitude"], doc["gps"]["latitude"]);
    }

    #[test]
    fn network_placeholders_stay_empty() {
        let doc = parse(&build_payload(&located_sample(), false, "t").unwrap());
        assert_eq!(doc["network"]["signal_quality"].as_u64(), Some(23));
        assert_eq!(doc["network"]["rsrp"], "");
        assert_eq!(doc["network"]["rsrq"], "");
        assert_eq!(doc["network"]["network_type"], "4G");
    }

    #[test]
    fn no_fix_omits_top_level_location() {
        let doc = parse(&build_payload(&TelemetrySample::default(), false, "t").unwrap());
        assert!(doc.get("latitude").is_none());
        assert!(doc.get("longitude").is_none());
        assert_eq!(doc["gps"]["satellites"].as_u64(), Some(0));
        assert_eq!(doc["gps"]["date"], "");
    }

    #[test]
    fn timestamp_prefers_network_clock() {
        let gps = located_sample().gps;
        let clock = gps_datetime("010125", "083000").unwrap();
        let (ts, source) = resolve_timestamp(Some(clock), &gps, 99);
        assert_eq!(ts, "2025-01-01T08:30:00Z");
        assert_eq!(source, TimestampSource::NetworkClock);
    }

    #[test]
    fn timestamp_falls_back_to_gps_then_uptime() {
        let gps = located_sample().gps;
        let (ts, source) = resolve_timestamp(None, &gps, 99);
        assert_eq!(ts, "2024-12-25T12:00:00Z");
        assert_eq!(source, TimestampSource::Gps);

        let (ts, source) = resolve_timestamp(None, &GpsData::default(), 99);
        assert_eq!(ts, "99");
        assert_eq!(source, TimestampSource::Uptime);
    }

    #[test]
    fn gps_datetime_rejects_bad_fields() {
        assert_eq!(gps_datetime("", ""), None);
        assert_eq!(gps_datetime("321224", "120000"), None);
        assert_eq!(gps_datetime("251224", "126100"), None);
        assert_eq!(gps_datetime("25122", "120000"), None);
    }
}
