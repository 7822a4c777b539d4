// LeGuardian Bracelet - Modem Reply Parsing
//
// Comma-separated AT replies are split into a fixed-capacity field list and
// read through bounds-checked accessors.

use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, NaiveDateTime, NaiveTime};
use heapless::Vec;

pub const MAX_FIELDS: usize = 20;
/// `+CGNSSINFO` carries position, date, time and altitude in the first 12.
pub const MIN_FIX_FIELDS: usize = 12;

/// Ordered fields of one reply line. Anything past `MAX_FIELDS` is dropped.
#[derive(Debug)]
pub struct Fields<'a> {
    fields: Vec<&'a str, MAX_FIELDS>,
}

impl<'a> Fields<'a> {
    pub fn tokenize(line: &'a str) -> Self {
        let mut fields = Vec::new();
        for field in line.trim().split(',') {
            if fields.push(field.trim()).is_err() {
                break;
            }
        }
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a str> {
        self.fields.get(index).copied()
    }

    /// The field at `index`, or `None` when it is missing or blank.
    pub fn non_empty(&self, index: usize) -> Option<&'a str> {
        self.get(index).filter(|f| !f.is_empty())
    }
}

/// Strip an echoed `+TAG:` prefix from a reply line.
pub fn strip_tag<'a>(line: &'a str, tag: &str) -> &'a str {
    let line = line.trim();
    match line.strip_prefix(tag) {
        Some(rest) => rest.strip_prefix(':').unwrap_or(rest).trim(),
        None => line,
    }
}

// ---------------------------------------------------------------------------
// GNSS
// ---------------------------------------------------------------------------

/// A valid position solution decoded from `+CGNSSINFO`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_text: String,
    pub satellites: u8,
    pub date_text: String,
    pub time_text: String,
}

impl ParsedFix {
    pub fn altitude_m(&self) -> f64 {
        self.altitude_text.parse().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GnssReply {
    Fix(ParsedFix),
    NoFix,
}

/// Decode `mode,sats,..,..,..,lat,N/S,lon,E/W,DDMMYY,hhmmss.ss,alt,...`.
///
/// Coordinates arrive as NMEA `ddmm.mmmm` / `dddmm.mmmm` and are converted to
/// signed decimal degrees.
pub fn parse_gnss_info(reply: &str) -> GnssReply {
    let body = strip_tag(reply, "+CGNSSINFO");
    let fields = Fields::tokenize(body);
    if fields.len() < MIN_FIX_FIELDS {
        return GnssReply::NoFix;
    }

    let (Some(lat), Some(lon)) = (fields.non_empty(5), fields.non_empty(7)) else {
        return GnssReply::NoFix;
    };
    let (Some(mut latitude), Some(mut longitude)) = (nmea_to_degrees(lat), nmea_to_degrees(lon))
    else {
        return GnssReply::NoFix;
    };

    if fields.get(6) == Some("S") {
        latitude = -latitude;
    }
    if fields.get(8) == Some("W") {
        longitude = -longitude;
    }

    GnssReply::Fix(ParsedFix {
        latitude,
        longitude,
        altitude_text: fields.get(11).unwrap_or_default().to_string(),
        satellites: fields.get(1).and_then(|s| s.parse().ok()).unwrap_or(0),
        date_text: fields.get(9).unwrap_or_default().to_string(),
        time_text: fields.get(10).unwrap_or_default().to_string(),
    })
}

fn nmea_to_degrees(text: &str) -> Option<f64> {
    let raw: f64 = text.parse().ok()?;
    if !raw.is_finite() || raw < 0.0 {
        return None;
    }
    let degrees = (raw / 100.0).trunc();
    let minutes = raw - degrees * 100.0;
    Some(degrees + minutes / 60.0)
}

// ---------------------------------------------------------------------------
// Signal quality
// ---------------------------------------------------------------------------

/// `+CSQ: <rssi>,<ber>`; 99 ("not detectable") maps to 0.
pub fn parse_signal_quality(reply: &str) -> Option<u8> {
    let fields = Fields::tokenize(strip_tag(reply, "+CSQ"));
    let rssi: u8 = fields.non_empty(0)?.parse().ok()?;
    match rssi {
        0..=31 => Some(rssi),
        99 => Some(0),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Network clock
// ---------------------------------------------------------------------------

/// Modems report this epoch (or earlier) before the network has pushed time.
const CLOCK_MIN_YEAR: i32 = 2020;
const CLOCK_MAX_ZONE_QUARTERS: i64 = 96; // ±24 h

/// `+CCLK: "yy/MM/dd,hh:mm:ss±zz"` (local time, zone in quarter hours) to UTC.
pub fn parse_network_time(reply: &str) -> Option<NaiveDateTime> {
    let body = strip_tag(reply, "+CCLK").trim_matches('"');
    let (date, rest) = body.split_once(',')?;

    let mut date_parts = date.split('/');
    let yy: i32 = date_parts.next()?.parse().ok()?;
    let month: u32 = date_parts.next()?.parse().ok()?;
    let day: u32 = date_parts.next()?.parse().ok()?;
    let year = if yy >= 80 { 1900 + yy } else { 2000 + yy };
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    if date.year() < CLOCK_MIN_YEAR {
        return None;
    }

    let zone_at = rest.find(['+', '-']);
    let (time, zone) = match zone_at {
        Some(i) => rest.split_at(i),
        None => (rest, "+00"),
    };
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S").ok()?;
    let quarters: i64 = zone.parse().ok()?;
    if !(-CLOCK_MAX_ZONE_QUARTERS..=CLOCK_MAX_ZONE_QUARTERS).contains(&quarters) {
        return None;
    }

    let local = NaiveDateTime::new(date, time);
    local.checked_sub_signed(ChronoDuration::minutes(quarters * 15))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIX: &str = "1,8,,,,4851.1234,N,00223.4567,E,251224,120000.00,123.4,0.0,0.0,1.2";

    // Exact ddmm.mmmm conversion of the sample reply. The 48.853957 / 2.390745
    // figures quoted alongside this reply do not follow from its fields.
    #[test]
    fn fix_northern_eastern_hemisphere_is_positive() {
        let GnssReply::Fix(fix) = parse_gnss_info(FIX) else {
            panic!("expected a fix");
        };
        assert!((fix.latitude - 48.852057).abs() < 1e-5, "lat {}", fix.latitude);
        assert!((fix.longitude - 2.390945).abs() < 1e-5, "lon {}", fix.longitude);
        assert_eq!(fix.altitude_text, "123.4");
        assert_eq!(fix.altitude_m(), 123.4);
        assert_eq!(fix.satellites, 8);
        assert_eq!(fix.date_text, "251224");
        assert_eq!(fix.time_text, "120000.00");
    }

    #[test]
    fn southern_western_hemisphere_negates_both() {
        let reply = FIX.replace(",N,", ",S,").replace(",E,", ",W,");
        let GnssReply::Fix(fix) = parse_gnss_info(&reply) else {
            panic!("expected a fix");
        };
        assert!((fix.latitude + 48.852057).abs() < 1e-5);
        assert!((fix.longitude + 2.390945).abs() < 1e-5);
    }

    #[test]
    fn echoed_tag_is_ignored() {
        let reply = format!("+CGNSSINFO: {FIX}");
        assert!(matches!(parse_gnss_info(&reply), GnssReply::Fix(_)));
    }

    #[test]
    fn short_reply_is_no_fix() {
        let eleven = "1,8,,,,4851.1234,N,00223.4567,E,251224,120000.00";
        assert_eq!(parse_gnss_info(eleven), GnssReply::NoFix);
        assert_eq!(parse_gnss_info(",,,,,,,,,,,,,,,"), GnssReply::NoFix);
        assert_eq!(parse_gnss_info(""), GnssReply::NoFix);
    }

    #[test]
    fn garbage_coordinates_are_no_fix() {
        let reply = FIX.replace("4851.1234", "abc");
        assert_eq!(parse_gnss_info(&reply), GnssReply::NoFix);
    }

    #[test]
    fn tokenizer_caps_field_count() {
        let line = vec!["x"; MAX_FIELDS + 5].join(",");
        let fields = Fields::tokenize(&line);
        assert_eq!(fields.len(), MAX_FIELDS);
        assert_eq!(fields.get(MAX_FIELDS), None);
    }

    #[test]
    fn signal_quality_reply() {
        assert_eq!(parse_signal_quality("+CSQ: 23,99"), Some(23));
        assert_eq!(parse_signal_quality("+CSQ: 99,99"), Some(0));
        assert_eq!(parse_signal_quality("+CSQ: 42,0"), None);
        assert_eq!(parse_signal_quality("ERROR"), None);
    }

    #[test]
    fn network_time_converts_zone_to_utc() {
        let utc = parse_network_time("+CCLK: \"24/12/25,13:00:00+04\"").unwrap();
        assert_eq!(utc.to_string(), "2024-12-25 12:00:00");

        let utc = parse_network_time("\"24/12/25,01:30:00-08\"").unwrap();
        assert_eq!(utc.to_string(), "2024-12-25 03:30:00");
    }

    #[test]
    fn unsynchronised_clock_is_rejected() {
        assert_eq!(parse_network_time("+CCLK: \"80/01/06,00:00:12+00\""), None);
        assert_eq!(parse_network_time("+CCLK: \"04/01/01,00:00:12+00\""), None);
        assert_eq!(parse_network_time("+CCLK: garbage"), None);
    }

    #[test]
    fn out_of_range_zone_is_rejected() {
        assert_eq!(parse_network_time("+CCLK: \"24/12/25,12:00:00+99999999999\""), None);
        assert_eq!(parse_network_time("+CCLK: \"24/12/25,12:00:00-97\""), None);

        let utc = parse_network_time("+CCLK: \"24/12/25,12:00:00+96\"").unwrap();
        assert_eq!(utc.to_string(), "2024-12-24 12:00:00");
    }
}
