// LeGuardian Bracelet - Telemetry Sample & Output Patterns

// ---------------------------------------------------------------------------
// Telemetry sample (replaced field-by-field on each collection)
// ---------------------------------------------------------------------------

/// Last known GNSS position. Empty date/time and zero satellites mean no fix
/// has been seen yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpsData {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
    pub satellites: u8,
    pub date_text: String,
    pub time_text: String,
}

impl GpsData {
    pub fn has_fix(&self) -> bool {
        !self.date_text.is_empty() || self.satellites > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkInfo {
    /// 0-31 CSQ scale as reported by the modem.
    pub signal_quality: u8,
    pub rsrp: String,
    pub rsrq: String,
    pub network_type: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One 6-axis reading plus die temperature.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionReading {
    /// m/s²
    pub accel: Vector3,
    /// deg/s
    pub gyro: Vector3,
    pub temperature_c: f32,
}

/// Motion block of the sample. When `available` is false the reading is
/// stale and must not be serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImuData {
    pub reading: MotionReading,
    pub available: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySample {
    pub gps: GpsData,
    pub network: NetworkInfo,
    pub imu: ImuData,
}

// ---------------------------------------------------------------------------
// Haptic patterns
// ---------------------------------------------------------------------------

/// On/off segments in milliseconds, starting with "on".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticPattern {
    /// Entering emergency mode: three short pulses.
    EnterEmergency,
    /// Leaving emergency mode: one long pulse.
    ExitEmergency,
    Short,
    Medium,
    Sos,
}

impl HapticPattern {
    pub fn segments(&self) -> &'static [u32] {
        match self {
            Self::EnterEmergency => &[150, 150, 150, 150, 150],
            Self::ExitEmergency => &[800],
            Self::Short => &[100],
            Self::Medium => &[200],
            Self::Sos => &[
                100, 100, 100, 100, 100, 300, // ...
                200, 100, 200, 100, 200, 300, // ---
                100, 100, 100, 100, 100, // ...
            ],
        }
    }

    pub fn pulse_count(&self) -> usize {
        self.segments().len().div_ceil(2)
    }
}

// ---------------------------------------------------------------------------
// Indicator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Primary,
    Secondary,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Primary, Channel::Secondary];

    pub const fn index(self) -> usize {
        match self {
            Channel::Primary => 0,
            Channel::Secondary => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicatorState {
    #[default]
    Off,
    Blinking,
    Normal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emergency_patterns_differ_by_direction() {
        assert_eq!(HapticPattern::EnterEmergency.pulse_count(), 3);
        assert_eq!(HapticPattern::ExitEmergency.pulse_count(), 1);
        assert!(
            HapticPattern::ExitEmergency.segments()[0] > HapticPattern::EnterEmergency.segments()[0]
        );
    }

    #[test]
    fn sos_has_nine_pulses() {
        assert_eq!(HapticPattern::Sos.pulse_count(), 9);
        let pulses: Vec<u32> = HapticPattern::Sos.segments().iter().step_by(2).copied().collect();
        assert_eq!(pulses, [100, 100, 100, 200, 200, 200, 100, 100, 100]);
    }

    #[test]
    fn fresh_sample_has_no_fix() {
        let sample = TelemetrySample::default();
        assert!(!sample.gps.has_fix());
        assert!(!sample.imu.available);
    }
}
