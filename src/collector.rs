// LeGuardian Bracelet - Telemetry Collector
//
// Refreshes the sample in place. A failed GPS read keeps the last known
// position so a payload sent right after losing the fix still carries it.
// RSRP/RSRQ are left as empty placeholders.

use crate::at_reply::{parse_gnss_info, GnssReply};
use crate::capabilities::{MotionSensor, Positioning, SignalMonitor};
use crate::config::NETWORK_TYPE;
use crate::error::SensorUnavailable;
use crate::events::{GpsData, TelemetrySample};

/// What changed during one collection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectionReport {
    pub gps_updated: bool,
    pub imu_updated: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct TelemetryCollector {
    imu_present: bool,
}

impl TelemetryCollector {
    /// Probe the motion sensor once; absence is final for this boot.
    pub fn probe<M: MotionSensor>(motion: &mut M) -> Self {
        let imu_present = motion.is_available();
        if !imu_present {
            log::warn!("Motion sensor unavailable, continuing without IMU data");
        }
        Self { imu_present }
    }

    pub fn imu_present(&self) -> bool {
        self.imu_present
    }

    /// GPS and signal quality both come from the cellular modem.
    pub fn collect<G, M>(&self, sample: &mut TelemetrySample, modem: &mut G, motion: &mut M) -> CollectionReport
    where
        G: Positioning + SignalMonitor,
        M: MotionSensor,
    {
        let mut report = CollectionReport::default();

        // ---- GPS ----
        match modem.gnss_info().map(|reply| parse_gnss_info(&reply)) {
            Ok(GnssReply::Fix(fix)) => {
                sample.gps = GpsData {
                    latitude: fix.latitude,
                    longitude: fix.longitude,
                    altitude_m: fix.altitude_m(),
                    satellites: fix.satellites,
                    date_text: fix.date_text,
                    time_text: fix.time_text,
                };
                report.gps_updated = true;
                log::debug!(
                    "GPS fix {:.6},{:.6} alt {:.1} m, {} sats",
                    sample.gps.latitude,
                    sample.gps.longitude,
                    sample.gps.altitude_m,
                    sample.gps.satellites
                );
            }
            Ok(GnssReply::NoFix) | Err(SensorUnavailable::NoFix) => {
                log::debug!("No GPS fix yet, keeping last known position");
            }
            Err(e) => log::warn!("GPS query failed: {e}"),
        }

        // ---- Network ----
        sample.network.signal_quality = modem.signal_quality();
        if sample.network.network_type.is_empty() {
            sample.network.network_type = NETWORK_TYPE.into();
        }

        // ---- Motion ----
        if !self.imu_present {
            sample.imu.available = false;
        } else {
            match motion.read() {
                Ok(reading) => {
                    sample.imu.reading = reading;
                    sample.imu.available = true;
                    report.imu_updated = true;
                }
                Err(e) => {
                    log::warn!("IMU read failed: {e}");
                    sample.imu.available = false;
                }
            }
        }

        report
    }
}
