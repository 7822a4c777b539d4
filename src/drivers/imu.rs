// LeGuardian Bracelet - LSM6DS3 IMU Driver
//
// Register-level driver over I2C. The bus only carries this sensor, so the
// driver owns it outright.

use esp_idf_hal::i2c::I2cDriver;

use crate::capabilities::MotionSensor;
use crate::config::*;
use crate::error::SensorUnavailable;
use crate::events::{MotionReading, Vector3};

// LSM6DS3 register addresses
const REG_WHO_AM_I: u8 = 0x0F;
const REG_CTRL1_XL: u8 = 0x10;
const REG_CTRL2_G: u8 = 0x11;
const REG_CTRL3_C: u8 = 0x12;
const REG_OUT_TEMP_L: u8 = 0x20; // Start of 14-byte temp/gyro/accel burst
const WHO_AM_I_EXPECTED: [u8; 2] = [0x69, 0x6A]; // LSM6DS3, LSM6DS3TR-C

// 104 Hz, ±4 g / 104 Hz, ±2000 °/s
const CTRL1_XL_104HZ_4G: u8 = 0x48;
const CTRL2_G_104HZ_2000DPS: u8 = 0x4C;
const CTRL3_C_BDU_IF_INC: u8 = 0x44;

const ACCEL_SCALE_4G: f32 = 0.122e-3 * 9.806_65; // m/s² per LSB
const GYRO_SCALE_2000: f32 = 70.0e-3;            // °/s per LSB
const TEMP_LSB_PER_C: f32 = 16.0;
const TEMP_OFFSET_C: f32 = 25.0;

pub struct Lsm6ds3<'d> {
    bus: I2cDriver<'d>,
    ready: bool,
}

impl<'d> Lsm6ds3<'d> {
    pub fn new(bus: I2cDriver<'d>) -> Self {
        Self { bus, ready: false }
    }

    /// Verify the device is reachable on the I2C bus.
    pub fn is_connected(&mut self) -> bool {
        let mut buf = [0u8; 1];
        match self
            .bus
            .write_read(I2C_ADDR_LSM6DS3, &[REG_WHO_AM_I], &mut buf, I2C_TIMEOUT_TICKS)
        {
            Ok(()) => WHO_AM_I_EXPECTED.contains(&buf[0]),
            Err(_) => false,
        }
    }

    /// Configure accel (±4 g), gyro (±2000 °/s), block data update.
    pub fn init(&mut self) -> anyhow::Result<()> {
        self.bus
            .write(I2C_ADDR_LSM6DS3, &[REG_CTRL3_C, CTRL3_C_BDU_IF_INC], I2C_TIMEOUT_TICKS)?;
        self.bus
            .write(I2C_ADDR_LSM6DS3, &[REG_CTRL1_XL, CTRL1_XL_104HZ_4G], I2C_TIMEOUT_TICKS)?;
        self.bus
            .write(I2C_ADDR_LSM6DS3, &[REG_CTRL2_G, CTRL2_G_104HZ_2000DPS], I2C_TIMEOUT_TICKS)?;

        log::info!("LSM6DS3 initialised (±4g, ±2000°/s, 104Hz)");
        Ok(())
    }

    /// Burst-read temperature and all 6 axes, converted to physical units.
    pub fn read_data(&mut self) -> anyhow::Result<MotionReading> {
        let mut raw = [0u8; 14];
        self.bus
            .write_read(I2C_ADDR_LSM6DS3, &[REG_OUT_TEMP_L], &mut raw, I2C_TIMEOUT_TICKS)?;

        let word = |i: usize| i16::from_le_bytes([raw[i], raw[i + 1]]) as f32;
        Ok(MotionReading {
            temperature_c: word(0) / TEMP_LSB_PER_C + TEMP_OFFSET_C,
            gyro: Vector3 {
                x: word(2) * GYRO_SCALE_2000,
                y: word(4) * GYRO_SCALE_2000,
                z: word(6) * GYRO_SCALE_2000,
            },
            accel: Vector3 {
                x: word(8) * ACCEL_SCALE_4G,
                y: word(10) * ACCEL_SCALE_4G,
                z: word(12) * ACCEL_SCALE_4G,
            },
        })
    }
}

impl MotionSensor for Lsm6ds3<'_> {
    fn is_available(&mut self) -> bool {
        if !self.ready && self.is_connected() {
            match self.init() {
                Ok(()) => self.ready = true,
                Err(e) => log::error!("LSM6DS3 init failed: {e:#}"),
            }
        }
        self.ready
    }

    fn read(&mut self) -> Result<MotionReading, SensorUnavailable> {
        if !self.ready {
            return Err(SensorUnavailable::MotionSensorAbsent);
        }
        self.read_data().map_err(|e| {
            log::warn!("IMU read error: {e:#}");
            SensorUnavailable::MotionReadFailed
        })
    }
}
