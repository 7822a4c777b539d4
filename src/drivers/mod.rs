pub mod button;
pub mod haptic;
pub mod imu;
pub mod led;
pub mod modem;
pub mod storage;
