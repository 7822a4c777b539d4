// LeGuardian Bracelet - Firmware Entry Point
//
// Boot sequence:
//   1. Bring up logging, NVS and the peripherals.
//   2. Power the modem and enable GNSS.
//   3. Register with the service on first boot, probe the IMU, check
//      association.
//   4. Run the controller loop forever at LOOP_INTERVAL_MS.

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("bracelet firmware targets ESP-IDF; build with --target xtensa-esp32-espidf");
}

#[cfg(target_os = "espidf")]
mod firmware {
    use std::thread;
    use std::time::Duration;

    use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, IOPin, Output, OutputPin, PinDriver};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;
    use esp_idf_hal::uart::{self, UartDriver};
    use esp_idf_svc::nvs::EspDefaultNvsPartition;

    use bracelet::config::*;
    use bracelet::controller::{Controller, Peripherals as Board, Platform};
    use bracelet::drivers::button::Button;
    use bracelet::drivers::haptic::HapticDriver;
    use bracelet::drivers::imu::Lsm6ds3;
    use bracelet::drivers::led::LedPair;
    use bracelet::drivers::modem::Modem;
    use bracelet::drivers::storage::Storage;
    use bracelet::http::{HttpClient, TcpConnector};
    use bracelet::time::now_ms;

    struct Bracelet;

    impl Platform for Bracelet {
        type Button = Button<'static>;
        type Modem = Modem<'static>;
        type Motion = Lsm6ds3<'static>;
        type Haptic = HapticDriver<'static>;
        type Indicator = LedPair<'static>;
        type Store = Storage;
        type Connector = TcpConnector;
    }

    fn output(pin: AnyOutputPin) -> anyhow::Result<PinDriver<'static, AnyOutputPin, Output>> {
        let mut driver = PinDriver::output(pin)?;
        driver.set_low()?;
        Ok(driver)
    }

    pub fn run() -> anyhow::Result<()> {
        // Link esp-idf-sys runtime patches and initialise logging.
        esp_idf_svc::sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();
        log::info!("LeGuardian bracelet starting (device {DEVICE_ID})");

        let peripherals = Peripherals::take()?;
        let pins = peripherals.pins;

        // ---- Storage ------------------------------------------------------
        let store = Storage::open(EspDefaultNvsPartition::take().map_err(Into::into));

        // ---- Modem --------------------------------------------------------
        let uart_config = uart::config::Config::default().baudrate(Hertz(MODEM_BAUDRATE));
        let uart = UartDriver::new(
            peripherals.uart1,
            pins.gpio26, // TX
            pins.gpio27, // RX
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &uart_config,
        )?;
        let mut modem = Modem::new(
            uart,
            output(pins.gpio4.downgrade_output())?,  // PWRKEY
            output(pins.gpio12.downgrade_output())?, // POWER
            output(pins.gpio25.downgrade_output())?, // DTR
        );
        modem.power_on()?;
        if let Err(e) = modem.init() {
            // Keep running: GPS/CSQ reads will report unavailable.
            log::error!("Modem init failed: {e:#}");
        }

        // ---- I2C / IMU ----------------------------------------------------
        let i2c_config = I2cConfig::new().baudrate(400u32.kHz().into());
        let i2c = I2cDriver::new(
            peripherals.i2c0,
            pins.gpio21, // SDA
            pins.gpio22, // SCL
            &i2c_config,
        )?;

        let hw = Board::<Bracelet> {
            button: Button::new(pins.gpio0.downgrade())?,
            modem,
            motion: Lsm6ds3::new(i2c),
            haptic: HapticDriver::new(output(pins.gpio32.downgrade_output())?),
            indicator: LedPair::new(
                output(pins.gpio33.downgrade_output())?,
                output(pins.gpio14.downgrade_output())?,
            ),
            store,
        };
        let client = HttpClient::new(TcpConnector, ServerConfig::default());
        log::info!("Server {SERVER_HOST}:{SERVER_PORT}");

        let mut controller = Controller::new(hw, client, now_ms());
        controller.start(now_ms());

        let interval = Duration::from_millis(LOOP_INTERVAL_MS);
        loop {
            controller.tick(now_ms());
            thread::sleep(interval);
        }
    }
}
