#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use esp_hal::analog::adc::{Adc, AdcConfig, Attenuation};
use esp_hal::clock::CpuClock;
use esp_hal::delay::Delay;
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::time::Rate;
use esp_hal::uart::{Config as UartConfig, Uart};
use log::info;

use pulse_core::{AcquisitionLoop, Max30105};
use pulse_firmware::board::{ACQUISITION, I2C_FREQUENCY_KHZ};
use pulse_firmware::peripherals::{OneshotAnalog, UartHost, UptimeClock};

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[esp_hal::main]
fn main() -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    info!("Pulse logger starting");

    let i2c = I2c::new(
        peripherals.I2C0,
        I2cConfig::default().with_frequency(Rate::from_khz(I2C_FREQUENCY_KHZ)),
    )
    .expect("Failed to configure I2C0")
    .with_sda(peripherals.GPIO12)
    .with_scl(peripherals.GPIO11);

    let uart = Uart::new(
        peripherals.UART0,
        UartConfig::default().with_baudrate(ACQUISITION.baud_rate),
    )
    .expect("Failed to configure UART0")
    .with_tx(peripherals.GPIO43)
    .with_rx(peripherals.GPIO44);

    // Only one analog input is wired, so the channel id is not consulted.
    let mut adc_config = AdcConfig::new();
    let mut gsr_pin = adc_config.enable_pin(peripherals.GPIO1, Attenuation::_11dB);
    let mut adc = Adc::new(peripherals.ADC1, adc_config);
    let gsr = OneshotAnalog::new(move |_channel| loop {
        if let Ok(value) = adc.read_oneshot(&mut gsr_pin) {
            break value;
        }
    });

    info!(
        "UART0 at {} baud, GSR on channel {}",
        ACQUISITION.baud_rate, ACQUISITION.gsr_channel.0
    );

    let mut acquisition: AcquisitionLoop<_, _, _, _> = AcquisitionLoop::new(
        Max30105::new(i2c, Delay::new()),
        gsr,
        UptimeClock::new(ACQUISITION.clock_origin.epoch_seconds()),
        UartHost::new(uart),
        ACQUISITION,
    );

    acquisition.run()
}
