//! Equinox - Telescope Mount Controller Firmware
//!
//! Main firmware binary for RP2040-based equatorial and alt-az mounts:
//! sidereal tracking, guiding, PEC, goto and park.
//!
//! Two contexts share the mount state. The motion task steps the axes at
//! the configured tick rate; the control task runs the state machines at
//! a slower rate and talks to it through a bounded command queue.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use equinox_core::mount::{MotionLoop, Mount};
use equinox_core::pec::PecBuffer;
use equinox_core::persist;
use equinox_core::shared::{CommandQueue, MotionTelemetry};
use equinox_hal_rp2040::flash::Rp2040FlashStorage;
use equinox_hal_rp2040::stepper::{DriverPolarity, GpioStepper};

mod channels;
mod config;
mod tasks;

// State shared between the motion and control tasks
static COMMAND_QUEUE: StaticCell<CommandQueue> = StaticCell::new();
static TELEMETRY: MotionTelemetry = MotionTelemetry::new();
static PEC_BUFFER: PecBuffer = PecBuffer::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Equinox firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let mut storage = Rp2040FlashStorage::new(p.FLASH, p.DMA_CH0);

    // Mount description, then the runtime records saved on it
    let config = config::load_mount_config(&mut storage).await;
    let settings = persist::load_settings(&mut storage, &config).await;
    let pec_table = persist::load_pec_table(&mut storage, config.pec.slots).await;

    // Stepper drivers
    // Pin assignments are board-specific (SKR Pico X: STEP=GPIO11, DIR=GPIO10, EN=GPIO12;
    // Y: STEP=GPIO6, DIR=GPIO5, EN=GPIO7). The TMC2209s there have their
    // microstep pins strapped, so no mode pins are driven.
    let polarity = DriverPolarity::default();
    let axis1 = GpioStepper::new(
        Output::new(p.PIN_11, Level::Low),
        Output::new(p.PIN_10, Level::Low),
        Output::new(p.PIN_12, Level::High),
        [None, None, None],
        None,
        polarity,
    );
    let axis2 = GpioStepper::new(
        Output::new(p.PIN_6, Level::Low),
        Output::new(p.PIN_5, Level::Low),
        Output::new(p.PIN_7, Level::High),
        [None, None, None],
        None,
        polarity,
    );
    info!("Stepper drivers initialized");

    // Endstop inputs (SKR Pico X-STOP: GPIO4, Y-STOP: GPIO3, Z-STOP: GPIO25)
    let index_sensor = config
        .pec
        .has_index_sensor
        .then(|| Input::new(p.PIN_4, Pull::Up));
    let limit_switch = Input::new(p.PIN_3, Pull::Up);
    let pps = Input::new(p.PIN_25, Pull::Down);

    // ST4 port on the expansion header, opto-isolated, active low
    let st4 = tasks::St4Pins {
        north: Input::new(p.PIN_18, Pull::Up),
        south: Input::new(p.PIN_19, Pull::Up),
        east: Input::new(p.PIN_20, Pull::Up),
        west: Input::new(p.PIN_21, Pull::Up),
    };

    // Build both contexts around the shared state
    let (producer, consumer) = COMMAND_QUEUE.init(CommandQueue::new()).split();
    let period = tasks::motion::tick_duration(config.tick_period);
    let motion = MotionLoop::new(&config, [axis1, axis2], consumer, &TELEMETRY, &PEC_BUFFER);
    let mut mount = Mount::new(config, settings, producer, &TELEMETRY, &PEC_BUFFER);

    if let Err(e) = mount.start() {
        error!("Failed to start motion loop: {:?}", e);
    }
    if let Some(record) = pec_table {
        if let Err(e) = mount.load_pec_table(&record) {
            warn!("Stored PEC table not loaded: {:?}", e);
        }
    }

    // Spawn tasks
    spawner
        .spawn(tasks::motion_task(
            motion,
            tasks::MotionHardware { index_sensor },
            period,
        ))
        .unwrap();
    spawner
        .spawn(tasks::control_task(
            mount,
            tasks::ControlInputs {
                limit_switch: Some(limit_switch),
            },
        ))
        .unwrap();
    spawner.spawn(tasks::pps_task(pps)).unwrap();
    spawner.spawn(tasks::st4_task(st4)).unwrap();
    spawner.spawn(tasks::storage_task(storage)).unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
