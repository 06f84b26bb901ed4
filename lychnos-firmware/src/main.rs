//! Lychnos - Lamp Control Panel Firmware
//!
//! Main firmware binary for the RP2040-based control panel: a FYSETC
//! Mini 12864-class module with an ST7567 LCD, three WS2812 pixels,
//! an encoder wheel with push button, a kill button, and a beeper.
//!
//! Named after the Greek "lychnos" (λύχνος) meaning "lamp".

#![no_std]
#![no_main]

extern crate alloc;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, InterruptHandler as AdcInterruptHandler};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::{PIO0, PIO1};
use embassy_rp::pio::Pio;
use embassy_rp::pio_programs::ws2812::{PioWs2812, PioWs2812Program};
use embassy_rp::pwm::Pwm;
use embassy_rp::spi::Spi;
use embassy_time::{block_for, Duration, Instant, Timer};
use embedded_alloc::LlffHeap as Heap;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use lychnos_core::{Millis, Stage};

use crate::panel::Panel;
use crate::st7567::St7567;

mod font;
mod panel;
mod scenes;
mod settings;
mod st7567;
mod tasks;

// Heap allocator for scene and item boxes
#[global_allocator]
static HEAP: Heap = Heap::empty();

// Heap size: 16KB
const HEAP_SIZE: usize = 16 * 1024;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => embassy_rp::pio::InterruptHandler<PIO0>;
    PIO1_IRQ_0 => embassy_rp::pio::InterruptHandler<PIO1>;
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

// PIO programs must outlive the drivers that run them
static PANEL_WS2812_PROGRAM: StaticCell<PioWs2812Program<'static, PIO0>> = StaticCell::new();
static STRIP_WS2812_PROGRAM: StaticCell<PioWs2812Program<'static, PIO1>> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Lychnos firmware starting...");

    // Initialize heap allocator
    init_heap();

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Load settings from the last flash sector
    let mut store = settings::SettingsStore::new(p.FLASH);
    store.load();

    // LCD on SPI1 (CLK=GPIO10, MOSI=GPIO11) with CS/A0/RST as GPIOs
    let mut spi_config = embassy_rp::spi::Config::default();
    spi_config.frequency = 4_000_000;
    let spi = Spi::new_blocking_txonly(p.SPI1, p.PIN_10, p.PIN_11, spi_config);
    let cs = Output::new(p.PIN_13, Level::High);
    let a0 = Output::new(p.PIN_12, Level::Low);
    let rst = Output::new(p.PIN_9, Level::High);
    let mut lcd = St7567::new(spi, cs, a0, rst);
    lcd.init(|ms| block_for(Duration::from_millis(ms as u64)));
    info!("LCD initialized");

    // Panel pixels (display backlight + knob) on PIO0
    let Pio {
        mut common, sm0, ..
    } = Pio::new(p.PIO0, Irqs);
    let program = PANEL_WS2812_PROGRAM.init(PioWs2812Program::new(&mut common));
    let leds = PioWs2812::new(&mut common, sm0, p.DMA_CH0, p.PIN_16, program);

    // Lamp strip on PIO1
    let Pio {
        mut common, sm0, ..
    } = Pio::new(p.PIO1, Irqs);
    let program = STRIP_WS2812_PROGRAM.init(PioWs2812Program::new(&mut common));
    let strip = PioWs2812::new(&mut common, sm0, p.DMA_CH1, p.PIN_17, program);
    info!("LEDs initialized");

    // Beeper on PWM slice 2A (GPIO20)
    let beeper = Pwm::new_output_a(p.PWM_SLICE2, p.PIN_20, embassy_rp::pwm::Config::default());

    // Encoder wheel and buttons (all active low)
    let enc_a = Input::new(p.PIN_21, Pull::Up);
    let enc_b = Input::new(p.PIN_22, Pull::Up);
    let knob_btn = Input::new(p.PIN_15, Pull::Up);
    let kill_btn = Input::new(p.PIN_18, Pull::Up);

    // Battery sense behind a 2:1 divider on ADC0
    let adc = Adc::new(p.ADC, Irqs, embassy_rp::adc::Config::default());
    let battery_channel = Channel::new_pin(p.PIN_26, Pull::None);

    let panel = Panel::new(lcd, leds, beeper);

    // Spawn tasks
    spawner
        .spawn(tasks::input_task(enc_a, enc_b, knob_btn, kill_btn))
        .unwrap();
    spawner
        .spawn(tasks::battery_task(adc, battery_channel))
        .unwrap();
    spawner.spawn(tasks::lamp_task(strip)).unwrap();
    spawner.spawn(tasks::settings_task(store)).unwrap();
    spawner.spawn(ui_task(panel)).unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Drive the scene stack and the beeper between hardware ticks.
#[embassy_executor::task]
async fn ui_task(panel: Panel) {
    info!("UI task started");

    let mut stage = Stage::new(panel);
    stage.begin(scenes::root_menu(), now_ms());

    let mut was_low = false;
    loop {
        stage.run_until_idle(now_ms());
        stage.binding_mut().service_tone();

        // Chirp once when the pack first goes low
        let low = tasks::battery_low();
        if low && !was_low && settings::get().beeper {
            stage.binding_mut().play_tone(4_000, 150);
        }
        was_low = low;

        if stage.can_sleep() {
            Timer::after_millis(50).await;
        } else {
            Timer::after_millis(5).await;
        }
    }
}

fn now_ms() -> Millis {
    Instant::now().as_millis() as Millis
}

/// Initialize the heap allocator
fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}
