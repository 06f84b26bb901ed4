//! Background tasks and the state they share with the UI
//!
//! The input task samples the encoder and buttons every couple of
//! milliseconds, banking results into atomics that the panel binding
//! drains from the UI task. The battery task owns the ADC and keeps the
//! voltage, the low-battery latch, and the history ring fresh. The lamp
//! task pushes the configured tint/brightness out to the strip.

use core::cell::RefCell;

use embassy_rp::adc::{Adc, Async, Channel};
use embassy_rp::gpio::Input;
use embassy_rp::peripherals::PIO1;
use embassy_rp::pio_programs::ws2812::PioWs2812;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Instant, Ticker, Timer};
use portable_atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};
use smart_leds::RGB8;

use defmt::{debug, info};

use lychnos_core::color::strip_color;
use lychnos_drivers::battery::{battery_millivolts, BatteryHistory, HistoryStore, HISTORY_LENGTH};
use lychnos_drivers::button::{ButtonClassifier, ButtonEvent};
use lychnos_drivers::encoder::{QuadratureDecoder, RotationCounter};

use crate::settings;

/// LEDs on the lamp's strip
pub const STRIP_LEN: usize = 24;

/// Button event codes latched for the UI thread
const EVENT_NONE: u8 = 0;
const EVENT_SINGLE_CLICK: u8 = 1;
const EVENT_DOUBLE_CLICK: u8 = 2;
const EVENT_LONG_PRESS: u8 = 3;

static ROTATIONS: RotationCounter = RotationCounter::new();
static KNOB_EVENT: AtomicU8 = AtomicU8::new(EVENT_NONE);
static KILL_EVENT: AtomicU8 = AtomicU8::new(EVENT_NONE);
static INPUT_BUSY: AtomicBool = AtomicBool::new(false);

static BATTERY_MV: AtomicU16 = AtomicU16::new(0);
static BATTERY_LOW: AtomicBool = AtomicBool::new(false);

/// In-RAM backing for the battery history ring.
struct RamHistory {
    slots: [u8; HISTORY_LENGTH],
}

impl HistoryStore for RamHistory {
    fn get_at(&self, index: usize) -> u8 {
        self.slots[index]
    }
    fn set_at(&mut self, index: usize, level: u8) {
        self.slots[index] = level;
    }
}

static HISTORY: Mutex<CriticalSectionRawMutex, RefCell<BatteryHistory<RamHistory>>> =
    Mutex::new(RefCell::new(BatteryHistory::new(RamHistory {
        slots: [0; HISTORY_LENGTH],
    })));

/// Drain the banked encoder steps.
pub fn take_rotations() -> i32 {
    ROTATIONS.take()
}

/// Drain the knob button's latched event.
pub fn take_knob_event() -> Option<ButtonEvent> {
    decode_event(KNOB_EVENT.swap(EVENT_NONE, Ordering::AcqRel))
}

/// Drain the kill button's latched event.
pub fn take_kill_event() -> Option<ButtonEvent> {
    decode_event(KILL_EVENT.swap(EVENT_NONE, Ordering::AcqRel))
}

/// True while any input is pressed, latched, or mid-classification.
pub fn input_busy() -> bool {
    INPUT_BUSY.load(Ordering::Acquire)
        || !ROTATIONS.is_empty()
        || KNOB_EVENT.load(Ordering::Acquire) != EVENT_NONE
        || KILL_EVENT.load(Ordering::Acquire) != EVENT_NONE
}

/// Most recent battery voltage in millivolts.
pub fn battery_mv() -> u16 {
    BATTERY_MV.load(Ordering::Acquire)
}

/// Current state of the low-battery latch.
pub fn battery_low() -> bool {
    BATTERY_LOW.load(Ordering::Acquire)
}

/// Copy the most recent `out.len()` history levels, newest last.
pub fn battery_history_levels(out: &mut [u8]) {
    HISTORY.lock(|history| {
        let history = history.borrow();
        let newest = history.last_sample_index();
        let count = out.len() as u32;
        for (i, slot) in out.iter_mut().enumerate() {
            let period = newest.wrapping_sub(count - 1 - i as u32);
            *slot = history.level_at(period as usize % HISTORY_LENGTH);
        }
    });
}

fn decode_event(code: u8) -> Option<ButtonEvent> {
    match code {
        EVENT_SINGLE_CLICK => Some(ButtonEvent::SingleClick),
        EVENT_DOUBLE_CLICK => Some(ButtonEvent::DoubleClick),
        EVENT_LONG_PRESS => Some(ButtonEvent::LongPress),
        _ => None,
    }
}

fn encode_event(event: ButtonEvent) -> u8 {
    match event {
        ButtonEvent::SingleClick => EVENT_SINGLE_CLICK,
        ButtonEvent::DoubleClick => EVENT_DOUBLE_CLICK,
        ButtonEvent::LongPress => EVENT_LONG_PRESS,
    }
}

fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}

/// Sample the encoder and both buttons.
#[embassy_executor::task]
pub async fn input_task(
    mut enc_a: Input<'static>,
    mut enc_b: Input<'static>,
    knob_btn: Input<'static>,
    kill_btn: Input<'static>,
) {
    info!("Input task started");

    let mut decoder = QuadratureDecoder::new(enc_a.is_high(), enc_b.is_high());
    let mut knob = ButtonClassifier::new();
    let mut kill = ButtonClassifier::new();

    let mut ticker = Ticker::every(Duration::from_millis(2));
    loop {
        ticker.next().await;
        let now = now_ms();

        ROTATIONS.add(decoder.update_from_pins(&mut enc_a, &mut enc_b));

        // Both buttons are active low
        if let Some(event) = knob.update(knob_btn.is_low(), now) {
            KNOB_EVENT.store(encode_event(event), Ordering::Release);
        }
        if let Some(event) = kill.update(kill_btn.is_low(), now) {
            KILL_EVENT.store(encode_event(event), Ordering::Release);
        }

        INPUT_BUSY.store(knob.is_busy() || kill.is_busy(), Ordering::Release);
    }
}

/// Sample the battery and maintain the history ring.
#[embassy_executor::task]
pub async fn battery_task(mut adc: Adc<'static, Async>, mut channel: Channel<'static>) {
    info!("Battery task started");

    let mut detector = lychnos_drivers::battery::LowBatteryDetector::new();
    let mut started = false;

    loop {
        if let Ok(raw) = adc.read(&mut channel).await {
            let mv = battery_millivolts(raw);
            BATTERY_MV.store(mv, Ordering::Release);

            let threshold = settings::get().low_battery_mv;
            BATTERY_LOW.store(detector.update(mv, threshold), Ordering::Release);

            let now_s = Instant::now().as_secs() as u32;
            HISTORY.lock(|history| {
                let mut history = history.borrow_mut();
                if !started {
                    history.begin(now_s, 0, mv);
                } else if history.update(now_s, mv) {
                    debug!("Battery history sample: {} mV", mv);
                }
            });
            started = true;
        }

        Timer::after_secs(5).await;
    }
}

/// Flush dirty settings to flash, batching bursts of edits.
#[embassy_executor::task]
pub async fn settings_task(mut store: settings::SettingsStore) {
    loop {
        Timer::after_secs(2).await;
        store.save_if_dirty();
    }
}

/// Push the configured lamp color out to the strip.
#[embassy_executor::task]
pub async fn lamp_task(mut strip: PioWs2812<'static, PIO1, 0, STRIP_LEN>) {
    info!("Lamp task started");

    let mut last = None;
    loop {
        let settings = settings::get();
        let color = strip_color(settings.tint, settings.brightness);
        if last != Some(color) {
            last = Some(color);
            // The strip is RGBW-less; fold the white channel in evenly
            let rgb = RGB8::new(
                color.r.saturating_add(color.w),
                color.g.saturating_add(color.w),
                color.b.saturating_add(color.w),
            );
            strip.write(&[rgb; STRIP_LEN]).await;
        }
        Timer::after_millis(100).await;
    }
}
