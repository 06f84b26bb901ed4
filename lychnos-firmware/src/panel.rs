//! Panel hardware binding
//!
//! Binds the UI core to the real panel: the ST7567 surface, the three
//! WS2812 pixels (one behind the display, two in the knob), and the
//! beeper. Input events are drained from the sampling task's atomics;
//! rotation is reported in preference to the knob button, and the knob
//! button in preference to the kill button.

use embassy_futures::block_on;
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio_programs::ws2812::PioWs2812;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_time::{Duration, Instant};
use smart_leds::RGB8;

use lychnos_core::color::Rgb;
use lychnos_core::{DrawSurface, InputEvent, InputKind, Millis, PanelBinding};
use lychnos_drivers::button::ButtonEvent;

use crate::settings;
use crate::st7567::St7567;
use crate::tasks;

/// Panel pixels: display backlight + two knob LEDs
const PANEL_LEDS: usize = 3;

/// System clock, for the beeper PWM divider
const SYS_CLK_HZ: u32 = 125_000_000;

pub struct Panel {
    surface: St7567,
    leds: PioWs2812<'static, PIO0, 0, PANEL_LEDS>,
    beeper: Pwm<'static>,
    tone_end: Option<Instant>,
}

impl Panel {
    pub fn new(
        surface: St7567,
        leds: PioWs2812<'static, PIO0, 0, PANEL_LEDS>,
        beeper: Pwm<'static>,
    ) -> Self {
        Self {
            surface,
            leds,
            beeper,
            tone_end: None,
        }
    }

    /// Silence the beeper once its tone duration has elapsed. Called
    /// from the UI loop between scheduler drains.
    pub fn service_tone(&mut self) {
        if let Some(end) = self.tone_end {
            if Instant::now() >= end {
                self.tone_end = None;
                self.beeper.set_config(&PwmConfig::default());
            }
        }
    }
}

impl PanelBinding for Panel {
    fn read_event(&mut self) -> InputEvent {
        let rotations = tasks::take_rotations();
        if rotations != 0 {
            return InputEvent::rotate(rotations);
        }

        if let Some(event) = tasks::take_knob_event() {
            return InputEvent::new(match event {
                ButtonEvent::SingleClick => InputKind::SingleClick,
                ButtonEvent::DoubleClick => InputKind::DoubleClick,
                ButtonEvent::LongPress => InputKind::LongPress,
            });
        }

        if let Some(event) = tasks::take_kill_event() {
            return InputEvent::new(match event {
                ButtonEvent::LongPress => InputKind::Home,
                _ => InputKind::Back,
            });
        }

        InputEvent::none()
    }

    fn surface(&mut self) -> &mut dyn DrawSurface {
        &mut self.surface
    }

    fn set_colors(&mut self, display: Rgb, knob: Rgb) {
        let display = RGB8::new(display.r, display.g, display.b);
        let knob = RGB8::new(knob.r, knob.g, knob.b);
        // Three pixels and a DMA transfer of microseconds; blocking
        // here keeps the binding synchronous.
        block_on(self.leds.write(&[display, knob, knob]));
    }

    fn play_tone(&mut self, freq_hz: u32, duration_ms: u32) {
        // Below ~2kHz the 16-bit counter would overflow at full clock;
        // the piezo is inaudible down there anyway.
        let freq_hz = freq_hz.max(2_000);
        let top = (SYS_CLK_HZ / freq_hz).min(u16::MAX as u32) as u16;

        let mut config = PwmConfig::default();
        config.top = top;
        config.compare_a = top / 2;
        self.beeper.set_config(&config);
        self.tone_end = Some(Instant::now() + Duration::from_millis(duration_ms as u64));
    }

    fn input_idle(&self) -> bool {
        !tasks::input_busy()
    }

    fn activity_timeout_ms(&self) -> Millis {
        settings::get().activity_timeout_ms()
    }
}
