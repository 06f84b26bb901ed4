//! Application scene graph
//!
//! The home menu edits the lamp itself (tint and brightness, with the
//! knob LEDs previewing the color under edit); a settings menu holds
//! the panel behavior knobs; a battery scene graphs the recent history.

use alloc::boxed::Box;
use core::fmt::Write;
use heapless::String;

use lychnos_core::color::{
    format_brightness, format_tint, knob_color, BRIGHTNESS_MAX, BRIGHTNESS_MIN, TINT_MAX, TINT_MIN,
};
use lychnos_core::config::PanelSettings;
use lychnos_core::menu::{
    BackItem, Choice, ChoiceItem, Item, Menu, NavigateItem, NumericItem, TitleItem,
};
use lychnos_core::{Canvas, Context, InputEvent, Scene};

use crate::settings;
use crate::tasks;

/// Idle timeout steps offered in the settings menu.
#[derive(Clone, Copy, PartialEq, Eq)]
enum TimeoutChoice {
    Never,
    S15,
    S30,
    M1,
    M5,
}

impl TimeoutChoice {
    fn seconds(self) -> u16 {
        match self {
            TimeoutChoice::Never => 0,
            TimeoutChoice::S15 => 15,
            TimeoutChoice::S30 => 30,
            TimeoutChoice::M1 => 60,
            TimeoutChoice::M5 => 300,
        }
    }

    fn nearest(seconds: u16) -> Self {
        match seconds {
            0 => TimeoutChoice::Never,
            1..=20 => TimeoutChoice::S15,
            21..=45 => TimeoutChoice::S30,
            46..=120 => TimeoutChoice::M1,
            _ => TimeoutChoice::M5,
        }
    }
}

impl Choice for TimeoutChoice {
    const MAX_ORDINAL: u8 = 4;

    fn from_ordinal(ordinal: u8) -> Self {
        match ordinal {
            0 => TimeoutChoice::Never,
            1 => TimeoutChoice::S15,
            2 => TimeoutChoice::S30,
            3 => TimeoutChoice::M1,
            _ => TimeoutChoice::M5,
        }
    }

    fn ordinal(self) -> u8 {
        match self {
            TimeoutChoice::Never => 0,
            TimeoutChoice::S15 => 1,
            TimeoutChoice::S30 => 2,
            TimeoutChoice::M1 => 3,
            TimeoutChoice::M5 => 4,
        }
    }

    fn label(self) -> &'static str {
        match self {
            TimeoutChoice::Never => "Never",
            TimeoutChoice::S15 => "15 s",
            TimeoutChoice::S30 => "30 s",
            TimeoutChoice::M1 => "1 min",
            TimeoutChoice::M5 => "5 min",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OnOff {
    Off,
    On,
}

impl Choice for OnOff {
    const MAX_ORDINAL: u8 = 1;

    fn from_ordinal(ordinal: u8) -> Self {
        if ordinal == 0 {
            OnOff::Off
        } else {
            OnOff::On
        }
    }

    fn ordinal(self) -> u8 {
        match self {
            OnOff::Off => 0,
            OnOff::On => 1,
        }
    }

    fn label(self) -> &'static str {
        match self {
            OnOff::Off => "Off",
            OnOff::On => "On",
        }
    }
}

/// The home menu: the lamp's own controls plus navigation.
pub fn root_menu() -> Box<dyn Scene> {
    let menu = Menu::new()
        .with(TitleItem::new("Lychnos"))
        .with(
            NumericItem::new(
                "Tint",
                || settings::get().tint as i32,
                |v| settings::update(|s| s.tint = v as u8),
                TINT_MIN as i32,
                TINT_MAX as i32,
                1,
            )
            .with_format(format_tint)
            .with_knob_preview(|v| knob_color(v as u8, settings::get().brightness)),
        )
        .with(
            NumericItem::new(
                "Brightness",
                || settings::get().brightness as i32,
                |v| settings::update(|s| s.brightness = v as u8),
                BRIGHTNESS_MIN as i32,
                BRIGHTNESS_MAX as i32,
                1,
            )
            .with_format(format_brightness)
            .with_knob_preview(|v| knob_color(settings::get().tint, v as u8)),
        )
        .with(NavigateItem::new("Battery", battery_scene))
        .with(NavigateItem::new("Settings", settings_menu));
    Box::new(menu)
}

/// Panel behavior settings.
fn settings_menu() -> Box<dyn Scene> {
    let menu = Menu::new()
        .with(TitleItem::new("Settings"))
        .with(ChoiceItem::new(
            "Sleep after",
            || TimeoutChoice::nearest(settings::get().activity_timeout_s),
            |v: TimeoutChoice| settings::update(|s| s.activity_timeout_s = v.seconds()),
        ))
        .with(NumericItem::new(
            "Low batt mV",
            || settings::get().low_battery_mv as i32,
            |v| settings::update(|s| s.low_battery_mv = v as u16),
            3000,
            4000,
            50,
        ))
        .with(ChoiceItem::new(
            "Beeper",
            || {
                if settings::get().beeper {
                    OnOff::On
                } else {
                    OnOff::Off
                }
            },
            |v: OnOff| settings::update(|s| s.beeper = v == OnOff::On),
        ))
        .with(ResetItem)
        .with(BackItem::new("Back"));
    Box::new(menu)
}

/// Restores factory defaults when clicked; the value items notice the
/// change on their next poll.
struct ResetItem;

impl Item for ResetItem {
    fn label(&self) -> &str {
        "Reset defaults"
    }

    fn click(&mut self, ctx: &mut Context) -> bool {
        settings::update(|s| *s = PanelSettings::DEFAULT);
        ctx.request_draw();
        false
    }
}

/// Battery status: live voltage plus a coarse history graph.
struct BatteryScene {
    polled_mv: u16,
    polled_low: bool,
}

impl BatteryScene {
    fn new() -> Self {
        Self {
            polled_mv: 0,
            polled_low: false,
        }
    }
}

fn battery_scene() -> Box<dyn Scene> {
    Box::new(BatteryScene::new())
}

/// Bar glyphs for the history graph, lowest to highest.
const BARS: [char; 5] = [' ', '.', ':', '|', '#'];

impl Scene for BatteryScene {
    fn input(&mut self, _ctx: &mut Context, _event: InputEvent) -> bool {
        false // Back and Home bubble up to the stage
    }

    fn poll(&mut self, ctx: &mut Context) {
        let mv = tasks::battery_mv();
        let low = tasks::battery_low();
        if mv != self.polled_mv || low != self.polled_low {
            self.polled_mv = mv;
            self.polled_low = low;
            ctx.request_draw();
        }
    }

    fn draw(&mut self, _ctx: &mut Context, canvas: &mut Canvas<'_>) {
        let mut line: String<21> = String::new();
        let _ = write!(
            line,
            "Battery  {}.{:02} V",
            self.polled_mv / 1000,
            self.polled_mv % 1000 / 10
        );
        canvas.text(0, 0, &line);

        if self.polled_low {
            canvas.text(1, 0, "LOW BATTERY");
            canvas.invert(1, 0, 11);
        }

        // One bar per history sample, newest on the right
        let mut levels = [0u8; 21];
        tasks::battery_history_levels(&mut levels);
        let mut graph: String<21> = String::new();
        for level in levels {
            let bar = BARS[(level as usize * (BARS.len() - 1)) / 255];
            let _ = graph.push(bar);
        }
        canvas.text(2, 0, &graph);
        canvas.text(3, 0, "last 5h, 15min/div");
    }
}
