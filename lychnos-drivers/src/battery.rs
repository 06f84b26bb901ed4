//! Battery voltage monitoring
//!
//! Voltage arrives through a 2:1 resistor divider into a 12-bit ADC.
//! Recent levels are kept in a 256-slot circular history sampled every
//! 15 minutes, quantized to 10mV steps over the 3.0-5.55V range the
//! pack can actually reach. Low-battery detection latches with release
//! hysteresis so a sagging pack does not flicker the warning.

/// Battery voltage in millivolts.
pub type Millivolts = u16;

/// ADC reference voltage in millivolts.
pub const VREF_MV: u32 = 3310;

/// Number of history slots.
pub const HISTORY_LENGTH: usize = 256;

/// Seconds between history samples.
pub const HISTORY_INTERVAL_S: u32 = 15 * 60;

/// Lowest voltage the history can represent.
pub const HISTORY_FLOOR_MV: Millivolts = 3000;

/// Highest voltage the history can represent.
pub const HISTORY_CEIL_MV: Millivolts = 5550;

/// Release hysteresis applied once the low-battery latch is set.
pub const LOW_BATTERY_HYSTERESIS_MV: Millivolts = 500;

/// Convert a 12-bit ADC reading to pack millivolts.
///
/// The 2:1 divider is folded into the constant: full scale (4095)
/// corresponds to twice the reference voltage.
pub fn battery_millivolts(raw: u16) -> Millivolts {
    (raw as u32 * VREF_MV / 2047) as Millivolts
}

/// Quantize a voltage to one history byte (10mV steps above the floor).
pub fn quantize_level(mv: Millivolts) -> u8 {
    if mv <= HISTORY_FLOOR_MV {
        0
    } else if mv >= HISTORY_CEIL_MV {
        255
    } else {
        ((mv - HISTORY_FLOOR_MV) / 10) as u8
    }
}

/// Recover the voltage a history byte represents.
pub fn dequantize_level(level: u8) -> Millivolts {
    level as Millivolts * 10 + HISTORY_FLOOR_MV
}

/// Persistent backing for the history ring.
///
/// Indices are already reduced modulo [`HISTORY_LENGTH`].
pub trait HistoryStore {
    fn get_at(&self, index: usize) -> u8;
    fn set_at(&mut self, index: usize, level: u8);
}

/// Circular record of recent battery voltage levels.
pub struct BatteryHistory<S: HistoryStore> {
    store: S,
    last_sample_index: u32,
}

impl<S: HistoryStore> BatteryHistory<S> {
    pub const fn new(store: S) -> Self {
        Self {
            store,
            last_sample_index: 0,
        }
    }

    /// The ring slot for a given time.
    pub fn period_at(now_s: u32) -> usize {
        (now_s / HISTORY_INTERVAL_S) as usize % HISTORY_LENGTH
    }

    /// Resume recording after a power cycle. Slots skipped while
    /// powered off (since `last_written_index`, as persisted by the
    /// host) are zeroed so stale readings don't masquerade as fresh.
    pub fn begin(&mut self, now_s: u32, last_written_index: u32, voltage_mv: Millivolts) {
        let index = now_s / HISTORY_INTERVAL_S;
        let mut next = last_written_index.wrapping_add(1);
        let mut cleared = 0;
        while next < index && cleared < HISTORY_LENGTH {
            self.store.set_at(next as usize % HISTORY_LENGTH, 0);
            next = next.wrapping_add(1);
            cleared += 1;
        }

        self.write_sample(index, voltage_mv);
    }

    /// Record the current voltage if a new period has started.
    /// Returns true if a sample was written.
    pub fn update(&mut self, now_s: u32, voltage_mv: Millivolts) -> bool {
        let index = now_s / HISTORY_INTERVAL_S;
        if index == self.last_sample_index {
            return false;
        }
        self.write_sample(index, voltage_mv);
        true
    }

    /// Index of the most recent sample, for the host to persist.
    pub fn last_sample_index(&self) -> u32 {
        self.last_sample_index
    }

    /// Voltage recorded for a ring slot.
    pub fn get_at(&self, period: usize) -> Millivolts {
        dequantize_level(self.level_at(period))
    }

    /// Raw quantized level for a ring slot.
    pub fn level_at(&self, period: usize) -> u8 {
        self.store.get_at(period % HISTORY_LENGTH)
    }

    fn write_sample(&mut self, index: u32, voltage_mv: Millivolts) {
        self.store
            .set_at(index as usize % HISTORY_LENGTH, quantize_level(voltage_mv));
        self.last_sample_index = index;
    }
}

/// Latching low-battery detector with release hysteresis.
pub struct LowBatteryDetector {
    threshold: Millivolts,
    low: bool,
}

impl LowBatteryDetector {
    pub fn new() -> Self {
        Self {
            threshold: 0,
            low: false,
        }
    }

    /// Compare a fresh voltage reading against the configured
    /// threshold. A threshold change resets the latch.
    pub fn update(&mut self, voltage_mv: Millivolts, threshold_mv: Millivolts) -> bool {
        if threshold_mv != self.threshold {
            self.threshold = threshold_mv;
            self.low = false;
        }

        let hysteresis = if self.low {
            LOW_BATTERY_HYSTERESIS_MV
        } else {
            0
        };
        self.low = voltage_mv < self.threshold.saturating_add(hysteresis);
        self.low
    }

    /// Result of the last [`update`](Self::update).
    pub fn is_low(&self) -> bool {
        self.low
    }
}

impl Default for LowBatteryDetector {
    fn default() -> Self {
        Self::new()
    }
}
