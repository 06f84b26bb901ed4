//! Flash-backed settings
//!
//! The live settings sit in a critical-section cell that menu items
//! read and write through closures; a dirty flag batches writes so one
//! knob twiddle does not erase flash per detent. The image lives in the
//! last flash sector; a schema mismatch at load erases it and rewrites
//! defaults.

use core::cell::Cell;

use embassy_rp::flash::{Blocking, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use portable_atomic::{AtomicBool, Ordering};

use defmt::{info, warn};

use lychnos_core::config::PanelSettings;

/// Flash size of the target board (2MB on the Pico)
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// The settings image lives in the last erase sector
const SETTINGS_OFFSET: u32 = (FLASH_SIZE - ERASE_SIZE) as u32;

/// Flash write granularity
const PAGE_SIZE: usize = 256;

static SETTINGS: Mutex<CriticalSectionRawMutex, Cell<PanelSettings>> =
    Mutex::new(Cell::new(PanelSettings::DEFAULT));

static DIRTY: AtomicBool = AtomicBool::new(false);

/// Read the current settings.
pub fn get() -> PanelSettings {
    SETTINGS.lock(|cell| cell.get())
}

/// Modify the settings and mark them for the next flash write.
pub fn update(f: impl FnOnce(&mut PanelSettings)) {
    SETTINGS.lock(|cell| {
        let mut settings = cell.get();
        f(&mut settings);
        cell.set(settings);
    });
    DIRTY.store(true, Ordering::Release);
}

/// Owns the flash peripheral and the persisted settings image.
pub struct SettingsStore {
    flash: Flash<'static, FLASH, Blocking, FLASH_SIZE>,
}

impl SettingsStore {
    pub fn new(flash: Peri<'static, FLASH>) -> Self {
        Self {
            flash: Flash::new_blocking(flash),
        }
    }

    /// Load the stored image into the live settings. A missing or
    /// mismatched image (fresh board, schema bump) is replaced with
    /// defaults, like a factory reset.
    pub fn load(&mut self) {
        let mut buf = [0u8; PanelSettings::MAX_ENCODED_LEN];
        let image = self.flash.blocking_read(SETTINGS_OFFSET, &mut buf);

        match image.ok().map(|()| PanelSettings::decode(&buf)) {
            Some(Ok(settings)) => {
                info!("Loaded settings from flash");
                SETTINGS.lock(|cell| cell.set(settings));
            }
            _ => {
                warn!("No valid settings image, writing defaults");
                SETTINGS.lock(|cell| cell.set(PanelSettings::DEFAULT));
                DIRTY.store(true, Ordering::Release);
                self.save_if_dirty();
            }
        }
    }

    /// Write the live settings to flash if anything changed.
    pub fn save_if_dirty(&mut self) {
        if !DIRTY.swap(false, Ordering::AcqRel) {
            return;
        }

        let settings = get();
        let mut page = [0xFFu8; PAGE_SIZE];
        if settings.encode(&mut page).is_err() {
            return;
        }

        if self
            .flash
            .blocking_erase(SETTINGS_OFFSET, SETTINGS_OFFSET + ERASE_SIZE as u32)
            .is_ok()
        {
            let _ = self.flash.blocking_write(SETTINGS_OFFSET, &page);
            info!("Settings saved");
        }
    }
}
