//! Persisted panel settings
//!
//! The settings image is a postcard body behind a magic word that folds in
//! the schema version. A mismatched magic means the stored image predates
//! the current schema (or was never written); the caller responds by
//! erasing and rewriting defaults rather than trying to migrate.

use serde::{Deserialize, Serialize};

use crate::color::{Brightness, Tint};
use crate::Millis;

/// Bump when the layout of [`PanelSettings`] changes.
pub const SCHEMA_VERSION: u8 = 1;

const SETTINGS_MAGIC: u32 = 0xAB5C_155A;

/// Errors from settings encode/decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    /// Stored image is missing or from a different schema version
    SchemaMismatch,
    /// Buffer too small or malformed postcard body
    Encoding,
}

/// All settings the panel persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelSettings {
    /// Lamp tint (0 = white)
    pub tint: Tint,
    /// Lamp brightness (0 = off)
    pub brightness: Brightness,
    /// Idle seconds before the panel sleeps; 0 disables the timeout
    pub activity_timeout_s: u16,
    /// Low-battery warning threshold in millivolts
    pub low_battery_mv: u16,
    /// Whether the beeper is enabled
    pub beeper: bool,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl PanelSettings {
    /// First-boot values, also used after a schema-mismatch erase.
    pub const DEFAULT: Self = Self {
        tint: 0,
        brightness: 6,
        activity_timeout_s: 30,
        low_battery_mv: 3300,
        beeper: true,
    };

    /// Upper bound on the encoded image size (magic word + postcard body).
    pub const MAX_ENCODED_LEN: usize = 4 + 16;

    /// Activity timeout in milliseconds; 0 disables it.
    pub fn activity_timeout_ms(&self) -> Millis {
        self.activity_timeout_s as Millis * 1000
    }

    /// Encode into `buf`, returning the written prefix.
    pub fn encode<'a>(&self, buf: &'a mut [u8]) -> Result<&'a [u8], SettingsError> {
        if buf.len() < 4 {
            return Err(SettingsError::Encoding);
        }
        buf[..4].copy_from_slice(&magic_word().to_le_bytes());
        let body_len = postcard::to_slice(self, &mut buf[4..])
            .map_err(|_| SettingsError::Encoding)?
            .len();
        Ok(&buf[..4 + body_len])
    }

    /// Decode a stored image.
    pub fn decode(buf: &[u8]) -> Result<Self, SettingsError> {
        if buf.len() < 4 {
            return Err(SettingsError::SchemaMismatch);
        }
        let mut word = [0u8; 4];
        word.copy_from_slice(&buf[..4]);
        if u32::from_le_bytes(word) != magic_word() {
            return Err(SettingsError::SchemaMismatch);
        }
        postcard::from_bytes(&buf[4..]).map_err(|_| SettingsError::Encoding)
    }
}

fn magic_word() -> u32 {
    SETTINGS_MAGIC ^ SCHEMA_VERSION as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let settings = PanelSettings {
            tint: 12,
            brightness: 3,
            activity_timeout_s: 120,
            low_battery_mv: 3500,
            beeper: false,
        };
        let mut buf = [0u8; PanelSettings::MAX_ENCODED_LEN];
        let image = settings.encode(&mut buf).unwrap();
        assert_eq!(PanelSettings::decode(image).unwrap(), settings);
    }

    #[test]
    fn test_default_roundtrip() {
        let mut buf = [0u8; PanelSettings::MAX_ENCODED_LEN];
        let image = PanelSettings::default().encode(&mut buf).unwrap();
        assert_eq!(
            PanelSettings::decode(image).unwrap(),
            PanelSettings::default()
        );
    }

    #[test]
    fn test_blank_image_is_schema_mismatch() {
        assert_eq!(
            PanelSettings::decode(&[0xFF; 24]),
            Err(SettingsError::SchemaMismatch)
        );
        assert_eq!(
            PanelSettings::decode(&[]),
            Err(SettingsError::SchemaMismatch)
        );
    }

    #[test]
    fn test_version_change_invalidates_image() {
        let mut buf = [0u8; PanelSettings::MAX_ENCODED_LEN];
        let len = PanelSettings::default().encode(&mut buf).unwrap().len();
        // Flip a bit in the magic word, as a schema bump would
        buf[0] ^= 0x01;
        assert_eq!(
            PanelSettings::decode(&buf[..len]),
            Err(SettingsError::SchemaMismatch)
        );
    }

    #[test]
    fn test_truncated_body_is_encoding_error() {
        let mut buf = [0u8; PanelSettings::MAX_ENCODED_LEN];
        let len = PanelSettings::default().encode(&mut buf).unwrap().len();
        assert_eq!(
            PanelSettings::decode(&buf[..len - 1]),
            Err(SettingsError::Encoding)
        );
    }

    #[test]
    fn test_activity_timeout_ms() {
        let mut settings = PanelSettings::default();
        settings.activity_timeout_s = 30;
        assert_eq!(settings.activity_timeout_ms(), 30_000);
        settings.activity_timeout_s = 0;
        assert_eq!(settings.activity_timeout_ms(), 0);
    }
}
