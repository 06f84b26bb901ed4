//! ST7567 LCD driver
//!
//! Driver for the panel's 128x64 ST7567 LCD over 4-wire SPI.
//! Page-addressed framebuffer rendered as 21 columns x 8 rows of text
//! with a 6x8 cell. Implements the UI core's [`DrawSurface`].
//!
//! SPI errors are swallowed at the transfer boundary: a wedged display
//! drops frames rather than failing the UI runtime.

use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI1;
use embassy_rp::spi::{Blocking, Spi};

use lychnos_core::DrawSurface;

use crate::font::glyph;

/// Display dimensions
const WIDTH: usize = 128;
const HEIGHT: usize = 64;
const PAGES: usize = HEIGHT / 8;

/// Character cell geometry
const CELL_WIDTH: usize = 6;
pub const TEXT_COLS: u8 = (WIDTH / CELL_WIDTH) as u8;
pub const TEXT_ROWS: u8 = PAGES as u8;

/// ST7567 commands
#[allow(dead_code)]
mod cmd {
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const ALL_PIXELS_ON: u8 = 0xA5;
    pub const ALL_PIXELS_NORMAL: u8 = 0xA4;
    pub const SET_NORMAL: u8 = 0xA6;
    pub const SET_INVERSE: u8 = 0xA7;
    pub const SET_BIAS_1_9: u8 = 0xA2;
    pub const SEG_NORMAL: u8 = 0xA0;
    pub const SEG_REVERSE: u8 = 0xA1;
    pub const COM_NORMAL: u8 = 0xC0;
    pub const COM_REVERSE: u8 = 0xC8;
    pub const SET_START_LINE: u8 = 0x40;
    pub const POWER_CONTROL: u8 = 0x28;
    pub const REGULATION_RATIO: u8 = 0x20;
    pub const SET_EV: u8 = 0x81;
    pub const SET_PAGE_ADDR: u8 = 0xB0;
    pub const SET_LOW_COLUMN: u8 = 0x00;
    pub const SET_HIGH_COLUMN: u8 = 0x10;
    pub const SOFT_RESET: u8 = 0xE2;
}

/// ST7567 LCD driver with a text-cell framebuffer.
pub struct St7567 {
    spi: Spi<'static, SPI1, Blocking>,
    cs: Output<'static>,
    a0: Output<'static>,
    rst: Output<'static>,
    /// Frame buffer (1 bit per pixel, organized as pages)
    buffer: [[u8; WIDTH]; PAGES],
}

impl St7567 {
    /// Create a new driver. Call [`init`](Self::init) before drawing.
    pub fn new(
        spi: Spi<'static, SPI1, Blocking>,
        cs: Output<'static>,
        a0: Output<'static>,
        rst: Output<'static>,
    ) -> Self {
        Self {
            spi,
            cs,
            a0,
            rst,
            buffer: [[0; WIDTH]; PAGES],
        }
    }

    /// Hardware reset followed by the panel init sequence.
    pub fn init(&mut self, delay: impl Fn(u32)) {
        self.rst.set_low();
        delay(10);
        self.rst.set_high();
        delay(10);

        let init_cmds: &[u8] = &[
            cmd::SOFT_RESET,
            cmd::SET_BIAS_1_9,
            cmd::SEG_NORMAL,
            cmd::COM_REVERSE, // panel is mounted upside down
            cmd::REGULATION_RATIO | 0x03,
            cmd::SET_EV,
            0x28, // contrast tuned for the FYSETC panel
            cmd::POWER_CONTROL | 0x07, // booster + regulator + follower on
            cmd::SET_START_LINE,
            cmd::ALL_PIXELS_NORMAL,
            cmd::SET_NORMAL,
            cmd::DISPLAY_ON,
        ];
        for &c in init_cmds {
            self.command(c);
        }
    }

    fn command(&mut self, cmd: u8) {
        self.a0.set_low();
        self.cs.set_low();
        let _ = self.spi.blocking_write(&[cmd]);
        self.cs.set_high();
    }

    fn data(&mut self, data: &[u8]) {
        self.a0.set_high();
        self.cs.set_low();
        let _ = self.spi.blocking_write(data);
        self.cs.set_high();
    }
}

impl DrawSurface for St7567 {
    fn clear(&mut self) {
        for page in self.buffer.iter_mut() {
            page.fill(0);
        }
    }

    fn text(&mut self, row: u8, col: u8, text: &str) {
        if row >= TEXT_ROWS {
            return;
        }

        let page = &mut self.buffer[row as usize];
        let mut x = col as usize * CELL_WIDTH;

        for ch in text.chars() {
            if x + CELL_WIDTH > WIDTH {
                break;
            }
            page[x..x + 5].copy_from_slice(glyph(ch));
            page[x + 5] = 0; // spacing column
            x += CELL_WIDTH;
        }
    }

    fn invert(&mut self, row: u8, start_col: u8, end_col: u8) {
        if row >= TEXT_ROWS {
            return;
        }

        let page = &mut self.buffer[row as usize];
        let start_x = start_col as usize * CELL_WIDTH;
        let end_x = (end_col as usize * CELL_WIDTH).min(WIDTH);
        for byte in &mut page[start_x..end_x] {
            *byte ^= 0xFF;
        }
    }

    fn set_power_save(&mut self, on: bool) {
        if on {
            // Sleep mode per datasheet: display off, then all pixels on
            self.command(cmd::DISPLAY_OFF);
            self.command(cmd::ALL_PIXELS_ON);
        } else {
            self.command(cmd::ALL_PIXELS_NORMAL);
            self.command(cmd::DISPLAY_ON);
        }
    }

    fn flush(&mut self) {
        for page in 0..PAGES {
            self.command(cmd::SET_PAGE_ADDR | (page as u8));
            self.command(cmd::SET_LOW_COLUMN);
            self.command(cmd::SET_HIGH_COLUMN);

            let row = self.buffer[page];
            self.data(&row);
        }
    }

    fn dimensions(&self) -> (u8, u8) {
        (TEXT_COLS, TEXT_ROWS)
    }
}
