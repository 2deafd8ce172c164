//! # esp32-touchpanel
//!
//! Hardware profiles and board bring-up for ESP32 boards with an SPI TFT and
//! an XPT2046 resistive touch panel.
//!
//! - **Profiles**: every pin, bus, calibration and feature constant of a
//!   board in one [`HardwareProfile`], validated at compile time
//! - **Registry**: the built-in boards, selected with `HW_PROFILE` at build
//!   time
//! - **Mapper**: rotation aware raw touch to pixel transform
//! - **Drivers**: display ([`mipidsi`]), XPT2046 touch and backlight behind
//!   small traits
//! - **Manager**: one facade that brings the board up and answers touch
//!   queries in display coordinates
//!
//! ## Quick start
//!
//! ```rust,ignore
//! let profile = esp32_touchpanel::registry::resolve_selected()?;
//! let peripherals = esp32_touchpanel::esp::init();
//! let board = esp32_touchpanel::esp::Board::new(
//!     profile,
//!     peripherals.SPI2,
//!     peripherals.SPI3,
//!     peripherals.LEDC,
//! )?;
//!
//! let mut hw = HardwareManager::new(profile, board.display, board.touch, board.backlight)?;
//! hw.begin()?;
//! let point = hw.touch_point()?;
//! ```

#![cfg_attr(not(test), no_std)]

pub mod backlight;
pub mod display;
mod error;
pub mod manager;
pub mod mapper;
pub mod profile;
pub mod registry;
pub mod touch;

#[cfg(feature = "esp32")]
pub mod esp;

#[cfg(test)]
mod testing;

pub use backlight::{
    BacklightDriver,
    GpioBacklight,
    NoBacklight,
    PwmBacklight,
};
pub use display::{
    DisplayDriver,
    MipidsiDisplay,
};
pub use error::Error;
pub use manager::HardwareManager;
pub use mapper::map_touch;
pub use profile::{
    HardwareProfile,
    Rotation,
    TouchPoint,
    TouchSample,
};
pub use registry::ProfileId;
pub use touch::{
    TouchDriver,
    Xpt2046,
};

/// StaticCell helper: allocates a value into a `static` exactly once.
#[cfg(feature = "esp32")]
#[macro_export]
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write($val);
        x
    }};
}
