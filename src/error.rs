//! Error definition for the crate

use core::fmt;

use embedded_graphics::geometry::Size;

/// Everything that can go wrong while selecting a profile or driving the
/// board.
///
/// The configuration variants are raised before any hardware is touched and
/// mean the program must not continue with the selected profile. The
/// remaining variants report a display, touch or backlight that did not
/// respond; the caller decides whether to retry, fall back or halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The profile identifier does not name a supported board.
    UnknownProfile,
    /// A calibration axis has `min == max`.
    InvalidCalibration,
    /// Touch point count does not fit the touch controller.
    InvalidMultipoint,
    /// Display width or height is zero.
    InvalidGeometry,
    /// Backlight feature flags disagree with the backlight wiring.
    InvalidBacklight,
    /// Rotation outside `0..=3`.
    InvalidRotation(u8),
    /// A signal the board support needs is not wired in the profile.
    MissingPin,
    /// No driver for the profile's display controller.
    UnsupportedController,
    /// The display driver reported a failure during init.
    DisplayInitFailed,
    /// The touch driver reported a failure during init.
    TouchInitFailed,
    /// The live display size does not match the profile.
    DisplaySizeMismatch { expected: Size, actual: Size },
    /// A command could not be written to the display controller.
    DisplayWrite,
    /// The touch controller could not be read.
    TouchRead,
    /// The backlight output could not be driven.
    Backlight,
    /// The hardware manager has not been started with `begin()`.
    NotReady,
}

impl Error {
    /// Returns `true` for errors caused by profile data rather than by
    /// hardware.
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownProfile
                | Error::InvalidCalibration
                | Error::InvalidMultipoint
                | Error::InvalidGeometry
                | Error::InvalidBacklight
                | Error::InvalidRotation(_)
                | Error::MissingPin
                | Error::UnsupportedController
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownProfile => f.write_str("unknown hardware profile"),
            Error::InvalidCalibration => f.write_str("touch calibration range is empty"),
            Error::InvalidMultipoint => {
                f.write_str("touch point count does not match the touch controller")
            }
            Error::InvalidGeometry => f.write_str("display size is zero"),
            Error::InvalidBacklight => {
                f.write_str("backlight features do not match the backlight wiring")
            }
            Error::InvalidRotation(r) => write!(f, "rotation {r} is not in 0..=3"),
            Error::MissingPin => f.write_str("required pin is not wired in the profile"),
            Error::UnsupportedController => f.write_str("display controller is not supported"),
            Error::DisplayInitFailed => f.write_str("display initialisation failed"),
            Error::TouchInitFailed => f.write_str("touch controller not responding"),
            Error::DisplaySizeMismatch { expected, actual } => write!(
                f,
                "display size mismatch: expected {}x{}, got {}x{}",
                expected.width, expected.height, actual.width, actual.height
            ),
            Error::DisplayWrite => f.write_str("display command write failed"),
            Error::TouchRead => f.write_str("touch controller read failed"),
            Error::Backlight => f.write_str("backlight output failed"),
            Error::NotReady => f.write_str("hardware not initialised"),
        }
    }
}

impl core::error::Error for Error {}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Error::UnknownProfile => defmt::write!(fmt, "unknown hardware profile"),
            Error::InvalidCalibration => defmt::write!(fmt, "touch calibration range is empty"),
            Error::InvalidMultipoint => {
                defmt::write!(fmt, "touch point count does not match the touch controller")
            }
            Error::InvalidGeometry => defmt::write!(fmt, "display size is zero"),
            Error::InvalidBacklight => {
                defmt::write!(fmt, "backlight features do not match the backlight wiring")
            }
            Error::InvalidRotation(r) => defmt::write!(fmt, "rotation {} is not in 0..=3", r),
            Error::MissingPin => defmt::write!(fmt, "required pin is not wired in the profile"),
            Error::UnsupportedController => {
                defmt::write!(fmt, "display controller is not supported")
            }
            Error::DisplayInitFailed => defmt::write!(fmt, "display initialisation failed"),
            Error::TouchInitFailed => defmt::write!(fmt, "touch controller not responding"),
            Error::DisplaySizeMismatch { expected, actual } => defmt::write!(
                fmt,
                "display size mismatch: expected {}x{}, got {}x{}",
                expected.width,
                expected.height,
                actual.width,
                actual.height
            ),
            Error::DisplayWrite => defmt::write!(fmt, "display command write failed"),
            Error::TouchRead => defmt::write!(fmt, "touch controller read failed"),
            Error::Backlight => defmt::write!(fmt, "backlight output failed"),
            Error::NotReady => defmt::write!(fmt, "hardware not initialised"),
        }
    }
}
