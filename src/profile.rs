//! Hardware profile data model.
//!
//! A [`HardwareProfile`] is the complete set of pin, timing, calibration and
//! feature constants for one physical board. Profiles are plain `const`
//! values; nothing in the crate mutates one after it has been resolved.

use embedded_graphics::geometry::{
    Point,
    Size,
};
use fugit::HertzU32;

use crate::Error;

/// Display controller chip.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayController {
    St7789,
    Ili9341,
    Ili9488,
    Generic,
}

impl DisplayController {
    pub const fn name(self) -> &'static str {
        match self {
            DisplayController::St7789 => "ST7789",
            DisplayController::Ili9341 => "ILI9341",
            DisplayController::Ili9488 => "ILI9488",
            DisplayController::Generic => "Generic",
        }
    }
}

/// Touch controller chip.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchController {
    /// Resistive, single touch, SPI.
    Xpt2046,
    /// Capacitive, up to five points, I2C.
    Gt911,
    /// Capacitive, two points, I2C.
    Ft6236,
    /// Capacitive, single touch, I2C.
    Cst816s,
    None,
}

impl TouchController {
    pub const fn name(self) -> &'static str {
        match self {
            TouchController::Xpt2046 => "XPT2046",
            TouchController::Gt911 => "GT911",
            TouchController::Ft6236 => "FT6236",
            TouchController::Cst816s => "CST816S",
            TouchController::None => "None",
        }
    }
}

/// ESP32 SPI host the touch controller sits on.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiBus {
    /// HSPI (SPI2), usually shared with the display.
    Primary,
    /// VSPI (SPI3), a separate bus.
    Secondary,
}

impl SpiBus {
    pub const fn name(self) -> &'static str {
        match self {
            SpiBus::Primary => "HSPI",
            SpiBus::Secondary => "VSPI",
        }
    }
}

/// One of the four fixed display orientations.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Portrait = 0,
    Landscape = 1,
    PortraitInverted = 2,
    LandscapeInverted = 3,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::Portrait,
        Rotation::Landscape,
        Rotation::PortraitInverted,
        Rotation::LandscapeInverted,
    ];

    /// Index into the per-rotation tables of a profile.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Rotations 1 and 3 swap the effective width and height.
    pub const fn is_landscape(self) -> bool {
        matches!(self, Rotation::Landscape | Rotation::LandscapeInverted)
    }
}

impl TryFrom<u8> for Rotation {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Rotation::Portrait),
            1 => Ok(Rotation::Landscape),
            2 => Ok(Rotation::PortraitInverted),
            3 => Ok(Rotation::LandscapeInverted),
            other => Err(Error::InvalidRotation(other)),
        }
    }
}

impl From<Rotation> for u8 {
    fn from(rotation: Rotation) -> Self {
        rotation as u8
    }
}

/// Display SPI wiring. `None` means the signal is not wired.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayPins {
    pub miso: Option<u8>,
    pub mosi: Option<u8>,
    pub sclk: Option<u8>,
    pub cs: Option<u8>,
    pub dc: Option<u8>,
    /// Usually tied to the board reset.
    pub rst: Option<u8>,
}

/// A raw controller command replayed after the display has been
/// initialised.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelCommand {
    pub command: u8,
    pub params: &'static [u8],
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    pub controller: DisplayController,
    /// Native width in rotation 0.
    pub width: u16,
    /// Native height in rotation 0.
    pub height: u16,
    pub default_rotation: Rotation,
    pub colors_inverted: bool,
    pub pins: DisplayPins,
    pub spi_frequency: HertzU32,
    pub read_spi_frequency: HertzU32,
    pub dma: bool,
    /// Board specific init sequence.
    pub init_commands: &'static [PanelCommand],
}

impl DisplayConfig {
    /// Native size in rotation 0.
    pub const fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }

    /// Effective size for `rotation`.
    pub const fn size_for(&self, rotation: Rotation) -> Size {
        if rotation.is_landscape() {
            Size::new(self.height as u32, self.width as u32)
        } else {
            self.size()
        }
    }
}

/// Touch SPI wiring.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchPins {
    /// PENIRQ, active low.
    pub irq: Option<u8>,
    pub mosi: Option<u8>,
    pub miso: Option<u8>,
    pub clk: Option<u8>,
    pub cs: Option<u8>,
}

/// Raw ADC values observed at the display edges.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl Calibration {
    pub const fn is_valid(&self) -> bool {
        self.min_x != self.max_x && self.min_y != self.max_y
    }
}

/// Per-rotation inversion override. `None` falls back to the profile wide
/// `invert_x` / `invert_y`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisInversion {
    pub x: Option<bool>,
    pub y: Option<bool>,
}

impl AxisInversion {
    pub const NONE: AxisInversion = AxisInversion { x: None, y: None };
}

/// Board specific raw to display mapping.
///
/// Receives the raw sample, the calibration and the effective display size
/// for the rotation, and returns the unclamped display coordinate. Inversion
/// and clamping are still applied afterwards.
pub type TouchMapFn = fn(raw: Point, calibration: &Calibration, extent: Size) -> Point;

/// How raw samples are mapped for one rotation.
#[derive(Debug, Clone, Copy, Default)]
pub enum TouchMapping {
    /// The XPT2046 convention for the rotation.
    #[default]
    Generic,
    Custom(TouchMapFn),
}

impl TouchMapping {
    pub const GENERIC: [TouchMapping; 4] = [TouchMapping::Generic; 4];
}

#[derive(Debug, Clone, Copy)]
pub struct TouchConfig {
    pub controller: TouchController,
    pub spi_bus: SpiBus,
    /// Maximum simultaneous touch points.
    pub multipoint: u8,
    pub pins: TouchPins,
    pub spi_frequency: HertzU32,
    pub calibration: Calibration,
    /// Minimum pressure for a sample to count as a touch.
    pub threshold: u16,
    pub calibrated: bool,
    pub invert_x: bool,
    pub invert_y: bool,
    /// Indexed by [`Rotation::index`].
    pub rotation_inversion: [AxisInversion; 4],
    /// Indexed by [`Rotation::index`].
    pub mappings: [TouchMapping; 4],
}

impl TouchConfig {
    /// Effective `(invert_x, invert_y)` for `rotation`.
    pub const fn inversion(&self, rotation: Rotation) -> (bool, bool) {
        let over = self.rotation_inversion[rotation.index()];
        let x = match over.x {
            Some(invert) => invert,
            None => self.invert_x,
        };
        let y = match over.y {
            Some(invert) => invert,
            None => self.invert_y,
        };
        (x, y)
    }
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmConfig {
    /// LEDC channel.
    pub channel: u8,
    pub frequency: HertzU32,
    pub resolution_bits: u8,
    /// Brightness applied by `begin()`, in percent.
    pub default_percent: u8,
}

impl PwmConfig {
    /// Largest duty value for the configured resolution.
    pub const fn max_duty(&self) -> u32 {
        (1u32 << self.resolution_bits) - 1
    }
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacklightConfig {
    pub pin: u8,
    /// `true` when the backlight is on with the pin low.
    pub inverted: bool,
    /// `None` for an on/off backlight.
    pub pwm: Option<PwmConfig>,
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbLedPins {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub inverted: bool,
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rs485Config {
    pub rx: u8,
    pub tx: u8,
    pub uart: u8,
    pub baud: u32,
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Features {
    pub multi_touch: bool,
    pub backlight_control: bool,
    pub pwm_backlight: bool,
    pub rgb_led: bool,
    pub rs485: bool,
    pub sd_card: bool,
    pub speaker: bool,
    pub wifi: bool,
    pub bluetooth: bool,
}

/// Every constant describing one board.
#[derive(Debug, Clone, Copy)]
pub struct HardwareProfile {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub display: DisplayConfig,
    pub touch: TouchConfig,
    pub backlight: Option<BacklightConfig>,
    pub led: Option<RgbLedPins>,
    pub rs485: Option<Rs485Config>,
    pub features: Features,
}

impl HardwareProfile {
    /// Checks the profile invariants.
    ///
    /// This is a `const fn` so the built-in tables are checked while
    /// compiling, see `registry`.
    pub const fn validate(&self) -> Result<(), Error> {
        if self.display.width == 0 || self.display.height == 0 {
            return Err(Error::InvalidGeometry);
        }

        if !self.touch.calibration.is_valid() {
            return Err(Error::InvalidCalibration);
        }

        if self.touch.multipoint == 0 {
            return Err(Error::InvalidMultipoint);
        }
        // Resistive panels report a single contact.
        if matches!(self.touch.controller, TouchController::Xpt2046) && self.touch.multipoint != 1
        {
            return Err(Error::InvalidMultipoint);
        }
        if self.features.multi_touch != (self.touch.multipoint > 1) {
            return Err(Error::InvalidMultipoint);
        }

        match self.backlight {
            None => {
                if self.features.backlight_control || self.features.pwm_backlight {
                    return Err(Error::InvalidBacklight);
                }
            }
            Some(backlight) => {
                if !self.features.backlight_control {
                    return Err(Error::InvalidBacklight);
                }
                match backlight.pwm {
                    None => {
                        if self.features.pwm_backlight {
                            return Err(Error::InvalidBacklight);
                        }
                    }
                    Some(pwm) => {
                        if !self.features.pwm_backlight
                            || pwm.resolution_bits == 0
                            || pwm.resolution_bits > 20
                            || pwm.default_percent > 100
                        {
                            return Err(Error::InvalidBacklight);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Whether the touch controller reports more than one point.
    pub const fn has_multi_touch(&self) -> bool {
        self.touch.multipoint > 1
    }

    pub const fn has_pwm_backlight(&self) -> bool {
        match self.backlight {
            Some(backlight) => backlight.pwm.is_some(),
            None => false,
        }
    }

    pub const fn is_backlight_inverted(&self) -> bool {
        match self.backlight {
            Some(backlight) => backlight.inverted,
            None => false,
        }
    }
}

/// One raw reading from the touch controller.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchSample {
    pub pressed: bool,
    pub raw_x: i32,
    pub raw_y: i32,
}

impl TouchSample {
    pub const fn pressed(raw_x: i32, raw_y: i32) -> Self {
        Self {
            pressed: true,
            raw_x,
            raw_y,
        }
    }

    pub const fn released() -> Self {
        Self {
            pressed: false,
            raw_x: 0,
            raw_y: 0,
        }
    }

    pub const fn raw(&self) -> Point {
        Point::new(self.raw_x, self.raw_y)
    }
}

/// A touch location in display pixels, or [`TouchPoint::INVALID`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchPoint {
    pub x: i32,
    pub y: i32,
}

impl TouchPoint {
    /// Reported when nothing touches the panel.
    pub const INVALID: TouchPoint = TouchPoint { x: -1, y: -1 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn is_valid(&self) -> bool {
        self.x >= 0 && self.y >= 0
    }

    pub const fn to_point(self) -> Option<Point> {
        if self.is_valid() {
            Some(Point::new(self.x, self.y))
        } else {
            None
        }
    }
}

impl Default for TouchPoint {
    fn default() -> Self {
        TouchPoint::INVALID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ESP32_2432S028R;

    #[test]
    fn rotation_from_integer() {
        assert_eq!(Rotation::try_from(0), Ok(Rotation::Portrait));
        assert_eq!(Rotation::try_from(3), Ok(Rotation::LandscapeInverted));
        assert_eq!(Rotation::try_from(4), Err(Error::InvalidRotation(4)));
        assert_eq!(u8::from(Rotation::PortraitInverted), 2);
    }

    #[test]
    fn landscape_swaps_size() {
        let display = ESP32_2432S028R.display;
        assert_eq!(display.size_for(Rotation::Portrait), Size::new(320, 240));
        assert_eq!(display.size_for(Rotation::Landscape), Size::new(240, 320));
        assert_eq!(display.size_for(Rotation::PortraitInverted), Size::new(320, 240));
        assert_eq!(display.size_for(Rotation::LandscapeInverted), Size::new(240, 320));
    }

    #[test]
    fn rotation_override_beats_default_inversion() {
        let mut touch = ESP32_2432S028R.touch;
        touch.invert_x = true;
        touch.rotation_inversion[Rotation::Landscape.index()] = AxisInversion {
            x: Some(false),
            y: Some(true),
        };

        assert_eq!(touch.inversion(Rotation::Portrait), (true, false));
        assert_eq!(touch.inversion(Rotation::Landscape), (false, true));
    }

    #[test]
    fn degenerate_calibration_is_rejected() {
        let mut profile = ESP32_2432S028R;
        profile.touch.calibration.max_y = profile.touch.calibration.min_y;
        assert_eq!(profile.validate(), Err(Error::InvalidCalibration));
    }

    #[test]
    fn resistive_touch_must_be_single_point() {
        let mut profile = ESP32_2432S028R;
        profile.touch.multipoint = 5;
        profile.features.multi_touch = true;
        assert_eq!(profile.validate(), Err(Error::InvalidMultipoint));

        profile.touch.controller = TouchController::Gt911;
        assert_eq!(profile.validate(), Ok(()));
    }

    #[test]
    fn pwm_flag_must_match_wiring() {
        let mut profile = ESP32_2432S028R;
        profile.features.pwm_backlight = false;
        assert_eq!(profile.validate(), Err(Error::InvalidBacklight));
    }

    #[test]
    fn invalid_touch_point_has_no_point() {
        assert!(!TouchPoint::INVALID.is_valid());
        assert_eq!(TouchPoint::INVALID.to_point(), None);
        assert_eq!(TouchPoint::new(3, 4).to_point(), Some(Point::new(3, 4)));
    }
}
