//! The hardware manager: one profile, one display, one touch controller and
//! one backlight behind a single facade.

use core::fmt;

use embedded_graphics::geometry::Size;

use crate::{
    Error,
    backlight::BacklightDriver,
    display::DisplayDriver,
    mapper::map_touch,
    profile::{
        DisplayController,
        HardwareProfile,
        Rotation,
        TouchController,
        TouchPoint,
        TouchSample,
    },
    touch::TouchDriver,
};

/// Owns the board drivers and applies a [`HardwareProfile`] to them.
///
/// Nothing touches the hardware until [`HardwareManager::begin`]. Until then
/// every hardware operation returns [`Error::NotReady`].
pub struct HardwareManager<'p, D, T, B> {
    profile: &'p HardwareProfile,
    display: D,
    touch: T,
    backlight: B,
    rotation: Rotation,
    brightness: u8,
    ready: bool,
}

impl<'p, D, T, B> HardwareManager<'p, D, T, B>
where
    D: DisplayDriver,
    T: TouchDriver,
    B: BacklightDriver,
{
    /// Validates `profile` and takes the drivers. No driver is called.
    pub fn new(
        profile: &'p HardwareProfile,
        display: D,
        touch: T,
        backlight: B,
    ) -> Result<Self, Error> {
        profile.validate()?;
        Ok(Self {
            profile,
            display,
            touch,
            backlight,
            rotation: profile.display.default_rotation,
            brightness: 0,
            ready: false,
        })
    }

    /// Brings up display, touch and backlight in that order.
    ///
    /// Display and touch failures abort; a backlight failure is logged and
    /// ignored. May be called again after [`Self::end`], which restores the
    /// profile's default rotation.
    pub fn begin(&mut self) -> Result<(), Error> {
        self.ready = false;

        #[cfg(feature = "defmt")]
        defmt::info!("Initialising hardware: {=str}", self.profile.name);

        self.init_display().map_err(|e| {
            #[cfg(feature = "defmt")]
            defmt::error!("Display initialisation failed");
            e
        })?;

        self.touch.init().map_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::error!(
                "Touch initialisation failed: {}",
                defmt::Debug2Format(&_e)
            );
            Error::TouchInitFailed
        })?;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Touch ready: {=str} on {=str}",
            self.profile.touch.controller.name(),
            self.profile.touch.spi_bus.name()
        );

        if let Some(backlight) = self.profile.backlight {
            let level = backlight.pwm.map_or(100, |pwm| pwm.default_percent);
            if let Err(_e) = self.apply_brightness(level) {
                #[cfg(feature = "defmt")]
                defmt::warn!("Backlight initialisation failed: {}", _e);
            }
        }

        for command in self.profile.display.init_commands {
            self.display
                .write_command(command.command, command.params)
                .map_err(|_e| {
                    #[cfg(feature = "defmt")]
                    defmt::error!(
                        "Init command {=u8:#x} failed: {}",
                        command.command,
                        defmt::Debug2Format(&_e)
                    );
                    Error::DisplayInitFailed
                })?;
        }

        self.ready = true;
        self.print_hardware_info();
        Ok(())
    }

    fn init_display(&mut self) -> Result<(), Error> {
        let display = &self.profile.display;

        self.display
            .init()
            .map_err(|_e| {
                #[cfg(feature = "defmt")]
                defmt::error!("{}", defmt::Debug2Format(&_e));
                Error::DisplayInitFailed
            })?;

        self.rotation = display.default_rotation;
        self.display
            .set_rotation(self.rotation)
            .map_err(|_| Error::DisplayInitFailed)?;
        self.display
            .invert_colors(display.colors_inverted)
            .map_err(|_| Error::DisplayInitFailed)?;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Display ready: {=u16}x{=u16}, rotation {=u8}",
            display.width,
            display.height,
            u8::from(self.rotation)
        );
        Ok(())
    }

    /// Marks the hardware as stopped. Drivers are left as they are.
    pub fn end(&mut self) {
        self.ready = false;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    fn ensure_ready(&self) -> Result<(), Error> {
        if self.ready { Ok(()) } else { Err(Error::NotReady) }
    }

    pub fn set_display_rotation(&mut self, rotation: Rotation) -> Result<(), Error> {
        self.ensure_ready()?;
        self.display.set_rotation(rotation).map_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::warn!("Rotation change failed: {}", defmt::Debug2Format(&_e));
            Error::DisplayWrite
        })?;
        self.rotation = rotation;
        Ok(())
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Effective display size for the current rotation, from the profile.
    pub fn display_size(&self) -> Size {
        self.profile.display.size_for(self.rotation)
    }

    /// Sets the backlight, clamping `percent` to `0..=100`.
    ///
    /// Does nothing on boards without backlight control. Digital backlights
    /// switch on above 50 %.
    pub fn set_display_brightness(&mut self, percent: i32) -> Result<(), Error> {
        self.ensure_ready()?;
        if !self.has_backlight_control() {
            return Ok(());
        }
        let percent = percent.clamp(0, 100) as u8;
        self.apply_brightness(percent)
    }

    fn apply_brightness(&mut self, percent: u8) -> Result<(), Error> {
        self.backlight.set_level(percent).map_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::warn!("Backlight write failed: {}", defmt::Debug2Format(&_e));
            Error::Backlight
        })?;
        self.brightness = percent;
        Ok(())
    }

    /// Last brightness applied, in percent.
    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn invert_display(&mut self, invert: bool) -> Result<(), Error> {
        self.ensure_ready()?;
        self.display
            .invert_colors(invert)
            .map_err(|_| Error::DisplayWrite)
    }

    pub fn is_touch_pressed(&mut self) -> Result<bool, Error> {
        self.ensure_ready()?;
        self.touch.touched().map_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::warn!("Touch read failed: {}", defmt::Debug2Format(&_e));
            Error::TouchRead
        })
    }

    /// Reads the touch controller once.
    pub fn touch_sample(&mut self) -> Result<TouchSample, Error> {
        if !self.is_touch_pressed()? {
            return Ok(TouchSample::released());
        }
        let raw = self.touch.read_raw().map_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::warn!("Touch read failed: {}", defmt::Debug2Format(&_e));
            Error::TouchRead
        })?;
        Ok(TouchSample::pressed(raw.x, raw.y))
    }

    /// The touch location in pixels for the current rotation, or
    /// [`TouchPoint::INVALID`] when nothing is pressed.
    pub fn touch_point(&mut self) -> Result<TouchPoint, Error> {
        let sample = self.touch_sample()?;
        Ok(map_touch(&sample, self.profile, self.rotation))
    }

    /// Maximum number of simultaneous touch points.
    pub fn touch_count(&self) -> u8 {
        self.profile.touch.multipoint
    }

    /// Fills `points` with the current touches and returns how many are
    /// valid. The remaining slots are set to [`TouchPoint::INVALID`].
    ///
    /// The resistive controllers supported here report at most one point.
    pub fn touch_points(&mut self, points: &mut [TouchPoint]) -> Result<usize, Error> {
        self.ensure_ready()?;
        points.fill(TouchPoint::INVALID);
        let Some(first) = points.first_mut() else {
            return Ok(0);
        };

        let point = self.touch_point()?;
        if point.is_valid() {
            *first = point;
            Ok(1)
        } else {
            Ok(0)
        }
    }

    /// Compares the live display size with the profile and re-initialises
    /// the touch controller.
    ///
    /// Both checks run; the display mismatch is reported first.
    pub fn validate_hardware(&mut self) -> Result<(), Error> {
        self.ensure_ready()?;

        let expected = self.display_size();
        let actual = self.display.size();
        let display = if expected == actual {
            Ok(())
        } else {
            #[cfg(feature = "defmt")]
            defmt::error!(
                "Display size mismatch. Expected: {=u32}x{=u32}, got: {=u32}x{=u32}",
                expected.width,
                expected.height,
                actual.width,
                actual.height
            );
            Err(Error::DisplaySizeMismatch { expected, actual })
        };

        let touch = self.touch.init().map_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::error!("Touch controller not responding: {}", defmt::Debug2Format(&_e));
            Error::TouchInitFailed
        });

        display.and(touch)
    }

    pub fn profile(&self) -> &'p HardwareProfile {
        self.profile
    }

    pub fn profile_name(&self) -> &'static str {
        self.profile.name
    }

    pub fn display_controller(&self) -> DisplayController {
        self.profile.display.controller
    }

    pub fn touch_controller(&self) -> TouchController {
        self.profile.touch.controller
    }

    pub fn has_multi_touch(&self) -> bool {
        self.profile.has_multi_touch()
    }

    pub fn has_backlight_control(&self) -> bool {
        self.profile.features.backlight_control
    }

    pub fn has_pwm_backlight(&self) -> bool {
        self.profile.has_pwm_backlight()
    }

    pub fn is_backlight_inverted(&self) -> bool {
        self.profile.is_backlight_inverted()
    }

    pub fn are_colors_inverted(&self) -> bool {
        self.profile.display.colors_inverted
    }

    pub fn has_rgb_led(&self) -> bool {
        self.profile.features.rgb_led
    }

    pub fn has_rs485(&self) -> bool {
        self.profile.features.rs485
    }

    pub fn has_sd_card(&self) -> bool {
        self.profile.features.sd_card
    }

    pub fn has_speaker(&self) -> bool {
        self.profile.features.speaker
    }

    pub fn has_wifi(&self) -> bool {
        self.profile.features.wifi
    }

    pub fn has_bluetooth(&self) -> bool {
        self.profile.features.bluetooth
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn touch_mut(&mut self) -> &mut T {
        &mut self.touch
    }

    pub fn backlight_mut(&mut self) -> &mut B {
        &mut self.backlight
    }

    pub fn release(self) -> (D, T, B) {
        (self.display, self.touch, self.backlight)
    }

    /// Writes the hardware summary, one item per line.
    pub fn write_hardware_info<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        let p = self.profile;
        writeln!(out, "=== HARDWARE INFORMATION ===")?;
        writeln!(out, "Profile: {} v{}", p.name, p.version)?;
        writeln!(
            out,
            "Display: {} ({}x{})",
            p.display.controller.name(),
            p.display.width,
            p.display.height
        )?;
        writeln!(
            out,
            "Touch: {} ({}, {} points)",
            p.touch.controller.name(),
            p.touch.spi_bus.name(),
            self.touch_count()
        )?;
        if let Some(backlight) = p.backlight {
            writeln!(
                out,
                "Backlight: Pin {} ({}, {})",
                backlight.pin,
                if backlight.inverted { "inverted" } else { "normal" },
                if backlight.pwm.is_some() { "PWM" } else { "digital" }
            )?;
        }
        write!(out, "Features:")?;
        for (enabled, name) in self.feature_names() {
            if enabled {
                write!(out, " {name}")?;
            }
        }
        writeln!(out)?;
        writeln!(out, "============================")
    }

    fn feature_names(&self) -> [(bool, &'static str); 9] {
        [
            (self.has_multi_touch(), "MultiTouch"),
            (self.has_backlight_control(), "Backlight"),
            (self.are_colors_inverted(), "ColorInv"),
            (self.has_rgb_led(), "RGB-LED"),
            (self.has_rs485(), "RS485"),
            (self.has_sd_card(), "SD"),
            (self.has_speaker(), "Speaker"),
            (self.has_wifi(), "WiFi"),
            (self.has_bluetooth(), "Bluetooth"),
        ]
    }

    /// Logs the hardware summary.
    pub fn print_hardware_info(&self) {
        #[cfg(feature = "defmt")]
        {
            let p = self.profile;
            defmt::info!("=== HARDWARE INFORMATION ===");
            defmt::info!("Profile: {=str} v{=str}", p.name, p.version);
            defmt::info!(
                "Display: {=str} ({=u16}x{=u16})",
                p.display.controller.name(),
                p.display.width,
                p.display.height
            );
            defmt::info!(
                "Touch: {=str} ({=str}, {=u8} points)",
                p.touch.controller.name(),
                p.touch.spi_bus.name(),
                self.touch_count()
            );
            if let Some(backlight) = p.backlight {
                defmt::info!(
                    "Backlight: Pin {=u8} ({=str}, {=str})",
                    backlight.pin,
                    if backlight.inverted { "inverted" } else { "normal" },
                    if backlight.pwm.is_some() { "PWM" } else { "digital" }
                );
            }
            for (enabled, name) in self.feature_names() {
                if enabled {
                    defmt::info!("Feature: {=str}", name);
                }
            }
        }
    }
}
