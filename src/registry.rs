//! Built-in board profiles and profile selection.

use core::str::FromStr;

use fugit::HertzU32;

use crate::{
    Error,
    profile::{
        AxisInversion,
        BacklightConfig,
        Calibration,
        DisplayConfig,
        DisplayController,
        DisplayPins,
        Features,
        HardwareProfile,
        PanelCommand,
        PwmConfig,
        RgbLedPins,
        Rotation,
        Rs485Config,
        SpiBus,
        TouchConfig,
        TouchController,
        TouchMapping,
        TouchPins,
    },
};

/// Identifies one of the built-in profiles.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileId {
    /// TZT 2.4" ST7789 board.
    Esp32Tzt24,
    /// "Cheap yellow display", 2.8" ILI9341.
    #[allow(non_camel_case_types)]
    Esp32_2432S028R,
    /// Template for an uncalibrated ILI9341 board.
    Esp32Generic,
}

impl ProfileId {
    pub const ALL: [ProfileId; 3] = [
        ProfileId::Esp32Tzt24,
        ProfileId::Esp32_2432S028R,
        ProfileId::Esp32Generic,
    ];

    /// Used when no profile has been selected at build time.
    pub const DEFAULT: ProfileId = ProfileId::Esp32Tzt24;

    /// Build identifier as accepted in `HW_PROFILE`.
    pub const fn build_name(self) -> &'static str {
        match self {
            ProfileId::Esp32Tzt24 => "ESP32_TZT_24",
            ProfileId::Esp32_2432S028R => "ESP32_2432S028R",
            ProfileId::Esp32Generic => "ESP32_GENERIC",
        }
    }

    /// Accepts the build identifier or the profile display name.
    pub fn from_name(name: &str) -> Result<Self, Error> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|id| name == id.build_name() || name == id.profile().name)
            .ok_or(Error::UnknownProfile)
    }

    /// The profile chosen with `HW_PROFILE` at build time.
    pub fn selected() -> Result<Self, Error> {
        match option_env!("HW_PROFILE") {
            Some(name) => Self::from_name(name),
            None => Ok(Self::DEFAULT),
        }
    }

    const fn profile(self) -> &'static HardwareProfile {
        match self {
            ProfileId::Esp32Tzt24 => &ESP32_TZT_24,
            ProfileId::Esp32_2432S028R => &ESP32_2432S028R,
            ProfileId::Esp32Generic => &ESP32_GENERIC,
        }
    }
}

impl FromStr for ProfileId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Returns the validated profile for `id`.
pub fn resolve(id: ProfileId) -> Result<&'static HardwareProfile, Error> {
    let profile = id.profile();
    profile.validate()?;
    Ok(profile)
}

/// Resolves the profile selected at build time.
pub fn resolve_selected() -> Result<&'static HardwareProfile, Error> {
    resolve(ProfileId::selected()?)
}

const ESP32_DISPLAY_PINS: DisplayPins = DisplayPins {
    miso: Some(12),
    mosi: Some(13),
    sclk: Some(14),
    cs: Some(15),
    dc: Some(2),
    rst: None,
};

const LEDC_BACKLIGHT: PwmConfig = PwmConfig {
    channel: 0,
    frequency: HertzU32::Hz(5000),
    resolution_bits: 8,
    default_percent: 100,
};

// Touch controller on its own VSPI bus.
const CYD_TOUCH_PINS: TouchPins = TouchPins {
    irq: Some(36),
    mosi: Some(32),
    miso: Some(39),
    clk: Some(25),
    cs: Some(33),
};

const RS485_UART2: Rs485Config = Rs485Config {
    rx: 22,
    tx: 27,
    uart: 2,
    baud: 57600,
};

pub const ESP32_TZT_24: HardwareProfile = HardwareProfile {
    name: "ESP32-TZT-2.4",
    version: "1.0",
    description: "TZT ESP32 2.4 inch ST7789 Display",
    display: DisplayConfig {
        controller: DisplayController::St7789,
        width: 240,
        height: 320,
        default_rotation: Rotation::PortraitInverted,
        colors_inverted: false,
        pins: ESP32_DISPLAY_PINS,
        spi_frequency: HertzU32::MHz(80),
        read_spi_frequency: HertzU32::MHz(80),
        dma: true,
        init_commands: &[],
    },
    touch: TouchConfig {
        controller: TouchController::Xpt2046,
        // Touch shares HSPI with the display.
        spi_bus: SpiBus::Primary,
        multipoint: 1,
        pins: TouchPins {
            irq: Some(36),
            mosi: Some(13),
            miso: Some(12),
            clk: Some(14),
            cs: Some(33),
        },
        spi_frequency: HertzU32::kHz(2500),
        calibration: Calibration {
            min_x: 400,
            max_x: 3900,
            min_y: 400,
            max_y: 3900,
        },
        threshold: 600,
        calibrated: true,
        invert_x: true,
        invert_y: false,
        rotation_inversion: [AxisInversion::NONE; 4],
        mappings: TouchMapping::GENERIC,
    },
    backlight: Some(BacklightConfig {
        pin: 27,
        inverted: false,
        pwm: Some(LEDC_BACKLIGHT),
    }),
    led: Some(RgbLedPins {
        red: 4,
        green: 17,
        blue: 16,
        inverted: true,
    }),
    rs485: Some(Rs485Config {
        tx: 21,
        ..RS485_UART2
    }),
    features: Features {
        multi_touch: false,
        backlight_control: true,
        pwm_backlight: true,
        rgb_led: true,
        rs485: true,
        sd_card: false,
        speaker: false,
        wifi: false,
        bluetooth: false,
    },
};

// Column 0..=319, row 0..=239.
const ILI9341_LANDSCAPE_WINDOW: &[PanelCommand] = &[
    PanelCommand {
        command: 0x2A,
        params: &[0x00, 0x00, 0x01, 0x3F],
    },
    PanelCommand {
        command: 0x2B,
        params: &[0x00, 0x00, 0x00, 0xEF],
    },
];

pub const ESP32_2432S028R: HardwareProfile = HardwareProfile {
    name: "ESP32-2432S028R",
    version: "1.0",
    description: "ESP32-2432S028R 2.8 inch ILI9341 Display",
    display: DisplayConfig {
        controller: DisplayController::Ili9341,
        width: 320,
        height: 240,
        default_rotation: Rotation::Portrait,
        colors_inverted: false,
        pins: ESP32_DISPLAY_PINS,
        spi_frequency: HertzU32::MHz(40),
        read_spi_frequency: HertzU32::MHz(20),
        dma: true,
        init_commands: ILI9341_LANDSCAPE_WINDOW,
    },
    touch: TouchConfig {
        controller: TouchController::Xpt2046,
        spi_bus: SpiBus::Secondary,
        multipoint: 1,
        pins: CYD_TOUCH_PINS,
        spi_frequency: HertzU32::kHz(2500),
        calibration: Calibration {
            min_x: 320,
            max_x: 3773,
            min_y: 376,
            max_y: 3743,
        },
        threshold: 600,
        calibrated: true,
        invert_x: false,
        invert_y: false,
        rotation_inversion: [AxisInversion::NONE; 4],
        mappings: TouchMapping::GENERIC,
    },
    backlight: Some(BacklightConfig {
        pin: 21,
        inverted: false,
        pwm: Some(LEDC_BACKLIGHT),
    }),
    led: Some(RgbLedPins {
        red: 4,
        green: 16,
        blue: 17,
        inverted: false,
    }),
    rs485: Some(RS485_UART2),
    features: Features {
        multi_touch: false,
        backlight_control: true,
        pwm_backlight: true,
        rgb_led: true,
        rs485: true,
        sd_card: false,
        speaker: false,
        wifi: false,
        bluetooth: false,
    },
};

pub const ESP32_GENERIC: HardwareProfile = HardwareProfile {
    name: "ESP32-Generic",
    version: "1.0",
    description: "Generic ESP32 Display Template",
    display: DisplayConfig {
        controller: DisplayController::Ili9341,
        width: 320,
        height: 240,
        default_rotation: Rotation::Landscape,
        colors_inverted: false,
        pins: ESP32_DISPLAY_PINS,
        spi_frequency: HertzU32::MHz(40),
        read_spi_frequency: HertzU32::MHz(20),
        dma: true,
        init_commands: &[],
    },
    touch: TouchConfig {
        controller: TouchController::Xpt2046,
        spi_bus: SpiBus::Secondary,
        multipoint: 1,
        pins: CYD_TOUCH_PINS,
        spi_frequency: HertzU32::kHz(2500),
        calibration: Calibration {
            min_x: 200,
            max_x: 3800,
            min_y: 200,
            max_y: 3800,
        },
        threshold: 600,
        calibrated: false,
        invert_x: false,
        invert_y: false,
        rotation_inversion: [AxisInversion::NONE; 4],
        mappings: TouchMapping::GENERIC,
    },
    backlight: Some(BacklightConfig {
        pin: 21,
        inverted: false,
        pwm: Some(LEDC_BACKLIGHT),
    }),
    led: Some(RgbLedPins {
        red: 4,
        green: 16,
        blue: 17,
        inverted: false,
    }),
    rs485: Some(RS485_UART2),
    features: Features {
        multi_touch: false,
        backlight_control: true,
        pwm_backlight: true,
        rgb_led: true,
        rs485: true,
        sd_card: false,
        speaker: false,
        wifi: true,
        bluetooth: true,
    },
};

const _: () = assert!(ESP32_TZT_24.validate().is_ok());
const _: () = assert!(ESP32_2432S028R.validate().is_ok());
const _: () = assert!(ESP32_GENERIC.validate().is_ok());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_profile_resolves() {
        for id in ProfileId::ALL {
            let profile = resolve(id).unwrap();
            assert_eq!(profile.validate(), Ok(()));
            assert_eq!(ProfileId::from_name(id.build_name()), Ok(id));
        }
    }

    #[test]
    fn names_resolve_to_their_profile() {
        assert_eq!(
            ProfileId::from_name("ESP32_2432S028R"),
            Ok(ProfileId::Esp32_2432S028R)
        );
        assert_eq!(
            ProfileId::from_name("ESP32-TZT-2.4"),
            Ok(ProfileId::Esp32Tzt24)
        );
        assert_eq!(
            "ESP32_GENERIC".parse::<ProfileId>(),
            Ok(ProfileId::Esp32Generic)
        );
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert_eq!(
            ProfileId::from_name("ESP32_UNKNOWN"),
            Err(Error::UnknownProfile)
        );
        assert_eq!(ProfileId::from_name(""), Err(Error::UnknownProfile));
        assert_eq!(
            "esp32_tzt_24".parse::<ProfileId>(),
            Err(Error::UnknownProfile)
        );
    }

    #[test]
    fn tzt_profile_values() {
        let profile = resolve(ProfileId::Esp32Tzt24).unwrap();
        assert_eq!(profile.display.controller, DisplayController::St7789);
        assert_eq!(profile.display.default_rotation, Rotation::PortraitInverted);
        assert_eq!(profile.touch.spi_bus, SpiBus::Primary);
        assert_eq!(profile.touch.pins.cs, Some(33));
        assert!(profile.touch.invert_x);
        assert_eq!(profile.backlight.map(|b| b.pin), Some(27));
        assert_eq!(profile.rs485.map(|r| r.tx), Some(21));
    }

    #[test]
    fn cyd_profile_values() {
        let profile = resolve(ProfileId::Esp32_2432S028R).unwrap();
        assert_eq!(profile.display.width, 320);
        assert_eq!(profile.display.height, 240);
        assert_eq!(profile.touch.spi_bus, SpiBus::Secondary);
        assert_eq!(
            profile.touch.calibration,
            Calibration {
                min_x: 320,
                max_x: 3773,
                min_y: 376,
                max_y: 3743
            }
        );
        assert_eq!(profile.display.init_commands.len(), 2);
        assert_eq!(profile.display.pins.rst, None);
    }

    #[test]
    fn generic_profile_is_uncalibrated() {
        let profile = resolve(ProfileId::Esp32Generic).unwrap();
        assert!(!profile.touch.calibrated);
        assert!(profile.features.wifi);
        assert_eq!(profile.display.default_rotation, Rotation::Landscape);
    }
}
