use std::{
    cell::RefCell,
    rc::Rc,
};

use embedded_graphics::geometry::{
    Point,
    Size,
};
use esp32_touchpanel::{
    BacklightDriver,
    DisplayDriver,
    Error,
    HardwareManager,
    HardwareProfile,
    ProfileId,
    Rotation,
    TouchDriver,
    TouchPoint,
    registry::{
        self,
        ESP32_2432S028R,
        ESP32_GENERIC,
        ESP32_TZT_24,
    },
};

type Log = Rc<RefCell<Vec<String>>>;

struct MockDisplay {
    log: Log,
    native: Size,
    rotation: Rotation,
    inverted: bool,
    fail_init: bool,
    size_override: Option<Size>,
}

impl MockDisplay {
    fn new(log: &Log, profile: &HardwareProfile) -> Self {
        Self {
            log: log.clone(),
            native: profile.display.size(),
            rotation: Rotation::Portrait,
            inverted: false,
            fail_init: false,
            size_override: None,
        }
    }
}

impl DisplayDriver for MockDisplay {
    type Error = &'static str;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push("display.init".into());
        if self.fail_init { Err("no display") } else { Ok(()) }
    }

    fn set_rotation(&mut self, rotation: Rotation) -> Result<(), Self::Error> {
        self.log
            .borrow_mut()
            .push(format!("display.rotation {}", u8::from(rotation)));
        self.rotation = rotation;
        Ok(())
    }

    fn invert_colors(&mut self, invert: bool) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(format!("display.invert {invert}"));
        self.inverted = invert;
        Ok(())
    }

    fn size(&self) -> Size {
        if let Some(size) = self.size_override {
            return size;
        }
        if self.rotation.is_landscape() {
            Size::new(self.native.height, self.native.width)
        } else {
            self.native
        }
    }

    fn write_command(&mut self, command: u8, params: &[u8]) -> Result<(), Self::Error> {
        self.log
            .borrow_mut()
            .push(format!("display.command {command:#04x} {params:?}"));
        Ok(())
    }
}

struct MockTouch {
    log: Log,
    raw: Option<Point>,
    fail_init: bool,
    fail_read: bool,
}

impl MockTouch {
    fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            raw: None,
            fail_init: false,
            fail_read: false,
        }
    }
}

impl TouchDriver for MockTouch {
    type Error = &'static str;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push("touch.init".into());
        if self.fail_init { Err("no touch") } else { Ok(()) }
    }

    fn touched(&mut self) -> Result<bool, Self::Error> {
        if self.fail_read {
            return Err("spi");
        }
        Ok(self.raw.is_some())
    }

    fn read_raw(&mut self) -> Result<Point, Self::Error> {
        self.raw.ok_or("released")
    }
}

struct MockBacklight {
    log: Log,
    level: Option<u8>,
    fail: bool,
}

impl MockBacklight {
    fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            level: None,
            fail: false,
        }
    }
}

impl BacklightDriver for MockBacklight {
    type Error = &'static str;

    fn set_level(&mut self, percent: u8) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(format!("backlight {percent}"));
        if self.fail {
            return Err("ledc");
        }
        self.level = Some(percent);
        Ok(())
    }
}

type Manager<'p> = HardwareManager<'p, MockDisplay, MockTouch, MockBacklight>;

fn manager(profile: &HardwareProfile) -> (Manager<'_>, Log) {
    let log = Log::default();
    let hw = HardwareManager::new(
        profile,
        MockDisplay::new(&log, profile),
        MockTouch::new(&log),
        MockBacklight::new(&log),
    )
    .unwrap();
    (hw, log)
}

fn started(profile: &HardwareProfile) -> (Manager<'_>, Log) {
    let (mut hw, log) = manager(profile);
    hw.begin().unwrap();
    log.borrow_mut().clear();
    (hw, log)
}

#[test]
fn invalid_profile_is_rejected_before_any_driver_call() {
    let mut profile = ESP32_2432S028R;
    profile.touch.calibration.min_x = profile.touch.calibration.max_x;

    let log = Log::default();
    let result = HardwareManager::new(
        &profile,
        MockDisplay::new(&log, &profile),
        MockTouch::new(&log),
        MockBacklight::new(&log),
    );
    assert!(matches!(result, Err(Error::InvalidCalibration)));
    assert!(log.borrow().is_empty());
}

#[test]
fn hardware_calls_need_begin() {
    let (mut hw, log) = manager(&ESP32_2432S028R);
    assert!(!hw.is_ready());
    assert_eq!(hw.touch_point(), Err(Error::NotReady));
    assert_eq!(hw.is_touch_pressed(), Err(Error::NotReady));
    assert_eq!(hw.set_display_brightness(50), Err(Error::NotReady));
    assert_eq!(hw.set_display_rotation(Rotation::Landscape), Err(Error::NotReady));
    assert_eq!(hw.validate_hardware(), Err(Error::NotReady));
    assert_eq!(hw.touch_points(&mut [TouchPoint::INVALID; 2]), Err(Error::NotReady));
    assert!(log.borrow().is_empty());
}

#[test]
fn begin_brings_up_drivers_in_order() {
    let (mut hw, log) = manager(&ESP32_2432S028R);
    hw.begin().unwrap();

    assert!(hw.is_ready());
    assert_eq!(
        *log.borrow(),
        [
            "display.init",
            "display.rotation 0",
            "display.invert false",
            "touch.init",
            "backlight 100",
            "display.command 0x2a [0, 0, 1, 63]",
            "display.command 0x2b [0, 0, 0, 239]",
        ]
    );
    assert_eq!(hw.brightness(), 100);
    assert_eq!(hw.rotation(), Rotation::Portrait);
}

#[test]
fn begin_applies_default_rotation() {
    let (hw, _) = started(&ESP32_TZT_24);
    assert_eq!(hw.rotation(), Rotation::PortraitInverted);

    let (hw, _) = started(&ESP32_GENERIC);
    assert_eq!(hw.rotation(), Rotation::Landscape);
    assert_eq!(hw.display_size(), Size::new(240, 320));
}

#[test]
fn display_failure_aborts_begin() {
    let (mut hw, log) = manager(&ESP32_2432S028R);
    hw.display_mut().fail_init = true;
    assert_eq!(hw.begin(), Err(Error::DisplayInitFailed));
    assert!(!hw.is_ready());
    assert_eq!(*log.borrow(), ["display.init"]);
}

#[test]
fn touch_failure_aborts_begin() {
    let (mut hw, log) = manager(&ESP32_2432S028R);
    hw.touch_mut().fail_init = true;
    assert_eq!(hw.begin(), Err(Error::TouchInitFailed));
    assert!(!hw.is_ready());
    assert!(!log.borrow().iter().any(|entry| entry.starts_with("backlight")));
}

#[test]
fn backlight_failure_is_not_fatal() {
    let (mut hw, _) = manager(&ESP32_2432S028R);
    hw.backlight_mut().fail = true;
    assert_eq!(hw.begin(), Ok(()));
    assert!(hw.is_ready());
    assert_eq!(hw.brightness(), 0);
}

#[test]
fn end_and_begin_again_restores_default_rotation() {
    let (mut hw, _) = started(&ESP32_2432S028R);
    hw.set_display_rotation(Rotation::LandscapeInverted).unwrap();
    hw.end();
    assert!(!hw.is_ready());
    assert_eq!(hw.touch_point(), Err(Error::NotReady));

    hw.begin().unwrap();
    assert_eq!(hw.rotation(), Rotation::Portrait);
    assert_eq!(hw.display_mut().rotation, Rotation::Portrait);
}

#[test]
fn touch_point_maps_raw_sample() {
    let (mut hw, _) = started(&ESP32_2432S028R);

    assert_eq!(hw.touch_point(), Ok(TouchPoint::INVALID));
    assert_eq!(hw.is_touch_pressed(), Ok(false));

    hw.touch_mut().raw = Some(Point::new(2046, 2059));
    assert_eq!(hw.is_touch_pressed(), Ok(true));
    assert_eq!(hw.touch_point(), Ok(TouchPoint::new(159, 119)));

    hw.touch_mut().raw = Some(Point::new(320, 376));
    assert_eq!(hw.touch_point(), Ok(TouchPoint::new(0, 0)));

    hw.touch_mut().raw = Some(Point::new(3773, 3743));
    assert_eq!(hw.touch_point(), Ok(TouchPoint::new(319, 239)));
}

#[test]
fn touch_point_follows_rotation() {
    let (mut hw, _) = started(&ESP32_2432S028R);
    hw.touch_mut().raw = Some(Point::new(3773, 3743));

    hw.set_display_rotation(Rotation::Landscape).unwrap();
    assert_eq!(hw.display_size(), Size::new(240, 320));
    assert_eq!(hw.touch_point(), Ok(TouchPoint::new(239, 0)));

    hw.set_display_rotation(Rotation::PortraitInverted).unwrap();
    assert_eq!(hw.touch_point(), Ok(TouchPoint::new(0, 0)));
}

#[test]
fn touch_read_errors_are_reported() {
    let (mut hw, _) = started(&ESP32_2432S028R);
    hw.touch_mut().fail_read = true;
    assert_eq!(hw.touch_point(), Err(Error::TouchRead));
}

#[test]
fn touch_points_reports_single_contact() {
    let (mut hw, _) = started(&ESP32_2432S028R);
    assert_eq!(hw.touch_count(), 1);

    let mut points = [TouchPoint::new(7, 7); 3];
    assert_eq!(hw.touch_points(&mut points), Ok(0));
    assert_eq!(points, [TouchPoint::INVALID; 3]);

    hw.touch_mut().raw = Some(Point::new(2046, 2059));
    let mut points = [TouchPoint::new(7, 7); 3];
    assert_eq!(hw.touch_points(&mut points), Ok(1));
    assert_eq!(
        points,
        [TouchPoint::new(159, 119), TouchPoint::INVALID, TouchPoint::INVALID]
    );

    assert_eq!(hw.touch_points(&mut []), Ok(0));
}

#[test]
fn brightness_is_clamped() {
    let (mut hw, log) = started(&ESP32_2432S028R);

    hw.set_display_brightness(150).unwrap();
    assert_eq!(hw.brightness(), 100);
    hw.set_display_brightness(-20).unwrap();
    assert_eq!(hw.brightness(), 0);
    hw.set_display_brightness(42).unwrap();
    assert_eq!(hw.backlight_mut().level, Some(42));

    assert_eq!(*log.borrow(), ["backlight 100", "backlight 0", "backlight 42"]);
}

#[test]
fn brightness_without_backlight_control_is_a_no_op() {
    let mut profile = ESP32_2432S028R;
    profile.backlight = None;
    profile.features.backlight_control = false;
    profile.features.pwm_backlight = false;

    let (mut hw, log) = started(&profile);
    assert!(!hw.has_backlight_control());
    assert_eq!(hw.set_display_brightness(80), Ok(()));
    assert!(log.borrow().is_empty());
    assert_eq!(hw.backlight_mut().level, None);
}

#[test]
fn invert_display_reaches_driver() {
    let (mut hw, _) = started(&ESP32_2432S028R);
    hw.invert_display(true).unwrap();
    assert!(hw.display_mut().inverted);
    assert!(!hw.are_colors_inverted());
}

#[test]
fn validate_hardware_checks_size_and_touch() {
    let (mut hw, log) = started(&ESP32_2432S028R);
    assert_eq!(hw.validate_hardware(), Ok(()));
    assert_eq!(*log.borrow(), ["touch.init"]);

    hw.set_display_rotation(Rotation::Landscape).unwrap();
    assert_eq!(hw.validate_hardware(), Ok(()));

    hw.display_mut().size_override = Some(Size::new(320, 480));
    hw.touch_mut().fail_init = true;
    assert_eq!(
        hw.validate_hardware(),
        Err(Error::DisplaySizeMismatch {
            expected: Size::new(240, 320),
            actual: Size::new(320, 480),
        })
    );

    hw.display_mut().size_override = None;
    assert_eq!(hw.validate_hardware(), Err(Error::TouchInitFailed));
}

#[test]
fn feature_queries_follow_profile() {
    let (hw, _) = manager(&ESP32_GENERIC);
    assert_eq!(hw.profile_name(), "ESP32-Generic");
    assert!(!hw.has_multi_touch());
    assert!(hw.has_backlight_control());
    assert!(hw.has_pwm_backlight());
    assert!(!hw.is_backlight_inverted());
    assert!(hw.has_rgb_led());
    assert!(hw.has_rs485());
    assert!(!hw.has_sd_card());
    assert!(!hw.has_speaker());
    assert!(hw.has_wifi());
    assert!(hw.has_bluetooth());
    assert_eq!(hw.display_controller().name(), "ILI9341");
    assert_eq!(hw.touch_controller().name(), "XPT2046");
}

#[test]
fn hardware_info_dump() {
    let (hw, _) = manager(&ESP32_TZT_24);
    let mut out = String::new();
    hw.write_hardware_info(&mut out).unwrap();

    assert_eq!(
        out,
        "=== HARDWARE INFORMATION ===\n\
         Profile: ESP32-TZT-2.4 v1.0\n\
         Display: ST7789 (240x320)\n\
         Touch: XPT2046 (HSPI, 1 points)\n\
         Backlight: Pin 27 (normal, PWM)\n\
         Features: Backlight RGB-LED RS485\n\
         ============================\n"
    );
}

#[test]
fn profiles_resolve_by_name() {
    for id in ProfileId::ALL {
        let profile = registry::resolve(id).unwrap();
        assert_eq!(id.build_name().parse::<ProfileId>(), Ok(id));
        assert_eq!(ProfileId::from_name(profile.name), Ok(id));
    }
    assert_eq!(
        ProfileId::from_name("ESP32_S3_BOX"),
        Err(Error::UnknownProfile)
    );
}

#[test]
fn default_selection_is_tzt() {
    // HW_PROFILE is not set for the test build.
    if option_env!("HW_PROFILE").is_none() {
        assert_eq!(ProfileId::selected(), Ok(ProfileId::Esp32Tzt24));
        let profile = registry::resolve_selected().unwrap();
        assert_eq!(profile.name, "ESP32-TZT-2.4");
    }
}
