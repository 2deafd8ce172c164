//! ESP32 bring-up: builds the board drivers from a [`HardwareProfile`].
//!
//! The display always sits on SPI2 (HSPI). The touch controller either
//! shares that bus or gets SPI3 (VSPI) to itself, as the profile says. Each
//! device on a shared bus carries its own SPI clock, so the display keeps its
//! 40-80 MHz while the XPT2046 is read at a few MHz.
//!
//! A backlight with a PWM config is dimmed through an LEDC low-speed
//! channel; one without is switched as a plain GPIO.

use core::{
    cell::RefCell,
    convert::Infallible,
};

use embassy_embedded_hal::shared_bus::blocking::spi::SpiDeviceWithConfig;
use embassy_sync::blocking_mutex::{
    Mutex,
    raw::CriticalSectionRawMutex,
};
use embedded_graphics::{
    Pixel,
    draw_target::DrawTarget,
    geometry::{
        OriginDimensions,
        Size,
    },
    pixelcolor::Rgb565,
};
use esp_hal::{
    Blocking,
    clock::CpuClock,
    delay::Delay,
    gpio::{
        AnyPin,
        Input,
        InputConfig,
        Level,
        Output,
        OutputConfig,
        Pull,
    },
    ledc::{
        LSGlobalClkSource,
        Ledc,
        LowSpeed,
        channel::{
            self,
            Channel,
            ChannelIFace,
        },
        timer::{
            self,
            LSClockSource,
            Timer,
            TimerIFace,
        },
    },
    peripherals::{
        LEDC,
        Peripherals,
        SPI2,
        SPI3,
    },
    spi::{
        Mode,
        master::{
            Config as SpiConfig,
            Spi,
        },
    },
    time::Rate,
};
use fugit::HertzU32;
use mipidsi::{
    interface::{
        Interface,
        SpiInterface,
    },
    models::{
        ILI9341Rgb565,
        ST7789,
    },
};

use crate::{
    Error,
    backlight::{
        BacklightDriver,
        GpioBacklight,
        PwmBacklight,
    },
    display::{
        DisplayDriver,
        MipidsiDisplay,
        MipidsiError,
    },
    profile::{
        BacklightConfig,
        DisplayController,
        HardwareProfile,
        PwmConfig,
        Rotation,
        SpiBus,
    },
    touch::Xpt2046,
};

type Bus = Mutex<CriticalSectionRawMutex, RefCell<Spi<'static, Blocking>>>;
type BusDevice = SpiDeviceWithConfig<'static, CriticalSectionRawMutex, Spi<'static, Blocking>, Output<'static>>;
type Di = SpiInterface<'static, BusDevice, Output<'static>>;
type DiError = <Di as Interface>::Error;

pub type St7789Display = MipidsiDisplay<Di, ST7789, Delay>;
pub type Ili9341Display = MipidsiDisplay<Di, ILI9341Rgb565, Delay>;
pub type Touch = Xpt2046<BusDevice, Input<'static>>;

/// Bytes buffered per display SPI transaction.
const DISPLAY_BUFFER: usize = 512;

/// Initialise the chip at full clock and return the raw peripheral set.
///
/// Call this once at the top of your `main`.
#[must_use]
pub fn init() -> Peripherals {
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    esp_hal::init(config)
}

/// The display controllers this board support can drive.
pub enum EspDisplay {
    St7789(St7789Display),
    Ili9341(Ili9341Display),
}

impl DisplayDriver for EspDisplay {
    type Error = MipidsiError<DiError>;

    fn init(&mut self) -> Result<(), Self::Error> {
        match self {
            EspDisplay::St7789(d) => d.init(),
            EspDisplay::Ili9341(d) => d.init(),
        }
    }

    fn set_rotation(&mut self, rotation: Rotation) -> Result<(), Self::Error> {
        match self {
            EspDisplay::St7789(d) => d.set_rotation(rotation),
            EspDisplay::Ili9341(d) => d.set_rotation(rotation),
        }
    }

    fn invert_colors(&mut self, invert: bool) -> Result<(), Self::Error> {
        match self {
            EspDisplay::St7789(d) => d.invert_colors(invert),
            EspDisplay::Ili9341(d) => d.invert_colors(invert),
        }
    }

    fn size(&self) -> Size {
        match self {
            EspDisplay::St7789(d) => d.size(),
            EspDisplay::Ili9341(d) => d.size(),
        }
    }

    fn write_command(&mut self, command: u8, params: &[u8]) -> Result<(), Self::Error> {
        match self {
            EspDisplay::St7789(d) => d.write_command(command, params),
            EspDisplay::Ili9341(d) => d.write_command(command, params),
        }
    }
}

impl OriginDimensions for EspDisplay {
    fn size(&self) -> Size {
        DisplayDriver::size(self)
    }
}

impl DrawTarget for EspDisplay {
    type Color = Rgb565;
    type Error = MipidsiError<DiError>;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        match self {
            EspDisplay::St7789(d) => d
                .display()
                .ok_or(MipidsiError::Unavailable)?
                .draw_iter(pixels)
                .map_err(MipidsiError::Interface),
            EspDisplay::Ili9341(d) => d
                .display()
                .ok_or(MipidsiError::Unavailable)?
                .draw_iter(pixels)
                .map_err(MipidsiError::Interface),
        }
    }
}

/// The backlight as wired on the board.
pub enum Backlight {
    Pwm(PwmBacklight<Channel<'static, LowSpeed>>),
    Gpio(GpioBacklight<Output<'static>>),
}

impl BacklightDriver for Backlight {
    type Error = channel::Error;

    fn set_level(&mut self, percent: u8) -> Result<(), Self::Error> {
        match self {
            Backlight::Pwm(b) => b.set_level(percent),
            Backlight::Gpio(b) => b
                .set_level(percent)
                .map_err(|e: Infallible| match e {}),
        }
    }
}

/// Drivers for one board, ready to hand to
/// [`HardwareManager::new`](crate::HardwareManager::new).
pub struct Board {
    pub display: EspDisplay,
    pub touch: Touch,
    pub backlight: Option<Backlight>,
    /// Held high for boards with a wired display reset.
    _reset: Option<Output<'static>>,
}

impl Board {
    /// Claims the pins named by `profile` and sets up the SPI buses and the
    /// backlight PWM.
    ///
    /// Nothing is sent to the display or touch controller yet. Can only be
    /// called once; the bus, buffer and LEDC statics are not reusable.
    pub fn new(
        profile: &HardwareProfile,
        spi2: SPI2<'static>,
        spi3: SPI3<'static>,
        ledc: LEDC<'static>,
    ) -> Result<Self, Error> {
        profile.validate()?;
        if !matches!(
            profile.display.controller,
            DisplayController::St7789 | DisplayController::Ili9341
        ) {
            return Err(Error::UnsupportedController);
        }

        let pins = &profile.display.pins;
        let display_bus = Spi::new(spi2, spi_config(profile.display.spi_frequency))
            .map_err(|_| Error::DisplayInitFailed)?
            .with_sck(pin(pins.sclk)?)
            .with_mosi(pin(pins.mosi)?);
        let display_bus = match pins.miso {
            Some(_) => display_bus.with_miso(pin(pins.miso)?),
            None => display_bus,
        };
        let display_bus: &'static Bus =
            crate::mk_static!(Bus, Mutex::new(RefCell::new(display_bus)));

        let display_device = SpiDeviceWithConfig::new(
            display_bus,
            output(pins.cs, Level::High)?,
            spi_config(profile.display.spi_frequency),
        );
        let buffer = crate::mk_static!([u8; DISPLAY_BUFFER], [0_u8; DISPLAY_BUFFER]);
        let di = SpiInterface::new(display_device, output(pins.dc, Level::Low)?, buffer);

        let reset = match pins.rst {
            Some(_) => Some(output(pins.rst, Level::High)?),
            None => None,
        };

        let native = profile.display.size();
        let delay = Delay::new();
        let display = match profile.display.controller {
            DisplayController::St7789 => {
                EspDisplay::St7789(MipidsiDisplay::new(ST7789, di, native, delay))
            }
            _ => EspDisplay::Ili9341(MipidsiDisplay::new(ILI9341Rgb565, di, native, delay)),
        };

        let touch_pins = &profile.touch.pins;
        let touch_bus: &'static Bus = match profile.touch.spi_bus {
            SpiBus::Primary => display_bus,
            SpiBus::Secondary => {
                let bus = Spi::new(spi3, spi_config(profile.touch.spi_frequency))
                    .map_err(|_| Error::TouchInitFailed)?
                    .with_sck(pin(touch_pins.clk)?)
                    .with_mosi(pin(touch_pins.mosi)?)
                    .with_miso(pin(touch_pins.miso)?);
                crate::mk_static!(Bus, Mutex::new(RefCell::new(bus)))
            }
        };
        let touch_device = SpiDeviceWithConfig::new(
            touch_bus,
            output(touch_pins.cs, Level::High)?,
            spi_config(profile.touch.spi_frequency),
        );
        // GPIO34..39 have no internal pull resistors.
        let irq = Input::new(pin(touch_pins.irq)?, InputConfig::default().with_pull(Pull::None));
        let touch = Xpt2046::new(touch_device, irq, profile.touch.threshold);

        let backlight = match profile.backlight {
            Some(config) => Some(backlight(config, ledc)?),
            None => None,
        };

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Board pins claimed for {=str}, touch on {=str}",
            profile.name,
            profile.touch.spi_bus.name()
        );

        Ok(Self {
            display,
            touch,
            backlight,
            _reset: reset,
        })
    }
}

fn backlight(config: BacklightConfig, ledc: LEDC<'static>) -> Result<Backlight, Error> {
    let off = if config.inverted { Level::High } else { Level::Low };
    let pin = output(Some(config.pin), off)?;
    let Some(pwm) = config.pwm else {
        return Ok(Backlight::Gpio(GpioBacklight::new(pin, config.inverted)));
    };

    let mut ledc = Ledc::new(ledc);
    ledc.set_global_slow_clock(LSGlobalClkSource::APBClk);
    let ledc: &'static Ledc<'static> = crate::mk_static!(Ledc<'static>, ledc);

    let mut timer = ledc.timer::<LowSpeed>(timer::Number::Timer0);
    timer
        .configure(timer::config::Config {
            duty: ledc_duty(pwm)?,
            clock_source: LSClockSource::APBClk,
            frequency: Rate::from_hz(pwm.frequency.raw()),
        })
        .map_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::error!("LEDC timer: {}", defmt::Debug2Format(&_e));
            Error::Backlight
        })?;
    let timer: &'static Timer<'static, LowSpeed> =
        crate::mk_static!(Timer<'static, LowSpeed>, timer);

    let mut channel = ledc.channel(ledc_channel(pwm)?, pin);
    channel
        .configure(channel::config::Config {
            timer,
            duty_pct: 0,
            pin_config: channel::config::PinConfig::PushPull,
        })
        .map_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::error!("LEDC channel: {}", defmt::Debug2Format(&_e));
            Error::Backlight
        })?;

    Ok(Backlight::Pwm(PwmBacklight::new(channel, config.inverted)))
}

fn ledc_channel(pwm: PwmConfig) -> Result<channel::Number, Error> {
    Ok(match pwm.channel {
        0 => channel::Number::Channel0,
        1 => channel::Number::Channel1,
        2 => channel::Number::Channel2,
        3 => channel::Number::Channel3,
        4 => channel::Number::Channel4,
        5 => channel::Number::Channel5,
        6 => channel::Number::Channel6,
        7 => channel::Number::Channel7,
        _ => return Err(Error::InvalidBacklight),
    })
}

// APB at 80 MHz leaves at most 14 bits for the backlight frequencies used.
fn ledc_duty(pwm: PwmConfig) -> Result<timer::config::Duty, Error> {
    use timer::config::Duty;

    Ok(match pwm.resolution_bits {
        1 => Duty::Duty1Bit,
        2 => Duty::Duty2Bit,
        3 => Duty::Duty3Bit,
        4 => Duty::Duty4Bit,
        5 => Duty::Duty5Bit,
        6 => Duty::Duty6Bit,
        7 => Duty::Duty7Bit,
        8 => Duty::Duty8Bit,
        9 => Duty::Duty9Bit,
        10 => Duty::Duty10Bit,
        11 => Duty::Duty11Bit,
        12 => Duty::Duty12Bit,
        13 => Duty::Duty13Bit,
        14 => Duty::Duty14Bit,
        _ => return Err(Error::InvalidBacklight),
    })
}

fn spi_config(frequency: HertzU32) -> SpiConfig {
    SpiConfig::default()
        .with_mode(Mode::_0)
        .with_frequency(Rate::from_hz(frequency.raw()))
}

fn pin(number: Option<u8>) -> Result<AnyPin<'static>, Error> {
    let number = number.ok_or(Error::MissingPin)?;
    // SAFETY: profile pin numbers are unique per signal and each is claimed
    // exactly once, here.
    Ok(unsafe { AnyPin::steal(number) })
}

fn output(number: Option<u8>, level: Level) -> Result<Output<'static>, Error> {
    Ok(Output::new(pin(number)?, level, OutputConfig::default()))
}
