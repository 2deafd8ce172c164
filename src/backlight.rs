//! Display backlight control.

use core::{
    convert::Infallible,
    fmt::Debug,
};

use embedded_hal::{
    digital::OutputPin,
    pwm::SetDutyCycle,
};

use crate::mapper::map_range;

/// A backlight that can be set to a brightness in percent.
pub trait BacklightDriver {
    type Error: Debug;

    /// `percent` is already clamped to `0..=100`.
    fn set_level(&mut self, percent: u8) -> Result<(), Self::Error>;
}

/// Duty value for `percent` at `max_duty`, honouring an active-low output.
pub fn duty_for_percent(percent: u8, max_duty: u16, inverted: bool) -> u16 {
    let percent = i32::from(percent.min(100));
    let duty = map_range(percent, 0, 100, 0, i32::from(max_duty)) as u16;
    if inverted { max_duty - duty } else { duty }
}

/// On/off backlight on a plain GPIO.
pub struct GpioBacklight<P> {
    pin: P,
    inverted: bool,
    on: bool,
}

impl<P: OutputPin> GpioBacklight<P> {
    pub fn new(pin: P, inverted: bool) -> Self {
        Self {
            pin,
            inverted,
            on: false,
        }
    }

    pub fn on(&mut self) -> Result<(), P::Error> {
        self.drive(true)
    }

    pub fn off(&mut self) -> Result<(), P::Error> {
        self.drive(false)
    }

    pub fn toggle(&mut self) -> Result<(), P::Error> {
        self.drive(!self.on)
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    fn drive(&mut self, on: bool) -> Result<(), P::Error> {
        if on != self.inverted {
            self.pin.set_high()?;
        } else {
            self.pin.set_low()?;
        }
        self.on = on;
        Ok(())
    }
}

impl<P: OutputPin> BacklightDriver for GpioBacklight<P> {
    type Error = P::Error;

    fn set_level(&mut self, percent: u8) -> Result<(), Self::Error> {
        self.drive(percent > 50)
    }
}

/// Dimmable backlight on a PWM channel.
pub struct PwmBacklight<P> {
    channel: P,
    inverted: bool,
}

impl<P: SetDutyCycle> PwmBacklight<P> {
    pub fn new(channel: P, inverted: bool) -> Self {
        Self { channel, inverted }
    }
}

impl<P: SetDutyCycle> BacklightDriver for PwmBacklight<P> {
    type Error = P::Error;

    fn set_level(&mut self, percent: u8) -> Result<(), Self::Error> {
        let max = self.channel.max_duty_cycle();
        self.channel
            .set_duty_cycle(duty_for_percent(percent, max, self.inverted))
    }
}

/// For boards without a controllable backlight.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBacklight;

impl BacklightDriver for NoBacklight {
    type Error = Infallible;

    fn set_level(&mut self, _percent: u8) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<B: BacklightDriver> BacklightDriver for Option<B> {
    type Error = B::Error;

    fn set_level(&mut self, percent: u8) -> Result<(), Self::Error> {
        match self {
            Some(backlight) => backlight.set_level(percent),
            None => Ok(()),
        }
    }
}
