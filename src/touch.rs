//! Touch controller capability and the XPT2046 resistive driver.
//!
//! The XPT2046 is an ADC behind an SPI interface. Every conversion is
//! started by a control byte: start bit, three channel bits, 12/8-bit mode,
//! single-ended/differential select and two power-down bits. The position
//! channels are read differentially at 12 bits with PENIRQ left enabled.
//!
//! The measurement comes back nine clocks after the start bit of its control
//! byte. Shifting the control byte three bits late (`<< 5` in a `u16`) lines
//! the 12-bit result up with the received bytes, so a pair of conversions
//! fits in a single 5-byte transfer.

use core::fmt::Debug;

use embedded_graphics::geometry::Point;
use embedded_hal::{
    digital::InputPin,
    spi::SpiDevice,
};

/// A touch controller as used by the hardware manager.
pub trait TouchDriver {
    type Error: Debug;

    /// Brings the controller into its idle, interrupt-enabled state.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Whether something presses the panel hard enough to count.
    fn touched(&mut self) -> Result<bool, Self::Error>;

    /// Raw ADC position of the current touch.
    fn read_raw(&mut self) -> Result<Point, Self::Error>;
}

const START: u8 = 0b1000_0000;
/// Channel select, A2..A0.
const CHANNEL_X: u8 = 0b101 << 4;
const CHANNEL_Y: u8 = 0b001 << 4;
const CHANNEL_Z1: u8 = 0b011 << 4;
const CHANNEL_Z2: u8 = 0b100 << 4;
// 12-bit, differential, reference off, PENIRQ on.
const POSITION_MODE: u8 = 0b0000;

const fn delayed(channel: u8) -> [u8; 2] {
    (((START | channel | POSITION_MODE) as u16) << 5).to_be_bytes()
}

const READ_X: [u8; 2] = delayed(CHANNEL_X);
const READ_Y: [u8; 2] = delayed(CHANNEL_Y);
const READ_Z1: [u8; 2] = delayed(CHANNEL_Z1);
const READ_Z2: [u8; 2] = delayed(CHANNEL_Z2);

const READ_XY: [u8; 5] = [READ_X[0], READ_X[1], READ_Y[0], READ_Y[1], 0];
const READ_Z: [u8; 5] = [READ_Z1[0], READ_Z1[1], READ_Z2[0], READ_Z2[1], 0];

/// Full scale of a 12-bit conversion.
pub const ADC_MAX: u16 = 4095;

/// Position reads averaged into one raw sample.
pub const DEFAULT_SAMPLES: u8 = 4;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Xpt2046Error<SpiError, IrqError> {
    /// SPI error
    Spi(SpiError),
    /// PENIRQ pin error
    Irq(IrqError),
}

/// XPT2046 on an SPI device, with PENIRQ on an input pin.
#[derive(Debug)]
pub struct Xpt2046<SPI, IRQ> {
    spi: SPI,
    irq: IRQ,
    threshold: u16,
    samples: u8,
}

impl<SPI, IRQ> Xpt2046<SPI, IRQ>
where
    SPI: SpiDevice<u8>,
    IRQ: InputPin,
{
    /// `threshold` is the minimum pressure, see [`Self::pressure`].
    pub fn new(spi: SPI, irq: IRQ, threshold: u16) -> Self {
        Self {
            spi,
            irq,
            threshold,
            samples: DEFAULT_SAMPLES,
        }
    }

    /// Number of position reads averaged per sample, at least one.
    pub fn with_samples(mut self, samples: u8) -> Self {
        self.samples = samples.max(1);
        self
    }

    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    pub fn release(self) -> (SPI, IRQ) {
        (self.spi, self.irq)
    }

    /// X and Y position in one transfer.
    pub fn measure_xy(&mut self) -> Result<(u16, u16), SPI::Error> {
        let mut rx = [0; 5];
        self.spi.transfer(&mut rx, &READ_XY)?;
        Ok((
            u16::from_be_bytes([rx[1], rx[2]]),
            u16::from_be_bytes([rx[3], rx[4]]),
        ))
    }

    /// Z1 and Z2 in one transfer.
    pub fn measure_z(&mut self) -> Result<(u16, u16), SPI::Error> {
        let mut rx = [0; 5];
        self.spi.transfer(&mut rx, &READ_Z)?;
        Ok((
            u16::from_be_bytes([rx[1], rx[2]]),
            u16::from_be_bytes([rx[3], rx[4]]),
        ))
    }

    /// Crude touch pressure, `z1 + 4095 - z2`. Grows with pressure.
    pub fn pressure(&mut self) -> Result<i32, SPI::Error> {
        let (z1, z2) = self.measure_z()?;
        Ok(i32::from(z1) + i32::from(ADC_MAX) - i32::from(z2))
    }
}

impl<SPI, IRQ> TouchDriver for Xpt2046<SPI, IRQ>
where
    SPI: SpiDevice<u8>,
    IRQ: InputPin,
{
    type Error = Xpt2046Error<SPI::Error, IRQ::Error>;

    fn init(&mut self) -> Result<(), Self::Error> {
        // Throwaway conversion leaves the reference off and PENIRQ enabled.
        self.measure_xy().map_err(Xpt2046Error::Spi)?;
        Ok(())
    }

    fn touched(&mut self) -> Result<bool, Self::Error> {
        // PENIRQ is pulled low while the panel is pressed.
        if self.irq.is_high().map_err(Xpt2046Error::Irq)? {
            return Ok(false);
        }
        let z = self.pressure().map_err(Xpt2046Error::Spi)?;
        Ok(z >= i32::from(self.threshold))
    }

    fn read_raw(&mut self) -> Result<Point, Self::Error> {
        let mut x = 0u32;
        let mut y = 0u32;
        for _ in 0..self.samples {
            let (rx, ry) = self.measure_xy().map_err(Xpt2046Error::Spi)?;
            x += u32::from(rx);
            y += u32::from(ry);
        }
        let n = u32::from(self.samples);
        Ok(Point::new((x / n) as i32, (y / n) as i32))
    }
}
