//! Fake SPI bus and pins for the unit tests.

use core::{
    cell::RefCell,
    convert::Infallible,
};
use std::{
    collections::VecDeque,
    rc::Rc,
    vec::Vec,
};

use embedded_hal::{
    delay::DelayNs,
    digital::{
        ErrorType as PinErrorType,
        InputPin,
        OutputPin,
    },
    spi::{
        ErrorKind,
        ErrorType,
        SpiBus,
    },
};
use embedded_hal_bus::spi::{
    ExclusiveDevice,
    NoDelay,
};

#[derive(Default)]
pub struct BusState {
    /// Value pairs returned by successive transfers, as `[_, a, a, b, b]`.
    pub replies: VecDeque<(u16, u16)>,
    /// Every buffer written or transferred out.
    pub sent: Vec<Vec<u8>>,
    pub fail: bool,
}

/// SPI bus whose state stays inspectable after it has been moved into a
/// device.
#[derive(Clone, Default)]
pub struct FakeBus(pub Rc<RefCell<BusState>>);

impl FakeBus {
    pub fn with_replies(replies: &[(u16, u16)]) -> Self {
        let bus = Self::default();
        bus.0.borrow_mut().replies = replies.iter().copied().collect();
        bus
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.0.borrow().sent.clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().sent.clear();
    }

    pub fn fail(&self, fail: bool) {
        self.0.borrow_mut().fail = fail;
    }

    pub fn device(&self) -> ExclusiveDevice<FakeBus, Pin, NoDelay> {
        ExclusiveDevice::new_no_delay(self.clone(), Pin::high()).unwrap()
    }
}

impl ErrorType for FakeBus {
    type Error = ErrorKind;
}

impl SpiBus for FakeBus {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        let mut state = self.0.borrow_mut();
        if state.fail {
            return Err(ErrorKind::Other);
        }
        state.sent.push(words.to_vec());
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let mut state = self.0.borrow_mut();
        if state.fail {
            return Err(ErrorKind::Other);
        }
        state.sent.push(write.to_vec());
        let (a, b) = state.replies.pop_front().unwrap_or((0, 0));
        let [a0, a1] = a.to_be_bytes();
        let [b0, b1] = b.to_be_bytes();
        let reply = [0, a0, a1, b0, b1];
        let n = read.len().min(reply.len());
        read[..n].copy_from_slice(&reply[..n]);
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Input or output pin holding a level.
#[derive(Debug, Default)]
pub struct Pin(pub bool);

impl Pin {
    pub fn high() -> Self {
        Pin(true)
    }

    pub fn low() -> Self {
        Pin(false)
    }
}

impl PinErrorType for Pin {
    type Error = Infallible;
}

impl InputPin for Pin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0)
    }
}

impl OutputPin for Pin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0 = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0 = true;
        Ok(())
    }
}

pub struct NoopDelay;

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}
