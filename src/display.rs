//! Display capability and the `mipidsi` backed implementation.

use core::fmt::Debug;

use embedded_graphics::geometry::{
    OriginDimensions,
    Size,
};
use embedded_hal::delay::DelayNs;
use mipidsi::{
    Builder,
    Display,
    NoResetPin,
    interface::{
        Interface,
        InterfacePixelFormat,
    },
    models::Model,
    options::{
        ColorInversion,
        Orientation,
        Rotation as PanelRotation,
    },
};

use crate::profile::Rotation;

/// MIPI DCS: exit colour inversion.
pub const INVOFF: u8 = 0x20;
/// MIPI DCS: enter colour inversion.
pub const INVON: u8 = 0x21;

/// A display as used by the hardware manager.
pub trait DisplayDriver {
    type Error: Debug;

    fn init(&mut self) -> Result<(), Self::Error>;

    fn set_rotation(&mut self, rotation: Rotation) -> Result<(), Self::Error>;

    fn invert_colors(&mut self, invert: bool) -> Result<(), Self::Error>;

    /// Current drawable size, after rotation.
    fn size(&self) -> Size;

    /// Sends a raw controller command followed by its parameter bytes.
    ///
    /// Must not change orientation, pixel format or sleep state; drivers may
    /// cache those.
    fn write_command(&mut self, command: u8, params: &[u8]) -> Result<(), Self::Error>;
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MipidsiError<DiError> {
    /// Controller init sequence failed, or the panel does not fit the
    /// controller's framebuffer.
    Init,
    Interface(DiError),
    /// A previous `init` failed and consumed the interface.
    Unavailable,
}

enum State<DI, M>
where
    DI: Interface,
    M: Model,
    M::ColorFormat: InterfacePixelFormat<DI::Word>,
{
    Pending { model: M, di: DI },
    Ready(Display<DI, M, NoResetPin>),
    Failed,
}

/// Quarter turns of the controller for each profile rotation.
///
/// Controllers are driven with their portrait framebuffer size. A profile
/// that is wider than tall in rotation 0 starts a quarter turn ahead.
pub fn panel_rotation(native: Size, rotation: Rotation) -> PanelRotation {
    let offset = usize::from(native.width > native.height);
    match (offset + rotation.index()) % 4 {
        0 => PanelRotation::Deg0,
        1 => PanelRotation::Deg90,
        2 => PanelRotation::Deg180,
        _ => PanelRotation::Deg270,
    }
}

/// Portrait framebuffer size for a panel of `native` size.
pub fn controller_size(native: Size) -> (u16, u16) {
    let short = native.width.min(native.height) as u16;
    let long = native.width.max(native.height) as u16;
    (short, long)
}

/// Adapts a `mipidsi` model and interface to [`DisplayDriver`].
///
/// The controller is only initialised on [`DisplayDriver::init`]; rotation
/// and inversion set before that are folded into the init sequence.
///
/// `mipidsi` keeps the orientation it was built with for clipping and
/// address windows, so a rotation change on a running display releases it
/// and runs the init sequence again. The framebuffer content and any raw
/// commands sent earlier are lost.
pub struct MipidsiDisplay<DI, M, DELAY>
where
    DI: Interface,
    M: Model,
    M::ColorFormat: InterfacePixelFormat<DI::Word>,
{
    state: State<DI, M>,
    delay: DELAY,
    native: Size,
    rotation: Rotation,
    inverted: bool,
}

impl<DI, M, DELAY> MipidsiDisplay<DI, M, DELAY>
where
    DI: Interface,
    M: Model,
    M::ColorFormat: InterfacePixelFormat<DI::Word>,
    DELAY: DelayNs,
{
    /// `native` is the panel size in rotation 0 as the board profile sees it.
    pub fn new(model: M, di: DI, native: Size, delay: DELAY) -> Self {
        Self {
            state: State::Pending { model, di },
            delay,
            native,
            rotation: Rotation::Portrait,
            inverted: false,
        }
    }

    /// The initialised display, for drawing.
    pub fn display(&mut self) -> Option<&mut Display<DI, M, NoResetPin>> {
        match &mut self.state {
            State::Ready(display) => Some(display),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    fn bring_up(&mut self, model: M, di: DI) -> Result<(), MipidsiError<DI::Error>> {
        let (width, height) = controller_size(self.native);
        let (max_width, max_height) = M::FRAMEBUFFER_SIZE;
        if width > max_width || height > max_height {
            #[cfg(feature = "defmt")]
            defmt::error!(
                "Panel {=u16}x{=u16} exceeds framebuffer {=u16}x{=u16}",
                width,
                height,
                max_width,
                max_height
            );
            return Err(MipidsiError::Init);
        }

        let inversion = if self.inverted {
            ColorInversion::Inverted
        } else {
            ColorInversion::Normal
        };
        let display = Builder::new(model, di)
            .display_size(width, height)
            .orientation(Orientation::new().rotate(panel_rotation(self.native, self.rotation)))
            .invert_colors(inversion)
            .init(&mut self.delay)
            .map_err(|_e| {
                #[cfg(feature = "defmt")]
                defmt::error!("mipidsi init: {}", defmt::Debug2Format(&_e));
                MipidsiError::Init
            })?;
        self.state = State::Ready(display);
        Ok(())
    }
}

impl<DI, M, DELAY> DisplayDriver for MipidsiDisplay<DI, M, DELAY>
where
    DI: Interface,
    M: Model,
    M::ColorFormat: InterfacePixelFormat<DI::Word>,
    DELAY: DelayNs,
{
    type Error = MipidsiError<DI::Error>;

    fn init(&mut self) -> Result<(), Self::Error> {
        match core::mem::replace(&mut self.state, State::Failed) {
            State::Pending { model, di } => self.bring_up(model, di),
            State::Ready(display) => {
                self.state = State::Ready(display);
                Ok(())
            }
            State::Failed => Err(MipidsiError::Unavailable),
        }
    }

    fn set_rotation(&mut self, rotation: Rotation) -> Result<(), Self::Error> {
        if rotation == self.rotation {
            return Ok(());
        }
        self.rotation = rotation;
        match core::mem::replace(&mut self.state, State::Failed) {
            State::Ready(display) => {
                let (di, model, _) = display.release();
                self.bring_up(model, di)
            }
            state => {
                self.state = state;
                Ok(())
            }
        }
    }

    fn invert_colors(&mut self, invert: bool) -> Result<(), Self::Error> {
        self.inverted = invert;
        let command = if invert { INVON } else { INVOFF };
        if let State::Ready(_) = self.state {
            self.write_command(command, &[])?;
        }
        Ok(())
    }

    fn size(&self) -> Size {
        match &self.state {
            State::Ready(display) => display.size(),
            _ => {
                if self.rotation.is_landscape() {
                    Size::new(self.native.height, self.native.width)
                } else {
                    self.native
                }
            }
        }
    }

    /// Sends a raw command to the running controller.
    ///
    /// The command must not change MADCTL (0x36), the pixel format (0x3A)
    /// or sleep state: `mipidsi` caches those and would draw against stale
    /// values.
    fn write_command(&mut self, command: u8, params: &[u8]) -> Result<(), Self::Error> {
        match &mut self.state {
            State::Ready(display) => {
                // SAFETY: callers only send commands outside the state
                // mipidsi caches, see above. Inversion is not cached.
                let dcs = unsafe { display.dcs() };
                dcs.send_command(command, params)
                    .map_err(MipidsiError::Interface)
            }
            _ => Err(MipidsiError::Unavailable),
        }
    }
}
