//! Finger painting: draws a dot wherever the panel is touched.
//!
//! The board is chosen at build time:
//!
//! ```sh
//! HW_PROFILE=ESP32_2432S028R cargo run --release --example touch_paint --features esp32
//! ```
//!
//! Touching the top-left corner cycles through the four rotations so the
//! mapping can be checked on every edge.

#![no_std]
#![no_main]

use defmt::{
    error,
    info,
};
use embassy_executor::Spawner;
use embassy_time::{
    Duration,
    Timer,
};
use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{
        PrimitiveStyle,
        Rectangle,
    },
};
use esp_backtrace as _;
use esp_hal::timer::timg::TimerGroup;
use esp_println as _;
use esp32_touchpanel::{
    HardwareManager,
    Rotation,
    esp::{
        self,
        Board,
    },
    registry,
};

esp_bootloader_esp_idf::esp_app_desc!();

/// Side length of a painted dot.
const BRUSH: u32 = 4;
/// Touches inside this square in the top-left corner rotate the display.
const ROTATE_CORNER: i32 = 24;

#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    let peripherals = esp::init();

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let profile = match registry::resolve_selected() {
        Ok(profile) => profile,
        Err(e) => halt(e).await,
    };
    info!("Selected profile: {=str} ({=str})", profile.name, profile.description);

    let board = match Board::new(profile, peripherals.SPI2, peripherals.SPI3, peripherals.LEDC) {
        Ok(board) => board,
        Err(e) => halt(e).await,
    };
    let mut hw = match HardwareManager::new(profile, board.display, board.touch, board.backlight) {
        Ok(hw) => hw,
        Err(e) => halt(e).await,
    };
    if let Err(e) = hw.begin() {
        halt(e).await;
    }
    if let Err(e) = hw.validate_hardware() {
        error!("Hardware validation: {}", e);
    }

    clear(&mut hw);
    let brush = PrimitiveStyle::with_fill(Rgb565::CSS_YELLOW);
    let mut was_pressed = false;

    loop {
        match hw.touch_point() {
            Ok(point) => {
                if let Some(p) = point.to_point() {
                    if !was_pressed && p.x < ROTATE_CORNER && p.y < ROTATE_CORNER {
                        let next = Rotation::try_from((u8::from(hw.rotation()) + 1) % 4)
                            .unwrap_or_default();
                        if hw.set_display_rotation(next).is_ok() {
                            info!("Rotation {=u8}", u8::from(next));
                            clear(&mut hw);
                        }
                    } else {
                        let dot = Rectangle::new(p, Size::new_equal(BRUSH)).into_styled(brush);
                        if let Err(e) = dot.draw(hw.display_mut()) {
                            error!(
                                "Draw at ({=i32}, {=i32}) failed: {}",
                                p.x,
                                p.y,
                                defmt::Debug2Format(&e)
                            );
                        }
                    }
                    was_pressed = true;
                } else {
                    was_pressed = false;
                }
            }
            Err(e) => error!("Touch: {}", e),
        }
        Timer::after(Duration::from_millis(10)).await;
    }
}

fn clear<T, B>(hw: &mut HardwareManager<'_, esp::EspDisplay, T, B>)
where
    T: esp32_touchpanel::TouchDriver,
    B: esp32_touchpanel::BacklightDriver,
{
    if hw.display_mut().clear(Rgb565::BLACK).is_err() {
        error!("Display clear failed");
    }
}

async fn halt(e: esp32_touchpanel::Error) -> ! {
    error!("Hardware bring-up failed: {}", e);
    loop {
        Timer::after(Duration::from_secs(600)).await;
    }
}
