//! Raw touch sample to display pixel transform.
//!
//! The XPT2046 reports 12-bit ADC values along the panel's native axes. The
//! mapping to pixels depends on the display rotation: landscape rotations
//! swap the raw axes and the inverted rotations run them backwards. After
//! the per-rotation mapping the profile inversion flags are applied and the
//! result is clamped to the visible area, so a point outside the calibrated
//! range still lands on the nearest edge pixel.

use embedded_graphics::geometry::{
    Point,
    Size,
};

use crate::profile::{
    Calibration,
    HardwareProfile,
    Rotation,
    TouchMapping,
    TouchPoint,
    TouchSample,
};

/// Re-maps `value` from `in_min..in_max` to `out_min..out_max`.
///
/// Linear, truncating toward zero and extrapolating outside the input range.
/// Reversed ranges flip the direction. `in_min == in_max` yields `out_min`;
/// profiles reject such calibrations so the mapper never hits it.
pub fn map_range(value: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    let span = i64::from(in_max) - i64::from(in_min);
    if span == 0 {
        return out_min;
    }
    let scaled = (i64::from(value) - i64::from(in_min)) * (i64::from(out_max) - i64::from(out_min))
        / span
        + i64::from(out_min);
    scaled.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Applies the XPT2046 axis convention for `rotation`.
pub fn generic_mapping(rotation: Rotation, raw: Point, cal: &Calibration, extent: Size) -> Point {
    let w = extent.width as i32;
    let h = extent.height as i32;
    match rotation {
        Rotation::Portrait => Point::new(
            map_range(raw.x, cal.min_x, cal.max_x, 0, w),
            map_range(raw.y, cal.min_y, cal.max_y, 0, h),
        ),
        Rotation::Landscape => Point::new(
            map_range(raw.y, cal.min_y, cal.max_y, 0, w),
            map_range(raw.x, cal.max_x, cal.min_x, 0, h),
        ),
        Rotation::PortraitInverted => Point::new(
            map_range(raw.x, cal.max_x, cal.min_x, 0, w),
            map_range(raw.y, cal.max_y, cal.min_y, 0, h),
        ),
        Rotation::LandscapeInverted => Point::new(
            map_range(raw.y, cal.max_y, cal.min_y, 0, w),
            map_range(raw.x, cal.min_x, cal.max_x, 0, h),
        ),
    }
}

/// Maps a raw sample to display pixels for `rotation`.
///
/// Returns [`TouchPoint::INVALID`] when the sample is not pressed. Pressed
/// samples always map inside `0..width` and `0..height` of the rotated
/// display.
pub fn map_touch(sample: &TouchSample, profile: &HardwareProfile, rotation: Rotation) -> TouchPoint {
    if !sample.pressed {
        return TouchPoint::INVALID;
    }

    let extent = profile.display.size_for(rotation);
    let touch = &profile.touch;

    let mapped = match touch.mappings[rotation.index()] {
        TouchMapping::Generic => {
            generic_mapping(rotation, sample.raw(), &touch.calibration, extent)
        }
        TouchMapping::Custom(map) => map(sample.raw(), &touch.calibration, extent),
    };

    let w = extent.width as i32;
    let h = extent.height as i32;
    let (invert_x, invert_y) = touch.inversion(rotation);
    // Custom mappings may return anything; saturate before clamping.
    let x = if invert_x { w.saturating_sub(mapped.x) } else { mapped.x };
    let y = if invert_y { h.saturating_sub(mapped.y) } else { mapped.y };

    TouchPoint::new(x.clamp(0, w - 1), y.clamp(0, h - 1))
}
