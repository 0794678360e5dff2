//! Coordinate model for the challenge image.
//!
//! Clicks arrive in viewport pixels and target regions are authored in a fixed
//! 1000x1000 virtual space, so the image can be rendered at any on-screen size.
//! `normalize` is the single conversion point between the two.

/// Width and height of the virtual coordinate space target regions live in.
pub const VIRTUAL_EXTENT: f64 = 1000.0;

/// A point in viewport (absolute) pixels, e.g. `MouseEvent.clientX/Y`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Click position relative to the image's top-left corner, in screen pixels.
/// Used only to place the overlay box; never hit-tested directly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelOffset {
    pub x: f64,
    pub y: f64,
}

/// Click position rescaled into the 1000x1000 virtual space. Values outside
/// [0, 1000] are legal (click landed outside the image) and simply miss.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

/// Axis-aligned target region in virtual coordinates. Valid iff all bounds are
/// finite with `top < bottom` and `left < right`; the hit tester enforces the
/// finiteness part at point of use.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}

/// On-screen bounding box of the rendered image (`getBoundingClientRect`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Converts an absolute pointer position into the overlay offset and the
/// virtual-space point used for hit testing.
///
/// A zero-size box (image not laid out yet) divides to NaN/Infinity; that is
/// deliberately propagated so the hit tester's validity gate rejects the click
/// instead of this function guessing a fallback.
pub fn normalize(pointer: Point, image_box: BoundingBox) -> (PixelOffset, NormalizedPoint) {
    let offset = PixelOffset {
        x: pointer.x - image_box.left,
        y: pointer.y - image_box.top,
    };
    let normalized = NormalizedPoint {
        x: offset.x * VIRTUAL_EXTENT / image_box.width,
        y: offset.y * VIRTUAL_EXTENT / image_box.height,
    };
    (offset, normalized)
}
