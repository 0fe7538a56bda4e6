use tracing::error;

use crate::capture::Frame;
use crate::marker::{Marker, MarkerShape, Rgb};
use crate::view::ViewState;

/// Rotate an RGB frame 180° in place.
///
/// Reversing the pixel order flips both axes at once, so this is a single
/// pass swapping 3-byte chunks from the ends toward the middle.
pub fn rotate_180(frame: &mut Frame) {
    let pixels = (frame.width * frame.height) as usize;
    let data = &mut frame.data;
    for i in 0..pixels / 2 {
        let j = pixels - 1 - i;
        for c in 0..3 {
            data.swap(i * 3 + c, j * 3 + c);
        }
    }
}

/// Draw every marker onto the rotated frame at its reflected position.
pub fn draw_markers(frame: &mut Frame, markers: &[Marker]) {
    for marker in markers {
        let (dx, dy) = ViewState::sensor_to_draw(marker.pos, frame.width, frame.height);
        let half = (marker.size / 2) as i32;
        match marker.shape {
            MarkerShape::Cross => {
                draw_hline(frame, dx - half, dx + half, dy, marker.color);
                draw_vline(frame, dx, dy - half, dy + half, marker.color);
            }
            MarkerShape::Circle => draw_circle(frame, dx, dy, half, marker.color),
            MarkerShape::Square => {
                draw_hline(frame, dx - half, dx + half, dy - half, marker.color);
                draw_hline(frame, dx - half, dx + half, dy + half, marker.color);
                draw_vline(frame, dx - half, dy - half, dy + half, marker.color);
                draw_vline(frame, dx + half, dy - half, dy + half, marker.color);
            }
        }
    }
}

/// Crop the frame to the visible view rectangle and scale it back to the
/// full frame size. At unity zoom the frame passes through untouched.
pub fn apply_view(frame: Frame, view: &ViewState) -> Frame {
    use fast_image_resize as fr;
    use fr::images::Image;

    if view.zoom() <= 1.0 {
        return frame;
    }

    let (x, y, w, h) = view.view_rect(frame.width, frame.height);
    let mut cropped = Vec::with_capacity((w * h * 3) as usize);
    for row in y..y + h {
        let start = ((row * frame.width + x) * 3) as usize;
        cropped.extend_from_slice(&frame.data[start..start + (w * 3) as usize]);
    }

    // The view invariants keep the crop non-empty and exactly sized, so
    // these failures should never fire; an unzoomed frame beats a crash if
    // they somehow do.
    let src_image = match Image::from_vec_u8(w, h, cropped, fr::PixelType::U8x3) {
        Ok(image) => image,
        Err(err) => {
            error!(%err, w, h, "view crop rejected");
            return frame;
        }
    };
    let mut dst_image = Image::new(frame.width, frame.height, fr::PixelType::U8x3);
    let mut resizer = fr::Resizer::new();
    if let Err(err) = resizer.resize(&src_image, &mut dst_image, None) {
        error!(%err, "view resize failed");
        return frame;
    }

    Frame::new(frame.width, frame.height, dst_image.into_vec())
}

fn put_pixel(frame: &mut Frame, x: i32, y: i32, color: Rgb) {
    if x < 0 || y < 0 || x >= frame.width as i32 || y >= frame.height as i32 {
        return;
    }
    let idx = ((y as u32 * frame.width + x as u32) * 3) as usize;
    frame.data[idx] = color.0;
    frame.data[idx + 1] = color.1;
    frame.data[idx + 2] = color.2;
}

fn draw_hline(frame: &mut Frame, x0: i32, x1: i32, y: i32, color: Rgb) {
    for x in x0..=x1 {
        put_pixel(frame, x, y, color);
    }
}

fn draw_vline(frame: &mut Frame, x: i32, y0: i32, y1: i32, color: Rgb) {
    for y in y0..=y1 {
        put_pixel(frame, x, y, color);
    }
}

/// Midpoint circle outline.
fn draw_circle(frame: &mut Frame, cx: i32, cy: i32, radius: i32, color: Rgb) {
    if radius <= 0 {
        put_pixel(frame, cx, cy, color);
        return;
    }
    let mut x = radius;
    let mut y = 0;
    let mut err = 1 - radius;
    while x >= y {
        for &(px, py) in &[
            (cx + x, cy + y),
            (cx + y, cy + x),
            (cx - y, cy + x),
            (cx - x, cy + y),
            (cx - x, cy - y),
            (cx - y, cy - x),
            (cx + y, cy - x),
            (cx + x, cy - y),
        ] {
            put_pixel(frame, px, py, color);
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}
