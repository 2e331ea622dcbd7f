use image::RgbImage;
use plotters::prelude::*;

use crate::calibrate::Calibration;
use crate::overlay_map::OverlayMap;

const COLOR_MAJ: RGBColor = RGBColor(110, 170, 90);
const COLOR_MIN: RGBColor = RGBColor(230, 130, 30);
const COLOR_SEVENTH: RGBColor = RGBColor(60, 110, 220);
const COLOR_OTHER: RGBColor = RGBColor(210, 70, 210);
const COLOR_COLUMN: RGBColor = RGBColor(200, 200, 200);

fn quality_color(quality: &str) -> RGBColor {
    match quality {
        "maj" => COLOR_MAJ,
        "min" => COLOR_MIN,
        "7" => COLOR_SEVENTH,
        _ => COLOR_OTHER,
    }
}

/// Renders the overlay in-memory as an RGBA pixel buffer.
///
/// Boxes are outlined in a colour per chord quality. When a calibration is
/// given, each column's sheared centre line is drawn underneath. `background`
/// is used as the canvas when its size matches, otherwise the canvas is white.
pub fn render_overlay_rgba(
    width: u32,
    height: u32,
    map: &OverlayMap,
    calibration: Option<&Calibration>,
    background: Option<&RgbImage>,
) -> Result<Vec<u8>, String> {
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }

    let pixel_count = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| "width*height overflow".to_string())?;

    let mut rgb = match background {
        Some(img) if img.dimensions() == (width, height) => img.as_raw().clone(),
        _ => vec![255u8; pixel_count * 3],
    };

    {
        let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
        let max_x = width.saturating_sub(1) as i32;
        let max_y = height.saturating_sub(1) as i32;

        if let Some(cal) = calibration {
            let slope = cal.fit.slope;
            let y0 = cal.anchors.baseline_y;
            for &anchor_x in &cal.anchors.centers_x {
                // Inverse of the shear: the image x that corrects onto the anchor.
                let x_at = |y: i32| (anchor_x - slope * (y as f64 - y0)).round() as i32;
                root.draw(&PathElement::new(
                    [(x_at(0), 0), (x_at(max_y), max_y)],
                    COLOR_COLUMN,
                ))
                .map_err(|e| e.to_string())?;
            }
        }

        for element in &map.elements {
            let [bx, by, bw, bh] = element.bbox;
            let x0 = ((bx * width as f64).round() as i32).clamp(0, max_x);
            let y0 = ((by * height as f64).round() as i32).clamp(0, max_y);
            let x1 = (((bx + bw) * width as f64).round() as i32).clamp(0, max_x);
            let y1 = (((by + bh) * height as f64).round() as i32).clamp(0, max_y);
            let color = quality_color(&element.quality);
            root.draw(&Rectangle::new([(x0, y0), (x1, y1)], color.stroke_width(2)))
                .map_err(|e| e.to_string())?;
        }

        root.present().map_err(|e| e.to_string())?;
    }

    let mut rgba = vec![255u8; pixel_count * 4];
    for i in 0..pixel_count {
        rgba[i * 4] = rgb[i * 3];
        rgba[i * 4 + 1] = rgb[i * 3 + 1];
        rgba[i * 4 + 2] = rgb[i * 3 + 2];
        rgba[i * 4 + 3] = 255;
    }

    Ok(rgba)
}
