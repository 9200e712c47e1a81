use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use eframe::egui::{self, Color32, ColorImage};
use image::ImageEncoder;

use crate::color::MarkerGeometry;
use crate::view::{RenderPoint, ViewTransform};

// ---------------------------------------------------------------------------
// PNG: crop of a viewport screenshot
// ---------------------------------------------------------------------------

/// Screenshot user data: where to write the PNG and which part of the
/// window (in points) to keep.
#[derive(Debug, Clone)]
pub struct PngRequest {
    pub path: PathBuf,
    pub rect: egui::Rect,
}

/// Write the part of a viewport screenshot covered by `rect` (in points).
pub fn save_png(image: &ColorImage, rect: egui::Rect, pixels_per_point: f32, path: &Path) -> Result<()> {
    let cropped = image.region(&rect, Some(pixels_per_point));
    let [w, h] = cropped.size;
    if w == 0 || h == 0 {
        anyhow::bail!("chart area is empty, nothing to export");
    }

    let mut rgba = Vec::with_capacity(w * h * 4);
    for p in &cropped.pixels {
        rgba.extend_from_slice(&[p.r(), p.g(), p.b(), p.a()]);
    }

    let file = std::fs::File::create(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;
    let encoder = image::codecs::png::PngEncoder::new_with_quality(
        file,
        image::codecs::png::CompressionType::Best,
        image::codecs::png::FilterType::Adaptive,
    );
    encoder
        .write_image(&rgba, w as u32, h as u32, image::ExtendedColorType::Rgba8)
        .with_context(|| format!("Failed to encode {}", path.display()))?;
    log::info!("exported {w}x{h} PNG to {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// SVG: vector rendering of the current chart
// ---------------------------------------------------------------------------

fn hex(c: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", c.r(), c.g(), c.b())
}

/// Render the points as seen through `transform` onto a `width` x `height`
/// canvas. Muted points are drawn first so emphasized ones stay on top.
pub fn render_svg(
    points: &[RenderPoint],
    transform: ViewTransform,
    width: f64,
    height: f64,
    radius: f64,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    let _ = writeln!(out, r#"<rect width="100%" height="100%" fill="white"/>"#);

    let ordered = points
        .iter()
        .filter(|p| !p.emphasized)
        .chain(points.iter().filter(|p| p.emphasized));

    for p in ordered {
        let [vx, vy] = transform.apply(p.pos);
        let cx = vx * width;
        let cy = (1.0 - vy) * height;
        if !(-radius..=width + radius).contains(&cx) || !(-radius..=height + radius).contains(&cy) {
            continue;
        }
        let fill = hex(p.fill);
        let opacity = p.opacity;
        match p.marker.geometry() {
            MarkerGeometry::Circle => {
                let _ = writeln!(
                    out,
                    r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{radius}" fill="{fill}" fill-opacity="{opacity}"/>"#
                );
            }
            MarkerGeometry::Polygon(vertices) => {
                let coords: Vec<String> = vertices
                    .iter()
                    .map(|v| {
                        format!(
                            "{:.2},{:.2}",
                            cx + v[0] as f64 * radius,
                            cy + v[1] as f64 * radius
                        )
                    })
                    .collect();
                let _ = writeln!(
                    out,
                    r#"<polygon points="{}" fill="{fill}" fill-opacity="{opacity}"/>"#,
                    coords.join(" ")
                );
            }
            MarkerGeometry::Strokes(segments) => {
                for [a, b] in segments {
                    let _ = writeln!(
                        out,
                        r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{fill}" stroke-opacity="{opacity}" stroke-width="1.5"/>"#,
                        cx + a[0] as f64 * radius,
                        cy + a[1] as f64 * radius,
                        cx + b[0] as f64 * radius,
                        cy + b[1] as f64 * radius,
                    );
                }
            }
        }
    }
    out.push_str("</svg>\n");
    out
}

pub fn save_svg(svg: &str, path: &Path) -> Result<()> {
    std::fs::write(path, svg).with_context(|| format!("Cannot write {}", path.display()))?;
    log::info!("exported SVG to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Marker, MUTED, NEUTRAL};

    fn point(row: usize, pos: [f64; 2], marker: Marker, emphasized: bool) -> RenderPoint {
        RenderPoint {
            row,
            pos,
            fill: if emphasized { NEUTRAL } else { MUTED },
            opacity: if emphasized { 0.9 } else { 0.2 },
            marker,
            emphasized,
        }
    }

    #[test]
    fn svg_places_points_with_y_flipped() {
        let svg = render_svg(
            &[point(0, [0.25, 0.75], Marker::Circle, true)],
            ViewTransform::IDENTITY,
            200.0,
            100.0,
            3.0,
        );
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r##"<circle cx="50.00" cy="25.00" r="3" fill="#111827""##));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn svg_draws_muted_points_first() {
        let svg = render_svg(
            &[
                point(0, [0.1, 0.1], Marker::Square, true),
                point(1, [0.9, 0.9], Marker::Diamond, false),
            ],
            ViewTransform::IDENTITY,
            100.0,
            100.0,
            2.0,
        );
        let muted = svg.find("#cccccc").unwrap();
        let emphasized = svg.find("#111827").unwrap();
        assert!(muted < emphasized);
        assert_eq!(svg.matches("<polygon").count(), 2);
    }

    #[test]
    fn svg_skips_points_outside_the_zoomed_view() {
        let zoomed = ViewTransform {
            kx: 4.0,
            ky: 4.0,
            x: 0.0,
            y: 0.0,
        };
        let svg = render_svg(
            &[
                point(0, [0.1, 0.1], Marker::Plus, true),
                point(1, [0.9, 0.9], Marker::Circle, true),
            ],
            zoomed,
            100.0,
            100.0,
            2.0,
        );
        assert_eq!(svg.matches("<line").count(), 2);
        assert!(!svg.contains("<circle"));
    }

    #[test]
    fn png_export_crops_screenshot() {
        let image = ColorImage::new([20, 10], Color32::RED);
        let rect = egui::Rect::from_min_size(egui::pos2(2.0, 2.0), egui::vec2(5.0, 4.0));
        let path = std::env::temp_dir().join(format!("emble_export_{}.png", std::process::id()));
        save_png(&image, rect, 1.0, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        std::fs::remove_file(&path).ok();
    }
}
