//! External contour tracing and drawing.
//!
//! Tracing follows `Imgproc.findContours` with `RETR_EXTERNAL`: only
//! outer borders that are not nested inside another shape's hole are
//! kept. The [`ContourTracer`] trait is implemented on [`ApproxMethod`]
//! so the approximation symbol chosen for the generated code also
//! drives the preview.

use image::{GrayImage, Rgba};
use imageproc::contours::BorderType;
use imageproc::drawing::draw_line_segment_mut;
use imageproc::point::Point;

use crate::stage::ApproxMethod;
use crate::types::RgbaImage;

/// One closed contour in mask pixel coordinates.
pub type Contour = Vec<Point<u32>>;

/// Stroke color, matching `new Scalar(0, 255, 0)` in the generated code.
pub const CONTOUR_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);

/// Stroke thickness in pixels.
pub const CONTOUR_THICKNESS: u32 = 3;

/// Trace the outermost borders of a binary mask.
pub trait ContourTracer {
    fn trace(&self, mask: &GrayImage) -> Vec<Contour>;
}

impl ContourTracer for ApproxMethod {
    fn trace(&self, mask: &GrayImage) -> Vec<Contour> {
        let contours: Vec<imageproc::contours::Contour<u32>> =
            imageproc::contours::find_contours(mask);

        contours
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .map(|c| match self {
                Self::All => c.points,
                // TC89 variants fall back to straight-run compression.
                Self::Simple | Self::Tc89L1 | Self::Tc89Kcos => compress_runs(&c.points),
            })
            .collect()
    }
}

fn step(from: Point<u32>, to: Point<u32>) -> (i64, i64) {
    (
        (i64::from(to.x) - i64::from(from.x)).signum(),
        (i64::from(to.y) - i64::from(from.y)).signum(),
    )
}

/// Drop every point lying in the middle of a straight horizontal,
/// vertical or diagonal run, keeping only the run endpoints.
#[must_use]
pub fn compress_runs(points: &[Point<u32>]) -> Contour {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect()
}

/// Draw closed contours onto `canvas`, shifting each point by `offset`.
#[allow(clippy::cast_precision_loss)]
pub fn draw_contours(canvas: &mut RgbaImage, contours: &[Contour], offset: (u32, u32)) {
    let half = i64::from(CONTOUR_THICKNESS / 2);
    let at = |p: Point<u32>, dx: i64, dy: i64| {
        (
            (i64::from(p.x) + i64::from(offset.0) + dx) as f32,
            (i64::from(p.y) + i64::from(offset.1) + dy) as f32,
        )
    };

    for contour in contours {
        let n = contour.len();
        for i in 0..n {
            let (a, b) = (contour[i], contour[(i + 1) % n]);
            for dy in -half..=half {
                for dx in -half..=half {
                    draw_line_segment_mut(canvas, at(a, dx, dy), at(b, dx, dy), CONTOUR_COLOR);
                }
            }
        }
    }
}
