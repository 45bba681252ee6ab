// src/report/heatmap.rs

use std::path::Path;

use anyhow::{anyhow, Result};
use plotters::prelude::*;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 900;

/// Map a correlation in [-1, 1] onto a blue-white-red ramp.
pub fn coolwarm(r: f64) -> RGBColor {
    let t = (r.clamp(-1.0, 1.0) + 1.0) / 2.0;
    let lerp = |a: u8, b: u8, u: f64| (f64::from(a) + (f64::from(b) - f64::from(a)) * u).round() as u8;
    if t < 0.5 {
        let u = t * 2.0;
        RGBColor(lerp(59, 255, u), lerp(76, 255, u), lerp(192, 255, u))
    } else {
        let u = (t - 0.5) * 2.0;
        RGBColor(lerp(255, 180, u), lerp(255, 4, u), lerp(255, 38, u))
    }
}

/// Render the correlation matrix as a colored cell grid with variable labels
/// on both axes. `matrix[i][j]` is the correlation of `labels[i]` with
/// `labels[j]`; degenerate cells draw grey.
pub fn render(labels: &[String], matrix: &[Vec<Option<f64>>], path: &Path) -> Result<()> {
    let n = labels.len();
    if n == 0 {
        return Err(anyhow!("nothing to draw: the correlation matrix is empty"));
    }

    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("filling canvas: {e}"))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Correlation heatmap", ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(150)
        .y_label_area_size(180)
        .build_cartesian_2d(0..n as i32, 0..n as i32)
        .map_err(|e| anyhow!("building chart: {e}"))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&|i| {
            labels
                .get(*i as usize)
                .cloned()
                .unwrap_or_default()
        })
        .y_label_formatter(&|i| {
            labels
                .get(*i as usize)
                .cloned()
                .unwrap_or_default()
        })
        .label_style(("sans-serif", 11))
        .draw()
        .map_err(|e| anyhow!("drawing axes: {e}"))?;

    chart
        .draw_series(
            (0..n)
                .flat_map(|i| (0..n).map(move |j| (i, j)))
                .map(|(i, j)| {
                    let color = match matrix[i][j] {
                        Some(r) => coolwarm(r),
                        None => RGBColor(224, 224, 224),
                    };
                    Rectangle::new(
                        [(j as i32, i as i32), (j as i32 + 1, i as i32 + 1)],
                        color.filled(),
                    )
                }),
        )
        .map_err(|e| anyhow!("drawing cells: {e}"))?;

    root.present()
        .map_err(|e| anyhow!("writing {}: {e}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colormap_endpoints_and_midpoint() {
        let cold = coolwarm(-1.0);
        assert_eq!((cold.0, cold.1, cold.2), (59, 76, 192));
        let hot = coolwarm(1.0);
        assert_eq!((hot.0, hot.1, hot.2), (180, 4, 38));
        let mid = coolwarm(0.0);
        assert_eq!((mid.0, mid.1, mid.2), (255, 255, 255));
        // out-of-range values clamp instead of wrapping
        let over = coolwarm(2.0);
        assert_eq!((over.0, over.1, over.2), (180, 4, 38));
    }
}
