//! SVG chart export via Plotters.
//!
//! Layers, bottom to top: ±σ band, error bars, samples, fitted curve.

use std::path::Path;

use plotters::prelude::*;
use tracing::info;

use crate::error::AppError;
use crate::plot::ChartSpec;

pub const SVG_SIZE: (u32, u32) = (960, 600);

const CURVE_COLOR: RGBColor = RGBColor(0, 100, 0);
const SAMPLE_COLOR: RGBColor = RGBColor(30, 60, 200);

fn draw_err(e: impl std::fmt::Display) -> AppError {
    AppError::runtime(format!("Failed to render SVG chart: {e}"))
}

pub fn write_svg_chart(path: &Path, spec: &ChartSpec<'_>, size: (u32, u32)) -> Result<(), AppError> {
    let ([x0, x1], [y0, y1]) = spec.bounds();
    let unit = spec.unit.label();

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", 20))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc(format!("x ({unit})"))
        .y_desc(format!("y ({unit})"))
        .draw()
        .map_err(draw_err)?;

    if spec.band && spec.has_band() {
        let band_style = CURVE_COLOR.mix(0.2).filled();
        let mut outline: Vec<(f64, f64)> = spec
            .grid
            .iter()
            .filter(|g| g.y.is_finite())
            .map(|g| (g.x, g.y + g.std_dev))
            .collect();
        outline.extend(
            spec.grid
                .iter()
                .rev()
                .filter(|g| g.y.is_finite())
                .map(|g| (g.x, g.y - g.std_dev)),
        );
        chart
            .draw_series(std::iter::once(Polygon::new(outline, band_style)))
            .map_err(draw_err)?
            .label("uncertainty (±σ)")
            .legend(move |(x, y)| Rectangle::new([(x, y - 4), (x + 20, y + 4)], band_style));
    }

    if spec.error_bars {
        let bar_style = SAMPLE_COLOR.mix(0.6).stroke_width(1);
        chart
            .draw_series(spec.samples.iter().filter_map(|s| {
                let sigma = s.y_sigma.filter(|v| *v > 0.0)?;
                Some(ErrorBar::new_vertical(s.x, s.y - sigma, s.y, s.y + sigma, bar_style, 4))
            }))
            .map_err(draw_err)?;
        chart
            .draw_series(spec.samples.iter().filter_map(|s| {
                let sigma = s.x_sigma.filter(|v| *v > 0.0)?;
                Some(ErrorBar::new_horizontal(s.y, s.x - sigma, s.x, s.x + sigma, bar_style, 4))
            }))
            .map_err(draw_err)?;
    }

    if !spec.samples.is_empty() {
        chart
            .draw_series(
                spec.samples
                    .iter()
                    .map(|s| Circle::new((s.x, s.y), 3, SAMPLE_COLOR.filled())),
            )
            .map_err(draw_err)?
            .label("experimental data")
            .legend(|(x, y)| Circle::new((x + 10, y), 3, SAMPLE_COLOR.filled()));
    }

    chart
        .draw_series(LineSeries::new(
            spec.grid.iter().filter(|g| g.y.is_finite()).map(|g| (g.x, g.y)),
            CURVE_COLOR.stroke_width(2),
        ))
        .map_err(draw_err)?
        .label("fitted catenary")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], CURVE_COLOR.stroke_width(2)));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    info!(path = %path.display(), "wrote SVG chart");
    Ok(())
}
