//! Plotters-powered catenary chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A render-only chart description; all series and bounds are computed outside `render()`.
pub struct CatenaryPlottersChart<'a> {
    /// Fitted curve.
    pub curve: &'a [(f64, f64)],
    /// Curve ± σ, drawn as two thin lines when non-empty.
    pub band_upper: &'a [(f64, f64)],
    pub band_lower: &'a [(f64, f64)],
    /// Observed samples.
    pub points: &'a [(f64, f64)],
    /// Error-bar segments (vertical and horizontal).
    pub bars: &'a [[(f64, f64); 2]],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: String,
    pub y_label: String,
}

impl Widget for CatenaryPlottersChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to build a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(&self.x_label)
                .y_desc(&self.y_label)
                .x_labels(5)
                .y_labels(5)
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let curve_color = RGBColor(0, 255, 0);
            let band_color = RGBColor(0, 140, 0);
            let bar_color = RGBColor(90, 90, 255);
            let points_color = RGBColor(255, 80, 80);

            if !self.band_upper.is_empty() {
                chart.draw_series(LineSeries::new(self.band_upper.iter().copied(), &band_color))?;
                chart.draw_series(LineSeries::new(self.band_lower.iter().copied(), &band_color))?;
            }

            chart.draw_series(
                self.bars
                    .iter()
                    .map(|seg| PathElement::new(seg.to_vec(), bar_color)),
            )?;

            chart.draw_series(LineSeries::new(self.curve.iter().copied(), &curve_color))?;

            // `Pixel` rather than `Circle`: the ratatui backend maps circle
            // radii to canvas units incorrectly and draws huge circles.
            chart.draw_series(
                self.points
                    .iter()
                    .map(|&(x, y)| Pixel::new((x, y), points_color)),
            )?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
