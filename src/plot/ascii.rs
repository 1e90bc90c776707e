//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed samples: `o`
//! - ±σy error bars: `|`
//! - fitted curve: `-` line

use crate::domain::{CurveFile, GridPoint, Sample, Unit};

/// Render samples (with error bars) over the evaluated grid.
pub fn render_ascii_plot(samples: &[Sample], grid: &[GridPoint], unit: Unit, width: usize, height: usize) -> String {
    let curve: Vec<(f64, f64)> = grid.iter().map(|g| (g.x, g.y)).collect();
    render_plot(samples, &curve, unit, width, height)
}

/// Render the grid stored in a curve JSON file (curve only).
pub fn render_ascii_plot_from_curve_file(curve: &CurveFile, width: usize, height: usize) -> String {
    let points: Vec<(f64, f64)> = curve.grid.iter().map(|g| (g.x, g.y)).collect();
    render_plot(&[], &points, curve.unit, width, height)
}

fn render_plot(samples: &[Sample], curve: &[(f64, f64)], unit: Unit, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = x_range(samples, curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = y_range(samples, curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Curve first so samples overlay it.
    draw_curve(&mut grid, curve, x_min, x_max, y_min, y_max);

    for s in samples {
        let col = map_x(s.x, x_min, x_max, width);
        if let Some(sigma) = s.y_sigma.filter(|v| *v > 0.0) {
            let top = map_y(s.y + sigma, y_min, y_max, height);
            let bottom = map_y(s.y - sigma, y_min, y_max, height);
            for row in grid.iter_mut().take(bottom + 1).skip(top) {
                if row[col] != 'o' {
                    row[col] = '|';
                }
            }
        }
    }
    for s in samples {
        let col = map_x(s.x, x_min, x_max, width);
        let row = map_y(s.y, y_min, y_max, height);
        grid[row][col] = 'o';
    }

    let u = unit.label();
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: x=[{x_min:.3}, {x_max:.3}] {u} | y=[{y_min:.3}, {y_max:.3}] {u}\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn x_range(samples: &[Sample], curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let xs = samples.iter().map(|s| s.x).chain(curve.iter().map(|&(x, _)| x));
    finite_range(xs)
}

fn y_range(samples: &[Sample], curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let ys = samples
        .iter()
        .flat_map(|s| {
            let sigma = s.y_sigma.unwrap_or(0.0);
            [s.y - sigma, s.y + sigma]
        })
        .chain(curve.iter().map(|&(_, y)| y));
    finite_range(ys)
}

fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        if !y.is_finite() {
            prev = None;
            continue;
        }
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, '-');
        } else {
            grid[row][col] = '-';
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::linspace;

    fn line_grid() -> Vec<GridPoint> {
        linspace(0.0, 1.0, 11)
            .into_iter()
            .map(|x| GridPoint { x, y: x, std_dev: 0.0 })
            .collect()
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let samples = vec![Sample::new(0.0, 0.0), Sample::new(1.0, 1.0)];
        let txt = render_ascii_plot(&samples, &line_grid(), Unit::M, 10, 5);
        let expected = concat!(
            "Plot: x=[0.000, 1.000] m | y=[-0.050, 1.050] m\n",
            "         o\n",
            "      --- \n",
            "    --    \n",
            " ---      \n",
            "o         \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn error_bars_surround_samples() {
        let samples = vec![
            Sample::with_sigma(0.5, 0.5, 0.0, 0.3),
            Sample::new(0.0, 0.0),
            Sample::new(1.0, 1.0),
        ];
        let txt = render_ascii_plot(&samples, &[], Unit::Cm, 21, 11);
        let rows: Vec<&str> = txt.lines().skip(1).collect();
        let col = 10;
        let column: String = rows.iter().map(|r| r.chars().nth(col).unwrap_or(' ')).collect();
        assert!(column.contains('o'));
        let bars = column.matches('|').count();
        assert!(bars >= 4, "column was {column:?}");
    }
}
