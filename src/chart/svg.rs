//! SVG export for figures
//!
//! Presentation collaborators that need a file (the CLI's `--chart-out`)
//! render a captured [`Figure`] to a standalone SVG document.

use std::f64::consts::PI;
use std::fmt::Write;

use super::figure::{Axes, AxisValue, Figure, Series, SeriesKind};

const CELL_WIDTH: f64 = 640.0;
const CELL_HEIGHT: f64 = 420.0;
const SUPTITLE_HEIGHT: f64 = 36.0;
const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 56.0;
const TICKS: usize = 5;

/// Matplotlib's default cycle
const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Plot area in document coordinates
#[derive(Debug, Clone, Copy)]
struct Frame {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn right(&self) -> f64 {
        self.x + self.width
    }

    fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Linear mapping from data range to pixel range
#[derive(Debug, Clone, Copy)]
struct Scale {
    lo: f64,
    hi: f64,
    from: f64,
    to: f64,
}

impl Scale {
    fn new((lo, hi): (f64, f64), from: f64, to: f64) -> Self {
        Self { lo, hi, from, to }
    }

    fn map(&self, v: f64) -> f64 {
        self.from + (v - self.lo) / (self.hi - self.lo) * (self.to - self.from)
    }

    fn ticks(&self) -> Vec<f64> {
        (0..=TICKS)
            .map(|i| self.lo + (self.hi - self.lo) * i as f64 / TICKS as f64)
            .collect()
    }
}

/// Render `figure` as an SVG document
pub fn to_svg(figure: &Figure) -> String {
    let (rows, cols) = figure.grid_shape();
    let top = if figure.suptitle.is_some() {
        SUPTITLE_HEIGHT
    } else {
        0.0
    };
    let width = CELL_WIDTH * cols as f64;
    let height = CELL_HEIGHT * rows as f64 + top;

    let mut out = String::new();
    let _ = writeln!(
        out,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"##,
        w = width,
        h = height
    );
    let _ = writeln!(
        out,
        r##"<rect width="{}" height="{}" fill="white"/>"##,
        width, height
    );

    if let Some(suptitle) = &figure.suptitle {
        let _ = writeln!(
            out,
            r##"<text x="{:.1}" y="24" text-anchor="middle" font-size="18" font-weight="600">{}</text>"##,
            width / 2.0,
            escape(suptitle)
        );
    }

    for axes in &figure.axes {
        let (row, col) = axes.slot.cell();
        let frame = Frame {
            x: col as f64 * CELL_WIDTH + MARGIN_LEFT,
            y: top + row as f64 * CELL_HEIGHT + MARGIN_TOP,
            width: CELL_WIDTH - MARGIN_LEFT - MARGIN_RIGHT,
            height: CELL_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM,
        };
        render_axes(&mut out, axes, frame);
    }

    out.push_str("</svg>\n");
    out
}

fn render_axes(out: &mut String, axes: &Axes, frame: Frame) {
    if let Some(title) = &axes.title {
        let _ = writeln!(
            out,
            r##"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="15" font-weight="600" fill="#222">{}</text>"##,
            frame.x + frame.width / 2.0,
            frame.y - 14.0,
            escape(title)
        );
    }

    let only_pies = !axes.series.is_empty() && axes.series.iter().all(|s| s.kind == SeriesKind::Pie);
    if only_pies {
        for series in &axes.series {
            render_pie(out, series, frame);
        }
        return;
    }

    let categories = category_labels(axes);
    let horizontal = axes
        .series
        .iter()
        .any(|s| s.kind == SeriesKind::BarHorizontal);

    let (x_range, y_range) = data_ranges(axes, &categories, horizontal);
    let xs = Scale::new(x_range, frame.x, frame.right());
    let ys = Scale::new(y_range, frame.bottom(), frame.y);

    render_frame(out, axes, frame, &xs, &ys, &categories, horizontal);

    let bar_series = axes
        .series
        .iter()
        .filter(|s| matches!(s.kind, SeriesKind::Bar | SeriesKind::BarHorizontal))
        .count()
        .max(1);
    let mut bar_index = 0;

    for (i, series) in axes.series.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        match series.kind {
            SeriesKind::Line => render_line(out, series, &categories, &xs, &ys, color),
            SeriesKind::Scatter => render_scatter(out, series, &categories, &xs, &ys, color),
            SeriesKind::Bar | SeriesKind::BarHorizontal => {
                render_bars(out, series, &categories, &xs, &ys, color, bar_index, bar_series);
                bar_index += 1;
            }
            SeriesKind::Histogram => render_histogram(out, series, &xs, &ys, color),
            SeriesKind::Pie => render_pie(out, series, frame),
        }
    }

    if axes.legend {
        render_legend(out, axes, frame);
    }
}

/// Categories in first-seen order across every series of the axes
fn category_labels(axes: &Axes) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for series in axes.series.iter().filter(|s| s.kind != SeriesKind::Pie) {
        for value in &series.x {
            if let AxisValue::Category(c) = value {
                if !labels.contains(c) {
                    labels.push(c.clone());
                }
            }
        }
    }
    labels
}

/// Position of an x value: its number, or its category slot
fn position(value: &AxisValue, categories: &[String]) -> f64 {
    match value {
        AxisValue::Number(n) => *n,
        AxisValue::Category(c) => categories.iter().position(|l| l == c).unwrap_or(0) as f64,
    }
}

fn data_ranges(axes: &Axes, categories: &[String], horizontal: bool) -> ((f64, f64), (f64, f64)) {
    let mut pos = Vec::new();
    let mut val = vec![0.0];

    for series in axes.series.iter().filter(|s| s.kind != SeriesKind::Pie) {
        pos.extend(series.x.iter().map(|v| position(v, categories)));
        val.extend(series.y.iter().copied());
        if series.kind == SeriesKind::Histogram {
            if let (Some(first), Some(second)) = (series.x.first(), series.x.get(1)) {
                let width = position(second, categories) - position(first, categories);
                pos.push(position(series.x.last().unwrap_or(first), categories) + width);
            }
        }
    }

    let mut pos_range = padded(bounds(&pos));
    if !categories.is_empty() {
        pos_range = (-0.5, categories.len() as f64 - 0.5);
    }
    let val_range = padded(bounds(&val));

    let (mut x, mut y) = if horizontal {
        (val_range, pos_range)
    } else {
        (pos_range, val_range)
    };
    if let Some(lim) = axes.xlim {
        x = lim;
    }
    if let Some(lim) = axes.ylim {
        y = lim;
    }
    (x, y)
}

fn bounds(values: &[f64]) -> (f64, f64) {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo.is_finite() && hi.is_finite() {
        (lo, hi)
    } else {
        (0.0, 1.0)
    }
}

fn padded((lo, hi): (f64, f64)) -> (f64, f64) {
    if hi - lo < f64::EPSILON {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

fn render_frame(
    out: &mut String,
    axes: &Axes,
    frame: Frame,
    xs: &Scale,
    ys: &Scale,
    categories: &[String],
    horizontal: bool,
) {
    let grid_stroke = if axes.grid { "#dddddd" } else { "none" };

    // Value-axis ticks, plus position ticks when the axis is numeric
    let numeric_x = horizontal || categories.is_empty();
    let numeric_y = !horizontal || categories.is_empty();

    if numeric_y {
        for tick in ys.ticks() {
            let y = ys.map(tick);
            let _ = writeln!(
                out,
                r##"<line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{}"/><text x="{:.1}" y="{:.1}" text-anchor="end" font-size="11" fill="#555">{}</text>"##,
                frame.x,
                frame.right(),
                grid_stroke,
                frame.x - 6.0,
                y + 4.0,
                format_tick(tick),
                y = y
            );
        }
    }
    if numeric_x {
        for tick in xs.ticks() {
            let x = xs.map(tick);
            let _ = writeln!(
                out,
                r##"<line x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}" stroke="{}"/><text x="{x:.1}" y="{:.1}" text-anchor="middle" font-size="11" fill="#555">{}</text>"##,
                frame.y,
                frame.bottom(),
                grid_stroke,
                frame.bottom() + 16.0,
                format_tick(tick),
                x = x
            );
        }
    }

    for (i, label) in categories.iter().enumerate() {
        if horizontal {
            let _ = writeln!(
                out,
                r##"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="11" fill="#555">{}</text>"##,
                frame.x - 6.0,
                ys.map(i as f64) + 4.0,
                escape(label)
            );
        } else {
            let _ = writeln!(
                out,
                r##"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="11" fill="#555">{}</text>"##,
                xs.map(i as f64),
                frame.bottom() + 16.0,
                escape(label)
            );
        }
    }

    let _ = writeln!(
        out,
        r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="#333"/>"##,
        frame.x, frame.y, frame.width, frame.height
    );

    if let Some(xlabel) = &axes.xlabel {
        let _ = writeln!(
            out,
            r##"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="13" fill="#333">{}</text>"##,
            frame.x + frame.width / 2.0,
            frame.bottom() + 38.0,
            escape(xlabel)
        );
    }
    if let Some(ylabel) = &axes.ylabel {
        let x = frame.x - 48.0;
        let y = frame.y + frame.height / 2.0;
        let _ = writeln!(
            out,
            r##"<text x="{x:.1}" y="{y:.1}" text-anchor="middle" font-size="13" fill="#333" transform="rotate(-90, {x:.1}, {y:.1})">{}</text>"##,
            escape(ylabel),
            x = x,
            y = y
        );
    }
}

fn render_line(out: &mut String, series: &Series, categories: &[String], xs: &Scale, ys: &Scale, color: &str) {
    let points: Vec<String> = series
        .x
        .iter()
        .zip(&series.y)
        .map(|(x, y)| format!("{:.1},{:.1}", xs.map(position(x, categories)), ys.map(*y)))
        .collect();
    let _ = writeln!(
        out,
        r##"<polyline points="{}" fill="none" stroke="{}" stroke-width="2"/>"##,
        points.join(" "),
        color
    );
}

fn render_scatter(out: &mut String, series: &Series, categories: &[String], xs: &Scale, ys: &Scale, color: &str) {
    for (x, y) in series.x.iter().zip(&series.y) {
        let _ = writeln!(
            out,
            r##"<circle cx="{:.1}" cy="{:.1}" r="4" fill="{}" opacity="0.8"/>"##,
            xs.map(position(x, categories)),
            ys.map(*y),
            color
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn render_bars(
    out: &mut String,
    series: &Series,
    categories: &[String],
    xs: &Scale,
    ys: &Scale,
    color: &str,
    index: usize,
    count: usize,
) {
    let horizontal = series.kind == SeriesKind::BarHorizontal;
    let slot = 0.8 / count as f64;
    let offset = -0.4 + slot * index as f64;

    for (x, v) in series.x.iter().zip(&series.y) {
        let p = position(x, categories) + offset;
        let (x0, x1, y0, y1) = if horizontal {
            (xs.map(0.0), xs.map(*v), ys.map(p), ys.map(p + slot))
        } else {
            (xs.map(p), xs.map(p + slot), ys.map(0.0), ys.map(*v))
        };
        let _ = writeln!(
            out,
            r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" opacity="0.85"/>"##,
            x0.min(x1),
            y0.min(y1),
            (x1 - x0).abs(),
            (y1 - y0).abs(),
            color
        );
    }
}

fn render_histogram(out: &mut String, series: &Series, xs: &Scale, ys: &Scale, color: &str) {
    let starts: Vec<f64> = series.x.iter().filter_map(AxisValue::as_number).collect();
    let width = match (starts.first(), starts.get(1)) {
        (Some(a), Some(b)) => b - a,
        _ => 1.0,
    };

    for (start, count) in starts.iter().zip(&series.y) {
        let x0 = xs.map(*start);
        let x1 = xs.map(start + width);
        let y = ys.map(*count);
        let _ = writeln!(
            out,
            r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" stroke="white"/>"##,
            x0,
            y,
            (x1 - x0).abs(),
            (ys.map(0.0) - y).abs(),
            color
        );
    }
}

fn render_pie(out: &mut String, series: &Series, frame: Frame) {
    let total: f64 = series.y.iter().sum();
    if total <= 0.0 {
        return;
    }

    let cx = frame.x + frame.width / 2.0;
    let cy = frame.y + frame.height / 2.0;
    let r = frame.width.min(frame.height) / 2.0 * 0.85;
    let mut angle = -PI / 2.0;

    for (i, (label, value)) in series.x.iter().zip(&series.y).enumerate() {
        let sweep = value / total * 2.0 * PI;
        let color = PALETTE[i % PALETTE.len()];

        if sweep >= 2.0 * PI - 1e-9 {
            let _ = writeln!(
                out,
                r##"<circle cx="{:.1}" cy="{:.1}" r="{:.1}" fill="{}"/>"##,
                cx, cy, r, color
            );
        } else if sweep > 0.0 {
            let (x0, y0) = (cx + r * angle.cos(), cy + r * angle.sin());
            let end = angle + sweep;
            let (x1, y1) = (cx + r * end.cos(), cy + r * end.sin());
            let large = if sweep > PI { 1 } else { 0 };
            let _ = writeln!(
                out,
                r##"<path d="M{:.1},{:.1} L{:.1},{:.1} A{:.1},{:.1} 0 {} 1 {:.1},{:.1} Z" fill="{}" stroke="white"/>"##,
                cx, cy, x0, y0, r, r, large, x1, y1, color
            );
        }

        let mid = angle + sweep / 2.0;
        let _ = writeln!(
            out,
            r##"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="12" fill="#222">{}</text>"##,
            cx + r * 1.12 * mid.cos(),
            cy + r * 1.12 * mid.sin(),
            escape(&label.to_string())
        );
        angle += sweep;
    }
}

fn render_legend(out: &mut String, axes: &Axes, frame: Frame) {
    let labelled: Vec<(usize, &str)> = axes
        .series
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.label.as_deref().map(|l| (i, l)))
        .collect();

    for (row, (i, label)) in labelled.iter().enumerate() {
        let y = frame.y + 16.0 + row as f64 * 18.0;
        let x = frame.right() - 180.0;
        let _ = writeln!(
            out,
            r##"<rect x="{:.1}" y="{:.1}" width="12" height="12" fill="{}"/><text x="{:.1}" y="{:.1}" font-size="12" fill="#222">{}</text>"##,
            x,
            y - 10.0,
            PALETTE[i % PALETTE.len()],
            x + 18.0,
            y,
            escape(label)
        );
    }
}

fn format_tick(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else if v.abs() >= 100.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.2}", v)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::context::ChartContext;

    fn numbers(values: &[f64]) -> Vec<AxisValue> {
        values.iter().copied().map(AxisValue::Number).collect()
    }

    #[test]
    fn line_chart_document() {
        let ctx = ChartContext::new();
        let plt = ctx.handle();
        plt.plot(numbers(&[1.0, 2.0, 3.0]), vec![1.0, 4.0, 9.0], Some("squares".to_string()))
            .unwrap();
        plt.title("Growth & <decay>".to_string());
        plt.legend();

        let svg = to_svg(&ctx.capture());
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("Growth &amp; &lt;decay&gt;"));
        assert!(svg.contains("squares"));
    }

    #[test]
    fn bars_and_pie_in_subplots() {
        let ctx = ChartContext::new();
        let plt = ctx.handle();
        plt.figure(Some("Overview".to_string()));
        plt.subplot(1, 2, 1).unwrap();
        plt.bar(
            vec![
                AxisValue::Category("A".to_string()),
                AxisValue::Category("B".to_string()),
            ],
            vec![3.0, 5.0],
            None,
        )
        .unwrap();
        plt.subplot(1, 2, 2).unwrap();
        plt.pie(vec![1.0, 3.0], vec!["x".to_string(), "y".to_string()])
            .unwrap();

        let svg = to_svg(&ctx.capture());
        assert!(svg.contains(r#"width="1280""#));
        assert!(svg.contains("Overview"));
        assert!(svg.contains("<path"));
        assert!(svg.contains(">A</text>"));
    }

    #[test]
    fn single_slice_pie_is_full_circle() {
        let ctx = ChartContext::new();
        ctx.handle()
            .pie(vec![5.0], vec!["all".to_string()])
            .unwrap();
        let svg = to_svg(&ctx.capture());
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn histogram_renders_rects() {
        let ctx = ChartContext::new();
        ctx.handle().hist(vec![1.0, 2.0, 2.5, 3.0], 3).unwrap();
        let svg = to_svg(&ctx.capture());
        assert_eq!(svg.matches("stroke=\"white\"").count(), 3);
    }

    #[test]
    fn tick_formatting() {
        assert_eq!(format_tick(10.0), "10");
        assert_eq!(format_tick(2.5), "2.50");
        assert_eq!(format_tick(1234.4), "1234");
    }
}
