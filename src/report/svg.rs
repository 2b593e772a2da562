//! SVG rendering of [`Figure`]s.
//!
//! Every mark carries a `<title>` child so browsers show a tooltip on hover.

use std::f64::consts::PI;
use std::fmt::Write;

use crate::charts::palette::{blues, color};
use crate::charts::{ChartKind, Figure, Point, Unit};
use crate::report::html_escape;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 420.0;
const LEFT: f64 = 60.0;
const RIGHT: f64 = 170.0;
const TOP: f64 = 50.0;
const BOTTOM: f64 = 90.0;

const PLOT_W: f64 = WIDTH - LEFT - RIGHT;
const PLOT_H: f64 = HEIGHT - TOP - BOTTOM;

/// Renders a figure as a standalone `<svg>` element.
pub fn render(fig: &Figure) -> String {
    let mut svg = format!(
        "<svg class=\"chart\" viewBox=\"0 0 {WIDTH} {HEIGHT}\" width=\"{WIDTH}\" height=\"{HEIGHT}\" xmlns=\"http://www.w3.org/2000/svg\" role=\"img\">\n"
    );
    let _ = writeln!(
        svg,
        "  <text class=\"chart-title\" x=\"{:.1}\" y=\"28\" text-anchor=\"middle\" font-size=\"16\">{}</text>",
        (LEFT + PLOT_W / 2.0),
        html_escape(&fig.title)
    );

    if fig.is_empty() {
        let _ = writeln!(
            svg,
            "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" fill=\"#6b7280\">No data</text>",
            LEFT + PLOT_W / 2.0,
            TOP + PLOT_H / 2.0
        );
    } else {
        match fig.kind {
            ChartKind::Bar => render_bars(&mut svg, fig),
            ChartKind::Line => render_lines(&mut svg, fig),
            ChartKind::Pie { hole } => render_pie(&mut svg, fig, hole),
            ChartKind::Heatmap => render_heatmap(&mut svg, fig),
        }
    }

    svg.push_str("</svg>\n");
    svg
}

/// Tooltip and label text for a value, with its student count when known.
fn describe(unit: Unit, value: f64, count: Option<usize>) -> String {
    match count {
        Some(n) => format!("{} (Count: {n})", unit.format(value)),
        None => unit.format(value),
    }
}

/// Value axis bounds; stretched when data exceeds the configured range.
fn y_bounds(fig: &Figure) -> (f64, f64) {
    let (min, mut max) = fig.y_range;
    let data_max = fig.max_value();
    if data_max > max {
        max = data_max * 1.1;
    }
    if max <= min {
        max = min + 1.0;
    }
    (min, max)
}

fn y_px(value: f64, (min, max): (f64, f64)) -> f64 {
    let t = ((value - min) / (max - min)).clamp(0.0, 1.0);
    TOP + PLOT_H * (1.0 - t)
}

fn render_axes(svg: &mut String, fig: &Figure, bounds: (f64, f64)) {
    let (min, max) = bounds;
    for i in 0..=5 {
        let v = min + (max - min) * i as f64 / 5.0;
        let y = y_px(v, bounds);
        let label = match fig.unit {
            Unit::Percent { .. } => format!("{v:.0}"),
            Unit::Count => format!("{}", v.round() as i64),
        };
        let _ = writeln!(
            svg,
            "  <line class=\"grid\" x1=\"{LEFT}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"#e5e7eb\"/>",
            LEFT + PLOT_W
        );
        let _ = writeln!(
            svg,
            "  <text x=\"{:.1}\" y=\"{y:.1}\" font-size=\"11\" text-anchor=\"end\" dominant-baseline=\"middle\">{label}</text>",
            LEFT - 6.0
        );
    }

    let _ = writeln!(
        svg,
        "  <text x=\"14\" y=\"{:.1}\" font-size=\"12\" text-anchor=\"middle\" transform=\"rotate(-90 14 {:.1})\">{}</text>",
        TOP + PLOT_H / 2.0,
        TOP + PLOT_H / 2.0,
        html_escape(&fig.y_label)
    );
    let _ = writeln!(
        svg,
        "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\" text-anchor=\"middle\">{}</text>",
        LEFT + PLOT_W / 2.0,
        HEIGHT - 8.0,
        html_escape(&fig.x_label)
    );
}

fn render_category_labels(svg: &mut String, categories: &[String]) {
    let band = PLOT_W / categories.len().max(1) as f64;
    let rotate = categories.len() > 5 || categories.iter().any(|c| c.len() > 12);

    for (i, category) in categories.iter().enumerate() {
        let x = LEFT + band * (i as f64 + 0.5);
        let y = TOP + PLOT_H + 16.0;
        if rotate {
            let _ = writeln!(
                svg,
                "  <text x=\"{x:.1}\" y=\"{y:.1}\" font-size=\"11\" text-anchor=\"end\" transform=\"rotate(-35 {x:.1} {y:.1})\">{}</text>",
                html_escape(category)
            );
        } else {
            let _ = writeln!(
                svg,
                "  <text x=\"{x:.1}\" y=\"{y:.1}\" font-size=\"11\" text-anchor=\"middle\">{}</text>",
                html_escape(category)
            );
        }
    }
}

fn render_legend(svg: &mut String, entries: &[(String, &str)]) {
    let x = LEFT + PLOT_W + 16.0;
    for (i, (name, fill)) in entries.iter().enumerate() {
        let y = TOP + i as f64 * 20.0;
        let _ = writeln!(
            svg,
            "  <rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"12\" height=\"12\" fill=\"{fill}\"/>"
        );
        let _ = writeln!(
            svg,
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\" dominant-baseline=\"middle\">{}</text>",
            x + 18.0,
            y + 6.0,
            html_escape(name)
        );
    }
}

fn render_bars(svg: &mut String, fig: &Figure) {
    let bounds = y_bounds(fig);
    render_axes(svg, fig, bounds);

    let n = fig.categories.len().max(1);
    let m = fig.series.len().max(1);
    let band = PLOT_W / n as f64;
    let bar_w = band * 0.8 / m as f64;
    let base = y_px(bounds.0, bounds);

    for (s, series) in fig.series.iter().enumerate() {
        for (c, category) in fig.categories.iter().enumerate() {
            let Some(point) = series.point(category) else {
                continue;
            };
            let fill = if fig.color_by_category {
                color(fig.palette, c)
            } else {
                color(fig.palette, s)
            };
            let x = LEFT + band * c as f64 + band * 0.1 + bar_w * s as f64;
            let y = y_px(point.value, bounds);
            let tooltip = format!(
                "{} | {}: {}",
                category,
                series.name,
                describe(fig.unit, point.value, point.count)
            );

            let _ = writeln!(
                svg,
                "  <rect class=\"mark\" x=\"{x:.1}\" y=\"{y:.1}\" width=\"{bar_w:.1}\" height=\"{:.1}\" fill=\"{fill}\"><title>{}</title></rect>",
                base - y,
                html_escape(&tooltip)
            );

            let cx = x + bar_w / 2.0;
            let _ = writeln!(
                svg,
                "  <text class=\"value\" x=\"{cx:.1}\" y=\"{:.1}\" font-size=\"10\" text-anchor=\"middle\">{}</text>",
                y - if point.count.is_some() { 16.0 } else { 4.0 },
                fig.unit.format(point.value)
            );
            if let Some(count) = point.count {
                let _ = writeln!(
                    svg,
                    "  <text class=\"value\" x=\"{cx:.1}\" y=\"{:.1}\" font-size=\"9\" text-anchor=\"middle\">Count: {count}</text>",
                    y - 4.0
                );
            }
        }
    }

    render_category_labels(svg, &fig.categories);

    if !fig.color_by_category {
        let entries: Vec<(String, &str)> = fig
            .series
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.clone(), color(fig.palette, i)))
            .collect();
        render_legend(svg, &entries);
    }
}

fn render_lines(svg: &mut String, fig: &Figure) {
    let bounds = y_bounds(fig);
    render_axes(svg, fig, bounds);

    let band = PLOT_W / fig.categories.len().max(1) as f64;
    let x_of = |category: &str| {
        fig.categories
            .iter()
            .position(|c| c == category)
            .map(|i| LEFT + band * (i as f64 + 0.5))
    };

    for (s, series) in fig.series.iter().enumerate() {
        let stroke = color(fig.palette, s);
        let coords: Vec<(f64, f64, &Point)> = series
            .points
            .iter()
            .filter_map(|p| Some((x_of(&p.category)?, y_px(p.value, bounds), p)))
            .collect();

        let path: Vec<String> = coords.iter().map(|(x, y, _)| format!("{x:.1},{y:.1}")).collect();
        let _ = writeln!(
            svg,
            "  <polyline points=\"{}\" fill=\"none\" stroke=\"{stroke}\" stroke-width=\"2\"/>",
            path.join(" ")
        );

        for (x, y, point) in coords {
            let tooltip = format!(
                "{}: {} {} | {}",
                series.name,
                fig.x_label,
                point.category,
                describe(fig.unit, point.value, point.count)
            );
            let _ = writeln!(
                svg,
                "  <circle class=\"mark\" cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"4\" fill=\"{stroke}\"><title>{}</title></circle>",
                html_escape(&tooltip)
            );
            let _ = writeln!(
                svg,
                "  <text class=\"value\" x=\"{x:.1}\" y=\"{:.1}\" font-size=\"9\" text-anchor=\"middle\">{}</text>",
                y - 8.0,
                fig.unit.format(point.value)
            );
        }
    }

    render_category_labels(svg, &fig.categories);

    let entries: Vec<(String, &str)> = fig
        .series
        .iter()
        .enumerate()
        .map(|(i, s)| (s.name.clone(), color(fig.palette, i)))
        .collect();
    render_legend(svg, &entries);
}

fn render_pie(svg: &mut String, fig: &Figure, hole: f64) {
    let Some(series) = fig.series.first() else {
        return;
    };
    let total: f64 = series.points.iter().map(|p| p.value).sum();
    let cx = LEFT + PLOT_W / 2.0;
    let cy = TOP + PLOT_H / 2.0 + 10.0;
    let r = PLOT_H.min(PLOT_W) / 2.0;

    if total <= 0.0 {
        let _ = writeln!(
            svg,
            "  <text x=\"{cx:.1}\" y=\"{cy:.1}\" text-anchor=\"middle\" fill=\"#6b7280\">No data</text>"
        );
        return;
    }

    let mut angle = -PI / 2.0;
    for (i, point) in series.points.iter().enumerate() {
        if point.value <= 0.0 {
            continue;
        }
        let fill = color(fig.palette, i);
        let share = point.value / total;
        let sweep = share * 2.0 * PI;
        let tooltip = format!(
            "{}: {} ({:.1}%)",
            point.category,
            fig.unit.format(point.value),
            share * 100.0
        );

        if share >= 0.9999 {
            let _ = writeln!(
                svg,
                "  <circle class=\"mark\" cx=\"{cx:.1}\" cy=\"{cy:.1}\" r=\"{r:.1}\" fill=\"{fill}\"><title>{}</title></circle>",
                html_escape(&tooltip)
            );
        } else {
            let (x1, y1) = (cx + r * angle.cos(), cy + r * angle.sin());
            let end = angle + sweep;
            let (x2, y2) = (cx + r * end.cos(), cy + r * end.sin());
            let large = if sweep > PI { 1 } else { 0 };
            let _ = writeln!(
                svg,
                "  <path class=\"mark\" d=\"M {cx:.1} {cy:.1} L {x1:.1} {y1:.1} A {r:.1} {r:.1} 0 {large} 1 {x2:.1} {y2:.1} Z\" fill=\"{fill}\" stroke=\"#fff\"><title>{}</title></path>",
                html_escape(&tooltip)
            );
        }

        let mid = angle + sweep / 2.0;
        let label_r = r * (0.5 + hole / 2.0).max(0.6);
        let _ = writeln!(
            svg,
            "  <text class=\"value\" x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" text-anchor=\"middle\">{} ({:.1}%)</text>",
            cx + label_r * mid.cos(),
            cy + label_r * mid.sin(),
            fig.unit.format(point.value),
            share * 100.0
        );

        angle += sweep;
    }

    if hole > 0.0 {
        let _ = writeln!(
            svg,
            "  <circle cx=\"{cx:.1}\" cy=\"{cy:.1}\" r=\"{:.1}\" fill=\"var(--bg, #fff)\"/>",
            r * hole
        );
    }

    let entries: Vec<(String, &str)> = series
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| (p.category.clone(), color(fig.palette, i)))
        .collect();
    render_legend(svg, &entries);
}

fn render_heatmap(svg: &mut String, fig: &Figure) {
    let rows = fig.series.len().max(1);
    let cols = fig.categories.len().max(1);
    let cell_w = PLOT_W / cols as f64;
    let cell_h = PLOT_H / rows as f64;
    let max = fig.max_value().max(1.0);

    for (r, series) in fig.series.iter().enumerate() {
        let y = TOP + cell_h * r as f64;
        let _ = writeln!(
            svg,
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>",
            LEFT - 6.0,
            y + cell_h / 2.0,
            html_escape(&series.name)
        );

        for (c, category) in fig.categories.iter().enumerate() {
            let value = series.point(category).map(|p| p.value).unwrap_or(0.0);
            let t = value / max;
            let x = LEFT + cell_w * c as f64;
            let tooltip = format!(
                "{} / {}: {}",
                series.name,
                category,
                fig.unit.format(value)
            );
            let _ = writeln!(
                svg,
                "  <rect class=\"mark\" x=\"{x:.1}\" y=\"{y:.1}\" width=\"{cell_w:.1}\" height=\"{cell_h:.1}\" fill=\"{}\" stroke=\"#fff\"><title>{}</title></rect>",
                blues(t),
                html_escape(&tooltip)
            );
            let _ = writeln!(
                svg,
                "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\" text-anchor=\"middle\" dominant-baseline=\"middle\" fill=\"{}\">{}</text>",
                x + cell_w / 2.0,
                y + cell_h / 2.0,
                if t > 0.5 { "#fff" } else { "#1a1a1a" },
                fig.unit.format(value)
            );
        }
    }

    render_category_labels(svg, &fig.categories);
    let _ = writeln!(
        svg,
        "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\" text-anchor=\"middle\">{}</text>",
        LEFT + PLOT_W / 2.0,
        HEIGHT - 8.0,
        html_escape(&fig.x_label)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::Series;
    use crate::charts::palette::SET2;

    fn bar() -> Figure {
        Figure::new(ChartKind::Bar, "Overall <Numeracy>")
            .palette(SET2)
            .categories(vec!["Addition".into(), "Pattern Recognition".into()])
            .series(Series::new(
                "Overall",
                vec![
                    Point::new("Addition", 40.0).with_count(4),
                    Point::new("Pattern Recognition", 150.0).with_count(15),
                ],
            ))
    }

    #[test]
    fn test_bar_chart_marks_and_labels() {
        let svg = render(&bar());

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<rect class=\"mark\"").count(), 2);
        assert!(svg.contains("Overall &lt;Numeracy&gt;"));
        assert!(svg.contains("40.0%"));
        assert!(svg.contains("Count: 15"));
        assert!(svg.contains("<title>Addition | Overall: 40.0% (Count: 4)</title>"));
    }

    #[test]
    fn test_y_bounds_stretch_to_data() {
        let (min, max) = y_bounds(&bar());
        assert_eq!(min, 0.0);
        assert!(max >= 150.0);
    }

    #[test]
    fn test_empty_figure_says_no_data() {
        let svg = render(&Figure::new(ChartKind::Line, "Nothing"));
        assert!(svg.contains("No data"));
    }

    #[test]
    fn test_pie_single_slice_is_full_circle() {
        let fig = Figure::new(ChartKind::Pie { hole: 0.4 }, "Gender")
            .unit(Unit::Count)
            .series(Series::new(
                "Gender",
                vec![Point::new("Female", 12.0), Point::new("Male", 0.0)],
            ));
        let svg = render(&fig);

        assert!(svg.contains("<circle class=\"mark\""));
        assert!(svg.contains("12 (100.0%)"));
        assert!(!svg.contains("<path class=\"mark\""));
    }

    #[test]
    fn test_pie_two_slices() {
        let fig = Figure::new(ChartKind::Pie { hole: 0.0 }, "Achievement")
            .unit(Unit::Count)
            .series(Series::new(
                "Numeracy",
                vec![Point::new("Achieved", 3.0), Point::new("Not Achieved", 1.0)],
            ));
        let svg = render(&fig);

        assert_eq!(svg.matches("<path class=\"mark\"").count(), 2);
        assert!(svg.contains("Achieved: 3 (75.0%)"));
    }

    #[test]
    fn test_line_and_heatmap_render() {
        let line = Figure::new(ChartKind::Line, "By age")
            .categories(vec!["7".into(), "8".into()])
            .series(Series::new(
                "Addition",
                vec![Point::new("7", 20.0), Point::new("8", 60.0)],
            ));
        let svg = render(&line);
        assert!(svg.contains("<polyline"));
        assert_eq!(svg.matches("<circle class=\"mark\"").count(), 2);

        let heat = Figure::new(ChartKind::Heatmap, "Cross")
            .unit(Unit::Count)
            .categories(vec!["no".into(), "yes".into()])
            .series(Series::new("yes", vec![Point::new("no", 2.0), Point::new("yes", 5.0)]));
        let svg = render(&heat);
        assert_eq!(svg.matches("<rect class=\"mark\"").count(), 2);
        assert!(svg.contains("#08306b"));
    }
}
