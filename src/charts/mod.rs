//! Chart model for the dashboard.
//!
//! Figures are plain data: a kind, category axis, one or more series of
//! points and styling. [`crate::report::svg`] turns them into SVG.

pub mod home;
pub mod overview;
pub mod palette;
pub mod subjects;

pub use home::home_figures;
pub use overview::{heatmap_figure, overview_figures};
pub use subjects::assessment_figures;

use palette::Palette;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChartKind {
    /// One bar per category and series, series side by side.
    Bar,
    /// Markers joined per series across the categories.
    Line,
    /// Slices from the first series; `hole` is the inner radius fraction.
    Pie { hole: f64 },
    /// Series are rows, categories are columns.
    Heatmap,
}

/// How point values are printed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Unit {
    Percent { decimals: usize },
    Count,
}

impl Unit {
    pub fn format(self, value: f64) -> String {
        match self {
            Unit::Percent { decimals } => format!("{value:.decimals$}%"),
            Unit::Count => format!("{}", value.round() as i64),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub category: String,
    pub value: f64,
    /// Students behind a percentage, shown as "Count: n".
    pub count: Option<usize>,
}

impl Point {
    pub fn new(category: impl Into<String>, value: f64) -> Self {
        Point {
            category: category.into(),
            value,
            count: None,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<Point>,
}

impl Series {
    pub fn new(name: impl Into<String>, points: Vec<Point>) -> Self {
        Series {
            name: name.into(),
            points,
        }
    }

    pub fn point(&self, category: &str) -> Option<&Point> {
        self.points.iter().find(|p| p.category == category)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub y_range: (f64, f64),
    pub unit: Unit,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
    pub palette: Palette,
    /// Color single-series bars per category instead of per series.
    pub color_by_category: bool,
}

impl Figure {
    pub fn new(kind: ChartKind, title: impl Into<String>) -> Self {
        Figure {
            kind,
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            y_range: (0.0, 120.0),
            unit: Unit::Percent { decimals: 1 },
            categories: Vec::new(),
            series: Vec::new(),
            palette: palette::SET2,
            color_by_category: false,
        }
    }

    pub fn axes(mut self, x: &str, y: &str) -> Self {
        self.x_label = x.to_string();
        self.y_label = y.to_string();
        self
    }

    pub fn y_range(mut self, min: f64, max: f64) -> Self {
        self.y_range = (min, max);
        self
    }

    pub fn unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn color_by_category(mut self) -> Self {
        self.color_by_category = true;
        self
    }

    pub fn categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    pub fn series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    /// Largest value over all series, 0 when empty.
    pub fn max_value(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.value))
            .fold(0.0, f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_format() {
        assert_eq!(Unit::Percent { decimals: 2 }.format(33.3333), "33.33%");
        assert_eq!(Unit::Percent { decimals: 1 }.format(50.0), "50.0%");
        assert_eq!(Unit::Count.format(12.0), "12");
    }

    #[test]
    fn test_figure_builder() {
        let fig = Figure::new(ChartKind::Bar, "Grades")
            .unit(Unit::Count)
            .categories(vec!["2".into(), "3".into()])
            .series(Series::new("Students", vec![Point::new("2", 4.0), Point::new("3", 9.0)]));

        assert_eq!(fig.max_value(), 9.0);
        assert!(!fig.is_empty());
        assert_eq!(fig.series[0].point("3").unwrap().value, 9.0);
        assert!(Figure::new(ChartKind::Line, "Empty").is_empty());
    }
}
