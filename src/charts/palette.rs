//! Qualitative color sequences for chart series.

pub type Palette = &'static [&'static str];

pub const SET1: Palette = &[
    "#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#ffff33", "#a65628", "#f781bf",
    "#999999",
];

pub const SET2: Palette = &[
    "#66c2a5", "#fc8d62", "#8da0cb", "#e78ac3", "#a6d854", "#ffd92f", "#e5c494", "#b3b3b3",
];

pub const SET3: Palette = &[
    "#8dd3c7", "#ffffb3", "#bebada", "#fb8072", "#80b1d3", "#fdb462", "#b3de69", "#fccde5",
    "#d9d9d9", "#bc80bd", "#ccebc5", "#ffed6f",
];

pub const PASTEL: Palette = &[
    "#66c5cc", "#f6cf71", "#f89c74", "#dcb0f2", "#87c55f", "#9eb9f3", "#fe88b1", "#c9db74",
    "#8be0a4", "#b497e7", "#d3b484", "#b3b3b3",
];

pub const NUMERACY_PIE: Palette = &["#2ecc71", "#e74c3c"];
pub const ENGLISH_PIE: Palette = &["#3498db", "#e67e22"];
pub const NEPALI_PIE: Palette = &["#9b59b6", "#e74c3c"];

/// Color for the `index`-th series, cycling through the palette.
pub fn color(palette: Palette, index: usize) -> &'static str {
    if palette.is_empty() {
        return "#888888";
    }
    palette[index % palette.len()]
}

/// Sequential blue for heatmap cells; `t` is clamped to 0..=1.
pub fn blues(t: f64) -> String {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        lerp(247.0, 8.0),
        lerp(251.0, 48.0),
        lerp(255.0, 107.0)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_cycles() {
        assert_eq!(color(SET2, 0), "#66c2a5");
        assert_eq!(color(SET2, 8), "#66c2a5");
        assert_eq!(color(&[], 3), "#888888");
    }

    #[test]
    fn test_blues_endpoints() {
        assert_eq!(blues(0.0), "#f7fbff");
        assert_eq!(blues(1.0), "#08306b");
        assert_eq!(blues(7.0), "#08306b");
    }
}
