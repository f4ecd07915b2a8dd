//! Report charts
//!
//! Charts render two ways: inline SVG for the HTML report and block-character
//! bars for the terminal report. Bar heights are scaled against a fixed
//! y-axis maximum so charts of the same kind stay comparable.

use crate::html_output::escape_html;
use crate::hypothesis::{Histogram, NullSimulation};
use crate::stats::{ConversionSummary, GroupRate};

const SVG_WIDTH: f64 = 640.0;
const SVG_HEIGHT: f64 = 360.0;
const SVG_LEFT_MARGIN: f64 = 64.0;
const SVG_RIGHT_MARGIN: f64 = 24.0;
const SVG_TOP_MARGIN: f64 = 44.0;
const SVG_BOTTOM_MARGIN: f64 = 56.0;
const Y_TICKS: usize = 5;
const BAR_FILL: &str = "#4a90d9";

/// y-axis maximum of the per-segment conversion charts
pub const SEGMENT_RATE_MAX: f64 = 0.30;

/// y-axis maximum of the control/treatment comparison chart
pub const OBSERVED_RATE_MAX: f64 = 0.25;

fn plot_width() -> f64 {
    SVG_WIDTH - SVG_LEFT_MARGIN - SVG_RIGHT_MARGIN
}

fn plot_height() -> f64 {
    SVG_HEIGHT - SVG_TOP_MARGIN - SVG_BOTTOM_MARGIN
}

/// Opening tag, title and axis lines shared by every chart
fn svg_frame(title: &str, x_label: &str, y_label: &str) -> String {
    let bottom = SVG_TOP_MARGIN + plot_height();
    let right = SVG_LEFT_MARGIN + plot_width();

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{SVG_WIDTH}\" height=\"{SVG_HEIGHT}\" viewBox=\"0 0 {SVG_WIDTH} {SVG_HEIGHT}\" role=\"img\">"
    ));
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"24\" text-anchor=\"middle\" font-size=\"15\" font-weight=\"bold\">{}</text>",
        SVG_WIDTH / 2.0,
        escape_html(title)
    ));
    svg.push_str(&format!(
        "<line x1=\"{SVG_LEFT_MARGIN}\" y1=\"{SVG_TOP_MARGIN}\" x2=\"{SVG_LEFT_MARGIN}\" y2=\"{bottom}\" stroke=\"#333\"/>"
    ));
    svg.push_str(&format!(
        "<line x1=\"{SVG_LEFT_MARGIN}\" y1=\"{bottom}\" x2=\"{right}\" y2=\"{bottom}\" stroke=\"#333\"/>"
    ));
    if !x_label.is_empty() {
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"12\">{}</text>",
            SVG_LEFT_MARGIN + plot_width() / 2.0,
            SVG_HEIGHT - 10.0,
            escape_html(x_label)
        ));
    }
    svg.push_str(&format!(
        "<text x=\"16\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"12\" transform=\"rotate(-90 16 {:.1})\">{}</text>",
        SVG_TOP_MARGIN + plot_height() / 2.0,
        SVG_TOP_MARGIN + plot_height() / 2.0,
        escape_html(y_label)
    ));
    svg
}

/// Evenly spaced y-axis tick labels from 0 to `y_max`
fn svg_y_ticks(y_max: f64, decimals: usize) -> String {
    let mut svg = String::new();
    for tick in 0..=Y_TICKS {
        let value = y_max * tick as f64 / Y_TICKS as f64;
        let y = SVG_TOP_MARGIN + plot_height() * (1.0 - tick as f64 / Y_TICKS as f64);
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"11\">{:.*}</text>",
            SVG_LEFT_MARGIN - 6.0,
            y + 4.0,
            decimals,
            value
        ));
    }
    svg
}

/// Height in pixels of `value` on an axis ending at `y_max`; NaN draws nothing
fn scaled_height(value: f64, y_max: f64) -> f64 {
    if !value.is_finite() || y_max <= 0.0 {
        return 0.0;
    }
    (value / y_max).clamp(0.0, 1.0) * plot_height()
}

/// Number of block characters for `value` on a bar of at most `width`
fn ascii_length(value: f64, max: f64, width: usize) -> usize {
    if !value.is_finite() || max <= 0.0 {
        return 0;
    }
    ((value / max).clamp(0.0, 1.0) * width as f64).round() as usize
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// Vertical bar chart with a fixed y-axis range
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub y_label: String,
    pub y_max: f64,
    pub bars: Vec<Bar>,
    /// Print each value above its bar
    pub annotate: bool,
}

impl BarChart {
    pub fn new(title: impl Into<String>, y_label: impl Into<String>, y_max: f64) -> Self {
        Self {
            title: title.into(),
            y_label: y_label.into(),
            y_max,
            bars: Vec::new(),
            annotate: false,
        }
    }

    pub fn with_bar(mut self, label: impl Into<String>, value: f64) -> Self {
        self.bars.push(Bar {
            label: label.into(),
            value,
        });
        self
    }

    pub fn annotated(mut self) -> Self {
        self.annotate = true;
        self
    }

    /// One bar per group, in group order
    pub fn from_groups(title: impl Into<String>, groups: &[GroupRate], y_max: f64) -> Self {
        groups.iter().fold(
            Self::new(title, "Conversion Rate", y_max),
            |chart, group| chart.with_bar(group.label.clone(), group.rate),
        )
    }

    pub fn to_svg(&self) -> String {
        let mut svg = svg_frame(&self.title, "", &self.y_label);
        svg.push_str(&svg_y_ticks(self.y_max, 2));

        let bottom = SVG_TOP_MARGIN + plot_height();
        let slot = plot_width() / self.bars.len().max(1) as f64;
        let bar_width = slot * 0.6;

        for (i, bar) in self.bars.iter().enumerate() {
            let x = SVG_LEFT_MARGIN + slot * i as f64 + (slot - bar_width) / 2.0;
            let height = scaled_height(bar.value, self.y_max);
            let y = bottom - height;
            let center = x + bar_width / 2.0;

            svg.push_str(&format!(
                "<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{bar_width:.1}\" height=\"{height:.1}\" fill=\"{BAR_FILL}\"><title>{}: {:.4}</title></rect>",
                escape_html(&bar.label),
                bar.value
            ));
            svg.push_str(&format!(
                "<text x=\"{center:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"12\">{}</text>",
                bottom + 18.0,
                escape_html(&bar.label)
            ));
            if self.annotate {
                svg.push_str(&format!(
                    "<text x=\"{center:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"12\">{:.3}</text>",
                    y - 6.0,
                    bar.value
                ));
            }
        }

        svg.push_str("</svg>");
        svg
    }

    /// Horizontal block-character bars, `width` characters at `y_max`
    pub fn to_ascii(&self, width: usize) -> String {
        let label_width = self
            .bars
            .iter()
            .map(|b| b.label.chars().count())
            .max()
            .unwrap_or(0);

        let mut out = format!("{}\n", self.title);
        for bar in &self.bars {
            let length = ascii_length(bar.value, self.y_max, width);
            out.push_str(&format!(
                "  {:<label_width$} │{}{} {:.4}\n",
                bar.label,
                "█".repeat(length),
                " ".repeat(width - length),
                bar.value
            ));
        }
        out.push_str(&format!(
            "  {:<label_width$} └{}┘ 0 .. {:.2}\n",
            "",
            "─".repeat(width),
            self.y_max
        ));
        out
    }
}

/// Frequency histogram with an optional vertical reference line
#[derive(Debug, Clone)]
pub struct HistogramChart<'a> {
    pub title: String,
    pub x_label: String,
    pub histogram: &'a Histogram,
    pub marker: Option<f64>,
}

impl<'a> HistogramChart<'a> {
    pub fn new(
        title: impl Into<String>,
        x_label: impl Into<String>,
        histogram: &'a Histogram,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            histogram,
            marker: None,
        }
    }

    pub fn with_marker(mut self, x: f64) -> Self {
        self.marker = Some(x);
        self
    }

    /// Horizontal extent covering every bin and the marker
    fn x_range(&self) -> Option<(f64, f64)> {
        let first = self.histogram.bins.first()?;
        let last = self.histogram.bins.last()?;
        let (mut lo, mut hi) = (first.lower, last.upper);
        if let Some(m) = self.marker {
            lo = lo.min(m);
            hi = hi.max(m);
        }
        if hi > lo {
            Some((lo, hi))
        } else {
            Some((lo - 0.5, hi + 0.5))
        }
    }

    pub fn to_svg(&self) -> String {
        let mut svg = svg_frame(&self.title, &self.x_label, "Frequency");
        let Some((lo, hi)) = self.x_range() else {
            svg.push_str("</svg>");
            return svg;
        };

        let y_max = self.histogram.max_count().max(1) as f64;
        svg.push_str(&svg_y_ticks(y_max, 0));

        let bottom = SVG_TOP_MARGIN + plot_height();
        let to_x = |v: f64| SVG_LEFT_MARGIN + (v - lo) / (hi - lo) * plot_width();

        for bin in &self.histogram.bins {
            let x = to_x(bin.lower);
            let width = (to_x(bin.upper) - x).max(1.0);
            let height = scaled_height(bin.count as f64, y_max);
            svg.push_str(&format!(
                "<rect x=\"{x:.1}\" y=\"{:.1}\" width=\"{width:.1}\" height=\"{height:.1}\" fill=\"{BAR_FILL}\" fill-opacity=\"0.75\" stroke=\"#fff\" stroke-width=\"0.5\"/>",
                bottom - height
            ));
        }

        for v in [lo, (lo + hi) / 2.0, hi] {
            svg.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"11\">{:.3}</text>",
                to_x(v),
                bottom + 16.0,
                v
            ));
        }

        if let Some(m) = self.marker {
            let x = to_x(m);
            svg.push_str(&format!(
                "<line x1=\"{x:.1}\" y1=\"{SVG_TOP_MARGIN}\" x2=\"{x:.1}\" y2=\"{bottom}\" stroke=\"#000\" stroke-dasharray=\"6 4\"/>"
            ));
        }

        svg.push_str("</svg>");
        svg
    }

    /// One row per bin; the bin holding the marker is flagged
    pub fn to_ascii(&self, width: usize) -> String {
        let max = self.histogram.max_count() as f64;
        let mut out = format!("{}\n", self.title);
        for bin in &self.histogram.bins {
            let length = ascii_length(bin.count as f64, max, width);
            let flag = match self.marker {
                Some(m) if bin.lower <= m && m < bin.upper => format!(" ◄ {}", m),
                _ => String::new(),
            };
            out.push_str(&format!(
                "  {:>+9.5} │{:<width$} {:>5}{}\n",
                bin.lower,
                "█".repeat(length),
                bin.count,
                flag
            ));
        }
        out.push_str(&format!("  {:>9} └{}\n", "", "─".repeat(width)));
        out.push_str(&format!("  {}\n", self.x_label));
        out
    }
}

pub fn location_chart(summary: &ConversionSummary) -> BarChart {
    BarChart::from_groups(
        "Conversion Rates by Location",
        &summary.by_location,
        SEGMENT_RATE_MAX,
    )
}

pub fn device_chart(summary: &ConversionSummary) -> BarChart {
    BarChart::from_groups(
        "Conversion Rates by Device Type",
        &summary.by_device,
        SEGMENT_RATE_MAX,
    )
}

pub fn observed_rates_chart(summary: &ConversionSummary) -> BarChart {
    BarChart::new(
        "Observed Conversion Rates with Z-Test Results",
        "Conversion Rate",
        OBSERVED_RATE_MAX,
    )
    .with_bar("Control", summary.control_rate)
    .with_bar("Treatment", summary.treatment_rate)
    .annotated()
}

/// Simulated differences with a reference line at zero
pub fn null_distribution_chart(simulation: &NullSimulation) -> HistogramChart<'_> {
    HistogramChart::new(
        "Simulated Differences in Conversion Rates under Null Hypothesis",
        "Difference in Conversion Rate",
        &simulation.histogram,
    )
    .with_marker(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hypothesis::HistogramBin;

    fn rates() -> BarChart {
        BarChart::new("Conversion Rates by Device Type", "Conversion Rate", 0.30)
            .with_bar("Desktop", 0.2388)
            .with_bar("Mobile", 0.2111)
            .with_bar("Tablet", 0.2321)
    }

    fn histogram() -> Histogram {
        Histogram {
            bins: vec![
                HistogramBin {
                    lower: -0.02,
                    upper: -0.01,
                    count: 10,
                },
                HistogramBin {
                    lower: -0.01,
                    upper: 0.0,
                    count: 40,
                },
                HistogramBin {
                    lower: 0.0,
                    upper: 0.01,
                    count: 38,
                },
                HistogramBin {
                    lower: 0.01,
                    upper: 0.02,
                    count: 12,
                },
            ],
        }
    }

    #[test]
    fn test_bar_chart_svg_structure() {
        let svg = rates().to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<rect").count(), 3);
        assert!(svg.contains("Conversion Rates by Device Type"));
        assert!(svg.contains(">Desktop</text>"));
        // y-axis runs to the fixed maximum
        assert!(svg.contains(">0.30</text>"));
    }

    #[test]
    fn test_bar_chart_annotations() {
        let plain = rates().to_svg();
        assert!(!plain.contains(">0.239</text>"));
        let annotated = rates().annotated().to_svg();
        assert!(annotated.contains(">0.239</text>"));
    }

    #[test]
    fn test_bar_chart_escapes_labels() {
        let svg = BarChart::new("<t>", "y", 1.0).with_bar("a&b", 0.5).to_svg();
        assert!(svg.contains("a&amp;b"));
        assert!(svg.contains("&lt;t&gt;"));
        assert!(!svg.contains("<t>"));
    }

    #[test]
    fn test_bar_chart_from_groups() {
        let groups = vec![
            GroupRate {
                label: "Asia".to_string(),
                observations: 10,
                conversions: 3,
                rate: 0.3,
            },
            GroupRate {
                label: "Europe".to_string(),
                observations: 10,
                conversions: 2,
                rate: 0.2,
            },
        ];
        let chart = BarChart::from_groups("By location", &groups, 0.30);
        assert_eq!(chart.bars.len(), 2);
        assert_eq!(chart.bars[0].label, "Asia");
        assert_eq!(chart.y_label, "Conversion Rate");
    }

    #[test]
    fn test_bar_chart_ascii_scaling() {
        let ascii = BarChart::new("t", "y", 0.30)
            .with_bar("full", 0.30)
            .with_bar("half", 0.15)
            .with_bar("none", f64::NAN)
            .to_ascii(20);
        let lines: Vec<&str> = ascii.lines().collect();
        assert_eq!(lines[0], "t");
        assert_eq!(lines[1].matches('█').count(), 20);
        assert_eq!(lines[2].matches('█').count(), 10);
        assert_eq!(lines[3].matches('█').count(), 0);
        assert!(lines[3].ends_with("NaN"));
    }

    #[test]
    fn test_values_above_axis_are_clamped() {
        assert_eq!(scaled_height(0.5, 0.25), plot_height());
        assert_eq!(scaled_height(-1.0, 0.25), 0.0);
        assert_eq!(ascii_length(0.5, 0.25, 10), 10);
    }

    #[test]
    fn test_histogram_svg_marker() {
        let hist = histogram();
        let svg = HistogramChart::new("Null", "Difference", &hist)
            .with_marker(0.0)
            .to_svg();
        assert_eq!(svg.matches("<rect").count(), 4);
        assert!(svg.contains("stroke-dasharray"));

        let without = HistogramChart::new("Null", "Difference", &hist).to_svg();
        assert!(!without.contains("stroke-dasharray"));
    }

    #[test]
    fn test_histogram_ascii_flags_marker_bin() {
        let hist = histogram();
        let ascii = HistogramChart::new("Null", "Difference", &hist)
            .with_marker(0.0)
            .to_ascii(40);
        let flagged: Vec<&str> = ascii.lines().filter(|l| l.contains('◄')).collect();
        assert_eq!(flagged.len(), 1);
        assert!(flagged[0].contains("+0.00000"));
        assert_eq!(flagged[0].matches('█').count(), 38);
    }

    #[test]
    fn test_empty_histogram() {
        let hist = Histogram { bins: Vec::new() };
        let svg = HistogramChart::new("Empty", "x", &hist).to_svg();
        assert!(svg.ends_with("</svg>"));
        assert!(!svg.contains("<rect"));
    }
}
