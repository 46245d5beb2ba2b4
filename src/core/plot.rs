use crate::domain::model::EvalueDistribution;
use crate::utils::error::{EtlError, Result};
use std::path::Path;
use svg::node::element::{Line, Rectangle, Text};
use svg::Document;

const SVG_WIDTH: f32 = 800.0;
const SVG_HEIGHT: f32 = 600.0;
const PLOT_LEFT: f32 = 90.0;
const PLOT_RIGHT: f32 = SVG_WIDTH - 40.0;
const PLOT_TOP: f32 = 70.0;
const PLOT_BOTTOM: f32 = SVG_HEIGHT - 80.0;
const Y_TICKS: usize = 5;

const BAR_FILL: &str = "#1f77b4";
const AXIS_COLOR: &str = "#111827";
const LABEL_COLOR: &str = "#374151";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotFormat {
    Svg,
    Png,
}

impl PlotFormat {
    /// `.svg` 以外一律輸出 PNG
    pub fn from_path(path: &str) -> Self {
        match Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
        {
            Some(ext) if ext == "svg" => PlotFormat::Svg,
            _ => PlotFormat::Png,
        }
    }
}

pub fn histogram_title(distribution: &EvalueDistribution) -> String {
    format!("Average log(e-value): {:.3}", distribution.mean)
}

fn axis_text(content: String, x: f32, y: f32, anchor: &str) -> Text {
    Text::new(content)
        .set("x", x)
        .set("y", y)
        .set("text-anchor", anchor)
        .set("font-family", "sans-serif")
        .set("font-size", 13)
        .set("fill", LABEL_COLOR)
}

pub fn render_histogram_svg(distribution: &EvalueDistribution) -> Document {
    let histogram = &distribution.histogram;
    let bins = histogram.counts.len().max(1);
    let max_count = histogram.max_count().max(1) as f32;
    let plot_width = PLOT_RIGHT - PLOT_LEFT;
    let plot_height = PLOT_BOTTOM - PLOT_TOP;
    let bar_width = plot_width / bins as f32;

    let mut doc = Document::new()
        .set("viewBox", (0, 0, SVG_WIDTH, SVG_HEIGHT))
        .set("width", SVG_WIDTH)
        .set("height", SVG_HEIGHT)
        .add(
            Rectangle::new()
                .set("x", 0)
                .set("y", 0)
                .set("width", SVG_WIDTH)
                .set("height", SVG_HEIGHT)
                .set("fill", "#ffffff"),
        )
        .add(
            Text::new(histogram_title(distribution))
                .set("x", SVG_WIDTH / 2.0)
                .set("y", PLOT_TOP / 2.0)
                .set("text-anchor", "middle")
                .set("font-family", "sans-serif")
                .set("font-size", 18)
                .set("fill", AXIS_COLOR),
        );

    for (i, count) in histogram.counts.iter().enumerate() {
        if *count == 0 {
            continue;
        }
        let height = *count as f32 / max_count * plot_height;
        doc = doc.add(
            Rectangle::new()
                .set("x", PLOT_LEFT + bar_width * i as f32)
                .set("y", PLOT_BOTTOM - height)
                .set("width", bar_width)
                .set("height", height)
                .set("fill", BAR_FILL)
                .set("stroke", "#ffffff")
                .set("stroke-width", 1),
        );
    }

    // 軸線
    doc = doc
        .add(
            Line::new()
                .set("x1", PLOT_LEFT)
                .set("y1", PLOT_BOTTOM)
                .set("x2", PLOT_RIGHT)
                .set("y2", PLOT_BOTTOM)
                .set("stroke", AXIS_COLOR)
                .set("stroke-width", 2),
        )
        .add(
            Line::new()
                .set("x1", PLOT_LEFT)
                .set("y1", PLOT_TOP)
                .set("x2", PLOT_LEFT)
                .set("y2", PLOT_BOTTOM)
                .set("stroke", AXIS_COLOR)
                .set("stroke-width", 2),
        );

    for (i, edge) in histogram.edges.iter().enumerate() {
        let x = PLOT_LEFT + bar_width * i as f32;
        doc = doc
            .add(
                Line::new()
                    .set("x1", x)
                    .set("y1", PLOT_BOTTOM)
                    .set("x2", x)
                    .set("y2", PLOT_BOTTOM + 5.0)
                    .set("stroke", AXIS_COLOR)
                    .set("stroke-width", 1),
            )
            .add(axis_text(format!("{:.1}", edge), x, PLOT_BOTTOM + 20.0, "middle"));
    }

    let tick_step = (histogram.max_count() as f32 / Y_TICKS as f32).ceil().max(1.0);
    let mut tick = 0.0f32;
    while tick <= max_count {
        let y = PLOT_BOTTOM - tick / max_count * plot_height;
        doc = doc
            .add(
                Line::new()
                    .set("x1", PLOT_LEFT - 5.0)
                    .set("y1", y)
                    .set("x2", PLOT_LEFT)
                    .set("y2", y)
                    .set("stroke", AXIS_COLOR)
                    .set("stroke-width", 1),
            )
            .add(axis_text(format!("{}", tick as usize), PLOT_LEFT - 9.0, y + 4.0, "end"));
        tick += tick_step;
    }

    doc.add(axis_text(
        "log(e-value)".to_string(),
        (PLOT_LEFT + PLOT_RIGHT) / 2.0,
        SVG_HEIGHT - 30.0,
        "middle",
    ))
    .add(
        axis_text("Frequency".to_string(), 0.0, 0.0, "middle").set(
            "transform",
            format!(
                "translate({}, {}) rotate(-90)",
                PLOT_LEFT - 55.0,
                (PLOT_TOP + PLOT_BOTTOM) / 2.0
            ),
        ),
    )
}

/// 依輸出格式產生圖檔內容
pub fn encode_histogram(distribution: &EvalueDistribution, format: PlotFormat) -> Result<Vec<u8>> {
    let svg_text = render_histogram_svg(distribution).to_string();
    match format {
        PlotFormat::Svg => Ok(svg_text.into_bytes()),
        PlotFormat::Png => rasterize_png(&svg_text),
    }
}

#[cfg(feature = "png")]
fn rasterize_png(svg_text: &str) -> Result<Vec<u8>> {
    use resvg::{tiny_skia, usvg};

    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg_text, &options).map_err(|e| EtlError::RenderError {
        message: format!("Invalid histogram SVG: {}", e),
    })?;

    let size = tree.size().to_int_size();
    let mut pixmap =
        tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| EtlError::RenderError {
            message: format!("Cannot allocate {}x{} pixmap", size.width(), size.height()),
        })?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    pixmap.encode_png().map_err(|e| EtlError::RenderError {
        message: format!("PNG encoding failed: {}", e),
    })
}

#[cfg(not(feature = "png"))]
fn rasterize_png(_svg_text: &str) -> Result<Vec<u8>> {
    Err(EtlError::RenderError {
        message: "PNG output requires the 'png' feature; use an .svg file name instead"
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distribution::summarize;

    #[test]
    fn test_plot_format_from_path() {
        assert_eq!(PlotFormat::from_path("out/hist.svg"), PlotFormat::Svg);
        assert_eq!(PlotFormat::from_path("out/hist.SVG"), PlotFormat::Svg);
        assert_eq!(PlotFormat::from_path("DistributionEValue.png"), PlotFormat::Png);
        assert_eq!(PlotFormat::from_path("histogram"), PlotFormat::Png);
    }

    #[test]
    fn test_svg_contains_labels_and_bars() {
        let dist = summarize(&[1e-50, 1e-20, 1e-20, 0.5, 3.0], 10).unwrap();
        let bytes = encode_histogram(&dist, PlotFormat::Svg).unwrap();
        let svg_text = String::from_utf8(bytes).unwrap();

        assert!(svg_text.contains("<svg"));
        assert!(svg_text.contains("Average log(e-value):"));
        assert!(svg_text.contains("log(e-value)"));
        assert!(svg_text.contains("Frequency"));

        let non_empty_bins = dist.histogram.counts.iter().filter(|c| **c > 0).count();
        // 背景一個 rect + 每個非空 bin 一個
        assert_eq!(svg_text.matches("<rect").count(), 1 + non_empty_bins);
    }

    #[cfg(feature = "png")]
    #[test]
    fn test_png_signature() {
        let dist = summarize(&[1e-10, 0.1, 2.0], 10).unwrap();
        let bytes = encode_histogram(&dist, PlotFormat::Png).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
