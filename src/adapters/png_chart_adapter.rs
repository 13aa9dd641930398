//! PNG price chart renderer.
//!
//! Draws the Close line and the Moving_Average line over a shared price axis,
//! with min/mid/max price labels, first/mid/last date labels and a legend.
//! The chart is laid out as an SVG document and rasterised with resvg.

use crate::adapters::atomic_file::write_atomically;
use crate::domain::error::StockDataError;
use crate::domain::indicator::MOVING_AVERAGE;
use crate::domain::style::KNOWN_STYLES;
use crate::ports::chart_port::{ChartPort, ChartRequest};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg;
use std::io::Write;
use std::sync::Arc;

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 45.0;

/// Colours for one named style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: &'static str,
    pub plot: &'static str,
    pub text: &'static str,
    pub axis: &'static str,
    pub grid: Option<&'static str>,
    pub close: &'static str,
    pub average: &'static str,
}

pub fn palette(style: &str) -> Option<Palette> {
    let p = match style {
        "classic" => Palette {
            background: "#ffffff",
            plot: "#ffffff",
            text: "#000000",
            axis: "#000000",
            grid: None,
            close: "#0000ff",
            average: "#ff7f0e",
        },
        "seaborn-v0_8" => Palette {
            background: "#ffffff",
            plot: "#eaeaf2",
            text: "#262626",
            axis: "#ffffff",
            grid: Some("#ffffff"),
            close: "#4c72b0",
            average: "#dd8452",
        },
        "seaborn-v0_8-whitegrid" => Palette {
            background: "#ffffff",
            plot: "#ffffff",
            text: "#262626",
            axis: "#cccccc",
            grid: Some("#cccccc"),
            close: "#4c72b0",
            average: "#dd8452",
        },
        "ggplot" => Palette {
            background: "#ffffff",
            plot: "#e5e5e5",
            text: "#555555",
            axis: "#ffffff",
            grid: Some("#ffffff"),
            close: "#e24a33",
            average: "#348abd",
        },
        "fivethirtyeight" => Palette {
            background: "#f0f0f0",
            plot: "#f0f0f0",
            text: "#000000",
            axis: "#f0f0f0",
            grid: Some("#cbcbcb"),
            close: "#008fd5",
            average: "#fc4f30",
        },
        "bmh" => Palette {
            background: "#ffffff",
            plot: "#eeeeee",
            text: "#000000",
            axis: "#bcbcbc",
            grid: Some("#b2b2b2"),
            close: "#348abd",
            average: "#a60628",
        },
        "dark_background" => Palette {
            background: "#000000",
            plot: "#000000",
            text: "#ffffff",
            axis: "#ffffff",
            grid: None,
            close: "#8dd3c7",
            average: "#feffb3",
        },
        "fast" => Palette {
            background: "#ffffff",
            plot: "#ffffff",
            text: "#000000",
            axis: "#000000",
            grid: None,
            close: "#1f77b4",
            average: "#ff7f0e",
        },
        "Solarize_Light2" => Palette {
            background: "#fdf6e3",
            plot: "#eee8d5",
            text: "#657b83",
            axis: "#eee8d5",
            grid: Some("#fdf6e3"),
            close: "#268bd2",
            average: "#2aa198",
        },
        _ => return None,
    };
    Some(p)
}

pub struct PngChartAdapter {
    width: f64,
    height: f64,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl PngChartAdapter {
    /// Scans the system fonts once; labels are skipped when none are found.
    pub fn new(width: u32, height: u32) -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        tracing::debug!(faces = fontdb.len(), "loaded chart fonts");
        Self {
            width: width as f64,
            height: height as f64,
            fontdb: Arc::new(fontdb),
        }
    }

    /// Encoded PNG image for `request`.
    pub fn render_to_png(&self, request: &ChartRequest<'_>) -> Result<Vec<u8>, StockDataError> {
        let svg = self.render_to_svg(request)?;
        let options = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(&svg, &options)
            .map_err(|e| StockDataError::render(e.to_string()))?;

        let size = tree.size().to_int_size();
        let mut pixmap = Pixmap::new(size.width(), size.height()).ok_or_else(|| {
            StockDataError::render(format!(
                "cannot allocate a {}x{} canvas",
                size.width(),
                size.height()
            ))
        })?;
        resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());
        pixmap
            .encode_png()
            .map_err(|e| StockDataError::render(e.to_string()))
    }

    /// Vector layout of the chart, before rasterising.
    pub fn render_to_svg(&self, request: &ChartRequest<'_>) -> Result<String, StockDataError> {
        let palette = palette(request.style).ok_or_else(|| {
            StockDataError::configuration(format!("unsupported chart style '{}'", request.style))
        })?;
        let table = request.table;
        if table.is_empty() {
            return Err(StockDataError::EmptyData);
        }

        let closes = table.closes();
        let average: Vec<Option<f64>> = table
            .column(MOVING_AVERAGE)
            .map(|c| c.to_vec())
            .unwrap_or_else(|| vec![None; closes.len()]);

        let (min_price, max_price) = closes
            .iter()
            .copied()
            .chain(average.iter().flatten().copied())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        let range = (max_price - min_price).max(1e-9);

        let plot_width = self.width - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_height = self.height - MARGIN_TOP - MARGIN_BOTTOM;
        let bottom = self.height - MARGIN_BOTTOM;

        let x_scale = |i: usize| -> f64 {
            MARGIN_LEFT + (i as f64 / (closes.len() - 1).max(1) as f64) * plot_width
        };
        let y_scale =
            |v: f64| -> f64 { MARGIN_TOP + plot_height - ((v - min_price) / range) * plot_height };

        let close_path = line_path(closes.iter().map(|&c| Some(c)), x_scale, y_scale);
        let average_path = line_path(average.iter().copied(), x_scale, y_scale);

        let dates = table.dates();
        let first = dates[0];
        let mid = dates[dates.len() / 2];
        let last = dates[dates.len() - 1];

        let mut svg = String::new();
        svg.push_str(&format!(
            r##"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg" font-family="sans-serif">"##,
            w = self.width,
            h = self.height
        ));
        svg.push('\n');
        svg.push_str(&format!(
            "  <rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n",
            palette.background
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>\n",
            MARGIN_LEFT, MARGIN_TOP, plot_width, plot_height, palette.plot
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"24\" text-anchor=\"middle\" font-size=\"16\" fill=\"{}\">{} Stock Price ({})</text>\n",
            self.width / 2.0,
            palette.text,
            escape(request.ticker),
            escape(request.period_label)
        ));

        if let Some(grid) = palette.grid {
            for frac in [0.25, 0.5, 0.75] {
                let y = MARGIN_TOP + plot_height * frac;
                svg.push_str(&format!(
                    "  <line x1=\"{}\" y1=\"{:.1}\" x2=\"{}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"1\"/>\n",
                    MARGIN_LEFT,
                    y,
                    self.width - MARGIN_RIGHT,
                    y,
                    grid
                ));
            }
        }

        svg.push_str(&format!(
            "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>\n",
            MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, bottom, palette.axis
        ));
        svg.push_str(&format!(
            "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>\n",
            MARGIN_LEFT,
            bottom,
            self.width - MARGIN_RIGHT,
            bottom,
            palette.axis
        ));

        for (price, y) in [
            (max_price, MARGIN_TOP + 5.0),
            ((max_price + min_price) / 2.0, MARGIN_TOP + plot_height / 2.0),
            (min_price, bottom - 5.0),
        ] {
            svg.push_str(&format!(
                "  <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"10\" fill=\"{}\">{:.2}</text>\n",
                MARGIN_LEFT - 5.0,
                y,
                palette.text,
                price
            ));
        }
        for (date, x) in [
            (first, MARGIN_LEFT),
            (mid, MARGIN_LEFT + plot_width / 2.0),
            (last, self.width - MARGIN_RIGHT),
        ] {
            svg.push_str(&format!(
                "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"{}\">{}</text>\n",
                x,
                bottom + 15.0,
                palette.text,
                date
            ));
        }
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"11\" fill=\"{}\">Date</text>\n",
            MARGIN_LEFT + plot_width / 2.0,
            self.height - 6.0,
            palette.text
        ));
        svg.push_str(&format!(
            "  <text x=\"14\" y=\"{}\" text-anchor=\"middle\" font-size=\"11\" fill=\"{}\" transform=\"rotate(-90 14 {})\">Price</text>\n",
            MARGIN_TOP + plot_height / 2.0,
            palette.text,
            MARGIN_TOP + plot_height / 2.0
        ));

        svg.push_str(&format!(
            "  <path class=\"close\" d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
            close_path, palette.close
        ));
        svg.push_str(&format!(
            "  <path class=\"moving-average\" d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\" stroke-dasharray=\"6 3\"/>\n",
            average_path, palette.average
        ));

        let legend_x = MARGIN_LEFT + 10.0;
        for (row, (label, colour)) in [("Close", palette.close), (MOVING_AVERAGE, palette.average)]
            .into_iter()
            .enumerate()
        {
            let y = MARGIN_TOP + 15.0 + row as f64 * 16.0;
            svg.push_str(&format!(
                "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"2\"/>\n",
                legend_x,
                y - 4.0,
                legend_x + 20.0,
                y - 4.0,
                colour
            ));
            svg.push_str(&format!(
                "  <text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"{}\">{}</text>\n",
                legend_x + 26.0,
                y,
                palette.text,
                label
            ));
        }

        svg.push_str("</svg>\n");
        Ok(svg)
    }
}

/// Path data for a line, starting a new subpath after every gap.
fn line_path(
    values: impl Iterator<Item = Option<f64>>,
    x_scale: impl Fn(usize) -> f64,
    y_scale: impl Fn(f64) -> f64,
) -> String {
    let mut path = String::new();
    let mut pen_down = false;
    for (i, value) in values.enumerate() {
        match value {
            Some(v) => {
                let cmd = if pen_down { "L" } else { "M" };
                if !path.is_empty() {
                    path.push(' ');
                }
                path.push_str(&format!("{} {:.1} {:.1}", cmd, x_scale(i), y_scale(v)));
                pen_down = true;
            }
            None => pen_down = false,
        }
    }
    path
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

impl ChartPort for PngChartAdapter {
    fn available_styles(&self) -> Vec<String> {
        KNOWN_STYLES
            .iter()
            .filter(|s| palette(s).is_some())
            .map(|s| s.to_string())
            .collect()
    }

    fn render(&self, request: &ChartRequest<'_>) -> Result<(), StockDataError> {
        let png = self.render_to_png(request)?;
        write_atomically(request.output_path, |file| {
            file.write_all(&png)?;
            Ok(())
        })?;
        tracing::info!(path = %request.output_path.display(), style = request.style, "saved chart");
        Ok(())
    }
}
