use std::future::Future;
use std::io::Cursor;

use anyhow::{bail, Context, Result};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::report::chart::{ChartSpec, ChartType};

/// Rendered chart ready to be embedded in a workbook. `bytes` hold an
/// encoded PNG.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartImage {
    pub bytes: Vec<u8>,
}

/// Turns a chart specification into an image.
pub trait ChartRenderer {
    fn render(&self, spec: &ChartSpec) -> impl Future<Output = Result<ChartImage>> + Send;
}

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([64, 64, 64]);
const MARGIN: u32 = 24;

// One colour per channel, in channel order.
const PALETTE: [Rgb<u8>; 7] = [
    Rgb([128, 128, 128]),
    Rgb([242, 181, 26]),
    Rgb([54, 112, 204]),
    Rgb([214, 48, 49]),
    Rgb([133, 84, 186]),
    Rgb([46, 150, 86]),
    Rgb([230, 110, 180]),
];

/// Plain raster renderer: bars for bar charts, straight polylines for line
/// charts. The tension hint is not honoured.
#[derive(Debug, Clone)]
pub struct PngChartRenderer {
    width: u32,
    height: u32,
}

impl PngChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn draw(&self, spec: &ChartSpec) -> Result<ChartImage> {
        if self.width <= 2 * MARGIN || self.height <= 2 * MARGIN {
            bail!(
                "chart size {}x{} leaves no plot area",
                self.width,
                self.height
            );
        }

        let mut canvas = RgbImage::from_pixel(self.width, self.height, BACKGROUND);
        let plot = PlotArea {
            left: MARGIN as f64,
            top: MARGIN as f64,
            width: (self.width - 2 * MARGIN) as f64,
            height: (self.height - 2 * MARGIN) as f64,
            y_max: y_max(spec),
        };

        match spec.chart_type {
            ChartType::Bar => draw_bars(&mut canvas, spec, &plot),
            ChartType::Line => draw_lines(&mut canvas, spec, &plot),
        }
        draw_axes(&mut canvas, &plot);

        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(canvas)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .context("failed to encode chart as PNG")?;

        Ok(ChartImage { bytes })
    }
}

impl ChartRenderer for PngChartRenderer {
    async fn render(&self, spec: &ChartSpec) -> Result<ChartImage> {
        let renderer = self.clone();
        let spec = spec.clone();
        tokio::task::spawn_blocking(move || renderer.draw(&spec))
            .await
            .context("chart rendering task panicked")?
    }
}

struct PlotArea {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    y_max: f64,
}

impl PlotArea {
    fn y(&self, value: f64) -> f64 {
        let ratio = (value / self.y_max).clamp(0.0, 1.0);
        self.top + self.height * (1.0 - ratio)
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

fn y_max(spec: &ChartSpec) -> f64 {
    let max = spec
        .datasets
        .iter()
        .flat_map(|dataset| dataset.data.iter().copied())
        .filter(|value| value.is_finite())
        .fold(0.0f64, f64::max);
    if max > 0.0 {
        max
    } else {
        1.0
    }
}

fn colour(index: usize) -> Rgb<u8> {
    PALETTE[index % PALETTE.len()]
}

fn draw_bars(canvas: &mut RgbImage, spec: &ChartSpec, plot: &PlotArea) {
    let groups = spec.point_count();
    if groups == 0 {
        return;
    }

    let group_width = plot.width / groups as f64;
    // One empty slot per group keeps neighbouring groups apart.
    let bar_width = group_width / (spec.datasets.len() + 1) as f64;

    for group in 0..groups {
        let group_left = plot.left + group_width * group as f64 + bar_width / 2.0;
        for (index, dataset) in spec.datasets.iter().enumerate() {
            let Some(&value) = dataset.data.get(group) else {
                continue;
            };
            let x0 = group_left + bar_width * index as f64;
            fill_rect(
                canvas,
                x0,
                plot.y(value),
                x0 + bar_width,
                plot.bottom(),
                colour(index),
            );
        }
    }
}

fn draw_lines(canvas: &mut RgbImage, spec: &ChartSpec, plot: &PlotArea) {
    let points = spec.point_count();
    if points == 0 {
        return;
    }

    let x_at = |i: usize| {
        if points == 1 {
            plot.left + plot.width / 2.0
        } else {
            plot.left + plot.width * i as f64 / (points - 1) as f64
        }
    };

    for (index, dataset) in spec.datasets.iter().enumerate() {
        let path: Vec<(f64, f64)> = dataset
            .data
            .iter()
            .enumerate()
            .map(|(i, &value)| (x_at(i), plot.y(value)))
            .collect();

        for &(x, y) in &path {
            fill_rect(canvas, x - 2.0, y - 2.0, x + 2.0, y + 2.0, colour(index));
        }
        for pair in path.windows(2) {
            draw_segment(canvas, pair[0], pair[1], colour(index));
        }
    }
}

fn draw_axes(canvas: &mut RgbImage, plot: &PlotArea) {
    let bottom = plot.bottom();
    draw_segment(canvas, (plot.left, plot.top), (plot.left, bottom), AXIS);
    draw_segment(
        canvas,
        (plot.left, bottom),
        (plot.left + plot.width, bottom),
        AXIS,
    );
}

fn put(canvas: &mut RgbImage, x: f64, y: f64, colour: Rgb<u8>) {
    if x < 0.0 || y < 0.0 {
        return;
    }
    let (x, y) = (x.round() as u32, y.round() as u32);
    if x < canvas.width() && y < canvas.height() {
        canvas.put_pixel(x, y, colour);
    }
}

fn fill_rect(canvas: &mut RgbImage, x0: f64, y0: f64, x1: f64, y1: f64, colour: Rgb<u8>) {
    let (x0, x1) = (x0.min(x1).round(), x0.max(x1).round());
    let (y0, y1) = (y0.min(y1).round(), y0.max(y1).round());
    let mut y = y0;
    while y <= y1 {
        let mut x = x0;
        while x <= x1 {
            put(canvas, x, y, colour);
            x += 1.0;
        }
        y += 1.0;
    }
}

fn draw_segment(canvas: &mut RgbImage, from: (f64, f64), to: (f64, f64), colour: Rgb<u8>) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
    for step in 0..=steps {
        let t = step as f64 / steps as f64;
        put(canvas, from.0 + dx * t, from.1 + dy * t, colour);
    }
}
