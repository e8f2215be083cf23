//! SVG summary charts for the admin dashboard.
//!
//! Both charts are written to fixed file names under the static directory.
//! Rendering is keyed by the label counts: when the counts have not changed
//! since the last render and both files are still present, nothing is
//! rewritten. Files are written to a temporary name and renamed into place so
//! a concurrent reader never sees a partial image.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::Label;
use crate::report::LabelCounts;

pub const BAR_CHART_FILE: &str = "bar.svg";
pub const PIE_CHART_FILE: &str = "pie.svg";

const WIDTH: f64 = 500.0;
const HEIGHT: f64 = 400.0;
const PIE_START_DEGREES: f64 = 90.0;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("cannot write chart {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPaths {
    pub bar: PathBuf,
    pub pie: PathBuf,
}

fn color(label: Label) -> &'static str {
    match label {
        Label::Fraud => "red",
        Label::Genuine => "green",
    }
}

#[derive(Clone, Debug)]
pub struct ChartRenderer {
    dir: PathBuf,
    last_rendered: Arc<Mutex<Option<LabelCounts>>>,
    renders: Arc<AtomicUsize>,
}

impl ChartRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_rendered: Arc::new(Mutex::new(None)),
            renders: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn paths(&self) -> ChartPaths {
        ChartPaths {
            bar: self.dir.join(BAR_CHART_FILE),
            pie: self.dir.join(PIE_CHART_FILE),
        }
    }

    /// Number of times the charts were actually written.
    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::Relaxed)
    }

    pub async fn render(&self, counts: &LabelCounts) -> Result<ChartPaths, ChartError> {
        let paths = self.paths();
        let mut last = self.last_rendered.lock().await;

        if last.as_ref() == Some(counts) && exists(&paths.bar).await && exists(&paths.pie).await {
            debug!(?counts, "charts up to date, skipping render");
            return Ok(paths);
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ChartError::Io {
                path: self.dir.clone(),
                source,
            })?;
        write_atomically(&paths.bar, bar_chart_svg(counts)).await?;
        write_atomically(&paths.pie, pie_chart_svg(counts)).await?;

        *last = Some(*counts);
        self.renders.fetch_add(1, Ordering::Relaxed);
        info!(?counts, dir = %self.dir.display(), "charts rendered");
        Ok(paths)
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

async fn write_atomically(path: &Path, contents: String) -> Result<(), ChartError> {
    let io_err = |source| ChartError::Io {
        path: path.to_path_buf(),
        source,
    };
    let tmp = path.with_extension("svg.tmp");
    tokio::fs::write(&tmp, contents).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)
}

fn svg_open(out: &mut String, title: &str) {
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif">"#
    );
    let _ = write!(
        out,
        r#"<rect width="100%" height="100%" fill="white"/><text x="{}" y="24" text-anchor="middle" font-size="16">{title}</text>"#,
        WIDTH / 2.0
    );
}

/// Smallest 1/2/5 × 10^k step giving at most five intervals up to `max`.
fn tick_step(max: usize) -> usize {
    let mut magnitude = 1;
    loop {
        for factor in [1, 2, 5] {
            let step = factor * magnitude;
            if max.div_ceil(step) <= 5 {
                return step;
            }
        }
        magnitude *= 10;
    }
}

/// Bar chart of counts per label.
pub fn bar_chart_svg(counts: &LabelCounts) -> String {
    let (left, right, top, bottom) = (60.0, 20.0, 40.0, 50.0);
    let plot_w = WIDTH - left - right;
    let plot_h = HEIGHT - top - bottom;
    let base_y = top + plot_h;

    let bars = [
        (Label::Fraud, counts.fraud),
        (Label::Genuine, counts.genuine),
    ];
    let step = tick_step(counts.fraud.max(counts.genuine));
    let ticks = counts.fraud.max(counts.genuine).div_ceil(step).max(1);
    let y_max = (ticks * step) as f64;

    let mut out = String::new();
    svg_open(&mut out, "Fraud vs Genuine");

    for i in 0..=ticks {
        let value = i * step;
        let y = base_y - plot_h * value as f64 / y_max;
        let _ = write!(
            out,
            r##"<line x1="{left}" y1="{y:.1}" x2="{}" y2="{y:.1}" stroke="#dddddd"/><text x="{}" y="{:.1}" text-anchor="end" font-size="11">{value}</text>"##,
            left + plot_w,
            left - 6.0,
            y + 4.0
        );
    }

    let slot = plot_w / bars.len() as f64;
    for (i, (label, count)) in bars.iter().enumerate() {
        let bar_h = plot_h * *count as f64 / y_max;
        let x = left + slot * i as f64 + slot * 0.25;
        let _ = write!(
            out,
            r#"<rect x="{x:.1}" y="{:.1}" width="{:.1}" height="{bar_h:.1}" fill="{}"><title>{label}: {count}</title></rect><text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="12">{label}</text>"#,
            base_y - bar_h,
            slot * 0.5,
            color(*label),
            x + slot * 0.25,
            base_y + 18.0
        );
    }

    let _ = write!(
        out,
        r#"<line x1="{left}" y1="{top}" x2="{left}" y2="{base_y}" stroke="black"/><line x1="{left}" y1="{base_y}" x2="{}" y2="{base_y}" stroke="black"/><text x="16" y="{:.1}" text-anchor="middle" font-size="12" transform="rotate(-90 16 {:.1})">Count</text></svg>"#,
        left + plot_w,
        top + plot_h / 2.0,
        top + plot_h / 2.0
    );
    out
}

/// Pie chart of label proportions, counter-clockwise from 12 o'clock, with
/// percentage labels. Empty categories get no slice.
pub fn pie_chart_svg(counts: &LabelCounts) -> String {
    let (cx, cy, r) = (WIDTH / 2.0, 215.0, 140.0);
    let point = |degrees: f64, radius: f64| {
        let rad = degrees.to_radians();
        (cx + radius * rad.cos(), cy - radius * rad.sin())
    };

    let mut out = String::new();
    svg_open(&mut out, "Fraud Distribution");

    let labelled = counts.labelled();
    let slices: Vec<(Label, usize)> = [
        (Label::Fraud, counts.fraud),
        (Label::Genuine, counts.genuine),
    ]
    .into_iter()
    .filter(|(_, count)| *count > 0)
    .collect();

    let mut start = PIE_START_DEGREES;
    for (label, count) in slices {
        let fraction = count as f64 / labelled as f64;
        let sweep = 360.0 * fraction;
        let end = start + sweep;

        if fraction >= 1.0 {
            let _ = write!(
                out,
                r#"<circle cx="{cx}" cy="{cy}" r="{r}" fill="{}"><title>{label}: {count}</title></circle>"#,
                color(label)
            );
        } else {
            let (x0, y0) = point(start, r);
            let (x1, y1) = point(end, r);
            let large_arc = u8::from(sweep > 180.0);
            let _ = write!(
                out,
                r#"<path d="M {cx} {cy} L {x0:.2} {y0:.2} A {r} {r} 0 {large_arc} 0 {x1:.2} {y1:.2} Z" fill="{}"><title>{label}: {count}</title></path>"#,
                color(label)
            );
        }

        let mid = start + sweep / 2.0;
        let (px, py) = point(mid, r * 0.6);
        let (lx, ly) = point(mid, r * 1.1);
        let anchor = if lx < cx - 1.0 {
            "end"
        } else if lx > cx + 1.0 {
            "start"
        } else {
            "middle"
        };
        let _ = write!(
            out,
            r#"<text x="{px:.2}" y="{py:.2}" text-anchor="middle" font-size="13" fill="white">{:.1}%</text><text x="{lx:.2}" y="{ly:.2}" text-anchor="{anchor}" font-size="12">{label}</text>"#,
            fraction * 100.0
        );

        start = end;
    }

    out.push_str("</svg>");
    out
}
