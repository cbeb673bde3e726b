//! Ratio histograms.
//!
//! Diagnostic only: the filter stage bins `frame_ratio` and `crop_ratio`
//! into equal-width bins, which the binary prints and can save as PNG bar
//! charts. Binning follows the usual plotting convention: the range spans
//! the data, every bin is half-open except the last, which includes the
//! maximum.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::Path,
};

use image::{Rgb, RgbImage};

use crate::error::AspectError;

/// Default number of bins.
pub const DEFAULT_BINS: usize = 10;

const CHART_WIDTH: u32 = 640;
const CHART_HEIGHT: u32 = 400;
const CHART_MARGIN: u32 = 20;
const BAR_GAP: u32 = 2;
const TEXT_BAR_WIDTH: usize = 40;

/// Equal-width histogram of a set of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Label used when rendering (e.g. `"frame_ratio"`).
    pub name: String,
    /// Lower edge of the first bin.
    pub lower: f64,
    /// Upper edge of the last bin.
    pub upper: f64,
    /// Number of values per bin.
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width bins.
    ///
    /// When every value is identical the range is widened to `value ± 0.5`.
    /// An empty input yields all-zero bins over `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`AspectError::InvalidBinCount`] if `bins` is zero.
    pub fn from_values(
        name: impl Into<String>,
        values: &[f64],
        bins: usize,
    ) -> Result<Self, AspectError> {
        if bins == 0 {
            return Err(AspectError::InvalidBinCount);
        }

        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let (mut lower, mut upper) = finite
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), &v| {
                (low.min(v), high.max(v))
            });
        if finite.is_empty() {
            (lower, upper) = (0.0, 1.0);
        } else if lower == upper {
            (lower, upper) = (lower - 0.5, upper + 0.5);
        }

        let width = (upper - lower) / bins as f64;
        let mut counts = vec![0; bins];
        for value in finite {
            let index = (((value - lower) / width) as usize).min(bins - 1);
            counts[index] += 1;
        }

        Ok(Self {
            name: name.into(),
            lower,
            upper,
            counts,
        })
    }

    /// Width of one bin.
    pub fn bin_width(&self) -> f64 {
        (self.upper - self.lower) / self.counts.len() as f64
    }

    /// `(lower, upper)` edges of bin `index`.
    pub fn bin_edges(&self, index: usize) -> (f64, f64) {
        let width = self.bin_width();
        (
            self.lower + width * index as f64,
            self.lower + width * (index + 1) as f64,
        )
    }

    /// Total number of binned values.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Draw the histogram as a bar chart.
    pub fn render(&self) -> RgbImage {
        let mut chart = RgbImage::from_pixel(CHART_WIDTH, CHART_HEIGHT, Rgb([255, 255, 255]));
        let plot_width = CHART_WIDTH - 2 * CHART_MARGIN;
        let plot_height = CHART_HEIGHT - 2 * CHART_MARGIN;
        let baseline = CHART_HEIGHT - CHART_MARGIN;
        let tallest = self.counts.iter().copied().max().unwrap_or(0).max(1);
        let slot = plot_width / self.counts.len().max(1) as u32;

        for (index, &count) in self.counts.iter().enumerate() {
            let bar_height = (count as f64 / tallest as f64 * plot_height as f64).round() as u32;
            let left = CHART_MARGIN + slot * index as u32;
            let right = (left + slot).saturating_sub(BAR_GAP).max(left + 1);
            for x in left..right {
                for y in (baseline - bar_height)..baseline {
                    chart.put_pixel(x, y, Rgb([31, 119, 180]));
                }
            }
        }

        for x in CHART_MARGIN..(CHART_WIDTH - CHART_MARGIN) {
            chart.put_pixel(x, baseline, Rgb([0, 0, 0]));
        }
        chart
    }

    /// Render and save as an image; the format follows the extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), AspectError> {
        let path = path.as_ref();
        self.render().save(path)?;
        log::debug!("Saved {} histogram to {}", self.name, path.display());
        Ok(())
    }
}

impl Display for Histogram {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "{} ({} values)", self.name, self.total())?;
        let tallest = self.counts.iter().copied().max().unwrap_or(0).max(1);
        let last = self.counts.len().saturating_sub(1);
        for (index, &count) in self.counts.iter().enumerate() {
            let (low, high) = self.bin_edges(index);
            let closing = if index == last { ']' } else { ')' };
            let bar = "#".repeat((count as usize * TEXT_BAR_WIDTH).div_ceil(tallest as usize));
            writeln!(f, "  [{low:.3}, {high:.3}{closing} {count:>6} {bar}")?;
        }
        Ok(())
    }
}
