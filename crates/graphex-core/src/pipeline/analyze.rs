//! Single-pass channel statistics and coarse color classification.
//!
//! Mean and variance are accumulated with Welford's online algorithm, so a
//! large image never sums squared samples. Distinct pixel tuples are tracked
//! in a [`PaletteTracker`] that stops growing at a fixed capacity.

use std::collections::HashSet;

use crate::config::AnalysisConfig;
use crate::error::{ObjectError, ObjectResult};
use crate::types::{sample_len, AnalysisResult, Orientation};

use super::encode::PNG_MAX_DIMENSION;

/// Running statistics for one channel.
#[derive(Debug, Clone)]
pub struct ChannelStats {
    pub count: u64,
    pub mean: f64,
    pub m2: f64,
    pub min: u8,
    pub max: u8,
}

impl Default for ChannelStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: u8::MAX,
            max: u8::MIN,
        }
    }
}

impl ChannelStats {
    pub fn push(&mut self, value: u8) {
        let x = f64::from(value);
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Population variance; zero for an empty channel.
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }
}

/// Set of distinct pixel tuples with a hard capacity.
///
/// Inserts are accepted until the set is full; after that they become no-ops,
/// except that an unseen tuple marks the tracker as overflowed. The count is
/// therefore exact up to and including `capacity`.
#[derive(Debug)]
pub struct PaletteTracker {
    seen: HashSet<[u8; 3]>,
    capacity: usize,
    overflowed: bool,
}

impl PaletteTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: HashSet::with_capacity(capacity.min(4096)),
            capacity,
            overflowed: false,
        }
    }

    pub fn insert(&mut self, pixel: &[u8]) {
        if self.overflowed {
            return;
        }
        let mut key = [0u8; 3];
        let n = pixel.len().min(3);
        key[..n].copy_from_slice(&pixel[..n]);

        if self.seen.len() < self.capacity {
            self.seen.insert(key);
        } else if !self.seen.contains(&key) {
            self.overflowed = true;
        }
    }

    /// Exact count, or `None` once more than `capacity` tuples were seen.
    pub fn size(&self) -> Option<usize> {
        (!self.overflowed).then_some(self.seen.len())
    }
}

/// Computes [`AnalysisResult`]s from decoded 8-bit samples.
pub struct ChannelAnalyzer {
    config: AnalysisConfig,
}

impl ChannelAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Analyze `pixels` for a `width` x `height` image with `channels` samples
    /// per pixel.
    ///
    /// The buffer must be exactly `width * height * channels` bytes, and
    /// `channels` must be 1 or 3 for a meaningful color label.
    pub fn analyze(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        channels: usize,
    ) -> ObjectResult<AnalysisResult> {
        if !(1..=3).contains(&channels) {
            return Err(ObjectError::UnsupportedColorSpace(format!(
                "{channels}-channel"
            )));
        }
        let expected = sample_len(width, height, channels).ok_or(ObjectError::InvalidDimensions {
            width,
            height,
            max_dim: PNG_MAX_DIMENSION,
        })?;
        if pixels.len() != expected {
            return Err(ObjectError::SizeMismatch {
                actual: pixels.len(),
                expected,
            });
        }

        let mut stats = vec![ChannelStats::default(); channels];
        let mut palette = PaletteTracker::new(self.config.palette_cap);

        for pixel in pixels.chunks_exact(channels) {
            for (channel, &value) in stats.iter_mut().zip(pixel) {
                channel.push(value);
            }
            palette.insert(pixel);
        }

        let means: Vec<f64> = stats.iter().map(|s| s.mean).collect();
        let primary_color = self.classify(&means);

        Ok(AnalysisResult {
            variances: stats.iter().map(ChannelStats::variance).collect(),
            min: stats.iter().map(|s| s.min).collect(),
            max: stats.iter().map(|s| s.max).collect(),
            palette_size: palette.size(),
            primary_color,
            orientation: Orientation::from_dimensions(width, height),
            means,
        })
    }

    /// Map per-channel means to a coarse color label.
    pub fn classify(&self, means: &[f64]) -> String {
        match means {
            [gray] => self.brightness_band(*gray).to_string(),
            [red, green, blue] => {
                let brightness = (red + green + blue) / 3.0;
                let band = self.brightness_band(brightness);
                let spread = red.max(*green).max(*blue) - red.min(*green).min(*blue);
                if spread < self.config.gray_spread {
                    return band.to_string();
                }
                // First channel wins ties.
                let dominant = if red >= green && red >= blue {
                    "red"
                } else if green >= blue {
                    "green"
                } else {
                    "blue"
                };
                format!("{band}-{dominant}")
            }
            _ => "unknown".to_string(),
        }
    }

    fn brightness_band(&self, value: f64) -> &'static str {
        const BANDS: [&str; 4] = ["black", "dark-gray", "mid-gray", "light-gray"];
        self.config
            .brightness_thresholds
            .iter()
            .zip(BANDS)
            .find(|(threshold, _)| value < **threshold)
            .map_or("white", |(_, band)| band)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> ChannelAnalyzer {
        ChannelAnalyzer::new(AnalysisConfig::default())
    }

    fn two_pass(values: &[u8]) -> (f64, f64) {
        let n = values.len() as f64;
        let mean = values.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let var = values
            .iter()
            .map(|&v| (f64::from(v) - mean).powi(2))
            .sum::<f64>()
            / n;
        (mean, var)
    }

    fn assert_close(a: f64, b: f64) {
        let scale = a.abs().max(b.abs()).max(1.0);
        assert!((a - b).abs() / scale < 1e-6, "{a} vs {b}");
    }

    #[test]
    fn test_overflowing_dimensions_are_rejected() {
        let err = analyzer().analyze(&[], u32::MAX, u32::MAX, 3).unwrap_err();
        assert!(matches!(err, ObjectError::InvalidDimensions { .. }));
    }

    #[test]
    fn test_black_gray_square() {
        let result = analyzer().analyze(&[0, 0, 0, 0], 2, 2, 1).unwrap();
        assert_eq!(result.primary_color, "black");
        assert_eq!(result.palette_size, Some(1));
        assert_eq!(result.orientation, Orientation::Square);
        assert_eq!(result.means, vec![0.0]);
        assert_eq!(result.variances, vec![0.0]);
        assert_eq!(result.min, vec![0]);
        assert_eq!(result.max, vec![0]);
    }

    #[test]
    fn test_size_mismatch() {
        let err = analyzer().analyze(&[0u8; 50], 10, 10, 3).unwrap_err();
        assert_eq!(
            err,
            ObjectError::SizeMismatch {
                actual: 50,
                expected: 300
            }
        );
    }

    #[test]
    fn test_welford_matches_two_pass() {
        // Deterministic pseudo-random samples with a large offset component.
        let mut state = 0x2545F491u32;
        let samples: Vec<u8> = (0..30_000)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                200 + (state % 56) as u8
            })
            .collect();

        let result = analyzer().analyze(&samples, 100, 100, 3).unwrap();
        for channel in 0..3 {
            let values: Vec<u8> = samples.iter().skip(channel).step_by(3).copied().collect();
            let (mean, var) = two_pass(&values);
            assert_close(result.means[channel], mean);
            assert_close(result.variances[channel], var);
        }
    }

    #[test]
    fn test_palette_exact_up_to_cap() {
        let config = AnalysisConfig {
            palette_cap: 16,
            ..AnalysisConfig::default()
        };
        let analyzer = ChannelAnalyzer::new(config);

        let exactly_cap: Vec<u8> = (0..16).chain(0..16).collect();
        let result = analyzer.analyze(&exactly_cap, 8, 4, 1).unwrap();
        assert_eq!(result.palette_size, Some(16));

        let over_cap: Vec<u8> = (0..17).collect();
        let result = analyzer.analyze(&over_cap, 17, 1, 1).unwrap();
        assert_eq!(result.palette_size, None);
    }

    #[test]
    fn test_palette_sentinel_at_default_cap() {
        let pixels: Vec<u8> = (0..2048u32)
            .flat_map(|i| [(i % 256) as u8, (i / 256) as u8, 0])
            .collect();
        let result = analyzer().analyze(&pixels, 64, 32, 3).unwrap();
        assert_eq!(result.palette_size, None);

        let pixels: Vec<u8> = (0..1024u32)
            .flat_map(|i| [(i % 256) as u8, (i / 256) as u8, 0])
            .collect();
        let result = analyzer().analyze(&pixels, 32, 32, 3).unwrap();
        assert_eq!(result.palette_size, Some(1024));
    }

    #[test]
    fn test_palette_tracker_ignores_repeats_after_full() {
        let mut tracker = PaletteTracker::new(2);
        tracker.insert(&[1]);
        tracker.insert(&[2]);
        tracker.insert(&[1]);
        tracker.insert(&[2]);
        assert_eq!(tracker.size(), Some(2));
        tracker.insert(&[3]);
        assert_eq!(tracker.size(), None);
    }

    #[test]
    fn test_gray_bands() {
        let a = analyzer();
        assert_eq!(a.classify(&[15.9]), "black");
        assert_eq!(a.classify(&[16.0]), "dark-gray");
        assert_eq!(a.classify(&[100.0]), "mid-gray");
        assert_eq!(a.classify(&[200.0]), "light-gray");
        assert_eq!(a.classify(&[224.0]), "white");
    }

    #[test]
    fn test_rgb_classification() {
        let a = analyzer();
        assert_eq!(a.classify(&[100.0, 105.0, 110.0]), "mid-gray");
        assert_eq!(a.classify(&[250.0, 10.0, 10.0]), "mid-gray-red");
        assert_eq!(a.classify(&[10.0, 10.0, 60.0]), "dark-gray-blue");
        assert_eq!(a.classify(&[240.0, 255.0, 200.0]), "white-green");
        assert_eq!(a.classify(&[200.0, 200.0, 100.0]), "light-gray-red");
    }

    #[test]
    fn test_orientation_from_dimensions() {
        let result = analyzer().analyze(&[9u8; 6], 3, 2, 1).unwrap();
        assert_eq!(result.orientation, Orientation::Landscape);
        let result = analyzer().analyze(&[9u8; 6], 2, 3, 1).unwrap();
        assert_eq!(result.orientation, Orientation::Portrait);
    }
}
