//! ChaCha-driven mock analysis.
//!
//! Picks an adulterant, a confidence and a clean/suspect verdict at
//! random. Nothing about the image influences the result beyond its
//! digest being echoed back.

use super::catalog::{Adulterant, ADULTERANTS, SAFETY_TIPS};
use crate::capture::{AnalysisConfig, CapturedFrame};
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use serde::Serialize;
use std::time::Duration;

/// Lowest reported confidence, percent.
pub const MIN_CONFIDENCE: u8 = 70;
/// Highest reported confidence, percent.
pub const MAX_CONFIDENCE: u8 = 90;
/// A draw above this is reported clean (30% of samples).
const CLEAN_THRESHOLD: f64 = 0.7;

/// Outcome of one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Clean,
    Suspect {
        adulterant: &'static Adulterant,
        /// Percent, in `MIN_CONFIDENCE..=MAX_CONFIDENCE`.
        confidence: u8,
    },
}

impl Verdict {
    pub fn is_clean(&self) -> bool {
        matches!(self, Verdict::Clean)
    }
}

/// Report returned for an analysed image.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// BLAKE3 digest of the analysed image bytes.
    pub image_digest: String,
    pub verdict: Verdict,
    pub tips: &'static [&'static str],
}

/// Random "analysis" service.
pub struct MockAnalyzer {
    rng: ChaCha20Rng,
    latency: Duration,
    analyses: u64,
}

impl MockAnalyzer {
    /// Seeds from the OS entropy source.
    pub fn from_os_entropy() -> Self {
        let mut seed = [0u8; 32];
        rand_core::OsRng.fill_bytes(&mut seed);
        Self::with_rng(ChaCha20Rng::from_seed(seed))
    }

    /// Reproducible analyzer.
    pub fn from_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha20Rng::seed_from_u64(seed))
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        let analyzer = match config.seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_os_entropy(),
        };
        analyzer.with_latency(Duration::from_millis(config.latency_ms))
    }

    fn with_rng(rng: ChaCha20Rng) -> Self {
        Self {
            rng,
            latency: Duration::ZERO,
            analyses: 0,
        }
    }

    /// Delay applied by [`MockAnalyzer::analyze_delayed`].
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Number of reports produced.
    pub fn analyses(&self) -> u64 {
        self.analyses
    }

    /// Produces a report immediately.
    pub fn analyze(&mut self, image: &CapturedFrame) -> AnalysisReport {
        // All three draws happen every time, clean or not
        let adulterant = &ADULTERANTS[self.below(ADULTERANTS.len() as u64) as usize];
        let span = u64::from(MAX_CONFIDENCE - MIN_CONFIDENCE) + 1;
        let confidence = MIN_CONFIDENCE + self.below(span) as u8;
        let is_clean = self.unit() > CLEAN_THRESHOLD;

        let verdict = if is_clean {
            Verdict::Clean
        } else {
            Verdict::Suspect {
                adulterant,
                confidence,
            }
        };

        self.analyses += 1;
        let image_digest = image.digest();
        tracing::info!(
            digest = %&image_digest[..12],
            clean = is_clean,
            adulterant = adulterant.name,
            confidence,
            "Analysis complete"
        );

        AnalysisReport {
            image_digest,
            verdict,
            tips: &SAFETY_TIPS,
        }
    }

    /// Produces a report after the configured latency.
    pub async fn analyze_delayed(&mut self, image: &CapturedFrame) -> AnalysisReport {
        if !self.latency.is_zero() {
            tracing::debug!(latency_ms = self.latency.as_millis() as u64, "Analyzing food sample");
            tokio::time::sleep(self.latency).await;
        }
        self.analyze(image)
    }

    /// Uniform integer in `0..n` (multiply-shift).
    fn below(&mut self, n: u64) -> u64 {
        ((u128::from(self.rng.next_u64()) * u128::from(n)) >> 64) as u64
    }

    /// Uniform float in `[0, 1)` with 53 bits of precision.
    fn unit(&mut self) -> f64 {
        (self.rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

impl Default for MockAnalyzer {
    fn default() -> Self {
        Self::from_os_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::FrameSource;
    use image::ImageFormat;
    use std::collections::HashSet;

    fn sample() -> CapturedFrame {
        CapturedFrame::new(vec![1, 2, 3, 4], 1, 1, ImageFormat::Png, FrameSource::Gallery)
    }

    #[test]
    fn test_seeded_analyzers_agree() {
        let mut a = MockAnalyzer::from_seed(42);
        let mut b = MockAnalyzer::from_seed(42);
        for _ in 0..20 {
            assert_eq!(a.analyze(&sample()).verdict, b.analyze(&sample()).verdict);
        }
        assert_eq!(a.analyses(), 20);
    }

    #[test]
    fn test_confidence_range_and_catalogue_coverage() {
        let mut analyzer = MockAnalyzer::from_seed(7);
        let mut seen = HashSet::new();

        for _ in 0..2000 {
            if let Verdict::Suspect {
                adulterant,
                confidence,
            } = analyzer.analyze(&sample()).verdict
            {
                assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&confidence));
                seen.insert(adulterant.name);
            }
        }
        assert_eq!(seen.len(), ADULTERANTS.len());
    }

    #[test]
    fn test_roughly_thirty_percent_clean() {
        let mut analyzer = MockAnalyzer::from_seed(1234);
        let clean = (0..2000)
            .filter(|_| analyzer.analyze(&sample()).verdict.is_clean())
            .count();
        let ratio = clean as f64 / 2000.0;
        assert!((0.25..0.35).contains(&ratio), "clean ratio {ratio}");
    }

    #[test]
    fn test_report_carries_digest_and_tips() {
        let image = sample();
        let report = MockAnalyzer::from_seed(0).analyze(&image);
        assert_eq!(report.image_digest, image.digest());
        assert_eq!(report.tips.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_analysis_waits() {
        let config = AnalysisConfig {
            latency_ms: 3500,
            seed: Some(3),
        };
        let mut analyzer = MockAnalyzer::from_config(&config);
        let start = tokio::time::Instant::now();
        analyzer.analyze_delayed(&sample()).await;
        assert!(start.elapsed() >= Duration::from_millis(3500));
    }
}
