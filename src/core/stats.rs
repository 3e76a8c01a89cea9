/// Mean and sample standard deviation of per-date ship counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountStats {
    pub n: usize,
    pub mean: f64,
    /// `None` below two samples.
    pub std: Option<f64>,
}

impl CountStats {
    pub fn from_counts(counts: &[usize]) -> Option<Self> {
        if counts.is_empty() {
            return None;
        }

        let n = counts.len();
        let mean = counts.iter().map(|&c| c as f64).sum::<f64>() / n as f64;
        let std = (n > 1).then(|| {
            let sum_sq = counts
                .iter()
                .map(|&c| (c as f64 - mean).powi(2))
                .sum::<f64>();
            (sum_sq / (n - 1) as f64).sqrt()
        });

        Some(Self { n, mean, std })
    }

    /// `(mean - threshold * std, mean + threshold * std)`.
    pub fn bounds(&self, threshold: f64) -> Option<(f64, f64)> {
        self.std
            .map(|std| (self.mean - threshold * std, self.mean + threshold * std))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_std() {
        let stats = CountStats::from_counts(&[2, 4, 4, 4, 5, 5, 7, 9]).unwrap();
        assert_eq!(stats.n, 8);
        assert_eq!(stats.mean, 5.0);
        // sum of squares 32, n - 1 = 7
        assert!((stats.std.unwrap() - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_bounds() {
        let stats = CountStats::from_counts(&[3, 5]).unwrap();
        let std = 2f64.sqrt();
        let (min, max) = stats.bounds(2.0).unwrap();
        assert!((min - (4.0 - 2.0 * std)).abs() < 1e-12);
        assert!((max - (4.0 + 2.0 * std)).abs() < 1e-12);
    }

    #[test]
    fn test_single_sample_has_no_bounds() {
        let stats = CountStats::from_counts(&[5]).unwrap();
        assert_eq!(stats.std, None);
        assert_eq!(stats.bounds(1.0), None);
        assert!(CountStats::from_counts(&[]).is_none());
    }
}
