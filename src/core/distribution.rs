use crate::domain::model::{EvalueDistribution, Histogram};

/// 最小非零 e-value 除以此值作為 pseudocount
pub const PSEUDOCOUNT_DIVISOR: f64 = 1000.0;
/// 全部 e-value 都是 0 時使用
pub const ZERO_ONLY_PSEUDOCOUNT: f64 = 1e-300;

pub fn pseudocount(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| *v > 0.0)
        .min_by(f64::total_cmp)
        .map(|smallest| smallest / PSEUDOCOUNT_DIVISOR)
        .unwrap_or(ZERO_ONLY_PSEUDOCOUNT)
}

pub fn count_below(values: &[f64], threshold: f64) -> usize {
    values.iter().filter(|v| **v < threshold).count()
}

impl Histogram {
    /// 等寬 bins，最後一個 bin 包含右邊界
    pub fn from_values(values: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let (mut lo, mut hi) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });

        if values.is_empty() {
            lo = 0.0;
            hi = 1.0;
        } else if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges = (0..=bins)
            .map(|i| if i == bins { hi } else { lo + width * i as f64 })
            .collect();

        let mut counts = vec![0usize; bins];
        for value in values {
            let index = (((value - lo) / width) as usize).min(bins - 1);
            counts[index] += 1;
        }

        Self { edges, counts }
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// log10(e-value + pseudocount) 的分佈；沒有分數時回傳 None
pub fn summarize(values: &[f64], bins: usize) -> Option<EvalueDistribution> {
    if values.is_empty() {
        return None;
    }

    let pseudocount = pseudocount(values);
    let log_values: Vec<f64> = values.iter().map(|v| (v + pseudocount).log10()).collect();
    let mean = log_values.iter().sum::<f64>() / log_values.len() as f64;
    let histogram = Histogram::from_values(&log_values, bins);

    Some(EvalueDistribution {
        pseudocount,
        log_values,
        mean,
        histogram,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_pseudocount_uses_smallest_nonzero() {
        assert!(approx(pseudocount(&[0.0, 1e-3, 5.0, 0.0]), 1e-6));
        assert_eq!(pseudocount(&[0.0, 0.0]), ZERO_ONLY_PSEUDOCOUNT);
        assert_eq!(pseudocount(&[]), ZERO_ONLY_PSEUDOCOUNT);
    }

    #[test]
    fn test_count_below_is_strict() {
        let values = [0.0, 1e-5, 10.0, 9.99, 11.0];
        assert_eq!(count_below(&values, 10.0), 3);
        assert_eq!(count_below(&values, 0.0), 0);
    }

    #[test]
    fn test_histogram_bins() {
        let hist = Histogram::from_values(&[0.0, 1.0, 2.0, 10.0], 10);
        assert_eq!(hist.edges.len(), 11);
        assert_eq!(hist.edges[0], 0.0);
        assert_eq!(hist.edges[10], 10.0);
        assert_eq!(hist.counts, vec![1, 1, 1, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(hist.counts.iter().sum::<usize>(), 4);
        assert_eq!(hist.max_count(), 1);
    }

    #[test]
    fn test_histogram_single_value_range() {
        let hist = Histogram::from_values(&[-3.0, -3.0], 10);
        assert!(approx(hist.edges[0], -3.5));
        assert!(approx(hist.edges[10], -2.5));
        assert_eq!(hist.counts[5], 2);
    }

    #[test]
    fn test_summarize() {
        let dist = summarize(&[0.0, 1.0, 100.0], 10).unwrap();
        // pseudocount = 1.0 / 1000
        assert!(approx(dist.pseudocount, 0.001));
        assert!(approx(dist.log_values[0], -3.0));
        assert!(approx(dist.log_values[1], 1.001f64.log10()));
        let expected_mean = dist.log_values.iter().sum::<f64>() / 3.0;
        assert!(approx(dist.mean, expected_mean));
        assert_eq!(dist.histogram.counts.iter().sum::<usize>(), 3);
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize(&[], 10).is_none());
    }
}
