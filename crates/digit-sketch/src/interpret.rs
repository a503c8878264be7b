//! Turning raw logits into probabilities and a ranked top-K.

use std::cmp::Ordering;

use crate::types::{LogitVector, RankedClass, RankedResult, TOP_K};

/// Numerically stable softmax.
///
/// The maximum is subtracted before exponentiating and the sum is accumulated
/// in f64. Input whose normalizer is not finite (NaN or infinite logits) yields
/// a uniform distribution.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }

    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|&l| (l as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();

    if !(sum.is_finite() && sum > 0.0) {
        tracing::warn!("Non-finite logits {logits:?}; falling back to a uniform distribution");
        return vec![1.0 / logits.len() as f32; logits.len()];
    }

    exps.iter().map(|e| (e / sum) as f32).collect()
}

/// Index of the largest value, lowest index on ties. `None` for empty input.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// The `k` most probable classes, descending, stable on ties.
pub fn top_k(probabilities: &[f32], k: usize) -> Vec<RankedClass> {
    let mut ranked: Vec<RankedClass> = probabilities
        .iter()
        .enumerate()
        .map(|(class, &probability)| RankedClass { class, probability })
        .collect();

    // `sort_by` is stable, so equal probabilities keep ascending class order.
    ranked.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(k);
    ranked
}

/// Softmax, argmax and top-3 in one pass over a logit vector.
pub fn interpret(logits: &LogitVector) -> RankedResult {
    let probabilities = softmax(logits.as_slice());
    let predicted = argmax(&probabilities).unwrap_or_default();
    let top = top_k(&probabilities, TOP_K);
    RankedResult {
        probabilities,
        predicted,
        top,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logits(values: &[f32]) -> LogitVector {
        LogitVector::new(values.to_vec()).unwrap()
    }

    fn assert_distribution(probs: &[f32]) {
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6, "sum was {sum}");
        assert!(probs.iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let cases: [[f32; 10]; 4] = [
            [0.1, -2.0, 3.5, 0.0, 1.2, -0.7, 2.2, 0.3, -1.1, 0.9],
            [-30.0, -25.0, -40.0, -31.0, -29.5, -33.0, -28.0, -35.0, -26.0, -27.0],
            [12.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0; 10],
        ];
        for case in &cases {
            let r = interpret(&logits(case));
            assert_eq!(r.probabilities.len(), 10);
            assert_distribution(&r.probabilities);
        }
    }

    #[test]
    fn test_equal_logits_uniform_and_lowest_index_wins() {
        let r = interpret(&logits(&[5.0; 10]));
        for &p in &r.probabilities {
            assert!((p - 0.1).abs() < 1e-6);
        }
        assert_eq!(r.predicted, 0);
        let classes: Vec<usize> = r.top.iter().map(|c| c.class).collect();
        assert_eq!(classes, vec![0, 1, 2]);
    }

    #[test]
    fn test_skewed_logits_do_not_overflow() {
        let r = interpret(&logits(&[
            1000.0, -1000.0, 500.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 999.0,
        ]));
        assert!(r.probabilities.iter().all(|p| p.is_finite()));
        assert_distribution(&r.probabilities);
        assert_eq!(r.predicted, 0);
        assert_eq!(r.top[1].class, 9);
    }

    #[test]
    fn test_shift_invariance() {
        let base = [0.5f32, -1.0, 2.0, 0.0, 1.5, -0.25, 3.0, 0.75, -2.0, 1.0];
        let a = interpret(&logits(&base));
        for c in [-50.0f32, 7.0, 100.0] {
            let shifted: Vec<f32> = base.iter().map(|l| l + c).collect();
            let b = interpret(&logits(&shifted));
            assert_eq!(a.predicted, b.predicted);
            for (x, y) in a.probabilities.iter().zip(&b.probabilities) {
                assert!((x - y).abs() < 1e-5, "{x} vs {y} for shift {c}");
            }
        }
    }

    #[test]
    fn test_top_k_stable_on_ties() {
        let probs = [0.1, 0.1, 0.3, 0.1, 0.1, 0.05, 0.05, 0.1, 0.05, 0.05];
        let top = top_k(&probs, 3);
        let classes: Vec<usize> = top.iter().map(|c| c.class).collect();
        assert_eq!(classes, vec![2, 0, 1]);
    }

    #[test]
    fn test_top_k_shorter_than_k() {
        let top = top_k(&[0.4, 0.6], 3);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].class, 1);
    }

    #[test]
    fn test_argmax_ties_and_empty() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_dominant_logit_confidence() {
        let mut values = [0.0f32; 10];
        values[0] = 10.0;
        let r = interpret(&logits(&values));
        assert_eq!(r.predicted, 0);
        assert!((r.confidence() - 0.9996).abs() < 1e-3);
        assert_eq!(r.top[1].class, 1);
        assert_eq!(r.top[2].class, 2);
    }

    #[test]
    fn test_non_finite_logits_fall_back_to_uniform() {
        let probs = softmax(&[f32::NAN, 1.0, 2.0, 0.0]);
        assert_eq!(probs, vec![0.25; 4]);
        let probs = softmax(&[f32::INFINITY, 1.0]);
        assert_eq!(probs, vec![0.5; 2]);
    }
}
