use shared::{Prediction, RankedResult, RankingMode};
use std::cmp::Ordering;

use super::labels::{LabelTable, NUM_CLASSES};
use super::model::InferenceError;

const PROBABILITY_MASS_TOLERANCE: f32 = 1e-3;

/// Class indices ordered by descending score. Ties keep ascending index
/// order and NaN sorts after every real score.
pub fn argsort_descending(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| compare_desc(scores[a], scores[b]));
    order
}

fn compare_desc(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

pub fn rank(
    scores: &[f32],
    labels: &LabelTable,
    mode: RankingMode,
) -> Result<RankedResult, InferenceError> {
    if scores.len() != NUM_CLASSES {
        return Err(InferenceError::OutputLength {
            expected: NUM_CLASSES,
            actual: scores.len(),
        });
    }

    let predictions = argsort_descending(scores)
        .into_iter()
        .take(mode.k())
        .filter_map(|class_index| {
            labels.get(class_index).map(|label| Prediction {
                class_index,
                label: label.to_string(),
                score: scores[class_index],
            })
        })
        .collect();

    Ok(RankedResult { predictions })
}

pub fn probability_mass(scores: &[f32]) -> f32 {
    scores.iter().sum()
}

pub fn is_distribution(scores: &[f32]) -> bool {
    (probability_mass(scores) - 1.0).abs() <= PROBABILITY_MASS_TOLERANCE
}

/// Numerically stable softmax for backends that emit raw logits.
///
/// `+inf` logits share all of the mass; a vector of only `-inf` is uniform.
/// NaN logits are rejected.
pub fn softmax(logits: &[f32]) -> Result<Vec<f32>, InferenceError> {
    if logits.iter().any(|v| v.is_nan()) {
        return Err(InferenceError::Backend("model emitted NaN logits".into()));
    }

    let saturated = logits.iter().filter(|&&v| v == f32::INFINITY).count();
    if saturated > 0 {
        let share = 1.0 / saturated as f32;
        return Ok(logits
            .iter()
            .map(|&v| if v == f32::INFINITY { share } else { 0.0 })
            .collect());
    }

    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max == f32::NEG_INFINITY {
        let share = 1.0 / logits.len().max(1) as f32;
        return Ok(vec![share; logits.len()]);
    }

    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    Ok(exps.into_iter().map(|v| v / total).collect())
}
