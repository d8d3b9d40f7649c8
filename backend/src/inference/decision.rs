use std::fmt;

use super::labels::LabelSet;

pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

pub const UNKNOWN_MESSAGE: &str = "Unknown or Not a Plant Leaf";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InvariantViolation {
    #[error("probability vector is empty")]
    EmptyProbabilities,
    #[error("label set is empty")]
    EmptyLabels,
    #[error("classifier returned {outputs} scores for {labels} labels")]
    LengthMismatch { outputs: usize, labels: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnosis {
    Diagnosed { label: String, confidence: f32 },
    Unknown,
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnosis::Diagnosed { label, confidence } => {
                write!(f, "Diagnosis: {} ({:.2}%)", label, f64::from(*confidence) * 100.0)
            }
            Diagnosis::Unknown => f.write_str(UNKNOWN_MESSAGE),
        }
    }
}

/// `Tomato___Early_blight` -> `Tomato Early blight`.
pub fn display_label(raw: &str) -> String {
    raw.replace("___", " ").replace('_', " ")
}

/// Index of the largest score; the first one wins on ties.
fn arg_max(probabilities: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &value) in probabilities.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        if best.is_none_or(|(_, top)| value > top) {
            best = Some((index, value));
        }
    }
    best
}

pub fn decide(
    probabilities: &[f32],
    labels: &LabelSet,
    threshold: f32,
) -> Result<Diagnosis, InvariantViolation> {
    if probabilities.is_empty() {
        return Err(InvariantViolation::EmptyProbabilities);
    }
    if labels.is_empty() {
        return Err(InvariantViolation::EmptyLabels);
    }
    if probabilities.len() != labels.len() {
        return Err(InvariantViolation::LengthMismatch {
            outputs: probabilities.len(),
            labels: labels.len(),
        });
    }

    let Some((index, confidence)) = arg_max(probabilities) else {
        return Ok(Diagnosis::Unknown);
    };
    if confidence <= threshold {
        return Ok(Diagnosis::Unknown);
    }

    let raw = labels
        .get(index)
        .ok_or(InvariantViolation::LengthMismatch {
            outputs: probabilities.len(),
            labels: labels.len(),
        })?;
    Ok(Diagnosis::Diagnosed {
        label: display_label(raw),
        confidence,
    })
}
