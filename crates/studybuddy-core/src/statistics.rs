//! Scores, accuracy percentages and session-to-session deltas.

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Percentage of correct answers, rounded to one decimal.
///
/// An empty quiz has 0% accuracy.
pub fn accuracy(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(correct as f64 / total as f64 * 100.0)
}

/// Signed change in accuracy between two sessions, one decimal.
///
/// Both inputs are the already-rounded accuracies shown on the report, so
/// the delta always agrees with the two printed figures.
pub fn accuracy_delta(current: f64, previous: f64) -> f64 {
    round1(round1(current) - round1(previous))
}

/// Format a delta with an explicit `+` for gains (`+12.5%`, `-3.0%`, `0.0%`).
pub fn format_delta(delta: f64) -> String {
    if delta > 0.0 {
        format!("+{delta:.1}%")
    } else if delta == 0.0 {
        // avoid "-0.0%"
        "0.0%".to_string()
    } else {
        format!("{delta:.1}%")
    }
}

/// Mean of per-quiz percentages, rounded to a whole percent.
pub fn average_percentage(scores: impl IntoIterator<Item = (usize, usize)>) -> u32 {
    let percentages: Vec<f64> = scores
        .into_iter()
        .filter(|&(_, total)| total > 0)
        .map(|(score, total)| score as f64 / total as f64 * 100.0)
        .collect();
    if percentages.is_empty() {
        return 0;
    }
    (percentages.iter().sum::<f64>() / percentages.len() as f64).round() as u32
}
