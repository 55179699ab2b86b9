/// Small statistics helpers shared by the adaptive layers.
///
/// These operate on plain slices so they can be fed from store rows, in-memory
/// fixtures or per-headline score vectors alike.

/// Compute the mean of a data slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Fraction of `true` values. Returns `None` for an empty slice.
pub fn hit_rate(hits: &[bool]) -> Option<f64> {
    if hits.is_empty() {
        return None;
    }
    Some(hits.iter().filter(|&&h| h).count() as f64 / hits.len() as f64)
}

/// How often consecutive values flip, from 0.0 (monotone streak) to 1.0 (strict
/// alternation). Sequences shorter than two have no flips.
pub fn alternation_rate(seq: &[bool]) -> f64 {
    if seq.len() < 2 {
        return 0.0;
    }
    let flips = seq.windows(2).filter(|w| w[0] != w[1]).count();
    flips as f64 / (seq.len() - 1) as f64
}
