/// Index of the maximum element; the first one wins on ties.
pub fn argmax(v: &[f32]) -> usize {
    let mut best_i = 0;
    let mut best_v = v[0];
    for i in 1..v.len() {
        if v[i] > best_v {
            best_v = v[i];
            best_i = i;
        }
    }
    best_i
}

/// Largest element of a non-empty slice.
pub fn max_value(v: &[f32]) -> f32 {
    v[argmax(v)]
}

pub fn has_non_finite(xs: &[f32]) -> bool {
    xs.iter().any(|&v| !v.is_finite())
}
