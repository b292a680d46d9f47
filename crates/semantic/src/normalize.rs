/// Scales `v` to unit length and returns the length it had.
///
/// The squared norm is accumulated in `f64` so wide embeddings of small
/// components do not lose precision. A zero-length vector has no direction;
/// it is left as is and `None` is returned.
pub fn unit_normalize(v: &mut [f32]) -> Option<f64> {
    let norm = v
        .iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    for x in v.iter_mut() {
        *x = (f64::from(*x) / norm) as f32;
    }
    Some(norm)
}
