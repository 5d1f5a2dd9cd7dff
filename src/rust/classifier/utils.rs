use ndarray::Array1;

// Squares are summed in f64 so components near f32::MAX do not overflow the norm.
fn l2_norm(vec: &Array1<f32>) -> f64 {
    vec.iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt()
}

pub(crate) fn normalize_vector(vec: &Array1<f32>) -> Array1<f32> {
    let norm = l2_norm(vec);
    if norm > 1e-10 {
        vec.mapv(|x| (f64::from(x) / norm) as f32)
    } else {
        Array1::zeros(vec.len())
    }
}

pub(crate) fn euclidean_distance(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            d * d
        })
        .sum::<f64>()
        .sqrt() as f32
}

/// `1 - cos(a, b)` where `unit_query` is already L2-normalised.
/// A zero-length example is treated as orthogonal to everything.
pub(crate) fn cosine_distance(unit_query: &Array1<f32>, example: &Array1<f32>) -> f32 {
    let norm = l2_norm(example);
    if norm > 1e-10 {
        let dot: f64 = unit_query
            .iter()
            .zip(example.iter())
            .map(|(&q, &x)| f64::from(q) * f64::from(x))
            .sum();
        (1.0 - dot / norm) as f32
    } else {
        1.0
    }
}
