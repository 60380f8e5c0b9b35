

/// Returns 0.0 for empty, mismatched or zero-norm inputs.
pub fn cosine_similarity(u: &[f32], v: &[f32]) -> f64 {
    if u.is_empty() || v.is_empty() || u.len() != v.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_u = 0.0f64;
    let mut norm_v = 0.0f64;
    for (a, b) in u.iter().zip(v.iter()) {
        let (a, b) = (f64::from(*a), f64::from(*b));
        dot += a * b;
        norm_u += a * a;
        norm_v += b * b;
    }

    if norm_u == 0.0 || norm_v == 0.0 {
        return 0.0;
    }

    (dot / (norm_u.sqrt() * norm_v.sqrt())).clamp(-1.0, 1.0)
}


/// Symmetric pairwise cosine similarities; the diagonal is fixed at 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    pub fn compute<V: AsRef<[f32]>>(vectors: &[V]) -> Self {
        let size = vectors.len();
        let mut values = vec![0.0; size * size];

        for i in 0..size {
            values[i * size + i] = 1.0;
            for j in (i + 1)..size {
                let similarity = cosine_similarity(vectors[i].as_ref(), vectors[j].as_ref());
                values[i * size + j] = similarity;
                values[j * size + i] = similarity;
            }
        }

        Self { size, values }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.size + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.size..(row + 1) * self.size]
    }
}


/// The `k` most similar indices to `row`, excluding `row`; ties go to the lower index.
pub fn top_k_neighbors(matrix: &SimilarityMatrix, row: usize, k: usize) -> Vec<usize> {
    top_k_neighbors_where(matrix, row, k, |_| true)
}


pub fn top_k_neighbors_where<F>(
    matrix: &SimilarityMatrix,
    row: usize,
    k: usize,
    mut keep: F,
) -> Vec<usize>
where
    F: FnMut(usize) -> bool,
{
    if row >= matrix.len() || k == 0 {
        return Vec::new();
    }

    let similarities = matrix.row(row);
    let mut candidates: Vec<usize> = (0..matrix.len())
        .filter(|&col| col != row && keep(col))
        .collect();

    candidates.sort_by(|&a, &b| {
        similarities[b]
            .total_cmp(&similarities[a])
            .then(a.cmp(&b))
    });
    candidates.truncate(k);
    candidates
}
