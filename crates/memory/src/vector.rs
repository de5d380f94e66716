//! Vector similarity utilities.
//!
//! Pure-Rust cosine similarity and top-k ranking over stored passages.

use brewline_core::knowledge::Passage;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank passages by cosine similarity to a query embedding.
///
/// Returns at most `limit` passages, most similar first, with `score` set.
/// Passages without an embedding are skipped. Ties keep insertion order.
pub fn rank_passages(passages: &[Passage], query_embedding: &[f32], limit: usize) -> Vec<Passage> {
    let mut scored: Vec<(f32, &Passage)> = passages
        .iter()
        .filter_map(|p| {
            let emb = p.embedding.as_ref()?;
            Some((cosine_similarity(emb, query_embedding), p))
        })
        .collect();

    // Stable sort keeps insertion order for equal scores
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
        .into_iter()
        .map(|(score, p)| Passage {
            score,
            embedding: None,
            ..p.clone()
        })
        .collect()
}
