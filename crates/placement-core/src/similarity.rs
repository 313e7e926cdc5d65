//! Vector helpers for the knowledge-base embeddings.

/// Approximate characters per token used when trimming text for embedding.
const CHARS_PER_TOKEN: usize = 4;

/// Cosine similarity of two vectors.
///
/// Returns `0.0` when the lengths differ, either vector is empty, or either
/// has zero magnitude.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0)
}

/// Scale a vector to unit length. Empty and all-zero vectors come back unchanged.
pub fn normalize_embedding(v: &[f64]) -> Vec<f64> {
    let magnitude = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if magnitude == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / magnitude).collect()
}

/// Trim text to roughly `max_tokens` tokens, appending `...` when cut.
pub fn truncate_for_embedding(text: &str, max_tokens: usize) -> String {
    let max_chars = max_tokens.saturating_mul(CHARS_PER_TOKEN);
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identical_vectors() {
        assert!(close(cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 1.0));
    }

    #[test]
    fn orthogonal_and_opposite() {
        assert!(close(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0));
        assert!(close(cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]), -1.0));
    }

    #[test]
    fn degenerate_inputs_are_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn symmetric_and_bounded() {
        let a = [0.3, -1.2, 4.5, 0.0];
        let b = [2.0, 0.7, -0.1, 3.3];
        let ab = cosine_similarity(&a, &b);
        assert!(close(ab, cosine_similarity(&b, &a)));
        assert!((-1.0..=1.0).contains(&ab));
    }

    #[test]
    fn normalize_gives_unit_length() {
        let n = normalize_embedding(&[3.0, 4.0]);
        assert!(close(n[0], 0.6));
        assert!(close(n[1], 0.8));
        let length: f64 = n.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!(close(length, 1.0));
    }

    #[test]
    fn normalize_leaves_zero_and_empty_alone() {
        assert_eq!(normalize_embedding(&[0.0, 0.0]), vec![0.0, 0.0]);
        assert!(normalize_embedding(&[]).is_empty());
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate_for_embedding("short", 10), "short");
        assert_eq!(truncate_for_embedding("abcdefghij", 2), "abcdefgh...");
        assert_eq!(truncate_for_embedding("abcdefgh", 2), "abcdefgh");
        // multi-byte characters are never split
        assert_eq!(truncate_for_embedding("ééééé", 1), "éééé...");
    }
}
