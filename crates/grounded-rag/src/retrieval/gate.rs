//! Distance gate and context selection
//!
//! The gate looks at the single best match first. If even that is farther
//! than `max_distance`, the corpus has nothing relevant and the whole result
//! set is dropped, even when later entries would pass individually. Only then
//! are passing chunks kept, closest first, up to `max_contexts`.

use crate::types::{Chunk, ScoredChunk};

/// Select the chunks that may be shown to the generator.
///
/// The returned order (ascending distance) is preserved into the prompt and
/// the citations.
pub fn select_contexts(
    scored: &[ScoredChunk],
    max_distance: f32,
    max_contexts: usize,
) -> Vec<Chunk> {
    let mut ranked: Vec<&ScoredChunk> = scored.iter().collect();
    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    let Some(best) = ranked.first() else {
        return Vec::new();
    };

    if best.distance.is_nan() || best.distance > max_distance {
        tracing::info!(
            "Gate closed: best distance {:.4} exceeds {:.4}",
            best.distance,
            max_distance
        );
        return Vec::new();
    }

    let contexts: Vec<Chunk> = ranked
        .into_iter()
        .filter(|r| r.distance <= max_distance)
        .take(max_contexts)
        .map(|r| r.chunk.clone())
        .collect();

    tracing::debug!(
        "Gate open: kept {} of {} chunks (max_distance {:.4})",
        contexts.len(),
        scored.len(),
        max_distance
    );
    contexts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::scored;
    use proptest::prelude::*;

    #[test]
    fn test_empty_input() {
        assert!(select_contexts(&[], 1.0, 5).is_empty());
    }

    #[test]
    fn test_poor_best_match_discards_everything() {
        // Out-of-order input: the best entry is 1.5, still above the ceiling
        let input = vec![
            scored("b", "a.pdf", None, 1.7),
            scored("a", "a.pdf", None, 1.5),
        ];
        assert!(select_contexts(&input, 1.1, 5).is_empty());
    }

    #[test]
    fn test_keeps_passing_chunks_up_to_limit() {
        let input = vec![
            scored("a", "a.pdf", Some(0), 0.2),
            scored("b", "a.pdf", Some(1), 0.4),
            scored("c", "b.pdf", Some(0), 0.6),
            scored("d", "b.pdf", Some(1), 1.3),
        ];

        let kept = select_contexts(&input, 1.1, 2);
        let texts: Vec<&str> = kept.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);

        let kept = select_contexts(&input, 1.1, 10);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_boundary_distance_passes() {
        let input = vec![scored("a", "a.pdf", None, 1.1)];
        assert_eq!(select_contexts(&input, 1.1, 5).len(), 1);
    }

    #[test]
    fn test_nan_best_closes_gate() {
        let input = vec![scored("a", "a.pdf", None, f32::NAN)];
        assert!(select_contexts(&input, 1.1, 5).is_empty());
    }

    proptest! {
        #[test]
        fn prop_gate_invariants(
            distances in prop::collection::vec(0.0f32..3.0, 0..20),
            max_distance in 0.0f32..3.0,
            max_contexts in 1usize..8,
        ) {
            let input: Vec<ScoredChunk> = distances
                .iter()
                .enumerate()
                .map(|(i, d)| scored(&i.to_string(), "doc.pdf", None, *d))
                .collect();
            let by_text = |c: &Chunk| distances[c.text.parse::<usize>().unwrap()];

            let kept = select_contexts(&input, max_distance, max_contexts);
            let best = distances.iter().cloned().fold(f32::INFINITY, f32::min);

            if best > max_distance {
                prop_assert!(kept.is_empty());
            }
            prop_assert!(kept.len() <= max_contexts);
            prop_assert!(kept.iter().all(|c| by_text(c) <= max_distance));
            prop_assert!(kept.windows(2).all(|w| by_text(&w[0]) <= by_text(&w[1])));
        }
    }
}
