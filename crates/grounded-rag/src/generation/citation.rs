//! Citation building from the gated context

use std::collections::HashSet;

use crate::types::Chunk;

/// Unique `source | p.N` citations, first occurrence wins, at most `max_sources`.
///
/// `contexts` must already be in ascending-distance order; a later chunk from
/// the same `(source, page)` is dropped.
pub fn build_citations(contexts: &[Chunk], max_sources: usize) -> Vec<String> {
    let mut seen: HashSet<(&str, Option<u32>)> = HashSet::new();
    let mut citations = Vec::new();

    for chunk in contexts {
        if citations.len() >= max_sources {
            break;
        }
        if seen.insert((chunk.source.as_str(), chunk.page)) {
            citations.push(chunk.citation());
        }
    }

    citations
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_dedups_same_page() {
        let contexts = vec![
            Chunk::new("a", "guide.pdf", Some(0), 1),
            Chunk::new("b", "guide.pdf", Some(0), 2),
            Chunk::new("c", "guide.pdf", Some(4), 3),
            Chunk::new("d", "notes.pdf", None, 1),
        ];
        assert_eq!(
            build_citations(&contexts, 10),
            vec!["guide.pdf | p.1", "guide.pdf | p.5", "notes.pdf"]
        );
    }

    #[test]
    fn test_caps_at_max_sources() {
        let contexts = vec![
            Chunk::new("a", "a.pdf", Some(0), 1),
            Chunk::new("b", "b.pdf", Some(0), 1),
            Chunk::new("c", "c.pdf", Some(0), 1),
        ];
        assert_eq!(build_citations(&contexts, 2), vec!["a.pdf | p.1", "b.pdf | p.1"]);
        assert!(build_citations(&contexts, 0).is_empty());
    }

    proptest! {
        #[test]
        fn prop_citations_unique_bounded_and_stable(
            pages in prop::collection::vec((0usize..3, prop::option::of(0u32..4)), 0..15),
            max_sources in 0usize..6,
        ) {
            let contexts: Vec<Chunk> = pages
                .iter()
                .enumerate()
                .map(|(i, (src, page))| Chunk::new(i.to_string(), format!("doc{}.pdf", src), *page, 1))
                .collect();

            let first = build_citations(&contexts, max_sources);
            let second = build_citations(&contexts, max_sources);
            prop_assert_eq!(&first, &second);
            prop_assert!(first.len() <= max_sources);

            let unique: HashSet<&String> = first.iter().collect();
            prop_assert_eq!(unique.len(), first.len());
        }
    }
}
