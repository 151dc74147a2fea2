use super::*;

/// Citations found in every node's own body text. Self-citations are skipped,
/// repeats collapse, and targets that match no known section stay in the set
/// as [`Resolution::Dangling`].
pub fn extract_cross_references(tree: &ChunkTree, grammar: &dyn HeadingGrammar) -> BTreeSet<CrossReference> {
    let nodes = tree.nodes();
    let known_sections = nodes
        .iter()
        .copied()
        .filter(|node| node.kind == ChunkType::Section)
        .map(|node| node.identifier.as_str())
        .collect::<HashSet<&str>>();

    let mut references = BTreeSet::new();
    for node in &nodes {
        let from_id = node.reference_key();
        for cited in grammar.citations(&node.body_text) {
            if cited == from_id {
                continue;
            }

            let resolution = if known_sections.contains(cited.as_str()) {
                Resolution::Resolved
            } else {
                Resolution::Dangling
            };
            references.insert(CrossReference {
                from_id: from_id.to_string(),
                to_id: cited,
                resolution,
            });
        }
    }

    references
}

/// `metadata/cross_references.json`: one entry per node keyed by its
/// reference key.
pub fn cross_reference_map(tree: &ChunkTree, references: &BTreeSet<CrossReference>) -> CrossReferenceMap {
    let mut map = tree
        .nodes()
        .into_iter()
        .map(|node| (node.reference_key().to_string(), CrossReferenceEntry::default()))
        .collect::<CrossReferenceMap>();

    for reference in references {
        if let Some(entry) = map.get_mut(&reference.from_id) {
            match reference.resolution {
                Resolution::Resolved => entry.outgoing.push(reference.to_id.clone()),
                Resolution::Dangling => entry.unresolved.push(reference.to_id.clone()),
            }
        }
        if reference.resolution == Resolution::Resolved {
            if let Some(entry) = map.get_mut(&reference.to_id) {
                entry.incoming.push(reference.from_id.clone());
            }
        }
    }

    for entry in map.values_mut() {
        entry.outgoing.sort();
        entry.outgoing.dedup();
        entry.incoming.sort();
        entry.incoming.dedup();
        entry.unresolved.sort();
        entry.unresolved.dedup();
    }

    map
}

/// Every target cited from `key`, resolved or not, sorted.
pub fn cited_targets(references: &BTreeSet<CrossReference>, key: &str) -> Vec<String> {
    references
        .iter()
        .filter(|reference| reference.from_id == key)
        .map(|reference| reference.to_id.clone())
        .collect()
}
