use super::*;

pub fn check_subchapters_present(scan: &StructureScan) -> Option<ValidationIssue> {
    (scan.heading_count(ChunkType::Subchapter) == 0).then(|| {
        ValidationIssue::error(
            IssueKind::ZeroSubchapters,
            "no subchapter headings detected; the text extraction is presumed wrong",
        )
    })
}

/// Numerals must increase in document order: subchapters across the
/// document, articles within their subchapter, sections across the document.
pub fn check_numeral_order(tree: &ChunkTree, grammar: &dyn HeadingGrammar) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let subchapters = tree
        .children
        .iter()
        .filter(|node| node.kind == ChunkType::Subchapter)
        .collect::<Vec<&ChunkNode>>();
    check_sequence(&subchapters, grammar, &mut issues);

    for subchapter in &subchapters {
        let articles = subchapter
            .children
            .iter()
            .filter(|node| node.kind == ChunkType::Article && !node.synthetic)
            .collect::<Vec<&ChunkNode>>();
        check_sequence(&articles, grammar, &mut issues);
    }

    let sections = tree
        .nodes()
        .into_iter()
        .filter(|node| node.kind == ChunkType::Section)
        .collect::<Vec<&ChunkNode>>();
    check_sequence(&sections, grammar, &mut issues);

    issues
}

fn check_sequence(nodes: &[&ChunkNode], grammar: &dyn HeadingGrammar, issues: &mut Vec<ValidationIssue>) {
    let mut previous: Option<(&ChunkNode, (u32, u32))> = None;

    for node in nodes {
        let Some(order) = grammar.numeral_order(node.kind, &node.identifier) else {
            continue;
        };

        if let Some((prior, prior_order)) = previous {
            if order <= prior_order {
                let mut issue = ValidationIssue::warning(
                    IssueKind::NonMonotonicNumeral,
                    format!(
                        "{} {} follows {} {} in document order",
                        node.kind.as_str(),
                        node.identifier,
                        prior.kind.as_str(),
                        prior.identifier
                    ),
                )
                .for_chunk(&node.id);
                if let Some((first, _)) = node.page_range {
                    issue = issue.on_page(first);
                }
                issues.push(issue);
            }
        }

        previous = Some((node, order));
    }
}

pub fn dangling_reference_issues(references: &BTreeSet<CrossReference>) -> Vec<ValidationIssue> {
    references
        .iter()
        .filter(|reference| reference.resolution == Resolution::Dangling)
        .map(|reference| {
            ValidationIssue::warning(
                IssueKind::DanglingReference,
                format!(
                    "{} cites {} but no such section was found",
                    reference.from_id, reference.to_id
                ),
            )
        })
        .collect()
}

pub fn build_report(
    source_sha256: &str,
    counts: StructureCounts,
    mut issues: Vec<ValidationIssue>,
) -> ValidationReport {
    issues.sort_by(|left, right| {
        right
            .severity
            .cmp(&left.severity)
            .then(left.page_number.cmp(&right.page_number))
            .then(left.kind.cmp(&right.kind))
            .then(left.chunk_id.cmp(&right.chunk_id))
            .then(left.message.cmp(&right.message))
    });

    ValidationReport {
        trusted: issues.iter().all(|issue| issue.severity != Severity::Error),
        source_sha256: source_sha256.to_string(),
        counts,
        issues,
    }
}
