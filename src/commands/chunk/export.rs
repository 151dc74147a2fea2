use super::*;

const METADATA_DIR: &str = "metadata";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSettings {
    pub keyword_limit: usize,
    pub chars_per_token: usize,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            keyword_limit: 12,
            chars_per_token: 4,
        }
    }
}

/// Offline token estimate: characters divided by a fixed ratio.
pub fn estimate_tokens(text: &str, chars_per_token: usize) -> usize {
    text.chars().count() / chars_per_token.max(1)
}

/// A node's own body followed by each child's heading line and content.
pub fn render_content(node: &ChunkNode, grammar: &dyn HeadingGrammar) -> String {
    let mut parts = Vec::with_capacity(node.children.len() + 1);
    if !node.body_text.is_empty() {
        parts.push(node.body_text.clone());
    }

    for child in &node.children {
        let heading = grammar.display_title(child.kind, &child.identifier, &child.title);
        let content = render_content(child, grammar);
        if content.is_empty() {
            parts.push(heading);
        } else {
            parts.push(format!("{heading}\n{content}"));
        }
    }

    parts.join("\n")
}

/// One record per node, every level, in document order.
pub fn build_records(
    tree: &ChunkTree,
    references: &BTreeSet<CrossReference>,
    grammar: &dyn HeadingGrammar,
    settings: &ExportSettings,
) -> Vec<ExportRecord> {
    let index = tree.index();
    tree.nodes()
        .into_iter()
        .map(|node| build_record(&index, node, references, grammar, settings))
        .collect()
}

fn build_record(
    index: &TreeIndex<'_>,
    node: &ChunkNode,
    references: &BTreeSet<CrossReference>,
    grammar: &dyn HeadingGrammar,
    settings: &ExportSettings,
) -> ExportRecord {
    let ancestors = index.ancestors(node);
    let identifier_at = |kind: ChunkType| {
        ancestors
            .iter()
            .copied()
            .chain(std::iter::once(node))
            .find(|ancestor| ancestor.kind == kind)
            .map(|ancestor| ancestor.identifier.clone())
    };

    let title = grammar.display_title(node.kind, &node.identifier, &node.title);
    let content = render_content(node, grammar);
    let page_numbers = node
        .page_range
        .map(|(first, last)| (first..=last).collect())
        .unwrap_or_default();

    ExportRecord {
        chunk_id: node.id.clone(),
        hierarchy: Hierarchy {
            title: grammar.code_title().to_string(),
            chapter: grammar.chapter().to_string(),
            subchapter: identifier_at(ChunkType::Subchapter),
            article: identifier_at(ChunkType::Article),
            section: identifier_at(ChunkType::Section),
        },
        keywords: extract_keywords(
            &title,
            &content,
            &subtree_citations(node, references),
            settings.keyword_limit,
        ),
        cross_references: cited_targets(references, node.reference_key()),
        content_length: content.chars().count(),
        token_estimate: estimate_tokens(&content, settings.chars_per_token),
        title,
        content,
        page_numbers,
        chunk_type: node.kind,
        parent_chunks: ancestors.iter().map(|ancestor| ancestor.id.clone()).collect(),
    }
}

/// Sections cited from the body text of `node` or any of its descendants.
fn subtree_citations(node: &ChunkNode, references: &BTreeSet<CrossReference>) -> BTreeSet<String> {
    let mut cited = cited_targets(references, node.reference_key())
        .into_iter()
        .collect::<BTreeSet<String>>();
    for child in &node.children {
        cited.extend(subtree_citations(child, references));
    }
    cited
}

pub fn build_structure_map(tree: &ChunkTree, grammar: &dyn HeadingGrammar) -> StructureMap {
    StructureMap {
        title: grammar.code_title().to_string(),
        chapter: grammar.chapter().to_string(),
        roots: tree.children.iter().map(|node| node.id.clone()).collect(),
        nodes: tree
            .nodes()
            .into_iter()
            .map(|node| StructureEntry {
                chunk_id: node.id.clone(),
                chunk_type: node.kind,
                identifier: node.identifier.clone(),
                parent: node.parent_id.clone(),
                children: node.children.iter().map(|child| child.id.clone()).collect(),
            })
            .collect(),
    }
}

/// Replaces the export directory's record and metadata folders with this
/// run's output. Returns the number of files written.
pub fn write_export(output_dir: &Path, outcome: &PipelineOutcome) -> Result<usize> {
    for chunk_type in ChunkType::ALL {
        reset_directory(&output_dir.join(chunk_type.dir_name()))?;
    }
    let metadata_dir = output_dir.join(METADATA_DIR);
    reset_directory(&metadata_dir)?;

    let mut written = 0usize;
    for record in &outcome.records {
        let path = output_dir
            .join(record.chunk_type.dir_name())
            .join(format!("{}.json", record.chunk_id));
        write_json_pretty(&path, record)?;
        written += 1;
    }

    write_json_pretty(
        &metadata_dir.join("cross_references.json"),
        &outcome.cross_references,
    )?;
    write_json_pretty(&metadata_dir.join("structure_map.json"), &outcome.structure_map)?;
    write_json_pretty(&metadata_dir.join("validation_report.json"), &outcome.report)?;
    written += 3;

    info!(
        path = %output_dir.display(),
        records = outcome.records.len(),
        files = written,
        "wrote chunk export"
    );

    Ok(written)
}
