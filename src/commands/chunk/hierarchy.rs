use super::*;

const UNFILED_IDENTIFIER: &str = "unfiled";
const UNFILED_TITLE: &str = "Unfiled sections";

/// Position of the deepest open node. Each field indexes into the children of
/// the level above it (or the root), so `subchapter: None, article: Some(i)`
/// is an orphan article filed directly under the root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub subchapter: Option<usize>,
    pub article: Option<usize>,
    pub section: Option<usize>,
}

impl Cursor {
    fn path(self) -> impl Iterator<Item = usize> {
        [self.subchapter, self.article, self.section]
            .into_iter()
            .flatten()
    }
}

#[derive(Debug)]
enum Event<'a> {
    Heading(&'a HeadingMatch),
    Body(&'a Line),
}

#[derive(Debug, Default)]
struct BuildState {
    tree: ChunkTree,
    issues: Vec<ValidationIssue>,
    id_counts: HashMap<String, usize>,
}

/// Folds headings and body lines into the subchapter/article/section tree.
///
/// The cursor is threaded through the fold as a value; no builder state
/// survives between calls.
pub fn build_tree(scan: &StructureScan, grammar: &dyn HeadingGrammar) -> (ChunkTree, Vec<ValidationIssue>) {
    let (state, last_cursor) = merged_events(scan).into_iter().fold(
        (BuildState::default(), Cursor::default()),
        |(mut state, cursor), event| {
            let next = match event {
                Event::Heading(heading) => open_heading(&mut state, cursor, heading, grammar),
                Event::Body(line) => append_body(&mut state, cursor, line),
            };
            (state, next)
        },
    );

    let BuildState {
        mut tree,
        mut issues,
        ..
    } = state;

    if let Some(index) = last_cursor.subchapter {
        flag_if_empty_subchapter(&tree.children[index], &mut issues);
    }

    for node in &mut tree.children {
        settle_page_range(node);
    }

    (tree, issues)
}

fn merged_events(scan: &StructureScan) -> Vec<Event<'_>> {
    let mut events = Vec::with_capacity(scan.headings.len() + scan.body.len());
    let mut headings = scan.headings.iter().peekable();
    let mut body = scan.body.iter().peekable();

    loop {
        let take_heading = match (headings.peek(), body.peek()) {
            (Some(heading), Some(line)) => heading.line_index < line.line_index,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };

        if take_heading {
            if let Some(heading) = headings.next() {
                events.push(Event::Heading(heading));
            }
        } else if let Some(line) = body.next() {
            events.push(Event::Body(line));
        }
    }

    events
}

fn open_heading(
    state: &mut BuildState,
    cursor: Cursor,
    heading: &HeadingMatch,
    grammar: &dyn HeadingGrammar,
) -> Cursor {
    match heading.kind {
        ChunkType::Subchapter => {
            if let Some(index) = cursor.subchapter {
                flag_if_empty_subchapter(&state.tree.children[index], &mut state.issues);
            }

            let node = new_node(state, heading, None, None, grammar);
            state.tree.children.push(node);
            Cursor {
                subchapter: Some(state.tree.children.len() - 1),
                article: None,
                section: None,
            }
        }
        ChunkType::Article => match cursor.subchapter {
            Some(subchapter_index) => {
                let (parent_id, subchapter) = {
                    let parent = &state.tree.children[subchapter_index];
                    (parent.id.clone(), parent.identifier.clone())
                };
                let node = new_node(state, heading, Some(parent_id), Some(&subchapter), grammar);
                let siblings = &mut state.tree.children[subchapter_index].children;
                siblings.push(node);
                Cursor {
                    subchapter: Some(subchapter_index),
                    article: Some(siblings.len() - 1),
                    section: None,
                }
            }
            None => {
                let node = new_node(state, heading, None, None, grammar);
                state.issues.push(
                    ValidationIssue::warning(
                        IssueKind::OrphanArticle,
                        format!(
                            "article {} appears before any subchapter and was filed under the root",
                            heading.identifier
                        ),
                    )
                    .for_chunk(&node.id)
                    .on_page(heading.page_number),
                );
                state.tree.children.push(node);
                Cursor {
                    subchapter: None,
                    article: Some(state.tree.children.len() - 1),
                    section: None,
                }
            }
        },
        ChunkType::Section => open_section(state, cursor, heading, grammar),
    }
}

fn open_section(
    state: &mut BuildState,
    cursor: Cursor,
    heading: &HeadingMatch,
    grammar: &dyn HeadingGrammar,
) -> Cursor {
    let article_cursor = match (cursor.subchapter, cursor.article) {
        (_, Some(_)) => Cursor {
            section: None,
            ..cursor
        },
        (Some(subchapter_index), None) => {
            let unfiled = synthetic_article(state, subchapter_index, grammar);
            let siblings = &mut state.tree.children[subchapter_index].children;
            siblings.push(unfiled);
            Cursor {
                subchapter: Some(subchapter_index),
                article: Some(siblings.len() - 1),
                section: None,
            }
        }
        (None, None) => Cursor::default(),
    };

    let parent_id = node_at(&state.tree, article_cursor).map(|parent| parent.id.clone());
    let node = new_node(state, heading, parent_id, None, grammar);
    let orphaned = article_cursor.article.is_none()
        || node_at(&state.tree, article_cursor).is_some_and(|parent| parent.synthetic);
    if orphaned {
        state.issues.push(
            ValidationIssue::warning(
                IssueKind::OrphanSection,
                format!(
                    "section {} has no enclosing article and was filed under {}",
                    heading.identifier,
                    node.parent_id.as_deref().unwrap_or("the root")
                ),
            )
            .for_chunk(&node.id)
            .on_page(heading.page_number),
        );
    }

    let page_number = heading.page_number;
    let Some(siblings) = children_at_mut(&mut state.tree, article_cursor) else {
        return cursor;
    };
    siblings.push(node);
    let section_index = siblings.len() - 1;
    if let Some(parent) = node_at_mut(&mut state.tree, article_cursor) {
        parent.include_page(page_number);
    }

    Cursor {
        section: Some(section_index),
        ..article_cursor
    }
}

fn synthetic_article(
    state: &mut BuildState,
    subchapter_index: usize,
    grammar: &dyn HeadingGrammar,
) -> ChunkNode {
    let parent = &state.tree.children[subchapter_index];
    let id = grammar.chunk_id(ChunkType::Article, UNFILED_IDENTIFIER, Some(&parent.identifier));
    let parent_id = parent.id.clone();

    ChunkNode {
        id: unique_id(state, id),
        kind: ChunkType::Article,
        identifier: UNFILED_IDENTIFIER.to_string(),
        title: UNFILED_TITLE.to_string(),
        page_range: None,
        body_text: String::new(),
        children: Vec::new(),
        parent_id: Some(parent_id),
        synthetic: true,
    }
}

fn new_node(
    state: &mut BuildState,
    heading: &HeadingMatch,
    parent_id: Option<String>,
    subchapter: Option<&str>,
    grammar: &dyn HeadingGrammar,
) -> ChunkNode {
    let base_id = grammar.chunk_id(heading.kind, &heading.identifier, subchapter);
    let id = unique_id(state, base_id);

    let mut node = ChunkNode {
        id,
        kind: heading.kind,
        identifier: heading.identifier.clone(),
        title: heading.title.clone(),
        page_range: None,
        body_text: String::new(),
        children: Vec::new(),
        parent_id,
        synthetic: false,
    };
    node.include_page(heading.page_number);
    if let Some(page_number) = heading.title_page_number {
        node.include_page(page_number);
    }
    if let Some(trailing) = heading.trailing_text.as_deref() {
        node.push_body(trailing);
    }
    node
}

fn unique_id(state: &mut BuildState, base_id: String) -> String {
    let count = state.id_counts.entry(base_id.clone()).or_default();
    *count += 1;
    if *count == 1 {
        return base_id;
    }

    let id = format!("{base_id}_{count}");
    state.issues.push(
        ValidationIssue::warning(
            IssueKind::DuplicateIdentifier,
            format!("identifier {base_id} appears more than once; renamed to {id}"),
        )
        .for_chunk(&id),
    );
    id
}

fn append_body(state: &mut BuildState, cursor: Cursor, line: &Line) -> Cursor {
    match node_at_mut(&mut state.tree, cursor) {
        Some(node) => {
            node.push_body(&line.text);
            node.include_page(line.page_number);
        }
        None => {
            if !state.tree.preamble.is_empty() {
                state.tree.preamble.push('\n');
            }
            state.tree.preamble.push_str(&line.text);
            state.tree.preamble_line_count += 1;
        }
    }
    cursor
}

fn flag_if_empty_subchapter(node: &ChunkNode, issues: &mut Vec<ValidationIssue>) {
    if node.children.is_empty() {
        let mut issue = ValidationIssue::warning(
            IssueKind::EmptySubchapter,
            format!(
                "subchapter {} has no articles or sections before the next subchapter",
                node.identifier
            ),
        )
        .for_chunk(&node.id);
        if let Some((first, _)) = node.page_range {
            issue = issue.on_page(first);
        }
        issues.push(issue);
    }
}

fn node_at(tree: &ChunkTree, cursor: Cursor) -> Option<&ChunkNode> {
    let mut path = cursor.path();
    let mut node = tree.children.get(path.next()?)?;
    for index in path {
        node = node.children.get(index)?;
    }
    Some(node)
}

fn node_at_mut(tree: &mut ChunkTree, cursor: Cursor) -> Option<&mut ChunkNode> {
    let mut path = cursor.path();
    let mut node = tree.children.get_mut(path.next()?)?;
    for index in path {
        node = node.children.get_mut(index)?;
    }
    Some(node)
}

fn children_at_mut(tree: &mut ChunkTree, cursor: Cursor) -> Option<&mut Vec<ChunkNode>> {
    if cursor.path().next().is_none() {
        return Some(&mut tree.children);
    }
    node_at_mut(tree, cursor).map(|node| &mut node.children)
}

/// Widens each node's page range to cover its descendants.
fn settle_page_range(node: &mut ChunkNode) -> Option<(u32, u32)> {
    let child_ranges = node
        .children
        .iter_mut()
        .filter_map(settle_page_range)
        .collect::<Vec<(u32, u32)>>();
    for (first, last) in child_ranges {
        node.include_page(first);
        node.include_page(last);
    }
    node.page_range
}
