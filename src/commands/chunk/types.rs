use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub page_number: u32,
    pub text: String,
    pub line_index: usize,
}

impl Line {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ExtractedDocument {
    pub page_count: usize,
    pub lines: Vec<Line>,
    pub page_furniture_lines_removed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingMatch {
    pub kind: ChunkType,
    pub identifier: String,
    pub title: String,
    pub page_number: u32,
    pub line_index: usize,
    pub title_line_index: Option<usize>,
    pub title_page_number: Option<u32>,
    pub trailing_text: Option<String>,
}

/// Output of the structure detector: headings and unmatched body lines, both
/// in document order.
#[derive(Debug, Default)]
pub struct StructureScan {
    pub headings: Vec<HeadingMatch>,
    pub body: Vec<Line>,
    pub blank_line_count: usize,
}

impl StructureScan {
    pub fn heading_count(&self, kind: ChunkType) -> usize {
        self.headings
            .iter()
            .filter(|heading| heading.kind == kind)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkNode {
    pub id: String,
    pub kind: ChunkType,
    pub identifier: String,
    pub title: String,
    pub page_range: Option<(u32, u32)>,
    pub body_text: String,
    pub children: Vec<ChunkNode>,
    pub parent_id: Option<String>,
    pub synthetic: bool,
}

impl ChunkNode {
    pub fn push_body(&mut self, text: &str) {
        if !self.body_text.is_empty() {
            self.body_text.push('\n');
        }
        self.body_text.push_str(text);
    }

    pub fn include_page(&mut self, page_number: u32) {
        self.page_range = Some(match self.page_range {
            Some((first, last)) => (first.min(page_number), last.max(page_number)),
            None => (page_number, page_number),
        });
    }

    /// Key under which citations from and to this node are recorded.
    pub fn reference_key(&self) -> &str {
        match self.kind {
            ChunkType::Section => &self.identifier,
            ChunkType::Subchapter | ChunkType::Article => &self.id,
        }
    }
}

/// Owning tree below an implicit root. Parent links are ids resolved through
/// [`TreeIndex`], never pointers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkTree {
    pub children: Vec<ChunkNode>,
    pub preamble: String,
    pub preamble_line_count: usize,
}

impl ChunkTree {
    /// All nodes in document (pre-)order.
    pub fn nodes(&self) -> Vec<&ChunkNode> {
        fn visit<'a>(node: &'a ChunkNode, out: &mut Vec<&'a ChunkNode>) {
            out.push(node);
            for child in &node.children {
                visit(child, out);
            }
        }

        let mut out = Vec::new();
        for child in &self.children {
            visit(child, &mut out);
        }
        out
    }

    pub fn index(&self) -> TreeIndex<'_> {
        TreeIndex {
            nodes: self
                .nodes()
                .into_iter()
                .map(|node| (node.id.as_str(), node))
                .collect(),
        }
    }
}

/// Id lookup over a finished tree. Build it once per pass; parent links are
/// resolved through it rather than by walking the tree again.
#[derive(Debug)]
pub struct TreeIndex<'a> {
    nodes: HashMap<&'a str, &'a ChunkNode>,
}

impl<'a> TreeIndex<'a> {
    pub fn get(&self, id: &str) -> Option<&'a ChunkNode> {
        self.nodes.get(id).copied()
    }

    /// Ancestors of `node`, root-to-parent.
    pub fn ancestors(&self, node: &ChunkNode) -> Vec<&'a ChunkNode> {
        let mut ancestors = Vec::new();
        let mut current = node.parent_id.as_deref().and_then(|id| self.get(id));
        while let Some(parent) = current {
            ancestors.push(parent);
            current = parent.parent_id.as_deref().and_then(|id| self.get(id));
        }
        ancestors.reverse();
        ancestors
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Resolution {
    Resolved,
    Dangling,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CrossReference {
    pub from_id: String,
    pub to_id: String,
    pub resolution: Resolution,
}
