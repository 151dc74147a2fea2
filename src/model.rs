use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    Subchapter,
    Article,
    Section,
}

impl ChunkType {
    pub const ALL: [ChunkType; 3] = [ChunkType::Subchapter, ChunkType::Article, ChunkType::Section];

    pub fn as_str(self) -> &'static str {
        match self {
            ChunkType::Subchapter => "subchapter",
            ChunkType::Article => "article",
            ChunkType::Section => "section",
        }
    }

    /// Export subdirectory holding records of this type.
    pub fn dir_name(self) -> &'static str {
        match self {
            ChunkType::Subchapter => "subchapters",
            ChunkType::Article => "articles",
            ChunkType::Section => "sections",
        }
    }

    /// Tree depth below the implicit root; shallower types sort first on ties.
    pub fn depth(self) -> usize {
        match self {
            ChunkType::Subchapter => 1,
            ChunkType::Article => 2,
            ChunkType::Section => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    pub title: String,
    pub chapter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subchapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub chunk_id: String,
    pub hierarchy: Hierarchy,
    pub title: String,
    pub content: String,
    pub page_numbers: Vec<u32>,
    pub cross_references: Vec<String>,
    pub keywords: Vec<String>,
    pub chunk_type: ChunkType,
    pub parent_chunks: Vec<String>,
    pub content_length: usize,
    pub token_estimate: usize,
}

impl ExportRecord {
    /// Key used for this record in `metadata/cross_references.json`.
    pub fn reference_key(&self) -> &str {
        match (self.chunk_type, self.hierarchy.section.as_deref()) {
            (ChunkType::Section, Some(section)) => section,
            _ => &self.chunk_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReferenceEntry {
    pub outgoing: Vec<String>,
    pub incoming: Vec<String>,
    #[serde(default)]
    pub unresolved: Vec<String>,
}

pub type CrossReferenceMap = BTreeMap<String, CrossReferenceEntry>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureMap {
    pub title: String,
    pub chapter: String,
    pub roots: Vec<String>,
    pub nodes: Vec<StructureEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureEntry {
    pub chunk_id: String,
    pub chunk_type: ChunkType,
    pub identifier: String,
    pub parent: Option<String>,
    pub children: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    ZeroSubchapters,
    NonMonotonicNumeral,
    EmptySubchapter,
    OrphanArticle,
    OrphanSection,
    DuplicateIdentifier,
    DanglingReference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub kind: IssueKind,
    pub chunk_id: Option<String>,
    pub page_number: Option<u32>,
    pub message: String,
}

impl ValidationIssue {
    pub fn warning(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            chunk_id: None,
            page_number: None,
            message: message.into(),
        }
    }

    pub fn error(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            ..Self::warning(kind, message)
        }
    }

    pub fn for_chunk(mut self, chunk_id: &str) -> Self {
        self.chunk_id = Some(chunk_id.to_string());
        self
    }

    pub fn on_page(mut self, page_number: u32) -> Self {
        self.page_number = Some(page_number);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureCounts {
    pub page_count: usize,
    pub line_count: usize,
    pub body_line_count: usize,
    pub preamble_line_count: usize,
    pub page_furniture_lines_removed: usize,
    pub subchapter_headings: usize,
    pub article_headings: usize,
    pub section_headings: usize,
    pub subchapter_records: usize,
    pub article_records: usize,
    pub section_records: usize,
    pub synthetic_articles: usize,
    pub cross_references: usize,
    pub dangling_references: usize,
    pub total_tokens: usize,
}

/// End-of-run report written beside the exported records. Contains nothing
/// run-specific so that re-exporting the same PDF reproduces it exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub trusted: bool,
    pub source_sha256: String,
    pub counts: StructureCounts,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Warning)
            .count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolVersions {
    pub pdftotext: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkPaths {
    pub pdf_path: String,
    pub output_dir: String,
    pub run_manifest_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub tool_versions: ToolVersions,
    pub paths: ChunkPaths,
    pub source_sha256: String,
    pub trusted: bool,
    pub counts: StructureCounts,
    pub error_count: usize,
    pub warning_count: usize,
    pub notes: Vec<String>,
}
