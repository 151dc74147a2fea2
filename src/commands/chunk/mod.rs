use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::cli::ChunkArgs;
use crate::grammar::{HeadingGrammar, HmcGrammar};
use crate::model::{
    ChunkPaths, ChunkRunManifest, ChunkType, CrossReferenceEntry, CrossReferenceMap,
    ExportRecord, Hierarchy, IssueKind, Severity, StructureCounts, StructureEntry, StructureMap,
    ToolVersions, ValidationIssue, ValidationReport,
};
use crate::text::{is_content_token, word_tokens};
use crate::util::{
    now_utc_string, reset_directory, sha256_file, utc_compact_string, write_json_pretty,
};

mod cross_refs;
mod detect;
mod export;
mod extract;
mod hierarchy;
mod keywords;
mod run;
#[cfg(test)]
mod tests;
mod types;
mod validate;

pub use run::run;
pub(crate) use detect::detect_structure;
pub(crate) use extract::extract_document;
pub(crate) use types::{HeadingMatch, Line, StructureScan};

use cross_refs::*;
use export::*;
use extract::*;
use hierarchy::*;
use keywords::*;
use run::*;
use types::*;
use validate::*;
