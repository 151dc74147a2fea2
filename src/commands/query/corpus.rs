use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::model::{ChunkType, CrossReferenceMap, ExportRecord};
use crate::util::read_json;

/// Exported records plus the cross-reference index, as read back from a
/// chunk export directory.
#[derive(Debug, Default)]
pub(super) struct Corpus {
    pub(super) records: Vec<ExportRecord>,
    pub(super) cross_references: CrossReferenceMap,
}

impl Corpus {
    pub(super) fn section_identifiers(&self) -> HashSet<&str> {
        self.records
            .iter()
            .filter(|record| record.chunk_type == ChunkType::Section)
            .filter_map(|record| record.hierarchy.section.as_deref())
            .collect()
    }
}

pub(super) fn load_corpus(chunks_dir: &Path) -> Result<Corpus> {
    if !chunks_dir.is_dir() {
        bail!(
            "chunk directory not found: {}; run `hmc-chunker chunk` first",
            chunks_dir.display()
        );
    }

    let mut records = Vec::new();
    for chunk_type in ChunkType::ALL {
        let dir = chunks_dir.join(chunk_type.dir_name());
        if !dir.is_dir() {
            warn!(path = %dir.display(), "record directory missing");
            continue;
        }

        for path in json_files(&dir)? {
            records.push(read_json::<ExportRecord>(&path)?);
        }
    }

    if records.is_empty() {
        bail!("no chunk records found under {}", chunks_dir.display());
    }

    let cross_references_path = chunks_dir.join("metadata").join("cross_references.json");
    let cross_references = if cross_references_path.is_file() {
        read_json::<CrossReferenceMap>(&cross_references_path)?
    } else {
        warn!(
            path = %cross_references_path.display(),
            "cross-reference index missing; related sections will be empty"
        );
        CrossReferenceMap::new()
    };

    info!(
        path = %chunks_dir.display(),
        records = records.len(),
        "loaded chunk records"
    );

    Ok(Corpus {
        records,
        cross_references,
    })
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<Vec<PathBuf>>>()
        .with_context(|| format!("failed to read entries of {}", dir.display()))?;

    paths.retain(|path| path.extension().is_some_and(|extension| extension == "json"));
    paths.sort();
    Ok(paths)
}
