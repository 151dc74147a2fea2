use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::{StatusArgs, resolve_chunks_dir};
use crate::model::{ChunkType, IssueKind, StructureMap, ValidationReport};
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let chunks_dir = resolve_chunks_dir(&args.cache_root, args.chunks_dir.as_ref());
    let metadata_dir = chunks_dir.join("metadata");
    let report_path = metadata_dir.join("validation_report.json");
    let structure_map_path = metadata_dir.join("structure_map.json");

    info!(chunks_dir = %chunks_dir.display(), "status requested");

    if report_path.exists() {
        let report: ValidationReport = read_json(&report_path)?;
        let counts = &report.counts;

        info!(
            trusted = report.trusted,
            source_sha256 = %report.source_sha256,
            pages = counts.page_count,
            subchapters = counts.subchapter_records,
            articles = counts.article_records,
            sections = counts.section_records,
            synthetic_articles = counts.synthetic_articles,
            cross_references = counts.cross_references,
            dangling_references = counts.dangling_references,
            preamble_lines = counts.preamble_line_count,
            total_tokens = counts.total_tokens,
            "loaded validation report"
        );

        let mut by_kind = BTreeMap::<IssueKind, usize>::new();
        for issue in &report.issues {
            *by_kind.entry(issue.kind).or_default() += 1;
        }
        for (kind, count) in by_kind {
            info!(kind = ?kind, count, "validation issues");
        }

        if !report.trusted {
            warn!(
                errors = report.error_count(),
                "export is flagged untrusted; re-run `chunk` after checking the PDF text layer"
            );
        }
    } else {
        warn!(path = %report_path.display(), "validation report missing");
    }

    if structure_map_path.exists() {
        let structure_map: StructureMap = read_json(&structure_map_path)?;
        let count = |kind: ChunkType| {
            structure_map
                .nodes
                .iter()
                .filter(|node| node.chunk_type == kind)
                .count()
        };

        info!(
            roots = structure_map.roots.len(),
            subchapters = count(ChunkType::Subchapter),
            articles = count(ChunkType::Article),
            sections = count(ChunkType::Section),
            "loaded structure map"
        );
    } else {
        warn!(path = %structure_map_path.display(), "structure map missing");
    }

    let manifest_dir = args.cache_root.join("manifests");
    if manifest_dir.is_dir() {
        let latest = std::fs::read_dir(&manifest_dir)
            .with_context(|| format!("failed to list {}", manifest_dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("chunk_run_") && name.ends_with(".json"))
            })
            .max();

        match latest {
            Some(path) => info!(path = %path.display(), "latest chunk run manifest"),
            None => warn!(path = %manifest_dir.display(), "no chunk run manifests found"),
        }
    }

    Ok(())
}
