use super::*;

/// Everything one pipeline pass produces, ready to be written.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub tree: ChunkTree,
    pub records: Vec<ExportRecord>,
    pub cross_references: CrossReferenceMap,
    pub structure_map: StructureMap,
    pub report: ValidationReport,
}

pub fn run(args: ChunkArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let output_dir = args.resolved_output_dir();
    let run_manifest_path = args.run_manifest_path.clone().unwrap_or_else(|| {
        args.cache_root.join("manifests").join(format!(
            "chunk_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    info!(pdf = %args.pdf.display(), run_id = %run_id, "starting chunk run");

    let grammar = HmcGrammar::new()?;
    let document = extract_document(
        &args.pdf,
        args.max_pages,
        !args.keep_page_furniture,
        &grammar,
    )?;
    let source_sha256 = sha256_file(&args.pdf)?;

    let settings = ExportSettings {
        keyword_limit: args.keyword_limit,
        chars_per_token: args.chars_per_token,
    };
    let outcome = run_pipeline(&document, &grammar, &settings, &source_sha256);
    write_export(&output_dir, &outcome)?;

    let report = &outcome.report;
    for issue in &report.issues {
        match issue.severity {
            Severity::Error => error!(
                kind = ?issue.kind,
                chunk_id = %issue.chunk_id.as_deref().unwrap_or_default(),
                "{}",
                issue.message
            ),
            Severity::Warning => warn!(
                kind = ?issue.kind,
                chunk_id = %issue.chunk_id.as_deref().unwrap_or_default(),
                "{}",
                issue.message
            ),
        }
    }

    let manifest = ChunkRunManifest {
        manifest_version: 1,
        run_id,
        status: if report.trusted { "completed" } else { "untrusted" }.to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_chunk_command(&args),
        tool_versions: ToolVersions {
            pdftotext: pdftotext_version(),
        },
        paths: ChunkPaths {
            pdf_path: args.pdf.display().to_string(),
            output_dir: output_dir.display().to_string(),
            run_manifest_path: run_manifest_path.display().to_string(),
        },
        source_sha256,
        trusted: report.trusted,
        counts: report.counts.clone(),
        error_count: report.error_count(),
        warning_count: report.warning_count(),
        notes: vec![
            "Headings are matched against whole lines only; citations inside prose never open a chunk."
                .to_string(),
            "Records under the output directory are reproducible; this manifest carries the run-specific fields."
                .to_string(),
        ],
    };
    write_json_pretty(&run_manifest_path, &manifest)?;

    info!(path = %run_manifest_path.display(), "wrote chunk run manifest");
    info!(
        roots = outcome.tree.children.len(),
        subchapters = report.counts.subchapter_records,
        articles = report.counts.article_records,
        sections = report.counts.section_records,
        tokens = report.counts.total_tokens,
        warnings = report.warning_count(),
        errors = report.error_count(),
        "chunk run completed"
    );

    if !report.trusted {
        bail!(
            "structure validation failed with {} error(s); output in {} is flagged untrusted",
            report.error_count(),
            output_dir.display()
        );
    }

    Ok(())
}

/// Detection through export, with no I/O. Validation problems end up in the
/// report; they never stop the pass.
pub fn run_pipeline(
    document: &ExtractedDocument,
    grammar: &dyn HeadingGrammar,
    settings: &ExportSettings,
    source_sha256: &str,
) -> PipelineOutcome {
    let scan = detect_structure(&document.lines, grammar);
    let (tree, mut issues) = build_tree(&scan, grammar);

    issues.extend(check_subchapters_present(&scan));
    issues.extend(check_numeral_order(&tree, grammar));

    let references = extract_cross_references(&tree, grammar);
    issues.extend(dangling_reference_issues(&references));

    let records = build_records(&tree, &references, grammar, settings);
    let cross_references = cross_reference_map(&tree, &references);
    let structure_map = build_structure_map(&tree, grammar);

    let counts = StructureCounts {
        page_count: document.page_count,
        line_count: document.lines.len(),
        body_line_count: scan.body.len(),
        preamble_line_count: tree.preamble_line_count,
        page_furniture_lines_removed: document.page_furniture_lines_removed,
        subchapter_headings: scan.heading_count(ChunkType::Subchapter),
        article_headings: scan.heading_count(ChunkType::Article),
        section_headings: scan.heading_count(ChunkType::Section),
        subchapter_records: count_records(&records, ChunkType::Subchapter),
        article_records: count_records(&records, ChunkType::Article),
        section_records: count_records(&records, ChunkType::Section),
        synthetic_articles: tree.nodes().iter().filter(|node| node.synthetic).count(),
        cross_references: references.len(),
        dangling_references: references
            .iter()
            .filter(|reference| reference.resolution == Resolution::Dangling)
            .count(),
        total_tokens: tree
            .nodes()
            .iter()
            .map(|node| estimate_tokens(&node.body_text, settings.chars_per_token))
            .sum(),
    };
    let report = build_report(source_sha256, counts, issues);

    PipelineOutcome {
        tree,
        records,
        cross_references,
        structure_map,
        report,
    }
}

fn count_records(records: &[ExportRecord], chunk_type: ChunkType) -> usize {
    records
        .iter()
        .filter(|record| record.chunk_type == chunk_type)
        .count()
}

fn render_chunk_command(args: &ChunkArgs) -> String {
    let mut command = format!(
        "hmc-chunker chunk --pdf {} --cache-root {}",
        args.pdf.display(),
        args.cache_root.display()
    );
    if let Some(output_dir) = &args.output_dir {
        command.push_str(&format!(" --output-dir {}", output_dir.display()));
    }
    if let Some(max_pages) = args.max_pages {
        command.push_str(&format!(" --max-pages {max_pages}"));
    }
    command.push_str(&format!(
        " --keyword-limit {} --chars-per-token {}",
        args.keyword_limit, args.chars_per_token
    ));
    if args.keep_page_furniture {
        command.push_str(" --keep-page-furniture");
    }
    command
}
