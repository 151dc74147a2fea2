use std::collections::HashSet;
use std::io::{self, Write};

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::InspectArgs;
use crate::commands::chunk::{HeadingMatch, Line, StructureScan, detect_structure, extract_document};
use crate::grammar::{HeadingGrammar, HmcGrammar};
use crate::model::ChunkType;

pub fn run(args: InspectArgs) -> Result<()> {
    let grammar = HmcGrammar::new()?;
    let document = extract_document(
        &args.pdf,
        args.max_pages,
        !args.keep_page_furniture,
        &grammar,
    )?;
    let scan = detect_structure(&document.lines, &grammar);
    let near_misses = collect_near_misses(&document.lines, &scan, &grammar);

    write_inspection(&document.lines, &scan, &near_misses, args.context_lines)?;

    info!(
        pages = document.page_count,
        subchapters = scan.heading_count(ChunkType::Subchapter),
        articles = scan.heading_count(ChunkType::Article),
        sections = scan.heading_count(ChunkType::Section),
        blank_lines = scan.blank_line_count,
        near_misses = near_misses.len(),
        "inspection complete"
    );
    if scan.heading_count(ChunkType::Subchapter) == 0 {
        warn!("no subchapter headings detected; `chunk` would flag this run untrusted");
    }

    Ok(())
}

/// Body lines that mention SUBCHAPTER, ARTICLE or a section symbol but were
/// rejected by the whole-line grammar.
fn collect_near_misses<'a>(
    lines: &'a [Line],
    scan: &StructureScan,
    grammar: &dyn HeadingGrammar,
) -> Vec<&'a Line> {
    let body_indexes = scan
        .body
        .iter()
        .map(|line| line.line_index)
        .collect::<HashSet<usize>>();

    lines
        .iter()
        .filter(|line| body_indexes.contains(&line.line_index))
        .filter(|line| grammar.mentions_heading_token(&line.text))
        .collect()
}

fn write_inspection(
    lines: &[Line],
    scan: &StructureScan,
    near_misses: &[&Line],
    context_lines: usize,
) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Headings: {}", scan.headings.len())?;
    for heading in &scan.headings {
        write_heading(&mut output, heading)?;
        let start = heading.line_index.saturating_sub(context_lines);
        let end = (heading.line_index + context_lines + 1).min(lines.len());
        for line in &lines[start..end] {
            let marker = if line.line_index == heading.line_index {
                ">>>"
            } else {
                "   "
            };
            writeln!(output, "\t{marker} {}", line.text)?;
        }
    }

    writeln!(output)?;
    writeln!(output, "Near misses: {}", near_misses.len())?;
    for line in near_misses {
        writeln!(
            output,
            "p{}\tL{}\t{}",
            line.page_number,
            line.line_index,
            line.text.trim()
        )?;
    }

    output.flush()?;
    Ok(())
}

fn write_heading(output: &mut impl Write, heading: &HeadingMatch) -> Result<()> {
    let title_source = match heading.title_line_index {
        Some(index) => format!("title from L{index}"),
        None => "title inline".to_string(),
    };
    writeln!(
        output,
        "p{}\tL{}\t{}\t{}\t{}\t({})",
        heading.page_number,
        heading.line_index,
        heading.kind.as_str(),
        heading.identifier,
        heading.title,
        title_source
    )?;
    Ok(())
}
