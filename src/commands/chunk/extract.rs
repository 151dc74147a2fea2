use super::*;

/// Runs `pdftotext` and turns its output into numbered lines. Fails when the
/// tool is missing, exits non-zero, or yields no text at all.
pub fn extract_document(
    pdf_path: &Path,
    max_pages: Option<usize>,
    strip_furniture: bool,
    grammar: &dyn HeadingGrammar,
) -> Result<ExtractedDocument> {
    if !pdf_path.is_file() {
        bail!("PDF not found: {}", pdf_path.display());
    }

    let mut pages = extract_pages_with_pdftotext(pdf_path, max_pages)?;
    if pages.iter().all(|page| page.trim().is_empty()) {
        bail!(
            "pdftotext produced no text for {}; the PDF may lack a text layer",
            pdf_path.display()
        );
    }

    let page_furniture_lines_removed = if strip_furniture {
        strip_page_furniture(&mut pages, grammar)
    } else {
        0
    };

    info!(
        path = %pdf_path.display(),
        pages = pages.len(),
        furniture_removed = page_furniture_lines_removed,
        "extracted text layer"
    );

    Ok(document_from_pages(&pages, page_furniture_lines_removed))
}

pub fn document_from_pages(pages: &[String], page_furniture_lines_removed: usize) -> ExtractedDocument {
    ExtractedDocument {
        page_count: pages.len(),
        lines: lines_from_pages(pages),
        page_furniture_lines_removed,
    }
}

pub fn lines_from_pages(pages: &[String]) -> Vec<Line> {
    let mut lines = Vec::new();
    for (page_index, page) in pages.iter().enumerate() {
        let page_number = (page_index + 1) as u32;
        for text in page.lines() {
            lines.push(Line {
                page_number,
                text: text.trim_end().to_string(),
                line_index: lines.len(),
            });
        }
    }
    lines
}

fn extract_pages_with_pdftotext(pdf_path: &Path, max_pages: Option<usize>) -> Result<Vec<String>> {
    let mut command = Command::new("pdftotext");
    command.arg("-enc").arg("UTF-8").arg("-f").arg("1");
    if let Some(max_pages) = max_pages {
        command.arg("-l").arg(max_pages.to_string());
    }
    command.arg(pdf_path).arg("-");

    let output = command
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    Ok(pages)
}

pub fn pdftotext_version() -> Option<String> {
    let output = Command::new("pdftotext").arg("-v").output().ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
}

/// Drops running headers/footers and bare page numbers from the first and last
/// non-empty line of each page. Heading lines are never dropped.
pub fn strip_page_furniture(pages: &mut [String], grammar: &dyn HeadingGrammar) -> usize {
    let header_candidates = detect_repeated_edge_lines(pages, true);
    let footer_candidates = detect_repeated_edge_lines(pages, false);
    let mut removed = 0usize;

    for page in pages.iter_mut() {
        let mut lines = page
            .lines()
            .map(ToOwned::to_owned)
            .collect::<Vec<String>>();

        if let Some(index) = first_nonempty_line_index(&lines) {
            if is_furniture(&lines[index], &header_candidates, grammar) {
                lines.remove(index);
                removed += 1;
            }
        }

        if let Some(index) = last_nonempty_line_index(&lines) {
            if is_furniture(&lines[index], &footer_candidates, grammar) {
                lines.remove(index);
                removed += 1;
            }
        }

        *page = lines.join("\n");
    }

    removed
}

fn is_furniture(line: &str, repeated: &HashSet<String>, grammar: &dyn HeadingGrammar) -> bool {
    if grammar.classify(line).is_some() {
        return false;
    }

    let candidate = normalize_edge_line(line);
    !candidate.is_empty() && (repeated.contains(&candidate) || is_page_number_line(line))
}

fn detect_repeated_edge_lines(pages: &[String], from_top: bool) -> HashSet<String> {
    let mut counts = HashMap::<String, usize>::new();
    for page in pages {
        let lines = page.lines().collect::<Vec<&str>>();
        let index = if from_top {
            first_nonempty_line_index(&lines)
        } else {
            last_nonempty_line_index(&lines)
        };
        if let Some(index) = index {
            let candidate = normalize_edge_line(lines[index]);
            if !candidate.is_empty() {
                *counts.entry(candidate).or_default() += 1;
            }
        }
    }

    let threshold = (pages.len() / 2).max(3);
    counts
        .into_iter()
        .filter(|(_, count)| *count >= threshold)
        .map(|(line, _)| line)
        .collect()
}

/// Collapses whitespace and masks digits so "Page 3" and "Page 4" compare equal.
fn normalize_edge_line(line: &str) -> String {
    line.split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .chars()
        .map(|character| if character.is_ascii_digit() { '#' } else { character })
        .collect()
}

fn is_page_number_line(line: &str) -> bool {
    let trimmed = line.trim();
    let number = trimmed
        .strip_prefix("Page ")
        .or_else(|| trimmed.strip_prefix("page "))
        .unwrap_or(trimmed)
        .trim();
    !number.is_empty() && number.len() <= 4 && number.chars().all(|character| character.is_ascii_digit())
}

fn first_nonempty_line_index<S: AsRef<str>>(lines: &[S]) -> Option<usize> {
    lines.iter().position(|line| !line.as_ref().trim().is_empty())
}

fn last_nonempty_line_index<S: AsRef<str>>(lines: &[S]) -> Option<usize> {
    lines.iter().rposition(|line| !line.as_ref().trim().is_empty())
}
