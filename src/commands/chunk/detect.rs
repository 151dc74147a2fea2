use super::*;

/// Classifies every line as heading, consumed heading title, blank, or body.
///
/// A subchapter or article heading without a same-line title takes the next
/// non-blank line as its title, unless that line is a heading itself.
pub fn detect_structure(lines: &[Line], grammar: &dyn HeadingGrammar) -> StructureScan {
    let mut scan = StructureScan::default();
    let mut index = 0usize;

    while index < lines.len() {
        let line = &lines[index];
        index += 1;

        if line.is_blank() {
            scan.blank_line_count += 1;
            continue;
        }

        let Some(candidate) = grammar.classify(&line.text) else {
            scan.body.push(Line {
                text: line.text.trim().to_string(),
                ..line.clone()
            });
            continue;
        };

        let mut heading = HeadingMatch {
            kind: candidate.kind,
            identifier: candidate.identifier,
            title: candidate.title.unwrap_or_default(),
            page_number: line.page_number,
            line_index: line.line_index,
            title_line_index: None,
            title_page_number: None,
            trailing_text: candidate.trailing_text,
        };

        if heading.title.is_empty() && heading.kind != ChunkType::Section {
            let mut lookahead = index;
            while lookahead < lines.len() && lines[lookahead].is_blank() {
                lookahead += 1;
            }

            if let Some(title_line) = lines.get(lookahead) {
                if grammar.classify(&title_line.text).is_none() {
                    heading.title = title_line.text.trim().to_string();
                    heading.title_line_index = Some(title_line.line_index);
                    heading.title_page_number = Some(title_line.page_number);
                    scan.blank_line_count += lookahead - index;
                    index = lookahead + 1;
                }
            }
        }

        scan.headings.push(heading);
    }

    scan
}
