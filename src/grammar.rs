//! Heading and citation grammar for the source document.
//!
//! Everything that knows what a heading or a citation looks like lives behind
//! [`HeadingGrammar`], so supporting another code's numbering scheme means
//! adding one implementation here.

use anyhow::{Context, Result};
use regex::Regex;

use crate::model::ChunkType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingCandidate {
    pub kind: ChunkType,
    pub identifier: String,
    pub title: Option<String>,
    pub trailing_text: Option<String>,
}

pub trait HeadingGrammar {
    /// Classifies one whole line. Returns `None` for body text.
    fn classify(&self, line: &str) -> Option<HeadingCandidate>;

    /// Section identifiers cited anywhere in `text`, in order of appearance.
    fn citations(&self, text: &str) -> Vec<String>;

    /// True when a line mentions a heading token without being a heading.
    fn mentions_heading_token(&self, line: &str) -> bool;

    /// Sort key of a numeral for monotonicity checks.
    fn numeral_order(&self, kind: ChunkType, identifier: &str) -> Option<(u32, u32)>;

    fn code_title(&self) -> &str;

    fn chapter(&self) -> &str;

    fn chunk_id(&self, kind: ChunkType, identifier: &str, subchapter: Option<&str>) -> String {
        let key = sanitize_ref_for_id(identifier);
        match (kind, subchapter) {
            (ChunkType::Subchapter, _) => format!("subchapter_{key}"),
            (ChunkType::Article, Some(subchapter)) => {
                format!("article_{}_{key}", sanitize_ref_for_id(subchapter))
            }
            (ChunkType::Article, None) => format!("article_{key}"),
            (ChunkType::Section, _) => format!("section_{key}"),
        }
    }

    fn display_title(&self, kind: ChunkType, identifier: &str, title: &str) -> String {
        let label = match kind {
            ChunkType::Subchapter => format!("Subchapter {identifier}"),
            ChunkType::Article => format!("Article {identifier}"),
            ChunkType::Section => format!("§ {identifier}"),
        };
        if title.is_empty() {
            label
        } else {
            format!("{label} - {title}")
        }
    }
}

/// Grammar of the Housing Maintenance Code (Administrative Code Title 27,
/// Chapter 2).
#[derive(Debug)]
pub struct HmcGrammar {
    subchapter_heading: Regex,
    article_heading: Regex,
    section_heading: Regex,
    citation: Regex,
    toc_line: Regex,
    heading_token: Regex,
}

impl HmcGrammar {
    pub fn new() -> Result<Self> {
        Ok(Self {
            subchapter_heading: Regex::new(r"^SUBCHAPTER\s+(\d+|[IVXLC]+)(?:\s*[-–—:.]\s*(.*))?$")
                .context("failed to compile subchapter heading regex")?,
            article_heading: Regex::new(
                r"^ARTICLE\s+(\d+(?:-[A-Z])?|[IVXLC]+)(?:\s*[-–—:.]\s*(.*))?$",
            )
            .context("failed to compile article heading regex")?,
            // One `§` and a capitalized title (or none): `§ 27-2017 of this
            // article` and `§§ 27-2005 and 27-2006` are wrapped citations.
            section_heading: Regex::new(
                r"^§\s*(27)\s*[-–—]\s*(\d{4}(?:\.\d+)?)(?:\s*[-–—.]?\s*([A-Z].*))?$",
            )
            .context("failed to compile section heading regex")?,
            citation: Regex::new(r"(?:§+\s*)?\b(27)\s*[-–—]\s*(\d{4}(?:\.\d+)?)\b")
                .context("failed to compile citation regex")?,
            toc_line: Regex::new(r"(?:\.\s*){3,}\d+\s*$")
                .context("failed to compile table-of-contents line regex")?,
            heading_token: Regex::new(r"(?i)\b(?:sub-?chapter|article)\s+\S+|§\s*27")
                .context("failed to compile heading token regex")?,
        })
    }
}

impl HeadingGrammar for HmcGrammar {
    fn classify(&self, line: &str) -> Option<HeadingCandidate> {
        let line = line.trim();
        if line.is_empty() || self.toc_line.is_match(line) {
            return None;
        }

        if let Some(captures) = self.subchapter_heading.captures(line) {
            return Some(HeadingCandidate {
                kind: ChunkType::Subchapter,
                identifier: captures.get(1)?.as_str().to_string(),
                title: non_empty(captures.get(2).map(|value| value.as_str())),
                trailing_text: None,
            });
        }

        if let Some(captures) = self.article_heading.captures(line) {
            return Some(HeadingCandidate {
                kind: ChunkType::Article,
                identifier: captures.get(1)?.as_str().to_string(),
                title: non_empty(captures.get(2).map(|value| value.as_str())),
                trailing_text: None,
            });
        }

        if let Some(captures) = self.section_heading.captures(line) {
            let identifier = format!("{}-{}", captures.get(1)?.as_str(), captures.get(2)?.as_str());
            let rest = captures
                .get(3)
                .map(|value| value.as_str().trim().trim_start_matches('.').trim_start())
                .unwrap_or_default();
            let (title, trailing_text) = match rest.split_once('.') {
                Some((title, trailing)) => (title, trailing),
                None => (rest, ""),
            };

            return Some(HeadingCandidate {
                kind: ChunkType::Section,
                identifier,
                title: non_empty(Some(title)),
                trailing_text: Some(trailing_text.trim())
                    .filter(|value| !value.is_empty())
                    .map(ToOwned::to_owned),
            });
        }

        None
    }

    fn citations(&self, text: &str) -> Vec<String> {
        self.citation
            .captures_iter(text)
            .filter_map(|captures| {
                let title = captures.get(1)?.as_str();
                let number = captures.get(2)?.as_str();
                Some(format!("{title}-{number}"))
            })
            .collect()
    }

    fn mentions_heading_token(&self, line: &str) -> bool {
        self.heading_token.is_match(line) && self.classify(line).is_none()
    }

    fn numeral_order(&self, kind: ChunkType, identifier: &str) -> Option<(u32, u32)> {
        match kind {
            ChunkType::Subchapter => parse_numeral(identifier).map(|value| (value, 0)),
            ChunkType::Article => {
                let (number, suffix) = match identifier.split_once('-') {
                    Some((number, suffix)) => (number, suffix),
                    None => (identifier, ""),
                };
                let suffix_order = suffix
                    .chars()
                    .next()
                    .map(|letter| u32::from(letter).saturating_sub(u32::from('A')) + 1)
                    .unwrap_or(0);
                parse_numeral(number).map(|value| (value, suffix_order))
            }
            ChunkType::Section => {
                let number = identifier.rsplit_once('-').map(|(_, number)| number)?;
                let (whole, fraction) = match number.split_once('.') {
                    Some((whole, fraction)) => (whole, fraction.parse().ok()?),
                    None => (number, 0),
                };
                Some((whole.parse().ok()?, fraction))
            }
        }
    }

    fn code_title(&self) -> &str {
        "27"
    }

    fn chapter(&self) -> &str {
        "2"
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(|value| value.trim().trim_end_matches('.').trim())
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

/// Decimal or roman numeral value.
pub fn parse_numeral(value: &str) -> Option<u32> {
    if let Ok(number) = value.parse::<u32>() {
        return Some(number);
    }

    let mut total = 0u32;
    let mut previous = 0u32;
    for letter in value.chars().rev() {
        let digit = match letter.to_ascii_uppercase() {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            _ => return None,
        };
        if digit < previous {
            total = total.checked_sub(digit)?;
        } else {
            total += digit;
            previous = digit;
        }
    }

    (total > 0).then_some(total)
}

pub fn sanitize_ref_for_id(reference: &str) -> String {
    let mut out = String::with_capacity(reference.len());
    for ch in reference.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push('_');
        }
    }

    while out.contains("__") {
        out = out.replace("__", "_");
    }

    out.trim_matches('_').to_string()
}
