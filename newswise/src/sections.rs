//! Pulls the labelled sections out of a summarization response.
//!
//! The summary prompt asks for `Title:`, `Potential Bias:`, `Summary of the article`
//! and `Explanation of complex topics (if any):` blocks. Models decorate those
//! headers with markdown, so `**Potential Bias:**` and `## Title:` are accepted too.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummarySections {
    pub title: Option<String>,
    pub bias: Option<String>,
    pub summary: Option<String>,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Title,
    Bias,
    Summary,
    Explanation,
}

// Longest labels first so "summary of the article" wins over "summary".
const LABELS: &[(&str, Section)] = &[
    ("explanation of complex topics (if any)", Section::Explanation),
    ("explanation of complex topics", Section::Explanation),
    ("explanation", Section::Explanation),
    ("potential bias", Section::Bias),
    ("bias", Section::Bias),
    ("summary of the article", Section::Summary),
    ("summary", Section::Summary),
    ("title", Section::Title),
];

fn is_decoration(c: char) -> bool {
    matches!(c, '*' | '#' | '_' | '-' | ' ' | '\t')
}

/// Recognise a header line, returning the section and any text after the colon.
fn header(line: &str) -> Option<(Section, &str)> {
    let trimmed = line.trim().trim_start_matches(is_decoration);
    let lower = trimmed.to_ascii_lowercase();

    for (label, section) in LABELS {
        if !lower.starts_with(label) {
            continue;
        }
        let rest = trimmed[label.len()..].trim_start_matches(|c| c == '*' || c == ' ');
        if rest.is_empty() {
            return Some((*section, ""));
        }
        if let Some(after) = rest.strip_prefix(':') {
            return Some((*section, after.trim_matches(|c: char| c == '*' || c.is_whitespace())));
        }
    }
    None
}

pub fn parse_sections(text: &str) -> SummarySections {
    let mut sections = SummarySections::default();
    let mut current: Option<(Section, Vec<&str>)> = None;

    for line in text.lines() {
        if let Some((section, inline)) = header(line) {
            if let Some((done, lines)) = current.take() {
                store(&mut sections, done, &lines);
            }
            let mut lines = Vec::new();
            if !inline.is_empty() {
                lines.push(inline);
            }
            current = Some((section, lines));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line.trim_end());
        }
    }
    if let Some((done, lines)) = current {
        store(&mut sections, done, &lines);
    }

    sections
}

fn store(sections: &mut SummarySections, section: Section, lines: &[&str]) {
    let body = lines.join("\n").trim().to_string();
    if body.is_empty() {
        return;
    }
    let slot = match section {
        Section::Title => &mut sections.title,
        Section::Bias => &mut sections.bias,
        Section::Summary => &mut sections.summary,
        Section::Explanation => &mut sections.explanation,
    };
    // first occurrence wins
    if slot.is_none() {
        *slot = Some(body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_sections() {
        let text = "Title: Moon mission delayed\n\
                    Potential Bias: Relies on agency statements only.\n\
                    Summary of the article: The launch slipped a week.\n\
                    It is the second delay.\n\
                    Explanation of complex topics (if any): A launch window is the period...";
        let s = parse_sections(text);
        assert_eq!(s.title.as_deref(), Some("Moon mission delayed"));
        assert_eq!(s.bias.as_deref(), Some("Relies on agency statements only."));
        assert_eq!(
            s.summary.as_deref(),
            Some("The launch slipped a week.\nIt is the second delay.")
        );
        assert_eq!(s.explanation.as_deref(), Some("A launch window is the period..."));
    }

    #[test]
    fn markdown_headers_with_body_on_next_lines() {
        let text = "## Title:\nBudget vote\n\n**Potential Bias:**\nNone detected.\n\n**Explanation of complex topics (if any):**\n* Reconciliation: a process";
        let s = parse_sections(text);
        assert_eq!(s.title.as_deref(), Some("Budget vote"));
        assert_eq!(s.bias.as_deref(), Some("None detected."));
        assert_eq!(s.explanation.as_deref(), Some("* Reconciliation: a process"));
        assert!(s.summary.is_none());
    }

    #[test]
    fn free_text_has_no_sections() {
        let s = parse_sections("Y");
        assert_eq!(s, SummarySections::default());
    }

    #[test]
    fn word_prefix_is_not_a_header() {
        let s = parse_sections("Summary: fine\nSummaryless sentence continues");
        assert_eq!(s.summary.as_deref(), Some("fine\nSummaryless sentence continues"));
    }

    #[test]
    fn empty_section_stays_unset() {
        let s = parse_sections("Potential Bias:\nTitle: T");
        assert!(s.bias.is_none());
        assert_eq!(s.title.as_deref(), Some("T"));
    }
}
