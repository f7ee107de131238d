use regex::Regex;

use crate::graph::Chunk;

/// Split fully normalized, numbered text into top-level chunks: one per
/// section boundary, with any leading material becoming the abstract
/// chunk. Acknowledgements sections are dropped before the graph is
/// built so they are never citable and never break neighbor adjacency.
pub fn build_chunks(body: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut ordinal = 0;
    for (i, segment) in split_sections(body).into_iter().enumerate() {
        let (id, text) = if i == 0 && !segment.trim_start().starts_with("\\section") {
            ("abstract".to_string(), rewrite_abstract(&segment))
        } else {
            (extract_heading_name(&segment), segment)
        };
        if is_acknowledgements(&id) {
            continue;
        }
        chunks.push(Chunk::new(id, text, ordinal));
        ordinal += 1;
    }
    chunks
}

/// Split before every `\section`/`\section*` command, keeping each
/// boundary with the chunk it introduces.
fn split_sections(body: &str) -> Vec<String> {
    let re = Regex::new(r"\\section\*?\{[^}]*\}").unwrap();
    let starts: Vec<usize> = re.find_iter(body).map(|m| m.start()).collect();

    let mut segments = Vec::new();
    if let Some(&first) = starts.first() {
        if first > 0 {
            segments.push(body[..first].to_string());
        }
        for (i, &start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(body.len());
            segments.push(body[start..end].to_string());
        }
    } else if !body.is_empty() {
        segments.push(body.to_string());
    }
    segments
}

/// Extracted heading or environment name; empty string when neither is
/// present.
fn extract_heading_name(segment: &str) -> String {
    let re = Regex::new(r"\\(?:begin|section\*?)\{([^}]*)\}").unwrap();
    re.captures(segment)
        .map(|c| c[1].to_string())
        .unwrap_or_default()
}

/// Matches "Acknowledgements" case-insensitively, tolerating the
/// numbering prefix the section numberer may have added.
fn is_acknowledgements(id: &str) -> bool {
    id.trim().to_ascii_lowercase().ends_with("acknowledgements")
}

/// Rewrite the abstract environment into an unnumbered section heading
/// so the abstract chunk reads like every other chunk.
fn rewrite_abstract(segment: &str) -> String {
    segment
        .replace("\\begin{abstract}", "\\section*{abstract}")
        .replace("\\end{abstract}", "")
}
