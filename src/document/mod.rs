use regex::Regex;

pub mod numberer;
pub mod splitter;

pub use numberer::SectionNumberer;

/// A manuscript after normalization. Built once per upload and treated
/// as immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub body: String,
}

/// Normalize raw LaTeX into a flat, whitespace-stable body suitable for
/// section splitting. Total over strings: malformed input degrades to
/// defaults instead of erroring.
pub fn normalize(raw: &str) -> Document {
    // Title comes from the pre-truncation text; truncating at the
    // abstract would otherwise lose the preamble it lives in.
    let title = extract_title(raw);

    let body = strip_document_wrapper(raw);
    let body = pad_inline_commands(&body);
    let body = replace_environment(&body, "table", "Table");
    let body = replace_environment(&body, "figure", "Figure");
    let body = truncate_at_abstract(&body);
    let body = strip_comment_lines(&body);
    let body = collapse_comment_markers(&body);

    Document { title, body }
}

/// First `\title{...}` argument, or empty string if absent.
pub fn extract_title(tex: &str) -> String {
    let re = Regex::new(r"\\title\{([^}]*)\}").unwrap();
    re.captures(tex)
        .map(|c| c[1].to_string())
        .unwrap_or_default()
}

/// Remove `\begin{document}` and `\end{document}` markers.
fn strip_document_wrapper(tex: &str) -> String {
    tex.replace("\\begin{document}", "")
        .replace("\\end{document}", "")
}

/// Pad inline commands with surrounding whitespace so command
/// boundaries never fuse into adjacent text, then collapse repeated
/// whitespace document-wide. Covers the starred heading variants too.
fn pad_inline_commands(tex: &str) -> String {
    let re =
        Regex::new(r"\\(?:footnote|href|textbf|section|subsection)\*?\{.*?\}").unwrap();
    let padded = re.replace_all(tex, |caps: &regex::Captures| format!(" {} ", &caps[0]));
    collapse_whitespace(&padded)
}

fn collapse_whitespace(text: &str) -> String {
    let re = Regex::new(r"\s+").unwrap();
    re.replace_all(text, " ").trim().to_string()
}

/// Replace every `\begin{env}...\end{env}` (and its starred variant)
/// with a single numbered caption sentence, dropping the environment
/// body. The counter starts at 1 and increments only on matched
/// environments; a captionless environment still consumes a number.
fn replace_environment(tex: &str, env: &str, label: &str) -> String {
    let env_re = Regex::new(&format!(
        r"(?s)\\begin\{{{env}\*?\}}.*?\\end\{{{env}\*?\}}"
    ))
    .unwrap();
    let caption_re = Regex::new(r"\\caption\{([^}]*)\}").unwrap();

    let mut out = String::with_capacity(tex.len());
    let mut last = 0;
    let mut counter = 0u32;
    for m in env_re.find_iter(tex) {
        counter += 1;
        let caption = caption_re
            .captures(m.as_str())
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        out.push_str(&tex[last..m.start()]);
        out.push_str(&format!(
            " {label} {counter} Description: {caption}. End {label} {counter} Description. "
        ));
        last = m.end();
    }
    out.push_str(&tex[last..]);
    collapse_whitespace(&out)
}

/// Keep only content from the first `\begin{abstract}` onward, if one
/// exists.
fn truncate_at_abstract(tex: &str) -> String {
    match tex.find("\\begin{abstract}") {
        Some(pos) => tex[pos..].to_string(),
        None => tex.to_string(),
    }
}

/// Remove comment-only lines while preserving each retained line's
/// original line-ending sequence (mixed CR / LF / CRLF).
fn strip_comment_lines(tex: &str) -> String {
    let mut out = String::with_capacity(tex.len());
    for (line, ending) in split_with_endings(tex) {
        if !line.trim_start().starts_with('%') {
            out.push_str(line);
            out.push_str(ending);
        }
    }
    out
}

/// Split into `(line, line_ending)` pairs, recognizing CRLF, CR and LF.
fn split_with_endings(text: &str) -> Vec<(&str, &str)> {
    let mut parts = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                let end = if bytes.get(i + 1) == Some(&b'\n') { i + 2 } else { i + 1 };
                parts.push((&text[start..i], &text[i..end]));
                start = end;
                i = end;
            }
            b'\n' => {
                parts.push((&text[start..i], &text[i..i + 1]));
                start = i + 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    if start < text.len() {
        parts.push((&text[start..], ""));
    }
    parts
}

/// Collapse runs of the repeated empty-comment marker `%%` into one
/// occurrence. Some authors use stacked `%%` rows as visual separators.
fn collapse_comment_markers(tex: &str) -> String {
    let re = Regex::new(r"(?:%%){2,}").unwrap();
    re.replace_all(tex, "%%").to_string()
}
