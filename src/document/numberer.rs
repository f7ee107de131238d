use regex::Regex;

/// Heading command recognized by the numbering pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeadingKind {
    Section,
    Subsection,
    Bibliography,
}

impl HeadingKind {
    fn from_command(command: &str) -> Self {
        match command {
            "section" => HeadingKind::Section,
            "subsection" => HeadingKind::Subsection,
            _ => HeadingKind::Bibliography,
        }
    }
}

/// Rewrites `\section{...}` and `\subsection{...}` headings with the
/// numbers LaTeX itself would assign: decimal before the appendix or
/// bibliography, letters (A, B, C, ...) after. The bibliography heading
/// is the mode switch and passes through unmodified. Starred headings
/// are unnumbered by convention and are left alone.
#[derive(Debug, Default)]
pub struct SectionNumberer {
    section_count: u32,
    subsection_count: u32,
    alpha_section_count: u32,
    appendix_entered: bool,
}

impl SectionNumberer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single left-to-right rewrite pass over the whole body.
    pub fn number_sections(&mut self, tex: &str) -> String {
        let re = Regex::new(r"\\(section|subsection|bibliography)\{([^}]*)\}").unwrap();
        let mut out = String::with_capacity(tex.len());
        let mut last = 0;
        for caps in re.captures_iter(tex) {
            let Some(m) = caps.get(0) else { continue };
            out.push_str(&tex[last..m.start()]);
            let kind = HeadingKind::from_command(&caps[1]);
            out.push_str(&self.rewrite_heading(kind, &caps[2], m.as_str()));
            last = m.end();
        }
        out.push_str(&tex[last..]);
        out
    }

    fn rewrite_heading(&mut self, kind: HeadingKind, content: &str, original: &str) -> String {
        // Either marker flips every later heading into appendix mode.
        if kind == HeadingKind::Bibliography || content.contains("\\appendix") {
            self.appendix_entered = true;
            return original.to_string();
        }

        match (kind, self.appendix_entered) {
            (HeadingKind::Section, false) => {
                self.section_count += 1;
                self.subsection_count = 0;
                format!("\\section{{{} {}}}", self.section_count, content)
            }
            (HeadingKind::Subsection, false) => {
                self.subsection_count += 1;
                format!(
                    "\\subsection{{{}.{} {}}}",
                    self.section_count, self.subsection_count, content
                )
            }
            (HeadingKind::Section, true) => {
                self.alpha_section_count += 1;
                self.subsection_count = 0;
                format!("\\section{{{} {}}}", self.alpha_label(), content)
            }
            (HeadingKind::Subsection, true) => {
                self.subsection_count += 1;
                format!(
                    "\\subsection{{{}.{} {}}}",
                    self.alpha_label(),
                    self.subsection_count,
                    content
                )
            }
            (HeadingKind::Bibliography, _) => original.to_string(),
        }
    }

    fn alpha_label(&self) -> char {
        (b'@' + self.alpha_section_count.min(26) as u8) as char
    }
}
