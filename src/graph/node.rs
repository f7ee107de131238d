use serde::{Deserialize, Serialize};

/// Top-level section-sized unit of the normalized document. Adjacency
/// is stored on the chunk itself and must stay mirror-consistent:
/// `chunk[i].next == chunk[i+1].id` iff `chunk[i+1].previous ==
/// chunk[i].id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Extracted heading or environment name; doubles as the section
    /// name offered to the language model.
    pub id: String,
    pub text: String,
    /// Position in document order, after filtering.
    pub ordinal: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}

impl Chunk {
    pub fn new(id: impl Into<String>, text: impl Into<String>, ordinal: usize) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            ordinal,
            next: None,
            previous: None,
        }
    }
}

/// Smaller semantically-delimited unit within a chunk, used for
/// fine-grained retrieval. Its id carries an ordinal suffix so it can
/// never collide with a section name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubChunk {
    pub id: String,
    pub text: String,
    pub parent_id: String,
}

impl SubChunk {
    pub fn new(parent_id: &str, ordinal: usize, text: impl Into<String>) -> Self {
        Self {
            id: format!("{parent_id}#{ordinal}"),
            text: text.into(),
            parent_id: parent_id.to_string(),
        }
    }
}

/// Any retrievable unit registered in the similarity index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum IndexEntry {
    Chunk(Chunk),
    SubChunk(SubChunk),
}

impl IndexEntry {
    pub fn id(&self) -> &str {
        match self {
            IndexEntry::Chunk(c) => &c.id,
            IndexEntry::SubChunk(s) => &s.id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            IndexEntry::Chunk(c) => &c.text,
            IndexEntry::SubChunk(s) => &s.text,
        }
    }

    /// Parent chunk id for sub-chunks; `None` for top-level chunks.
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            IndexEntry::Chunk(_) => None,
            IndexEntry::SubChunk(s) => Some(&s.parent_id),
        }
    }
}
