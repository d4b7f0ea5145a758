use std::path::PathBuf;
use std::sync::Arc;
use tiny_skia::Pixmap;

/// Position of a provider inside the [`Index`](crate::index::Index) that ingested an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProviderId(pub usize);

/// Provider-specific data carried by an item. Only the owning provider interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Directory(PathBuf),
    Command(String),
}

#[derive(Debug, Clone)]
pub struct Item {
    pub name: String,              // Display title
    pub description: String,       // Subtitle, may be empty
    pub icon: Option<Arc<Pixmap>>, // Resolved at index time
    pub words: Vec<String>,        // Tokens used for matching
    pub payload: Payload,
    source: ProviderId,
}

impl Item {
    pub fn new(name: String, description: String, words: Vec<String>, payload: Payload) -> Self {
        Self {
            name,
            description,
            icon: None,
            words,
            payload,
            source: ProviderId::default(),
        }
    }

    pub fn with_icon(mut self, icon: Option<Arc<Pixmap>>) -> Self {
        self.icon = icon;
        self
    }

    /// The provider that produced this item.
    pub fn source(&self) -> ProviderId {
        self.source
    }

    pub(crate) fn attach_source(mut self, source: ProviderId) -> Self {
        self.source = source;
        self
    }
}
