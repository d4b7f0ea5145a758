use crate::error::LaunchError;
use crate::matcher::{PrefixMatcher, lowercase_words};
use crate::model::{Item, ProviderId};
use crate::providers::Provider;
use log::{debug, info};

/// Snapshot of every provider's items plus the prefix search over them.
///
/// Items keep provider registration order, then each provider's own order.
/// Nothing is mutated after ingestion; [`index`](Index::index) builds a fresh
/// collection and replaces the old one wholesale.
pub struct Index {
    providers: Vec<Box<dyn Provider>>,
    items: Vec<Item>,
    // Lower-cased copy of each item's words, same positions as `items`.
    words: Vec<Vec<String>>,
}

impl Index {
    /// Takes ownership of already configured providers. Call [`index`](Index::index) next.
    pub fn new(providers: Vec<Box<dyn Provider>>) -> Self {
        Self {
            providers,
            items: Vec::new(),
            words: Vec::new(),
        }
    }

    /// Asks every provider for its items, in registration order.
    pub fn index(&mut self) {
        let mut items = Vec::new();
        for (position, provider) in self.providers.iter().enumerate() {
            let provided = provider.provide();
            debug!("{} provided {} items", provider.name(), provided.len());
            let source = ProviderId(position);
            items.extend(provided.into_iter().map(|item| item.attach_source(source)));
        }

        let words = items.iter().map(|item| lowercase_words(&item.words)).collect();

        self.items = items;
        self.words = words;
        info!("Index: {} items from {} providers", self.items.len(), self.providers.len());
    }

    /// Items whose words cover every whitespace-separated token of `query` by
    /// case-insensitive prefix, in index order. A blank query yields nothing.
    pub fn search(&self, query: &str) -> Vec<&Item> {
        let matcher = PrefixMatcher::new(query);
        if matcher.is_blank() {
            return Vec::new();
        }

        let results: Vec<&Item> = self
            .items
            .iter()
            .zip(&self.words)
            .filter(|(_, words)| matcher.matches(words))
            .map(|(item, _)| item)
            .collect();

        debug!("Index: query={:?}, matched={}", query, results.len());
        results
    }

    pub fn provider(&self, id: ProviderId) -> Option<&dyn Provider> {
        self.providers.get(id.0).map(|provider| provider.as_ref())
    }

    /// Asks the item's own provider. Items of unknown origin are never launchable.
    pub fn launchable(&self, item: &Item) -> bool {
        self.provider(item.source())
            .is_some_and(|provider| provider.launchable(item))
    }

    pub fn launch(&self, item: &Item) -> Result<(), LaunchError> {
        match self.provider(item.source()) {
            Some(provider) => provider.launch(item),
            None => Err(LaunchError::UnknownProvider(item.name.clone())),
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::Payload;
    use serde_json::{Map, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Hands out a fixed list of `(name, words)` and counts launches.
    struct FixedProvider {
        name: &'static str,
        entries: Vec<(&'static str, Vec<&'static str>)>,
        launches: Arc<AtomicUsize>,
    }

    impl FixedProvider {
        fn boxed(name: &'static str, entries: Vec<(&'static str, Vec<&'static str>)>) -> Box<dyn Provider> {
            Box::new(Self { name, entries, launches: Arc::new(AtomicUsize::new(0)) })
        }
    }

    impl Provider for FixedProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn configure(&mut self, _own: &Map<String, Value>, _config: &Config) {}

        fn provide(&self) -> Vec<Item> {
            self.entries
                .iter()
                .map(|(name, words)| {
                    Item::new(
                        name.to_string(),
                        String::new(),
                        words.iter().map(|w| w.to_string()).collect(),
                        Payload::Command(format!("{} {}", self.name, name)),
                    )
                })
                .collect()
        }

        fn launch(&self, _item: &Item) -> Result<(), LaunchError> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn launchable(&self, item: &Item) -> bool {
            !item.name.starts_with('!')
        }
    }

    fn names<'a>(items: &[&'a Item]) -> Vec<&'a str> {
        items.iter().map(|item| item.name.as_str()).collect()
    }

    fn sample() -> Index {
        let mut index = Index::new(vec![
            FixedProvider::boxed("dirs", vec![("A", vec!["alpha", "shared"]), ("B", vec!["beta"])]),
            FixedProvider::boxed("apps", vec![("C", vec!["Gamma", "Shared"]), ("!D", vec!["shared"])]),
        ]);
        index.index();
        index
    }

    #[test]
    fn keeps_registration_order_and_tags_sources() {
        let index = sample();

        let all: Vec<&str> = index.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(all, ["A", "B", "C", "!D"]);
        assert_eq!(index.items()[1].source(), ProviderId(0));
        assert_eq!(index.items()[2].source(), ProviderId(1));
        assert_eq!(index.provider(ProviderId(1)).map(|p| p.name()), Some("apps"));
    }

    #[test]
    fn results_are_a_subsequence_of_index_order() {
        let index = sample();

        assert_eq!(names(&index.search("sha")), ["A", "C", "!D"]);
        assert_eq!(names(&index.search("SHARED gam")), ["C"]);
        assert!(index.search("shared delta").is_empty());
    }

    #[test]
    fn searching_twice_gives_the_same_answer() {
        let index = sample();

        assert_eq!(names(&index.search("s")), names(&index.search("s")));
    }

    #[test]
    fn blank_queries_match_nothing() {
        let index = sample();

        assert!(index.search("").is_empty());
        assert!(index.search("   ").is_empty());
    }

    #[test]
    fn reindexing_replaces_instead_of_appending() {
        let mut index = sample();
        index.index();

        assert_eq!(index.len(), 4);
    }

    #[test]
    fn dispatches_to_the_owning_provider() {
        let launches = Arc::new(AtomicUsize::new(0));
        let mut index = Index::new(vec![
            FixedProvider::boxed("other", vec![]),
            Box::new(FixedProvider {
                name: "apps",
                entries: vec![("Editor", vec!["editor"]), ("!Broken", vec!["broken"])],
                launches: launches.clone(),
            }),
        ]);
        index.index();

        let editor = index.search("edit")[0];
        let broken = index.search("brok")[0];
        assert!(index.launchable(editor));
        assert!(!index.launchable(broken));

        index.launch(editor).unwrap();
        assert_eq!(launches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn items_from_elsewhere_cannot_be_launched() {
        let index = Index::new(Vec::new());
        let stray = Item::new("stray".into(), String::new(), vec![], Payload::Command("x".into()));

        assert!(index.is_empty());
        assert!(!index.launchable(&stray));
        assert!(matches!(index.launch(&stray), Err(LaunchError::UnknownProvider(_))));
    }
}
