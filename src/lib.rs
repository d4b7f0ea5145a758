//! Indexing and search core of the `sling` launcher.
//!
//! Providers turn folders and desktop entries into [`model::Item`]s, the
//! [`index::Index`] filters them on every keystroke, and the owning provider
//! launches the chosen one through [`executor::detach`].

pub mod config;
pub mod error;
pub mod executor;
pub mod icons;
pub mod index;
pub mod matcher;
pub mod model;
pub mod providers;

use crate::config::Config;
use crate::index::Index;

/// Configures the built-in providers from `config` and indexes them.
pub fn build_index(config: &Config) -> Index {
    let mut providers = providers::builtin();
    providers::configure_all(&mut providers, config);

    let mut index = Index::new(providers);
    index.index();
    index
}
