use crate::config::Config;
use crate::error::LaunchError;
use crate::model::Item;
use log::warn;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub mod application;
pub mod desktop_entry;
pub mod directory;

/// A pluggable source of launchable items.
///
/// A provider is configured once, then asked for a snapshot of its items. It is
/// also the only party that knows how to launch, or judge the launchability of,
/// the items it produced.
pub trait Provider: Send + Sync {
    /// Stable identifier, also the key of the provider's configuration section.
    fn name(&self) -> &'static str;

    /// One-time setup. Missing keys fall back to defaults; this never fails.
    fn configure(&mut self, own: &Map<String, Value>, config: &Config);

    /// Produces the current items. Unreadable entries are skipped, a missing
    /// source yields nothing.
    fn provide(&self) -> Vec<Item>;

    /// Starts the item in the background and returns without waiting for it.
    fn launch(&self, item: &Item) -> Result<(), LaunchError>;

    /// Cheap check, called for every search result.
    fn launchable(&self, item: &Item) -> bool;
}

/// The providers shipped with the launcher, in registration order.
pub fn builtin() -> Vec<Box<dyn Provider>> {
    vec![
        Box::new(directory::DirectoryProvider::new()),
        Box::new(application::ApplicationProvider::new()),
    ]
}

/// Hands every provider its own section of `config`.
pub fn configure_all(providers: &mut [Box<dyn Provider>], config: &Config) {
    for provider in providers.iter_mut() {
        let own = config.section(provider.name());
        provider.configure(&own, config);
    }
}

/// Reads typed options from a provider section, falling back to defaults on type errors.
pub(crate) fn options<T>(provider: &str, own: &Map<String, Value>) -> T
where
    T: DeserializeOwned + Default,
{
    match serde_json::from_value(Value::Object(own.clone())) {
        Ok(options) => options,
        Err(e) => {
            warn!("{}: ignoring invalid configuration: {}", provider, e);
            T::default()
        }
    }
}
