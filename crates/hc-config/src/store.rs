//! Named descriptor templates.

use std::collections::HashMap;

use hc_core::{Error, Result};

use crate::descriptor::{DescriptorFields, HistogramDescriptor, Overrides};
use crate::list::DescriptorList;

/// Registry of named descriptor templates.
///
/// Keys are configuration-level identifiers (`muon_jetpt`), independent of
/// the histogram `name` each descriptor carries. Stored templates are never
/// modified; deriving from one always produces a new value.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    entries: Vec<(String, HistogramDescriptor)>,
    index: HashMap<String, usize>,
}

impl TemplateStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already constructed descriptor under `key`.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        descriptor: HistogramDescriptor,
    ) -> Result<&HistogramDescriptor> {
        let key = key.into();
        if self.index.contains_key(&key) {
            return Err(Error::DuplicateTemplate(key));
        }
        let idx = self.entries.len();
        self.index.insert(key.clone(), idx);
        self.entries.push((key, descriptor));
        Ok(&self.entries[idx].1)
    }

    /// Define a base template from explicit values.
    pub fn define(
        &mut self,
        key: impl Into<String>,
        fields: DescriptorFields,
    ) -> Result<&HistogramDescriptor> {
        let descriptor = HistogramDescriptor::define(fields)?;
        self.insert(key, descriptor)
    }

    /// Derive `key` from the template `base` and register it.
    pub fn derive(
        &mut self,
        key: impl Into<String>,
        base: &str,
        overrides: &Overrides,
    ) -> Result<&HistogramDescriptor> {
        let descriptor = self.instantiate(base, overrides)?;
        self.insert(key, descriptor)
    }

    /// Derive a descriptor from `base` without registering it.
    pub fn instantiate(&self, base: &str, overrides: &Overrides) -> Result<HistogramDescriptor> {
        self.get(base)?.clone_with(overrides)
    }

    /// Template by key.
    pub fn get(&self, key: &str) -> Result<&HistogramDescriptor> {
        self.index
            .get(key)
            .map(|&i| &self.entries[i].1)
            .ok_or_else(|| Error::UnknownTemplate(key.to_string()))
    }

    /// `true` if `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Collect templates into a descriptor list for analyzer `label`.
    pub fn list<S: AsRef<str>>(
        &self,
        label: impl Into<String>,
        src: impl Into<String>,
        keys: &[S],
    ) -> Result<DescriptorList> {
        let mut list = DescriptorList::new(label, src);
        for key in keys {
            list.push(self.get(key.as_ref())?.clone())?;
        }
        Ok(list)
    }

    /// Template keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// `(key, descriptor)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HistogramDescriptor)> {
        self.entries.iter().map(|(k, d)| (k.as_str(), d))
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if no template is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_muons() -> DescriptorFields {
        DescriptorFields {
            name: "hasExtMuons".into(),
            description: "Has Ext Muons".into(),
            plotquantity: "hasOverlaps('extMuons')".into(),
            min: -0.5,
            max: 1.5,
            nbins: 2,
            lazy_parsing: true,
        }
    }

    #[test]
    fn derive_registers_and_keeps_base() {
        let mut store = TemplateStore::new();
        store.define("hasMuons", has_muons()).unwrap();
        store
            .derive(
                "hasTaus",
                "hasMuons",
                &Overrides::new()
                    .set("name", "hasExtTaus")
                    .set("description", "Has Ext Taus")
                    .set("plotquantity", "hasOverlaps('extTaus')"),
            )
            .unwrap();

        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["hasMuons", "hasTaus"]);
        assert_eq!(store.get("hasMuons").unwrap().name(), "hasExtMuons");
        assert_eq!(store.get("hasTaus").unwrap().nbins(), 2);
    }

    #[test]
    fn unknown_and_duplicate_keys() {
        let mut store = TemplateStore::new();
        store.define("hasMuons", has_muons()).unwrap();

        assert!(matches!(store.define("hasMuons", has_muons()), Err(Error::DuplicateTemplate(_))));
        assert!(matches!(
            store.derive("x", "missing", &Overrides::new()),
            Err(Error::UnknownTemplate(ref k)) if k == "missing"
        ));
        assert!(!store.contains("x"));
    }

    #[test]
    fn failed_derive_registers_nothing() {
        let mut store = TemplateStore::new();
        store.define("hasMuons", has_muons()).unwrap();
        let res = store.derive("bad", "hasMuons", &Overrides::new().set("nbins", 0));
        assert!(matches!(res, Err(Error::InvalidValue { .. })));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn list_collects_in_key_order() {
        let mut store = TemplateStore::new();
        store.define("hasMuons", has_muons()).unwrap();
        store.derive("copy", "hasMuons", &Overrides::new().set("name", "copy")).unwrap();

        let list = store.list("mt", "finalStateMuTau", &["copy", "hasMuons"]).unwrap();
        assert_eq!(list.names(), vec!["copy", "hasExtMuons"]);

        assert!(matches!(
            store.list("mt", "src", &["hasMuons", "hasMuons"]),
            Err(Error::DuplicateName { .. })
        ));
    }
}
