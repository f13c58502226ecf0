//! Ordered, name-unique descriptor lists bound to one input collection.

use std::collections::HashSet;

use hc_core::{Error, Result};

use crate::descriptor::HistogramDescriptor;

/// The histograms handed to one analyzer, read from one `src` collection.
///
/// Histogram names are unique within a list; order is kept as inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorList {
    label: String,
    src: String,
    histograms: Vec<HistogramDescriptor>,
    names: HashSet<String>,
}

impl DescriptorList {
    /// Empty list for the analyzer `label` reading collection `src`.
    pub fn new(label: impl Into<String>, src: impl Into<String>) -> Self {
        Self { label: label.into(), src: src.into(), histograms: Vec::new(), names: HashSet::new() }
    }

    /// Build a list from descriptors, failing on the first duplicate name.
    pub fn from_descriptors(
        label: impl Into<String>,
        src: impl Into<String>,
        descriptors: impl IntoIterator<Item = HistogramDescriptor>,
    ) -> Result<Self> {
        let mut list = Self::new(label, src);
        for d in descriptors {
            list.push(d)?;
        }
        Ok(list)
    }

    /// Append a descriptor.
    pub fn push(&mut self, descriptor: HistogramDescriptor) -> Result<()> {
        if !self.names.insert(descriptor.name().to_string()) {
            return Err(Error::DuplicateName {
                list: self.label.clone(),
                name: descriptor.name().to_string(),
            });
        }
        self.histograms.push(descriptor);
        Ok(())
    }

    /// Analyzer label this list belongs to.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Input collection.
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Descriptor by histogram name.
    pub fn get(&self, name: &str) -> Option<&HistogramDescriptor> {
        self.histograms.iter().find(|d| d.name() == name)
    }

    /// Histogram names in list order.
    pub fn names(&self) -> Vec<&str> {
        self.histograms.iter().map(|d| d.name()).collect()
    }

    /// Descriptors in list order.
    pub fn iter(&self) -> std::slice::Iter<'_, HistogramDescriptor> {
        self.histograms.iter()
    }

    /// Descriptors as a slice.
    pub fn as_slice(&self) -> &[HistogramDescriptor] {
        &self.histograms
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    /// `true` if the list holds no descriptors.
    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }
}

impl<'a> IntoIterator for &'a DescriptorList {
    type Item = &'a HistogramDescriptor;
    type IntoIter = std::slice::Iter<'a, HistogramDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.histograms.iter()
    }
}
