//! Job files (YAML, or JSON since YAML is a superset).
//!
//! ```yaml
//! process: TUPLETEST
//! source: { files: ["file:output.root"] }
//! output_file: plots.root
//! templates:
//!   pt: { name: Pt, description: "p_{T}", plotquantity: pt,
//!         min: 0, max: 200, nbins: 100, lazyParsing: true }
//!   muon_jetpt: { clone: pt, name: MuJetPt,
//!                 plotquantity: "daughter(0).userFloat('jetPt')" }
//! analyzers:
//!   - { label: mt, src: finalStateMuTau, histograms: [pt, muon_jetpt] }
//! path: "mt"
//! ```
//!
//! A template with a `clone` key is derived from that template and its other
//! keys are overrides; a template without one must define every field.

use std::collections::BTreeMap;
use std::path::Path;

use hc_core::{Error, Result};
use serde::Deserialize;

use crate::descriptor::{DescriptorFields, FieldValue, Overrides};
use crate::job::{AnalyzerConfig, DEFAULT_PATH_NAME, ExecutionPath, JobBuilder, JobConfig};
use crate::options::JobOptions;
use crate::store::TemplateStore;

/// Parsed job file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobFile {
    /// Process name.
    pub process: String,
    /// Event source defaults.
    #[serde(default)]
    pub source: SourceSection,
    /// Maximum number of events (`-1` = all).
    #[serde(default = "default_max_events")]
    pub max_events: i64,
    /// Output file default.
    #[serde(default)]
    pub output_file: Option<String>,
    /// Extra integer options and their defaults.
    #[serde(default)]
    pub options: BTreeMap<String, i64>,
    /// Descriptor templates by key.
    pub templates: BTreeMap<String, TemplateEntry>,
    /// Analyzers in declaration order.
    pub analyzers: Vec<AnalyzerSection>,
    /// Execution path; every analyzer in order when absent.
    #[serde(default)]
    pub path: Option<PathSection>,
}

fn default_max_events() -> i64 {
    -1
}

/// `source:` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSection {
    /// Input files.
    #[serde(default)]
    pub files: Vec<String>,
    /// Skipped events.
    #[serde(default)]
    pub skip_events: u32,
}

/// One entry under `templates:`.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateEntry {
    /// Base template key, for derived entries.
    #[serde(default)]
    pub clone: Option<String>,
    /// Field values (overrides when `clone` is set).
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

/// One entry under `analyzers:`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerSection {
    /// Analyzer label.
    pub label: String,
    /// Plugin type; defaults to [`crate::job::DEFAULT_PLUGIN`].
    #[serde(default)]
    pub plugin: Option<String>,
    /// Input collection.
    pub src: String,
    /// Template keys, in histogram order.
    pub histograms: Vec<String>,
}

/// `path:` either as `"mt*et"` or as `{ name, sequence }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PathSection {
    /// Product expression, path named [`DEFAULT_PATH_NAME`].
    Expr(String),
    /// Explicit name and sequence.
    Named {
        /// Path name.
        name: String,
        /// Analyzer labels.
        sequence: Vec<String>,
    },
}

impl JobFile {
    /// Read and parse a job file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "loading job file");
        let bytes = std::fs::read(path)?;
        Ok(serde_yaml_ng::from_slice(&bytes)?)
    }

    /// Parse a job file from text.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Option defaults declared in the file.
    pub fn default_options(&self) -> JobOptions {
        let mut options = self
            .options
            .iter()
            .fold(JobOptions::new(), |o, (name, &default)| o.register_int(name.clone(), default));
        options.input_files = self.source.files.clone();
        options.output_file = self.output_file.clone().unwrap_or_default();
        options.max_events = self.max_events;
        options.skip_events = self.source.skip_events;
        options
    }

    /// Resolve every template, following `clone` references in any order.
    pub fn resolve_templates(&self) -> Result<TemplateStore> {
        let mut store = TemplateStore::new();
        for key in self.templates.keys() {
            let mut stack = Vec::new();
            self.resolve(key, &mut store, &mut stack)?;
        }
        Ok(store)
    }

    fn resolve(&self, key: &str, store: &mut TemplateStore, stack: &mut Vec<String>) -> Result<()> {
        if store.contains(key) {
            return Ok(());
        }
        if stack.iter().any(|k| k == key) {
            stack.push(key.to_string());
            return Err(Error::TemplateCycle(stack.join(" -> ")));
        }
        let entry = self.templates.get(key).ok_or_else(|| Error::UnknownTemplate(key.to_string()))?;

        stack.push(key.to_string());
        match &entry.clone {
            Some(base) => {
                self.resolve(base, store, stack)?;
                let overrides: Overrides = entry.fields.clone().into_iter().collect();
                store.derive(key, base, &overrides)?;
            }
            None => {
                let fields = DescriptorFields::from_map(key, &entry.fields)?;
                store.define(key, fields)?;
            }
        }
        stack.pop();
        Ok(())
    }

    /// Resolve templates and assemble the job using `options`.
    pub fn build(&self, options: &JobOptions) -> Result<JobConfig> {
        let store = self.resolve_templates()?;

        let mut builder = JobBuilder::new(self.process.clone()).options(options);
        for section in &self.analyzers {
            let list = store.list(
                section.label.clone(),
                section.src.clone(),
                section.histograms.as_slice(),
            )?;
            let mut analyzer = AnalyzerConfig::new(list);
            if let Some(plugin) = &section.plugin {
                analyzer = analyzer.with_plugin(plugin.clone());
            }
            builder = builder.add_analyzer(analyzer);
        }

        match &self.path {
            Some(PathSection::Expr(expr)) => {
                builder = builder.path(ExecutionPath::parse(DEFAULT_PATH_NAME, expr)?);
            }
            Some(PathSection::Named { name, sequence }) => {
                builder = builder.path(ExecutionPath::new(name.clone(), sequence.iter().cloned()));
            }
            None => {}
        }

        builder.build()
    }
}
