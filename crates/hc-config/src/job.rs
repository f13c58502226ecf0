//! Job assembly: source, output service, analyzers and the execution path.
//!
//! [`JobBuilder`] collects the pieces; [`JobBuilder::build`] validates them
//! and returns an immutable [`JobConfig`] ready to be rendered for the host
//! framework.

use std::collections::HashSet;

use hc_core::{Error, Result};
use serde::{Serialize, Serializer};

use crate::descriptor::HistogramDescriptor;
use crate::list::DescriptorList;
use crate::options::JobOptions;

/// Analyzer plugin used when none is given.
pub const DEFAULT_PLUGIN: &str = "CandViewHistoAnalyzer";
/// Execution path name used when none is given.
pub const DEFAULT_PATH_NAME: &str = "p";

const SOURCE_TYPE: &str = "PoolSource";
const SERVICE_TYPE: &str = "TFileService";

/// Event source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceConfig {
    /// Source plugin type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Input file names.
    #[serde(rename = "fileNames")]
    pub file_names: Vec<String>,
    /// Events skipped at the start.
    #[serde(rename = "skipEvents")]
    pub skip_events: u32,
}

/// Output file service owned by the host framework.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputService {
    /// Service type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Output file name.
    #[serde(rename = "fileName")]
    pub file_name: String,
}

/// One histogram-filling analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    plugin: String,
    histograms: DescriptorList,
}

impl AnalyzerConfig {
    /// Analyzer using [`DEFAULT_PLUGIN`]; its label and `src` come from the list.
    pub fn new(histograms: DescriptorList) -> Self {
        Self { plugin: DEFAULT_PLUGIN.to_string(), histograms }
    }

    /// Use a different analyzer plugin.
    pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = plugin.into();
        self
    }

    /// Analyzer label.
    pub fn label(&self) -> &str {
        self.histograms.label()
    }

    /// Plugin type.
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Input collection.
    pub fn src(&self) -> &str {
        self.histograms.src()
    }

    /// Histogram descriptors.
    pub fn histograms(&self) -> &DescriptorList {
        &self.histograms
    }
}

impl Serialize for AnalyzerConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            label: &'a str,
            plugin: &'a str,
            src: &'a str,
            histograms: &'a [HistogramDescriptor],
        }

        Repr {
            label: self.label(),
            plugin: &self.plugin,
            src: self.src(),
            histograms: self.histograms.as_slice(),
        }
        .serialize(serializer)
    }
}

/// Linear sequence of analyzer labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionPath {
    /// Path name.
    pub name: String,
    /// Analyzer labels in execution order.
    pub sequence: Vec<String>,
}

impl ExecutionPath {
    /// Path from explicit labels.
    pub fn new<S: Into<String>>(name: impl Into<String>, sequence: impl IntoIterator<Item = S>) -> Self {
        Self { name: name.into(), sequence: sequence.into_iter().map(Into::into).collect() }
    }

    /// Path from a `mt*et` style product expression.
    pub fn parse(name: impl Into<String>, expr: &str) -> Result<Self> {
        let sequence: Vec<String> = expr.split('*').map(|s| s.trim().to_string()).collect();
        if sequence.iter().any(String::is_empty) {
            return Err(Error::Validation(format!("malformed path expression '{expr}'")));
        }
        Ok(Self { name: name.into(), sequence })
    }
}

/// A validated processing job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobConfig {
    /// Process name.
    pub process: String,
    /// Event source.
    pub source: SourceConfig,
    /// Maximum number of events (`-1` = all).
    #[serde(rename = "maxEvents")]
    pub max_events: i64,
    /// Output service.
    pub service: OutputService,
    /// Analyzers in declaration order.
    pub analyzers: Vec<AnalyzerConfig>,
    /// Execution path.
    pub path: ExecutionPath,
}

impl JobConfig {
    /// Analyzer by label.
    pub fn analyzer(&self, label: &str) -> Option<&AnalyzerConfig> {
        self.analyzers.iter().find(|a| a.label() == label)
    }

    /// Total number of histograms across all analyzers.
    pub fn n_histograms(&self) -> usize {
        self.analyzers.iter().map(|a| a.histograms().len()).sum()
    }

    /// Pretty JSON rendering for the host framework.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for [`JobConfig`].
///
/// # Example
///
/// ```
/// use hc_config::{DescriptorFields, DescriptorList, HistogramDescriptor, JobBuilder, AnalyzerConfig};
///
/// let pt = HistogramDescriptor::define(DescriptorFields {
///     name: "Pt".into(),
///     description: "p_{T}".into(),
///     plotquantity: "pt".into(),
///     min: 0.0,
///     max: 200.0,
///     nbins: 100,
///     lazy_parsing: true,
/// })
/// .unwrap();
///
/// let job = JobBuilder::new("TUPLETEST")
///     .input_files(["file:output.root"])
///     .output_file("plots.root")
///     .add_analyzer(AnalyzerConfig::new(
///         DescriptorList::from_descriptors("mt", "finalStateMuTau", [pt]).unwrap(),
///     ))
///     .build()
///     .unwrap();
/// assert_eq!(job.path.sequence, vec!["mt"]);
/// ```
#[derive(Debug, Clone)]
pub struct JobBuilder {
    process: String,
    input_files: Vec<String>,
    skip_events: u32,
    max_events: i64,
    output_file: String,
    analyzers: Vec<AnalyzerConfig>,
    path: Option<ExecutionPath>,
}

impl JobBuilder {
    /// New builder for process `process`.
    pub fn new(process: impl Into<String>) -> Self {
        Self {
            process: process.into(),
            input_files: Vec::new(),
            skip_events: 0,
            max_events: -1,
            output_file: String::new(),
            analyzers: Vec::new(),
            path: None,
        }
    }

    /// Take input files, output file and event counts from parsed options.
    pub fn options(mut self, options: &JobOptions) -> Self {
        self.input_files = options.input_files.clone();
        self.output_file = options.output_file.clone();
        self.max_events = options.max_events;
        self.skip_events = options.skip_events;
        self
    }

    /// Set the input files.
    pub fn input_files<S: Into<String>>(mut self, files: impl IntoIterator<Item = S>) -> Self {
        self.input_files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Set the number of skipped events.
    pub fn skip_events(mut self, n: u32) -> Self {
        self.skip_events = n;
        self
    }

    /// Set the maximum number of events (`-1` = all).
    pub fn max_events(mut self, n: i64) -> Self {
        self.max_events = n;
        self
    }

    /// Set the output file.
    pub fn output_file(mut self, path: impl Into<String>) -> Self {
        self.output_file = path.into();
        self
    }

    /// Add an analyzer.
    pub fn add_analyzer(mut self, analyzer: AnalyzerConfig) -> Self {
        self.analyzers.push(analyzer);
        self
    }

    /// Set the execution path (defaults to every analyzer in declaration order).
    pub fn path(mut self, path: ExecutionPath) -> Self {
        self.path = Some(path);
        self
    }

    /// Validate and produce the job.
    pub fn build(self) -> Result<JobConfig> {
        if self.process.trim().is_empty() {
            return Err(Error::Validation("process name must not be empty".into()));
        }
        if self.input_files.is_empty() {
            return Err(Error::Validation("no input files".into()));
        }
        if self.input_files.iter().any(|f| f.trim().is_empty()) {
            return Err(Error::Validation("empty input file name".into()));
        }
        if self.output_file.trim().is_empty() {
            return Err(Error::Validation("output file must not be empty".into()));
        }
        if self.max_events < -1 {
            return Err(Error::Validation(format!(
                "maxEvents must be -1 or non-negative, got {}",
                self.max_events
            )));
        }

        let mut labels = HashSet::new();
        for a in &self.analyzers {
            if a.label().trim().is_empty() {
                return Err(Error::Validation("analyzer label must not be empty".into()));
            }
            if a.src().trim().is_empty() {
                return Err(Error::Validation(format!("analyzer '{}' has no src", a.label())));
            }
            if !labels.insert(a.label()) {
                return Err(Error::DuplicateAnalyzer(a.label().to_string()));
            }
            if a.plugin().trim().is_empty() {
                return Err(Error::Validation(format!("analyzer '{}' has no plugin", a.label())));
            }
        }

        let path = match self.path {
            Some(p) => p,
            None => ExecutionPath::new(
                DEFAULT_PATH_NAME,
                self.analyzers.iter().map(|a| a.label().to_string()),
            ),
        };
        if path.name.trim().is_empty() {
            return Err(Error::Validation("path name must not be empty".into()));
        }
        if path.sequence.is_empty() {
            return Err(Error::Validation(format!("path '{}' schedules nothing", path.name)));
        }
        let mut scheduled = HashSet::new();
        for label in &path.sequence {
            if !labels.contains(label.as_str()) {
                return Err(Error::UnknownAnalyzer(label.clone()));
            }
            if !scheduled.insert(label.as_str()) {
                return Err(Error::DuplicateAnalyzer(label.clone()));
            }
        }
        for a in &self.analyzers {
            if !scheduled.contains(a.label()) {
                tracing::warn!(label = a.label(), path = %path.name, "analyzer is not on the path");
            }
        }

        let job = JobConfig {
            process: self.process,
            source: SourceConfig {
                kind: SOURCE_TYPE.to_string(),
                file_names: self.input_files,
                skip_events: self.skip_events,
            },
            max_events: self.max_events,
            service: OutputService { kind: SERVICE_TYPE.to_string(), file_name: self.output_file },
            analyzers: self.analyzers,
            path,
        };
        tracing::info!(
            process = %job.process,
            n_analyzers = job.analyzers.len(),
            n_histograms = job.n_histograms(),
            "job configured"
        );
        Ok(job)
    }
}
