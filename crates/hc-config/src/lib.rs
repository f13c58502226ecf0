//! # hc-config
//!
//! Histogram descriptor templates and job configuration for histogram-filling
//! analyzers.
//!
//! Descriptors are immutable values. New ones are derived from templates by
//! overriding a subset of fields, and every descriptor is validated before it
//! can be placed in a [`DescriptorList`]:
//!
//! ```
//! use hc_config::{DescriptorFields, HistogramDescriptor, Overrides};
//!
//! let pt = HistogramDescriptor::define(DescriptorFields {
//!     name: "Pt".into(),
//!     description: "p_{T}".into(),
//!     plotquantity: "pt".into(),
//!     min: 0.0,
//!     max: 200.0,
//!     nbins: 100,
//!     lazy_parsing: true,
//! })
//! .unwrap();
//!
//! let mu_jet_pt = pt
//!     .clone_with(
//!         &Overrides::new()
//!             .set("name", "MuJetPt")
//!             .set("plotquantity", "daughter(0).userFloat('jetPt')"),
//!     )
//!     .unwrap();
//! assert_eq!(mu_jet_pt.nbins(), 100);
//! assert_eq!(pt.name(), "Pt");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod descriptor;
pub mod file;
pub mod job;
pub mod list;
pub mod options;
pub mod presets;
pub mod store;

pub use descriptor::{DescriptorFields, Field, FieldValue, HistogramDescriptor, Overrides};
pub use file::JobFile;
pub use job::{AnalyzerConfig, ExecutionPath, JobBuilder, JobConfig, OutputService, SourceConfig};
pub use list::DescriptorList;
pub use options::JobOptions;
pub use store::TemplateStore;

pub use hc_core::{Error, Result};
