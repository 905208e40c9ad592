//! Per-category statistical reports rendered as PDF documents.
//!
//! Subject records are aggregated into labelled percentage distributions,
//! laid out as pie and bar charts with a localized narrative, and rendered
//! either as single versioned documents or as a zip archive of categories.

pub mod aggregate;
pub mod archive;
pub mod color;
pub mod config;
pub mod document;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod geometry;
pub mod model;
pub mod pipeline;
pub mod record;
pub mod registry;
pub mod renderer;
pub mod richtext;
pub mod services;
pub mod source;
pub mod store;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use aggregate::{aggregate, Distribution, DistributionEntry};
pub use archive::{ArchiveOrchestrator, ArchiveParams, ArchiveRequest};
pub use config::ReportConfig;
pub use document::ReportDocument;
pub use error::{ReportError, Result};
pub use pipeline::{Collaborators, Delivery, ReportService, SingleReport, SingleReportOptions};
pub use record::{CategorySelector, ChartType, SubjectRecord};
pub use registry::{ChartArtifact, ChartRegistry, ChartStatus};
pub use renderer::GenpdfRenderer;
