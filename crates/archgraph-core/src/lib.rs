//! # archgraph-core
//!
//! Core library for building and checking JVM class dependency graphs.
//!
//! This crate parses compiled class files into a resolved class graph and
//! evaluates architectural rules over it. It includes:
//!
//! - [`parse_class`] for decoding a single class-file buffer
//! - [`ClassGraphBuilder`] for two-phase import into a [`ClassUniverse`]
//! - [`SlicePartition`] and [`SliceGraph`] for slice cycle detection
//! - [`Config`] for `archgraph.toml` rule configuration
//!
//! ## Example
//!
//! ```ignore
//! use archgraph_core::{ClassGraphBuilder, SliceGraph, SlicePartition, SlicePattern};
//!
//! let mut builder = ClassGraphBuilder::new();
//! builder.add_source("Foo.class", &bytes)?;
//! let outcome = builder.resolve()?;
//!
//! let pattern = SlicePattern::new(r"com\.example\.([^.]+)\..*")?;
//! let partition = SlicePartition::partition(&outcome.universe, &pattern);
//! let graph = SliceGraph::build(&outcome.universe, &partition, 20);
//! for cycle in graph.find_cycles() {
//!     println!("{}", cycle.describe());
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod importer;
pub mod parser;
pub mod raw;
mod resolver;
pub mod slices;
pub mod universe;

pub use config::{Config, ConfigError, ImportConfig, Severity, SliceRuleConfig};
pub use importer::{
    ClassGraphBuilder, ImportError, ImportOutcome, ImportReport, ImportWarning, SkippedFile,
};
pub use parser::{parse_class, ParseError};
pub use slices::{
    CycleEdge, Evidence, Slice, SliceCycle, SliceError, SliceGraph, SliceKey, SlicePartition,
    SlicePattern,
};
pub use universe::{
    ClassId, ClassNode, ClassUniverse, Dependency, DependencyKind, DependencyOrigin, MemberId,
    MemberKind, MemberNode, Resolution, ResolvedClass, UniverseStats,
};
