//! Two-phase class import.
//!
//! [`ClassGraphBuilder`] accumulates raw records (pass 1 input) and
//! [`ClassGraphBuilder::resolve`] is the explicit barrier behind which all
//! cross-class resolution happens (pass 2). Forward references need no
//! special handling: by the time resolution starts, every parsed class has
//! a shell, and anything still unknown becomes a permanent stub.

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::parser::{parse_class, ParseError};
use crate::raw::RawClassRecord;
use crate::resolver;
use crate::universe::{ClassId, ClassUniverse};

/// A fatal import failure.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Every given input failed to parse.
    #[error("no class file could be imported ({failed} input(s) failed)")]
    NothingImported {
        /// Number of inputs that failed.
        failed: usize,
    },
    /// A parse failure surfaced immediately because fail-fast was requested.
    #[error("failed to parse {identifier}")]
    FailFast {
        /// Diagnostic identifier of the failing input.
        identifier: String,
        /// The underlying parse error.
        #[source]
        source: ParseError,
    },
}

/// A non-fatal condition observed during import.
#[derive(Debug, Clone, Error)]
pub enum ImportWarning {
    /// Two inputs declared the same class; the first one was kept.
    #[error("duplicate class {name}, keeping the first occurrence")]
    DuplicateClass {
        /// Fully qualified class name.
        name: String,
        /// Identifier of the dropped input, when known.
        identifier: Option<String>,
    },
    /// A member reference had no exact signature match in the resolved
    /// target; a best-effort match was recorded instead.
    #[error("{origin}: no exact match for {target}.{member}{descriptor}")]
    AmbiguousMember {
        /// Class the reference originates from.
        origin: String,
        /// Referenced owner class.
        target: String,
        /// Referenced member name.
        member: String,
        /// Referenced descriptor.
        descriptor: String,
    },
}

/// An input skipped because its bytes did not parse.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    /// Diagnostic identifier of the input.
    pub identifier: String,
    /// Why the input was rejected.
    pub error: ParseError,
}

/// Everything the import wants to tell the caller besides the universe.
#[derive(Debug, Default, Clone)]
pub struct ImportReport {
    /// Inputs skipped for parse errors.
    pub skipped: Vec<SkippedFile>,
    /// Non-fatal warnings in detection order.
    pub warnings: Vec<ImportWarning>,
    /// Names of classes that were referenced but never parsed.
    pub stub_names: Vec<String>,
}

/// The result of a completed import: a frozen universe plus its report.
#[derive(Debug)]
pub struct ImportOutcome {
    /// The resolved, frozen class graph.
    pub universe: ClassUniverse,
    /// Skips and warnings accumulated across both passes.
    pub report: ImportReport,
}

/// Accumulates class records and resolves them into a [`ClassUniverse`].
#[derive(Debug, Default)]
pub struct ClassGraphBuilder {
    records: Vec<(Option<String>, RawClassRecord)>,
    skipped: Vec<SkippedFile>,
    fail_fast: bool,
    inputs_seen: usize,
}

impl ClassGraphBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next parse failure abort the import instead of skipping
    /// the file.
    #[must_use]
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Queues an already-parsed record.
    pub fn add_record(&mut self, record: RawClassRecord) {
        self.inputs_seen += 1;
        self.records.push((None, record));
    }

    /// Parses one class-file buffer and queues the result.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::FailFast`] when the buffer is malformed and
    /// fail-fast was requested; otherwise malformed buffers are recorded as
    /// skipped and the import continues.
    pub fn add_source(&mut self, identifier: &str, bytes: &[u8]) -> Result<(), ImportError> {
        self.inputs_seen += 1;
        match parse_class(bytes) {
            Ok(record) => {
                debug!(identifier, class = %record.name, "parsed class file");
                self.records.push((Some(identifier.to_owned()), record));
                Ok(())
            }
            Err(error) => self.record_failure(identifier.to_owned(), error),
        }
    }

    /// Parses many `(identifier, bytes)` pairs in parallel and queues the
    /// results in input order.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::FailFast`] for the first malformed buffer in
    /// input order when fail-fast was requested.
    pub fn add_sources(
        &mut self,
        sources: Vec<(String, Vec<u8>)>,
    ) -> Result<(), ImportError> {
        let parsed: Vec<(String, Result<RawClassRecord, ParseError>)> = sources
            .into_par_iter()
            .map(|(identifier, bytes)| {
                let result = parse_class(&bytes);
                (identifier, result)
            })
            .collect();
        for (identifier, result) in parsed {
            self.inputs_seen += 1;
            match result {
                Ok(record) => {
                    debug!(identifier = %identifier, class = %record.name, "parsed class file");
                    self.records.push((Some(identifier), record));
                }
                Err(error) => self.record_failure(identifier, error)?,
            }
        }
        Ok(())
    }

    fn record_failure(
        &mut self,
        identifier: String,
        error: ParseError,
    ) -> Result<(), ImportError> {
        if self.fail_fast {
            return Err(ImportError::FailFast { identifier, source: error });
        }
        warn!(identifier = %identifier, %error, "skipping malformed class file");
        self.skipped.push(SkippedFile { identifier, error });
        Ok(())
    }

    /// Resolves everything queued so far into a frozen universe.
    ///
    /// This is the barrier between collection and resolution: pass 1
    /// inserts one shell per class name in deterministic (sorted-by-name)
    /// order, pass 2 links hierarchies and members for every shell and then
    /// resolves dependency edges. Nothing mutates the universe afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::NothingImported`] when at least one input was
    /// given and every single one failed to parse.
    pub fn resolve(mut self) -> Result<ImportOutcome, ImportError> {
        if self.records.is_empty() && self.inputs_seen > 0 {
            return Err(ImportError::NothingImported { failed: self.skipped.len() });
        }

        let mut warnings = Vec::new();
        let mut universe = ClassUniverse::default();

        // Stable sort keeps earlier inputs first among duplicate names.
        self.records.sort_by(|(_, a), (_, b)| a.name.cmp(&b.name));

        // Pass 1: shells.
        let mut shells: Vec<(ClassId, RawClassRecord)> = Vec::with_capacity(self.records.len());
        for (identifier, record) in self.records {
            let name = record.name.clone();
            match universe.insert_shell(record) {
                Ok(id) => {
                    let record = universe
                        .take_record(id)
                        .unwrap_or_else(|| panic!("fresh shell always has a record"));
                    shells.push((id, record));
                }
                Err(_) => {
                    warn!(class = %name, "duplicate class definition");
                    warnings.push(ImportWarning::DuplicateClass { name, identifier });
                }
            }
        }

        // Pass 2a: hierarchy and members for every class before any member
        // lookup happens.
        for (id, record) in &shells {
            let resolved = resolver::build_structure(&mut universe, *id, record);
            universe.promote(*id, resolved);
        }

        // Pass 2b: dependency edges.
        for (id, record) in &shells {
            resolver::link_dependencies(&mut universe, *id, record, &mut warnings);
        }

        let stub_names: Vec<String> = universe
            .classes()
            .filter(|(_, node)| node.is_stub())
            .map(|(_, node)| node.name.clone())
            .collect();

        let stats = universe.stats();
        info!(
            classes = stats.classes,
            stubs = stats.stubs,
            dependencies = stats.dependencies,
            skipped = self.skipped.len(),
            "import resolved"
        );

        Ok(ImportOutcome {
            universe,
            report: ImportReport { skipped: self.skipped, warnings, stub_names },
        })
    }
}
