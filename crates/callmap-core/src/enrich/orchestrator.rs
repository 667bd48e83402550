//! Documentation generation across all classes with two-tier retry.
//!
//! Tier one runs each class's batch plan under the primary retry policy.
//! Classes that exhaust it are retried with the fallback batch size under the
//! fallback policy; those that fail again are given up. A class contributes
//! documentation only after an attempt covering all of its batches succeeds,
//! and one class's failure never stops the others.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{EnrichmentConfig, RetryPolicy};
use crate::enrich::batch::plan_batches;
use crate::enrich::generator::DocGenerator;
use crate::enrich::prompt::DocRequest;
use crate::enrich::retry::{run_with_retry, RetryOutcome, Sleeper};
use crate::errors::{CallmapError, CallmapResult};
use crate::indexer::inventory::SymbolInventory;
use crate::models::{bare_name, DocumentationMap};
use crate::store::source_table::SourceIndex;

/// Documentation produced by one successful attempt for one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDocumentation {
    pub class_doc: String,
    pub method_docs: DocumentationMap,
}

/// Aggregate documentation for the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentationMaps {
    pub classes: DocumentationMap,
    pub methods: DocumentationMap,
}

impl DocumentationMaps {
    fn merge_class(&mut self, class_key: &str, docs: ClassDocumentation) {
        self.classes.insert(class_key.to_string(), docs.class_doc);
        self.methods.extend(docs.method_docs);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassAttempts {
    pub primary: u32,
    pub fallback: u32,
}

/// Operator-facing summary of generation outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentReport {
    /// Classes that exhausted the primary policy.
    pub failed: BTreeSet<String>,
    /// Classes that also exhausted the fallback policy.
    pub given_up: BTreeSet<String>,
    pub attempts: BTreeMap<String, ClassAttempts>,
}

#[derive(Debug, Clone, Default)]
pub struct EnrichmentResult {
    pub docs: DocumentationMaps,
    pub report: EnrichmentReport,
}

pub struct Orchestrator<'a> {
    generator: &'a dyn DocGenerator,
    sleeper: &'a dyn Sleeper,
    inventory: &'a SymbolInventory,
    sources: &'a SourceIndex,
    config: &'a EnrichmentConfig,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        generator: &'a dyn DocGenerator,
        sleeper: &'a dyn Sleeper,
        inventory: &'a SymbolInventory,
        sources: &'a SourceIndex,
        config: &'a EnrichmentConfig,
    ) -> Self {
        Self {
            generator,
            sleeper,
            inventory,
            sources,
            config,
        }
    }

    /// One attempt over every batch of `class_key`.
    ///
    /// Any error aborts the attempt and discards what earlier batches
    /// produced. The class doc is taken from the first batch that supplies it.
    pub fn document_class(
        &self,
        class_key: &str,
        batch_size: usize,
    ) -> CallmapResult<ClassDocumentation> {
        let empty = BTreeSet::new();
        let methods = self.inventory.methods_of(class_key).unwrap_or(&empty);
        let class_code = self.sources.class_source(bare_name(class_key));

        let mut class_doc: Option<String> = None;
        let mut method_docs = DocumentationMap::new();

        for batch in plan_batches(methods, batch_size, self.config.small_class_threshold) {
            let request = DocRequest::for_batch(class_key, &batch, class_code);
            let reply = self.generator.generate(&request.prompt, &request.schema)?;
            let mut docs = request.schema.validate(&reply)?;

            if let Some(text) = docs.shift_remove(class_key) {
                class_doc.get_or_insert(text);
            }
            method_docs.extend(docs);
        }

        let class_doc = class_doc.ok_or_else(|| {
            CallmapError::SchemaViolation(format!("no documentation for class {class_key}"))
        })?;
        Ok(ClassDocumentation {
            class_doc,
            method_docs,
        })
    }

    fn attempt_class(
        &self,
        class_key: &str,
        batch_size: usize,
        policy: &RetryPolicy,
    ) -> RetryOutcome<ClassDocumentation> {
        run_with_retry(policy, self.sleeper, class_key, |attempt| {
            debug!(class = class_key, attempt, batch_size, "documenting class");
            self.document_class(class_key, batch_size)
        })
    }

    /// Document every class in `classes`, then retry failures one method per
    /// request.
    pub fn run(&self, classes: &BTreeSet<String>) -> EnrichmentResult {
        let started = Instant::now();
        let docs = Mutex::new(DocumentationMaps::default());
        let report = Mutex::new(EnrichmentReport::default());

        let all: Vec<&str> = classes.iter().map(String::as_str).collect();
        self.for_each_class(&all, |class_key| {
            let outcome = self.attempt_class(
                class_key,
                self.config.batch_size,
                &self.config.primary_retry,
            );
            let attempts = outcome.attempts;
            let succeeded = match outcome.value {
                Some(class_docs) => {
                    docs.lock().merge_class(class_key, class_docs);
                    true
                }
                None => false,
            };
            let mut report = report.lock();
            report.attempts.entry(class_key.to_string()).or_default().primary = attempts;
            if !succeeded {
                warn!(class = class_key, attempts, "skipping class after failed attempts");
                report.failed.insert(class_key.to_string());
            }
        });

        let failed: Vec<String> = report.lock().failed.iter().cloned().collect();
        if !failed.is_empty() {
            info!(count = failed.len(), "retrying failed classes one method per request");
        }
        let failed_refs: Vec<&str> = failed.iter().map(String::as_str).collect();
        self.for_each_class(&failed_refs, |class_key| {
            let outcome = self.attempt_class(
                class_key,
                self.config.fallback_batch_size,
                &self.config.fallback_retry,
            );
            let attempts = outcome.attempts;
            let succeeded = match outcome.value {
                Some(class_docs) => {
                    docs.lock().merge_class(class_key, class_docs);
                    true
                }
                None => false,
            };
            let mut report = report.lock();
            report.attempts.entry(class_key.to_string()).or_default().fallback = attempts;
            if !succeeded {
                warn!(class = class_key, attempts, "giving up on class");
                report.given_up.insert(class_key.to_string());
            }
        });

        let result = EnrichmentResult {
            docs: docs.into_inner(),
            report: report.into_inner(),
        };
        info!(
            classes = classes.len(),
            documented = result.docs.classes.len(),
            failed = result.report.failed.len(),
            given_up = result.report.given_up.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "documentation generation finished"
        );
        result
    }

    /// Run `work` for each class, on a bounded pool when `workers > 1`.
    fn for_each_class<F>(&self, classes: &[&str], work: F)
    where
        F: Fn(&str) + Sync,
    {
        let workers = self.config.workers.max(1);
        if workers == 1 || classes.len() < 2 {
            classes.iter().for_each(|c| work(c));
            return;
        }
        match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool.install(|| classes.par_iter().for_each(|c| work(c))),
            Err(e) => {
                warn!(error = %e, "thread pool unavailable, documenting sequentially");
                classes.iter().for_each(|c| work(c));
            }
        }
    }
}
