//! Partitioning of a class's methods into bounded request batches.

use std::collections::BTreeSet;

/// Lazily yields method batches for one class.
///
/// Methods are sorted once, so the same input always produces the same
/// batches. Cloning the iterator restarts it from its current position;
/// calling [`plan_batches`] again restarts it from the beginning.
#[derive(Debug, Clone)]
pub struct MethodBatches {
    methods: Vec<String>,
    chunk: usize,
    cursor: usize,
    emitted_single: bool,
}

impl Iterator for MethodBatches {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Self::Item> {
        // A small (or empty) class is sent as a single request.
        if self.chunk == 0 {
            if self.emitted_single {
                return None;
            }
            self.emitted_single = true;
            return Some(self.methods.clone());
        }
        if self.cursor >= self.methods.len() {
            return None;
        }
        let end = (self.cursor + self.chunk).min(self.methods.len());
        let batch = self.methods[self.cursor..end].to_vec();
        self.cursor = end;
        Some(batch)
    }
}

/// Plan batches for `methods`.
///
/// At or below `small_class_threshold` methods the whole set is one batch;
/// above it, sorted consecutive slices of `batch_size` (minimum 1) are
/// produced, the last possibly shorter.
pub fn plan_batches(
    methods: &BTreeSet<String>,
    batch_size: usize,
    small_class_threshold: usize,
) -> MethodBatches {
    let chunk = if methods.len() <= small_class_threshold {
        0
    } else {
        batch_size.max(1)
    };
    MethodBatches {
        methods: methods.iter().cloned().collect(),
        chunk,
        cursor: 0,
        emitted_single: false,
    }
}
