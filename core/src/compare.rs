//! Structural comparison of nested mappings.
//!
//! Unlike `==`, the comparator never stops at the first problem: every key-set
//! divergence and every leaf divergence is collected in one pass, in key order.
//! A key-set divergence stops descent into that mapping only; its siblings are
//! still compared.

use tarry_types::{AssertionFailure, Failure, FailureReporter, Mapping, Node, SourceLocation};

/// One divergence between two mappings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    path: String,
    failure: AssertionFailure,
}

impl Mismatch {
    fn new(path: &str, failure: AssertionFailure) -> Self {
        Self {
            path: path.to_owned(),
            failure,
        }
    }

    /// Dotted path of the mapping holding the divergence; empty at the root.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn failure(&self) -> &AssertionFailure {
        &self.failure
    }

    #[must_use]
    pub fn into_failure(self, location: SourceLocation) -> Failure {
        Failure::new(self.failure, location).at_path(self.path)
    }
}

/// Collect every divergence between `actual` and `expected`.
#[must_use]
pub fn compare(actual: &Mapping, expected: &Mapping) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    compare_mappings(actual, expected, "", &mut mismatches);
    mismatches
}

fn compare_mappings(actual: &Mapping, expected: &Mapping, path: &str, out: &mut Vec<Mismatch>) {
    let missing: Vec<String> = expected
        .keys()
        .filter(|key| !actual.contains_key(key))
        .map(str::to_owned)
        .collect();
    let extra: Vec<String> = actual
        .keys()
        .filter(|key| !expected.contains_key(key))
        .map(str::to_owned)
        .collect();

    if !missing.is_empty() || !extra.is_empty() {
        out.push(Mismatch::new(
            path,
            AssertionFailure::KeySetMismatch { missing, extra },
        ));
        return;
    }

    for (field, actual_value) in actual {
        if let Some(expected_value) = expected.get(field) {
            compare_values(field, actual_value, expected_value, path, out);
        }
    }
}

fn compare_values(
    field: &str,
    actual: &Node,
    expected: &Node,
    path: &str,
    out: &mut Vec<Mismatch>,
) {
    match (actual, expected) {
        (Node::Mapping(actual), Node::Mapping(expected)) => {
            compare_mappings(actual, expected, &child_path(path, field), out);
        }
        (Node::Text(a), Node::Text(b)) if a == b => {}
        (Node::Integer(a), Node::Integer(b)) if a == b => {}
        (Node::Text(_), Node::Text(_)) | (Node::Integer(_), Node::Integer(_)) => {
            out.push(Mismatch::new(
                path,
                AssertionFailure::FieldMismatch {
                    field: field.to_owned(),
                    actual: actual.clone(),
                    expected: expected.clone(),
                },
            ));
        }
        _ => out.push(Mismatch::new(
            path,
            AssertionFailure::UnsupportedPair {
                field: field.to_owned(),
                actual: actual.clone(),
                expected: expected.clone(),
            },
        )),
    }
}

fn child_path(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_owned()
    } else {
        format!("{path}.{field}")
    }
}

/// Report every divergence between `actual` and `expected`.
///
/// Returns the number of failures reported.
#[track_caller]
pub fn assert_equal_dictionaries<R: FailureReporter + ?Sized>(
    reporter: &R,
    actual: &Mapping,
    expected: &Mapping,
) -> usize {
    let location = SourceLocation::caller();
    let mismatches = compare(actual, expected);
    let count = mismatches.len();
    if count > 0 {
        tracing::debug!(count, %location, "Mappings differ");
    }
    for mismatch in mismatches {
        reporter.report(mismatch.into_failure(location));
    }
    count
}
