//! Flat ordered-sequence comparison.

use std::fmt;

use tarry_types::{AssertionFailure, Failure, FailureReporter, SourceLocation};
use tarry_utils::format_line_diff;

/// Compare two sequences element-wise.
///
/// A length difference wins over element differences. For equal lengths the
/// first differing index is returned with a line diff of the `Debug` forms.
#[must_use]
pub fn compare_arrays<T>(first: &[T], second: &[T]) -> Option<AssertionFailure>
where
    T: PartialEq + fmt::Debug,
{
    if first.len() != second.len() {
        return Some(AssertionFailure::CountMismatch {
            actual: first.len(),
            expected: second.len(),
        });
    }

    let index = first.iter().zip(second).position(|(a, b)| a != b)?;
    Some(AssertionFailure::ArraysDiffer {
        index,
        diff: format_line_diff(&render(second), &render(first)),
    })
}

fn render<T: fmt::Debug>(items: &[T]) -> String {
    items.iter().map(|item| format!("{item:?}\n")).collect()
}

/// Report a single failure if the sequences differ. Returns whether they matched.
#[track_caller]
pub fn assert_equal_arrays<R, T>(reporter: &R, first: &[T], second: &[T]) -> bool
where
    R: FailureReporter + ?Sized,
    T: PartialEq + fmt::Debug,
{
    let location = SourceLocation::caller();
    match compare_arrays(first, second) {
        Some(failure) => {
            reporter.report(Failure::new(failure, location));
            false
        }
        None => true,
    }
}
