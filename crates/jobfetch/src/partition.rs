use crate::{Error, Result};
use core::ops::Range;

/// Splits `[0, len)` into exactly `parts` contiguous, non-overlapping
/// sub-ranges whose sizes differ by at most one.
///
/// The first `len % parts` sub-ranges receive one extra element. Ordering is
/// preserved: concatenating the returned ranges yields `0..len`.
///
/// When `parts > len` the trailing sub-ranges are empty. Callers that
/// dispatch work should skip them.
///
/// # Errors
///
/// Returns [`Error::InvalidPartition`] if `parts` is zero.
///
/// # Example
///
/// ```
/// let parts = jobfetch::partition(10, 3).unwrap();
/// assert_eq!(parts, vec![0..4, 4..7, 7..10]);
/// ```
pub fn partition(len: usize, parts: usize) -> Result<Vec<Range<usize>>> {
    if parts == 0 {
        return Err(Error::invalid_partition("part count must be greater than 0"));
    }

    let quo = len / parts;
    let rem = len % parts;
    let bound = |k: usize| k * quo + k.min(rem);

    Ok((0..parts).map(|k| bound(k)..bound(k + 1)).collect())
}
