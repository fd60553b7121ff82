//! Work splitting for sweeps: chunk boundaries over the configuration space and
//! deterministic sampling of a subset of it.

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Batches are as equal in size as possible; earlier batches take the remainder.
///
/// # Example
/// ```
/// # use draftsim::parallel::batch_ranges;
/// let ranges = batch_ranges(100, 4);
/// assert_eq!(ranges, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
/// ```
pub fn batch_ranges(total: u64, num_batches: u64) -> Vec<(u64, u64)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = num_batches.min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut ranges = Vec::with_capacity(num_batches as usize);
    let mut start = 0;
    for i in 0..num_batches {
        let size = base + u64::from(i < remainder);
        let end = start + size;
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// Ranges of at most `chunk_size` items covering `0..total`.
pub fn chunk_ranges(total: u64, chunk_size: u64) -> Vec<(u64, u64)> {
    if chunk_size == 0 {
        return Vec::new();
    }
    batch_ranges(total, total.div_ceil(chunk_size))
}

/// `k` evenly spaced indices `i * total / k` over `0..total`; `k` is clamped to `total`.
///
/// # Example
/// ```
/// # use draftsim::parallel::evenly_spaced_indices;
/// assert_eq!(evenly_spaced_indices(10, 4), vec![0, 2, 5, 7]);
/// ```
pub fn evenly_spaced_indices(total: u64, k: u64) -> Vec<u64> {
    let k = k.min(total);
    (0..k)
        .map(|i| ((i as u128 * total as u128) / k as u128) as u64)
        .collect()
}
