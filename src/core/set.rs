//! Sorting and set algebra over slices of sorted `u64` keys.
//!
//! These operate on raw VariantKey/RegionKey values, not on the decoded
//! structs, so they stay useful across all the fixed-width key types in this
//! crate. The sort is an explicit 8-pass LSD radix sort (one pass per byte)
//! rather than a comparison sort, since the columnar containers this crate
//! builds need stable ascending order over the full `u64` key space and the
//! input sizes are large enough that the linear-time radix pass earns its
//! keep over `O(n log n)`.

/// Sorts `arr` in ascending order using an 8-pass LSD radix sort.
pub fn sort_uint64_t(arr: &mut [u64]) {
    let mut tmp = vec![0u64; arr.len()];
    let mut src = arr;
    let mut dst = &mut tmp[..];
    for pass in 0..8 {
        let shift = 8 * pass as u32;
        let mut counts = [0u32; 256];
        for &v in src.iter() {
            counts[((v >> shift) & 0xff) as usize] += 1;
        }
        let mut offset = 0u32;
        for c in counts.iter_mut() {
            let next = offset + *c;
            *c = offset;
            offset = next;
        }
        for &v in src.iter() {
            let bucket = ((v >> shift) & 0xff) as usize;
            dst[counts[bucket] as usize] = v;
            counts[bucket] += 1;
        }
        std::mem::swap(&mut src, &mut dst);
    }
    // After 8 swaps `src` again aliases the original `arr` binding's storage
    // only if 8 is even (it is), so the sorted data is already back in `arr`.
}

/// Sorts `arr` in ascending order the same way as [`sort_uint64_t`], while
/// tracking the resulting permutation: `idx[i]` is the original index of
/// the element now at `arr[i]`.
pub fn order_uint64_t(arr: &mut [u64], idx: &mut [u32]) {
    debug_assert_eq!(arr.len(), idx.len());
    for (i, slot) in idx.iter_mut().enumerate() {
        *slot = i as u32;
    }
    let mut tmp = vec![0u64; arr.len()];
    let mut tdx = vec![0u32; idx.len()];
    let mut src = arr;
    let mut dst = &mut tmp[..];
    let mut isrc = idx;
    let mut idst = &mut tdx[..];
    for pass in 0..8 {
        let shift = 8 * pass as u32;
        let mut counts = [0u32; 256];
        for &v in src.iter() {
            counts[((v >> shift) & 0xff) as usize] += 1;
        }
        let mut offset = 0u32;
        for c in counts.iter_mut() {
            let next = offset + *c;
            *c = offset;
            offset = next;
        }
        for (&v, &original) in src.iter().zip(isrc.iter()) {
            let bucket = ((v >> shift) & 0xff) as usize;
            let j = counts[bucket] as usize;
            dst[j] = v;
            idst[j] = original;
            counts[bucket] += 1;
        }
        std::mem::swap(&mut src, &mut dst);
        std::mem::swap(&mut isrc, &mut idst);
    }
}

/// Reverses `arr` in place.
pub fn reverse_uint64_t(arr: &mut [u64]) {
    arr.reverse();
}

/// Collapses consecutive runs of equal values, keeping the first of each
/// run, and returns the number of elements retained. Assumes `arr` is
/// sorted; operates in place like `std::unique` in spirit.
pub fn unique_uint64_t(arr: &mut [u64]) -> usize {
    if arr.is_empty() {
        return 0;
    }
    let mut write = 1;
    for read in 1..arr.len() {
        if arr[read] != arr[write - 1] {
            arr[write] = arr[read];
            write += 1;
        }
    }
    write
}

/// Returns the sorted intersection of two sorted slices.
pub fn intersection_uint64_t(a: &[u64], b: &[u64]) -> Vec<u64> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Returns the sorted union of two sorted slices (duplicates across inputs
/// collapsed, matching an `a == b` element at the same merge step).
pub fn union_uint64_t(a: &[u64], b: &[u64]) -> Vec<u64> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}
