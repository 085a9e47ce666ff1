//! Partitioning of definitions across workers
//!
//! Worker `i` of `n` receives `len / n` items, plus one more when
//! `i < len % n`, as a contiguous slice in the original order. The worker
//! count is clamped to `max(1, len)`.

/// Number of workers actually used for `total` items
pub fn effective_workers(total: usize, requested: usize) -> usize {
    requested.min(total).max(1)
}

/// Split `items` into order-preserving, contiguous blocks
pub fn partition<T: Clone>(items: &[T], workers: usize) -> Vec<Vec<T>> {
    let count = effective_workers(items.len(), workers);
    let base = items.len() / count;
    let extra = items.len() % count;

    let mut parts = Vec::with_capacity(count);
    let mut offset = 0;
    for i in 0..count {
        let size = base + usize::from(i < extra);
        parts.push(items[offset..offset + size].to_vec());
        offset += size;
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(parts: &[Vec<usize>]) -> Vec<usize> {
        parts.iter().map(Vec::len).collect()
    }

    #[test]
    fn test_five_over_three() {
        let items: Vec<usize> = (0..5).collect();
        let parts = partition(&items, 3);
        assert_eq!(sizes(&parts), [2, 2, 1]);
        assert_eq!(parts, vec![vec![0, 1], vec![2, 3], vec![4]]);
    }

    #[test]
    fn test_more_workers_than_items() {
        let items = vec!['a', 'b'];
        assert_eq!(partition(&items, 8), vec![vec!['a'], vec!['b']]);
    }

    #[test]
    fn test_empty_input_gets_one_partition() {
        let items: Vec<u8> = Vec::new();
        let parts = partition(&items, 4);
        assert_eq!(parts.len(), 1);
        assert!(parts[0].is_empty());
    }

    #[test]
    fn test_no_loss_no_duplication_and_balanced() {
        for total in 0..40usize {
            let items: Vec<usize> = (0..total).collect();
            for workers in 1..12usize {
                let parts = partition(&items, workers);
                assert_eq!(parts.len(), effective_workers(total, workers));

                let flattened: Vec<usize> = parts.iter().flatten().copied().collect();
                assert_eq!(flattened, items, "total={total} workers={workers}");

                let lens = sizes(&parts);
                let max = lens.iter().max().copied().unwrap_or(0);
                let min = lens.iter().min().copied().unwrap_or(0);
                assert!(max - min <= 1, "total={total} workers={workers}");
            }
        }
    }

    #[test]
    fn test_effective_workers() {
        assert_eq!(effective_workers(10, 3), 3);
        assert_eq!(effective_workers(2, 5), 2);
        assert_eq!(effective_workers(0, 5), 1);
        assert_eq!(effective_workers(4, 0), 1);
    }
}
