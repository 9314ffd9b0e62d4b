use crate::compile::{CompilerError, CompilerErrorKind};

/// One fixed-size slice of the compiled dataset, stored row-major:
/// `nodes[i][d]` is the node id at depth `d` of data point `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub prog_ids: Vec<i32>,
    pub nodes: Vec<Vec<i32>>,
    pub edges: Vec<Vec<bool>>,
    pub targets: Vec<Vec<i32>>,
    /// One row per data point, per configured evidence kind.
    pub evidence: Vec<Vec<Vec<i32>>>,
}

/// What one iteration step hands to the downstream model: node and edge
/// sequences transposed to depth-major layout for sequential consumption,
/// targets left row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchView<'a> {
    pub prog_ids: &'a [i32],
    pub nodes_by_depth: Vec<Vec<i32>>,
    pub edges_by_depth: Vec<Vec<bool>>,
    pub targets: &'a [Vec<i32>],
    pub evidence: &'a [Vec<Vec<i32>>],
}

/// Restartable cursor over the frozen batch list. Stepping past the last
/// batch without an explicit `reset` is an error, not a wraparound.
#[derive(Debug)]
pub struct BatchIterator<'a> {
    batches: &'a [Batch],
    next: usize,
}

impl<'a> BatchIterator<'a> {
    pub(crate) fn new(batches: &'a [Batch]) -> Self {
        BatchIterator { batches, next: 0 }
    }

    pub fn num_batches(&self) -> usize {
        self.batches.len()
    }

    pub fn next_batch(&mut self) -> Result<BatchView<'a>, CompilerError> {
        let Some(batch) = self.batches.get(self.next) else {
            return Err(CompilerError::new(
                CompilerErrorKind::Exhausted,
                format!(
                    "all {} batches consumed; call reset() to iterate again",
                    self.batches.len()
                ),
            ));
        };
        self.next += 1;
        Ok(BatchView {
            prog_ids: &batch.prog_ids,
            nodes_by_depth: transpose(&batch.nodes),
            edges_by_depth: transpose(&batch.edges),
            targets: &batch.targets,
            evidence: &batch.evidence,
        })
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

fn transpose<T: Copy + Default>(rows: &[Vec<T>]) -> Vec<Vec<T>> {
    let depth = rows.first().map_or(0, Vec::len);
    let mut out = vec![vec![T::default(); rows.len()]; depth];
    for (i, row) in rows.iter().enumerate() {
        for (d, value) in row.iter().enumerate() {
            out[d][i] = *value;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_batch() -> Batch {
        Batch {
            prog_ids: vec![0, 1],
            nodes: vec![vec![1, 2, 3], vec![4, 5, 6]],
            edges: vec![vec![true, false, false], vec![true, true, false]],
            targets: vec![vec![2, 3, 0], vec![5, 6, 0]],
            evidence: vec![vec![vec![1, 0], vec![0, 1]]],
        }
    }

    #[test]
    fn transposes_to_depth_major() {
        let batches = [tiny_batch()];
        let mut iter = BatchIterator::new(&batches);
        let view = iter.next_batch().expect("one batch available");
        assert_eq!(view.nodes_by_depth, [[1, 4], [2, 5], [3, 6]]);
        assert_eq!(
            view.edges_by_depth,
            [[true, true], [false, true], [false, false]]
        );
        assert_eq!(view.targets, [[2, 3, 0], [5, 6, 0]]);
    }

    #[test]
    fn errors_past_the_end_until_reset() {
        let batches = [tiny_batch()];
        let mut iter = BatchIterator::new(&batches);
        iter.next_batch().expect("first pass");
        let err = iter.next_batch().expect_err("must not wrap around");
        assert_eq!(err.kind, CompilerErrorKind::Exhausted);

        iter.reset();
        iter.next_batch().expect("restart after reset");
    }
}
