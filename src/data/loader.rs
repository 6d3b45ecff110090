use rand::seq::SliceRandom;

/// Mini-batch iteration settings: how many samples per optimization step and
/// whether the sample order is reshuffled on every pass.
#[derive(Debug, Clone, Copy)]
pub struct DataLoader {
    pub batch_size: usize,
    pub shuffle: bool,
}

/// One mini-batch of borrowed samples. The final batch of a pass may be
/// shorter than `batch_size`.
pub struct Batch<'a> {
    pub inputs: Vec<&'a [f64]>,
    pub targets: Vec<&'a [f64]>,
}

impl Batch<'_> {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Iterator over the mini-batches of one full pass (epoch).
pub struct Batches<'a> {
    inputs: &'a [Vec<f64>],
    targets: &'a [Vec<f64>],
    indices: Vec<usize>,
    batch_size: usize,
    cursor: usize,
}

impl DataLoader {
    pub fn new(batch_size: usize, shuffle: bool) -> DataLoader {
        DataLoader { batch_size, shuffle }
    }

    /// Starts one pass over the data. A fresh random permutation is drawn
    /// per call when shuffling is enabled.
    ///
    /// # Panics
    /// Panics if `batch_size == 0` or the slices differ in length.
    pub fn batches<'a>(&self, inputs: &'a [Vec<f64>], targets: &'a [Vec<f64>]) -> Batches<'a> {
        assert!(self.batch_size > 0, "batch_size must be at least 1");
        assert_eq!(
            inputs.len(),
            targets.len(),
            "inputs and targets must have equal length"
        );

        let mut indices: Vec<usize> = (0..inputs.len()).collect();
        if self.shuffle {
            indices.shuffle(&mut rand::thread_rng());
        }

        Batches {
            inputs,
            targets,
            indices,
            batch_size: self.batch_size,
            cursor: 0,
        }
    }
}

impl<'a> Iterator for Batches<'a> {
    type Item = Batch<'a>;

    fn next(&mut self) -> Option<Batch<'a>> {
        if self.cursor >= self.indices.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.indices.len());
        let picked = &self.indices[self.cursor..end];
        self.cursor = end;

        Some(Batch {
            inputs: picked.iter().map(|&i| self.inputs[i].as_slice()).collect(),
            targets: picked.iter().map(|&i| self.targets[i].as_slice()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(n: usize) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let inputs: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64]).collect();
        let targets: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64 * 10.0]).collect();
        (inputs, targets)
    }

    #[test]
    fn covers_every_sample_exactly_once() {
        let (inputs, targets) = samples(10);
        let loader = DataLoader::new(3, true);

        let mut seen = vec![0usize; 10];
        for batch in loader.batches(&inputs, &targets) {
            for input in &batch.inputs {
                seen[input[0] as usize] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1), "coverage: {seen:?}");
    }

    #[test]
    fn final_batch_may_be_short() {
        let (inputs, targets) = samples(10);
        let loader = DataLoader::new(4, false);
        let sizes: Vec<usize> = loader.batches(&inputs, &targets).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[test]
    fn unshuffled_order_is_stable() {
        let (inputs, targets) = samples(5);
        let loader = DataLoader::new(2, false);
        let first: Vec<f64> = loader
            .batches(&inputs, &targets)
            .flat_map(|b| b.inputs.iter().map(|v| v[0]).collect::<Vec<_>>())
            .collect();
        assert_eq!(first, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn targets_stay_paired_with_inputs() {
        let (inputs, targets) = samples(8);
        let loader = DataLoader::new(3, true);
        for batch in loader.batches(&inputs, &targets) {
            for (input, target) in batch.inputs.iter().zip(batch.targets.iter()) {
                assert_eq!(target[0], input[0] * 10.0);
            }
        }
    }

    #[test]
    #[should_panic(expected = "batch_size")]
    fn zero_batch_size_panics() {
        let (inputs, targets) = samples(3);
        DataLoader::new(0, false).batches(&inputs, &targets);
    }
}
