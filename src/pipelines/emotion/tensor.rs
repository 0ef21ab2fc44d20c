use candle_core::{Device, Result, Tensor};

/// Padded id matrix for one forward pass.
///
/// Device-neutral marshalling form: the executor copies it onto whichever
/// device it runs on. Rows are padded to the longest sequence in the batch,
/// but never below `min_len` so every convolution window fits.
#[derive(Debug, Clone)]
pub struct TokenBatch {
    ids: Vec<u32>,
    rows: usize,
    cols: usize,
    seq_lens: Vec<usize>,
}

impl TokenBatch {
    pub fn from_sequences(sequences: &[Vec<u32>], pad_id: u32, min_len: usize) -> Self {
        let rows = sequences.len();
        let cols = sequences
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(min_len.max(1));

        let mut ids = Vec::with_capacity(rows * cols);
        let mut seq_lens = Vec::with_capacity(rows);
        for sequence in sequences {
            ids.extend_from_slice(sequence);
            ids.resize(ids.len() + (cols - sequence.len()), pad_id);
            seq_lens.push(sequence.len());
        }

        Self {
            ids,
            rows,
            cols,
            seq_lens,
        }
    }

    /// Materialize the `(rows, cols)` id tensor on the executor's device.
    pub fn to_tensor(&self, device: &Device) -> Result<Tensor> {
        Tensor::from_vec(self.ids.clone(), (self.rows, self.cols), device)
    }

    pub fn seq_lens(&self) -> &[usize] {
        &self.seq_lens
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }
}
