use ndarray::{Array1, Array2};

/// Per-channel summary statistic over a frame sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStat {
    /// Arithmetic mean over frames.
    Mean,
    /// Maximum over frames.
    Max,
    /// Minimum over frames.
    Min,
    /// Population standard deviation over frames (ddof = 0).
    Std,
}

/// The statistic set used by the match pipeline: 4 statistics per channel.
pub const DEFAULT_STATS: [SummaryStat; 4] = [
    SummaryStat::Mean,
    SummaryStat::Max,
    SummaryStat::Min,
    SummaryStat::Std,
];

/// Collapse a variable-length frame sequence into one fixed-length vector.
///
/// Statistics are laid out stat-major: with `s` statistics and `c` channels
/// the output is `[stat0(ch0..chC), stat1(ch0..chC), ...]`, length `s * c`.
///
/// # Arguments
/// * `frames` - Frame matrix of shape `(frames, channels)`
/// * `stats` - Statistics to compute, in output order
///
/// # Errors
/// Returns `EmptyInput` when `frames` has no rows or no columns, or when
/// `stats` is empty.
///
/// # Example
/// ```
/// use avmatch::features::{summarize, SummaryStat};
/// use ndarray::array;
///
/// let frames = array![[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0]];
/// let v = summarize(&frames, &[SummaryStat::Mean, SummaryStat::Max]).unwrap();
/// assert_eq!(v.len(), 4);
/// assert_eq!(v[0], 3.0); // mean of channel 0
/// assert_eq!(v[3], 6.0); // max of channel 1
/// ```
pub fn summarize(frames: &Array2<f32>, stats: &[SummaryStat]) -> crate::Result<Array1<f32>> {
    let (t, c) = (frames.nrows(), frames.ncols());
    if t == 0 || c == 0 {
        return Err(crate::Error::EmptyInput("frame sequence"));
    }
    if stats.is_empty() {
        return Err(crate::Error::EmptyInput("summary statistics"));
    }

    let mut out = Array1::<f32>::zeros(stats.len() * c);
    for (s, stat) in stats.iter().enumerate() {
        for ch in 0..c {
            let column = frames.column(ch);
            out[s * c + ch] = match stat {
                SummaryStat::Mean => column.sum() / t as f32,
                SummaryStat::Max => column.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v)),
                SummaryStat::Min => column.fold(f32::INFINITY, |acc, &v| acc.min(v)),
                SummaryStat::Std => {
                    let mean = column.sum() / t as f32;
                    let var = column.fold(0.0f32, |acc, &v| acc + (v - mean) * (v - mean))
                        / t as f32;
                    var.sqrt()
                }
            };
        }
    }
    Ok(out)
}

/// Summarize a batch of frame sequences into a feature matrix.
///
/// Sequences may differ in frame count but must share a channel count.
///
/// # Arguments
/// * `sequences` - One frame matrix per sample
/// * `stats` - Statistics to compute, in output order
///
/// # Returns
/// Matrix of shape `(samples, stats.len() * channels)`
///
/// # Errors
/// Returns `EmptyInput` on an empty batch and `ShapeMismatch` when channel
/// counts disagree.
pub fn summarize_batch(
    sequences: &[Array2<f32>],
    stats: &[SummaryStat],
) -> crate::Result<Array2<f32>> {
    let first = sequences
        .first()
        .ok_or(crate::Error::EmptyInput("sequence batch"))?;
    let channels = first.ncols();

    let mut out = Array2::<f32>::zeros((sequences.len(), stats.len() * channels));
    for (i, seq) in sequences.iter().enumerate() {
        if seq.ncols() != channels {
            return Err(crate::Error::ShapeMismatch {
                expected: format!("{} channels", channels),
                got: format!("{} channels", seq.ncols()),
            });
        }
        let row = summarize(seq, stats)?;
        out.row_mut(i).assign(&row);
    }
    Ok(out)
}
