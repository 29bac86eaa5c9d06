use crate::nn::Network;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// One parameter array in row-major order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamState {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<f32>,
}

/// A snapshot of every learnable parameter in a network, in layer order.
///
/// The snapshot carries values only; restoring requires a network with the
/// same architecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkState {
    pub params: Vec<ParamState>,
}

/// Capture the current parameter values of a network.
pub fn state(network: &mut Network) -> NetworkState {
    let params = network
        .parameters()
        .into_iter()
        .map(|p| ParamState {
            rows: p.data.nrows(),
            cols: p.data.ncols(),
            values: p.data.iter().copied().collect(),
        })
        .collect();
    NetworkState { params }
}

/// Restore parameter values from a snapshot.
///
/// # Errors
/// Returns `ShapeMismatch` when the snapshot does not match the network's
/// parameter count or shapes.
pub fn apply_state(network: &mut Network, snapshot: &NetworkState) -> crate::Result<()> {
    let mut params = network.parameters();
    if params.len() != snapshot.params.len() {
        return Err(crate::Error::ShapeMismatch {
            expected: format!("{} parameters", params.len()),
            got: format!("{} parameters", snapshot.params.len()),
        });
    }

    for (param, saved) in params.iter_mut().zip(snapshot.params.iter()) {
        if param.data.nrows() != saved.rows || param.data.ncols() != saved.cols {
            return Err(crate::Error::ShapeMismatch {
                expected: format!("({}, {}) parameter", param.data.nrows(), param.data.ncols()),
                got: format!("({}, {}) parameter", saved.rows, saved.cols),
            });
        }
        let restored = Array2::from_shape_vec((saved.rows, saved.cols), saved.values.clone())
            .map_err(|e| crate::Error::ShapeMismatch {
                expected: format!("({}, {}) values", saved.rows, saved.cols),
                got: e.to_string(),
            })?;
        param.data = restored;
    }
    Ok(())
}

/// Write a parameter snapshot to a JSON file.
///
/// # Errors
/// Returns `Io` on file errors and `Checkpoint` on serialization failure.
pub fn save<P: AsRef<Path>>(network: &mut Network, path: P) -> crate::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer(writer, &state(network))?;
    Ok(())
}

/// Load a parameter snapshot from a JSON file into a network.
///
/// # Errors
/// Returns `Io` on file errors, `Checkpoint` on malformed JSON, and
/// `ShapeMismatch` when the snapshot does not fit the network.
pub fn load<P: AsRef<Path>>(network: &mut Network, path: P) -> crate::Result<()> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let snapshot: NetworkState = serde_json::from_reader(reader)?;
    apply_state(network, &snapshot)
}
