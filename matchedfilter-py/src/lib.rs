//! Python bindings for the matchedfilter correlation engine.
//!
//! `matched_filter` keeps the 13-argument order and keyword names of the
//! established binding. Input arrays are borrowed read-only, `cc_out` is the
//! only array written, and the GIL is released while the grid is computed.

use numpy::{IntoPyArray, PyArray1, PyReadonlyArrayDyn, PyReadwriteArrayDyn};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use matchedfilter::{
    correlation_len as rust_correlation_len, matched_filter as rust_matched_filter,
    max_moveout, sum_square_templates as rust_sum_square_templates, MatchedFilterError,
};

/// Convert a MatchedFilterError to a Python exception.
fn to_py_err(err: MatchedFilterError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Run the matched filter, writing into `cc_out`.
///
/// Args:
///     templates: float32 array [n_templates, n_stations, n_components, n_samples_template]
///     sum_square_templates: float32 array [n_templates, n_stations, n_components]
///     moveouts: int32 array [n_templates, n_stations, n_components]
///     data: float32 array [n_stations, n_components, n_samples_data]
///     weights: float32 array [n_stations, n_components] or
///         [n_templates, n_stations, n_components]
///     step: stride in samples between evaluated offsets
///     n_samples_template, n_samples_data, n_templates, n_stations,
///     n_components, n_corr: declared sizes, checked against the arrays
///     cc_out: writable float32 array [n_templates, n_corr]
///
/// Raises:
///     ValueError: if sizes and arrays disagree, step is 0, or a weight is
///         negative or not finite.
#[pyfunction]
#[pyo3(signature = (
    templates,
    sum_square_templates,
    moveouts,
    data,
    weights,
    step,
    n_samples_template,
    n_samples_data,
    n_templates,
    n_stations,
    n_components,
    n_corr,
    cc_out
))]
#[allow(clippy::too_many_arguments)]
fn matched_filter(
    py: Python<'_>,
    templates: PyReadonlyArrayDyn<'_, f32>,
    sum_square_templates: PyReadonlyArrayDyn<'_, f32>,
    moveouts: PyReadonlyArrayDyn<'_, i32>,
    data: PyReadonlyArrayDyn<'_, f32>,
    weights: PyReadonlyArrayDyn<'_, f32>,
    step: usize,
    n_samples_template: usize,
    n_samples_data: usize,
    n_templates: usize,
    n_stations: usize,
    n_components: usize,
    n_corr: usize,
    mut cc_out: PyReadwriteArrayDyn<'_, f32>,
) -> PyResult<usize> {
    let templates = templates.as_slice()?;
    let sum_square_templates = sum_square_templates.as_slice()?;
    let moveouts = moveouts.as_slice()?;
    let data = data.as_slice()?;
    let weights = weights.as_slice()?;
    let cc_out = cc_out.as_slice_mut()?;

    let report = py
        .detach(|| {
            rust_matched_filter(
                templates,
                sum_square_templates,
                moveouts,
                data,
                weights,
                step,
                n_samples_template,
                n_samples_data,
                n_templates,
                n_stations,
                n_components,
                n_corr,
                cc_out,
            )
        })
        .map_err(to_py_err)?;
    Ok(report.n_valid)
}

/// Per-channel sum of squared template samples.
///
/// Args:
///     templates: float32 array whose last axis has n_samples_template samples
///     n_samples_template: samples per channel
///
/// Returns:
///     Flat float32 array with one entry per channel.
#[pyfunction]
fn sum_square_templates<'py>(
    py: Python<'py>,
    templates: PyReadonlyArrayDyn<'py, f32>,
    n_samples_template: usize,
) -> PyResult<Bound<'py, PyArray1<f32>>> {
    let templates = templates.as_slice()?;
    let sums = rust_sum_square_templates(templates, n_samples_template).map_err(to_py_err)?;
    Ok(sums.into_pyarray(py))
}

/// Number of valid correlation offsets for a moveout table.
///
/// Args:
///     moveouts: int32 array of moveouts in samples
///     n_samples_template: template length
///     n_samples_data: data length
///     step: stride between offsets (default: 1)
#[pyfunction]
#[pyo3(signature = (moveouts, n_samples_template, n_samples_data, step = 1))]
fn correlation_len(
    moveouts: PyReadonlyArrayDyn<'_, i32>,
    n_samples_template: usize,
    n_samples_data: usize,
    step: usize,
) -> PyResult<usize> {
    if step == 0 {
        return Err(to_py_err(MatchedFilterError::InvalidStep { step }));
    }
    let moveouts = moveouts.as_slice()?;
    let max = max_moveout(moveouts, n_samples_template, n_samples_data);
    Ok(rust_correlation_len(
        n_samples_data,
        n_samples_template,
        max,
        step,
    ))
}

/// Python module for the matchedfilter engine.
#[pymodule]
fn _matchedfilter(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(matched_filter, m)?)?;
    m.add_function(wrap_pyfunction!(sum_square_templates, m)?)?;
    m.add_function(wrap_pyfunction!(correlation_len, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
