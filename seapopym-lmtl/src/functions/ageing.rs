//! Cohort ageing: the transfer of unrecruited matter from each age class to the next.

use ndarray::{
    s, Array, Array2, Array3, ArrayBase, ArrayView1, ArrayViewMut1, Axis, Data, Dimension, Ix2, Zip,
};

/// Age `production` by one timestep along its trailing cohort axis.
///
/// A fraction `1 / timesteps_per_cohort[c]` of cohort `c` moves into cohort `c + 1` and the rest
/// stays. The last cohort keeps everything it holds and only receives, so the sum over cohorts
/// is preserved. `timesteps_per_cohort` must be at least as long as the cohort axis.
pub fn ageing<S, D>(production: &ArrayBase<S, D>, timesteps_per_cohort: &[f64]) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let mut aged = Array::zeros(production.raw_dim());
    let Some(last) = production.ndim().checked_sub(1).map(Axis) else {
        return aged;
    };
    Zip::from(aged.lanes_mut(last))
        .and(production.lanes(last))
        .for_each(|aged, cohorts| age_lane(cohorts, aged, timesteps_per_cohort));
    aged
}

fn age_lane(cohorts: ArrayView1<f64>, mut aged: ArrayViewMut1<f64>, timesteps_per_cohort: &[f64]) {
    let oldest = cohorts.len().saturating_sub(1);
    for (c, &content) in cohorts.iter().enumerate() {
        if c == oldest {
            aged[c] += content;
        } else {
            let coefficient = 1.0 / timesteps_per_cohort[c];
            aged[c] += content * (1.0 - coefficient);
            aged[c + 1] += content * coefficient;
        }
    }
}

/// Put a (Y, X) field into the first cohort of a (Y, X, cohort) array of zeros.
pub fn expand_cohort<S>(field: &ArrayBase<S, Ix2>, cohorts: usize) -> Array3<f64>
where
    S: Data<Elem = f64>,
{
    let (ny, nx) = field.dim();
    let mut expanded = Array3::zeros((ny, nx, cohorts));
    if cohorts > 0 {
        expanded.slice_mut(s![.., .., 0]).assign(field);
    }
    expanded
}

/// Sum over the trailing cohort axis of a (Y, X, cohort) array.
pub(crate) fn sum_cohorts(values: &Array3<f64>) -> Array2<f64> {
    values.sum_axis(Axis(2))
}
