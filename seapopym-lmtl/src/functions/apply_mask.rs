use ndarray::Zip;
use seapopym_core::array::{broadcast_to, DataArray};
use seapopym_core::errors::SeapopymResult;
use seapopym_core::labels::forcing;
use seapopym_core::state::State;
use tracing::debug;

/// Set float variables to NaN outside the global mask.
///
/// Only variables spanning every dimension of the mask are masked. A state without a global mask
/// is returned unchanged.
pub fn apply_mask_to_state(mut state: State) -> SeapopymResult<State> {
    let Some(mask) = state.get(forcing::GLOBAL_MASK).cloned() else {
        return Ok(state);
    };
    let mask_values = state.boolean(forcing::GLOBAL_MASK, "apply_mask_to_state")?.clone();

    for name in state.variable_names() {
        let Some(data) = state.get(&name) else {
            continue;
        };
        if data.as_float().is_none() || !mask.dims().iter().all(|dim| data.has_dim(*dim)) {
            continue;
        }
        let Some(inside) = broadcast_to(&mask_values, mask.dims(), data.dims(), data.shape())
        else {
            continue;
        };
        let mut values = data.to_float();
        Zip::from(&mut values)
            .and(&inside)
            .for_each(|v, &m| {
                if !m {
                    *v = f64::NAN;
                }
            });
        let masked = DataArray::float(data.dims().to_vec(), values)
            .map(|masked| masked.with_attrs(data.attrs().clone()));
        if let Some(masked) = masked {
            debug!(variable = %name, "Applying the global mask");
            state.insert(&name, masked)?;
        }
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::testing::{filled, grid};
    use ndarray::array;
    use seapopym_core::labels::Dim;

    #[test]
    fn masks_fields_spanning_the_mask() {
        let base = grid(1, 2, 1);
        let state = base
            .clone()
            .with_variable(
                forcing::GLOBAL_MASK,
                DataArray::boolean(
                    vec![Dim::Y, Dim::X, Dim::Z],
                    array![[[true, false, true]]].into_dyn(),
                )
                .unwrap(),
            )
            .unwrap()
            .with_variable(
                forcing::TEMPERATURE,
                filled(&base, &[Dim::Time, Dim::Y, Dim::X, Dim::Z], 15.0),
            )
            .unwrap()
            .with_variable(
                forcing::PRIMARY_PRODUCTION,
                filled(&base, &[Dim::Time, Dim::Y, Dim::X], 1.0),
            )
            .unwrap();

        let masked = apply_mask_to_state(state).unwrap();
        let temperature = masked.float(forcing::TEMPERATURE, "test").unwrap();
        assert!(temperature[[1, 0, 0, 1]].is_nan());
        assert_eq!(temperature[[1, 0, 0, 2]], 15.0);
        // no layer dimension: left alone
        let production = masked.float(forcing::PRIMARY_PRODUCTION, "test").unwrap();
        assert!(production.iter().all(|v| *v == 1.0));
        assert!(masked.boolean(forcing::GLOBAL_MASK, "test").is_ok());
    }

    #[test]
    fn without_mask_nothing_changes() {
        let base = grid(1, 1, 1);
        let state = base
            .clone()
            .with_variable(forcing::PRIMARY_PRODUCTION, filled(&base, &[Dim::Time, Dim::Y, Dim::X], f64::NAN))
            .unwrap();
        assert_eq!(apply_mask_to_state(state.clone()).unwrap().len(), state.len());
    }
}
