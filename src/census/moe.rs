//! Margin-of-error arithmetic for derived ACS estimates.
//!
//! Every input column is an `Array1<f64>` with `NaN` standing in for a
//! missing value. Results keep `NaN` wherever the value is undefined.

use ndarray::{Array1, Array2, Axis, Zip};

/// Row sums over `columns`, skipping `NaN`. A row with nothing but `NaN`
/// sums to zero.
pub fn sum_skip_nan(columns: &Array2<f64>) -> Array1<f64> {
    columns.map_axis(Axis(1), |row| row.iter().filter(|v| !v.is_nan()).sum())
}

/// MOE of a sum of estimates: `sqrt(Σ MOE²)` per row, skipping `NaN`.
pub fn aggregate_moe(moes: &Array2<f64>) -> Array1<f64> {
    moes.map_axis(Axis(1), |row| {
        row.iter()
            .filter(|v| !v.is_nan())
            .map(|v| v * v)
            .sum::<f64>()
            .sqrt()
    })
}

/// MOE of a proportion `numerator / total`, as a percentage:
/// `100 · (1/TOT) · sqrt(MOE_NUM² − PROP² · MOE_TOT²)`. A negative radicand
/// leaves the value undefined.
pub fn percent_moe(
    moe_numerator: &Array1<f64>,
    proportion: &Array1<f64>,
    moe_total: &Array1<f64>,
    total: &Array1<f64>,
) -> Array1<f64> {
    Zip::from(moe_numerator)
        .and(proportion)
        .and(moe_total)
        .and(total)
        .map_collect(|&moe_num, &prop, &moe_tot, &tot| {
            let radicand = moe_num * moe_num - prop * prop * moe_tot * moe_tot;
            if radicand < 0.0 {
                return f64::NAN;
            }
            100.0 * (1.0 / tot) * radicand.sqrt()
        })
}

/// MOE of a ratio: `(1/TOT) · sqrt(MOE² + PROP² · MOE_TOT²)`. A non-finite
/// radicand counts as zero.
pub fn ratio_moe(
    moe: &Array1<f64>,
    ratio: &Array1<f64>,
    moe_total: &Array1<f64>,
    total: &Array1<f64>,
) -> Array1<f64> {
    Zip::from(moe)
        .and(ratio)
        .and(moe_total)
        .and(total)
        .map_collect(|&moe, &ratio, &moe_tot, &tot| {
            let radicand = moe * moe + ratio * ratio * moe_tot * moe_tot;
            let radicand = if radicand.is_finite() { radicand } else { 0.0 };
            (1.0 / tot) * radicand.sqrt()
        })
}

/// Turns `0` into `NaN`.
pub fn zero_as_missing(values: &Array1<f64>) -> Array1<f64> {
    values.mapv(|v| if v == 0.0 { f64::NAN } else { v })
}

/// Finite values only; everything else becomes `None`.
pub fn to_options(values: &Array1<f64>) -> Vec<Option<f64>> {
    values
        .iter()
        .map(|v| if v.is_finite() { Some(*v) } else { None })
        .collect()
}
