use ndarray::{Array1, Array2};
use tracing::{info, warn};

use super::merge::MergedCensus;
use super::moe::{aggregate_moe, percent_moe, ratio_moe, sum_skip_nan, zero_as_missing};
use crate::config::{EducationScore, PercentMetric, estimate_column, moe_column};

/// A derived value and its margin of error, aligned with the merged rows.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricColumns {
    pub value_name: String,
    pub moe_name: String,
    pub value: Array1<f64>,
    pub moe: Array1<f64>,
}

fn stack(columns: &[Array1<f64>], rows: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, columns.len()), |(row, col)| columns[col][row])
}

fn column(census: &MergedCensus, name: &str) -> Array1<f64> {
    if !census.has_acs_column(name) {
        warn!("ACS column {} was not loaded; treating it as missing", name);
    }
    census.acs_column(name)
}

/// `PCT_<name>`: one numerator, or the sum of several with zeros counted
/// as missing.
pub fn percent_metric(census: &MergedCensus, metric: &PercentMetric) -> MetricColumns {
    let rows = census.len();
    let prepare = |values: Array1<f64>| {
        if metric.aggregate {
            zero_as_missing(&values)
        } else {
            values
        }
    };

    let total = prepare(column(census, &estimate_column(&metric.total)));
    let moe_total = prepare(column(census, &moe_column(&metric.total)));

    let estimates: Vec<Array1<f64>> = metric
        .numerators
        .iter()
        .map(|code| prepare(column(census, &estimate_column(code))))
        .collect();
    let moes: Vec<Array1<f64>> = metric
        .numerators
        .iter()
        .map(|code| prepare(column(census, &moe_column(code))))
        .collect();

    let (numerator, moe_numerator) = if metric.aggregate {
        (
            sum_skip_nan(&stack(&estimates, rows)),
            aggregate_moe(&stack(&moes, rows)),
        )
    } else {
        (estimates[0].clone(), moes[0].clone())
    };

    let proportion = &numerator / &total;
    let value = &proportion * 100.0;
    let moe = percent_moe(&moe_numerator, &proportion, &moe_total, &total);

    MetricColumns {
        value_name: format!("PCT_{}", metric.name),
        moe_name: format!("MOE_{}", metric.name),
        value,
        moe,
    }
}

/// Grade-weighted attainment per person, with a ratio MOE.
pub fn education_score(census: &MergedCensus, score: &EducationScore) -> MetricColumns {
    let rows = census.len();
    let total = zero_as_missing(&column(census, &estimate_column(&score.total)));
    let moe_total = column(census, &moe_column(&score.total));

    let mut weighted = Array1::<f64>::zeros(rows);
    let mut moes = Vec::with_capacity(score.grades.len());
    for grade in &score.grades {
        weighted = weighted + column(census, &estimate_column(&grade.column)) * grade.weight;
        moes.push(column(census, &moe_column(&grade.column)));
    }

    let ratio = &weighted / &total;
    let moe = ratio_moe(&aggregate_moe(&stack(&moes, rows)), &ratio, &moe_total, &total);

    MetricColumns {
        value_name: score.name.clone(),
        moe_name: format!("MOE_{}", score.name),
        value: ratio,
        moe,
    }
}

pub fn compute_metrics(
    census: &MergedCensus,
    percent: &[PercentMetric],
    education: Option<&EducationScore>,
) -> Vec<MetricColumns> {
    let mut metrics: Vec<MetricColumns> = percent
        .iter()
        .map(|metric| percent_metric(census, metric))
        .collect();
    if let Some(score) = education {
        metrics.push(education_score(census, score));
    }
    info!("Computed {} metrics over {} block groups", metrics.len(), census.len());
    metrics
}
