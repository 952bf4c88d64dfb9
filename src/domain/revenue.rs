use serde::{Deserialize, Serialize};

/// Monthly revenue reference data, in whole dollars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revenue {
    pub month: String,
    pub revenue: i64,
}

impl Revenue {
    pub fn new(month: impl Into<String>, revenue: i64) -> Self {
        Self {
            month: month.into(),
            revenue,
        }
    }
}

/// Y-axis labels for the revenue chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YAxis {
    pub labels: Vec<String>,
    pub top_label: i64,
}

/// Most steps drawn on the revenue axis. Wider ranges use a coarser step.
const MAX_Y_AXIS_STEPS: u64 = 100;

/// Compute chart labels in steps of $1K, from the top label down to $0K.
/// The top label is the highest revenue rounded up to the next thousand.
pub fn generate_y_axis(revenue: &[Revenue]) -> YAxis {
    let highest = revenue.iter().map(|r| r.revenue).max().unwrap_or(0).max(0) as u64;
    let thousands = highest.div_ceil(1000);
    let step = thousands.div_ceil(MAX_Y_AXIS_STEPS).max(1);
    let steps = thousands.div_ceil(step);
    let top_label = i64::try_from((steps * step).saturating_mul(1000)).unwrap_or(i64::MAX);

    let labels = (0..=steps)
        .rev()
        .map(|i| format!("${}K", i * step))
        .collect();

    YAxis { labels, top_label }
}
