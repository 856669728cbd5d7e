use chrono::NaiveDateTime;

use crate::model::{ForecastStep, ForecastWindow};

const DATE_KEY: &str = "%Y-%m-%d";

fn date_key(at: &NaiveDateTime) -> String {
    at.format(DATE_KEY).to_string()
}

/// Steps whose local `YYYY-MM-DD` matches `now`'s, in input order.
pub fn select_today(steps: &[ForecastStep], now: NaiveDateTime) -> ForecastWindow {
    let today = date_key(&now);

    ForecastWindow::new(
        steps
            .iter()
            .filter(|step| date_key(&step.timestamp) == today)
            .cloned()
            .collect(),
    )
}
