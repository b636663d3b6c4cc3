use txcap_core::{Branch, MegavoltAmperes};

use crate::options::{RatingColumn, RatingPreference};

fn column_value(branch: &Branch, column: RatingColumn) -> Option<MegavoltAmperes> {
    match column {
        RatingColumn::RateA => branch.rate_a,
        RatingColumn::RateB => branch.rate_b,
        RatingColumn::RateC => branch.rate_c,
    }
}

/// First positive rating along the preference ladder. A rating of zero is
/// MATPOWER's "unspecified"; negative and null ratings are skipped too.
pub fn select_rating(branch: &Branch, preference: RatingPreference) -> Option<MegavoltAmperes> {
    preference
        .ladder()
        .into_iter()
        .filter_map(|column| column_value(branch, column))
        .find(|rating| rating.value() > 0.0)
}
