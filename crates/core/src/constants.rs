/// Months used for the linear monthly projections.
pub const MONTHS_PER_YEAR: u32 = 12;

/// Scale used when turning ratios into percentages.
pub const PERCENT_SCALE: u32 = 100;

/// Default number of per-customer sections in a selection report.
pub const DEFAULT_REPORT_CUSTOMER_CAP: usize = 30;
