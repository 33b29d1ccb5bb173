pub mod decimal_utils;

pub use decimal_utils::{per_month, percent_of, safe_div};
