use sales_targets_core::constants::DEFAULT_REPORT_CUSTOMER_CAP;

pub struct Config {
    pub db_path: String,
    pub log_format: String,
    pub agent_labels: String,
    pub report_customer_cap: usize,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let db_path =
            std::env::var("ST_DB_PATH").unwrap_or_else(|_| "./data/targets.sqlite".into());
        let log_format = std::env::var("ST_LOG_FORMAT").unwrap_or_else(|_| "text".into());
        let agent_labels = std::env::var("ST_AGENT_LABELS").unwrap_or_default();
        let report_customer_cap: usize = std::env::var("ST_REPORT_CUSTOMER_CAP")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_REPORT_CUSTOMER_CAP);
        Self {
            db_path,
            log_format,
            agent_labels,
            report_customer_cap,
        }
    }
}
