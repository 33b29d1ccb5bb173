//! Facts module - the normalized sales fact table and its CSV adapter.

mod csv_loader;
mod fact_table;
mod facts_model;

pub use csv_loader::{load_facts_csv, load_facts_csv_path};
pub use fact_table::FactTable;
pub use facts_model::{AgentDirectory, CustomerSummary, SalesFact, SelectionShare};
