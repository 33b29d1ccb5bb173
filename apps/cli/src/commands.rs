use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use sales_targets_core::aggregation::ItemFilter;
use sales_targets_core::facts::{load_facts_csv_path, FactTable};
use sales_targets_core::targets::{
    ClassDeltaEdit, ItemDeltaEdit, Scope, TargetServiceTrait,
};
use sales_targets_core::visibility::{PermissionSet, VisibilityFilter};

use crate::main_lib::AppState;

#[derive(Debug, Parser)]
#[command(name = "sales-targets", version, about = "Sales target deltas and derived targets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Per-customer sales of one agent with each customer's share.
    Customers(AgentArgs),
    /// Class table and KPIs for a scope.
    Classes(ScopeArgs),
    /// Item detail table for a scope.
    Items {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Case-insensitive substring of the item name.
        #[arg(long)]
        query: Option<String>,
        /// Restrict to these classes.
        #[arg(long = "class")]
        classes: Vec<String>,
    },
    /// Record a class-level quantity delta for one customer.
    SetClassDelta {
        #[command(flatten)]
        target: EditArgs,
        #[arg(long = "class")]
        class_id: String,
        #[arg(long, allow_negative_numbers = true)]
        qty: Decimal,
    },
    /// Record an item-level quantity delta for one customer.
    SetItemDelta {
        #[command(flatten)]
        target: EditArgs,
        #[arg(long = "class")]
        class_id: String,
        #[arg(long = "item")]
        item_id: String,
        #[arg(long, allow_negative_numbers = true)]
        qty: Decimal,
    },
    /// Summary, combined and per-customer tables for a customer selection.
    Report(AgentArgs),
}

#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Sales facts export (CSV).
    #[arg(long)]
    pub facts: PathBuf,
    /// Field categories the caller may see: money, quantity, item_identity, or all.
    #[arg(long, default_value = "money,quantity,item_identity")]
    pub permissions: String,
}

#[derive(Debug, Args)]
pub struct AgentArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    #[arg(long)]
    pub agent: String,
    /// Customer accounts; none selects every account of the agent.
    #[arg(long = "account")]
    pub accounts: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ScopeArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    #[arg(long, required_unless_present = "company")]
    pub agent: Option<String>,
    #[arg(long = "account")]
    pub accounts: Vec<String>,
    /// Every account of every agent.
    #[arg(long, conflicts_with_all = ["agent", "accounts"])]
    pub company: bool,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    #[arg(long)]
    pub agent: String,
    #[arg(long)]
    pub account: String,
}

impl ScopeArgs {
    fn scope(&self) -> anyhow::Result<Scope> {
        if self.company {
            return Ok(Scope::company());
        }
        let agent = self
            .agent
            .as_deref()
            .context("--agent is required unless --company is given")?;
        Ok(Scope::agent(agent, self.accounts.iter().cloned()))
    }
}

fn load(common: &CommonArgs) -> anyhow::Result<(FactTable, VisibilityFilter)> {
    let facts = load_facts_csv_path(&common.facts)
        .with_context(|| format!("loading facts from {}", common.facts.display()))?;
    tracing::debug!("Loaded {} facts", facts.facts().len());
    let permissions = PermissionSet::parse(&common.permissions)?;
    Ok((facts, VisibilityFilter::new(permissions)))
}

pub async fn run(state: &AppState, command: Command) -> anyhow::Result<Value> {
    let service = state.target_service.as_ref();
    match command {
        Command::Customers(args) => {
            let (facts, filter) = load(&args.common)?;
            let customers = service.customer_summaries(&facts, &args.agent)?;
            let share = facts.selection_share(&args.agent, &args.accounts);
            Ok(json!({
                "agent": service.agent_label(&args.agent),
                "customers": filter.customer_table(&customers),
                "selection": filter.table(
                    sales_targets_core::visibility::SELECTION_SHARE_COLUMNS,
                    std::slice::from_ref(&share),
                ),
            }))
        }
        Command::Classes(args) => {
            let (facts, filter) = load(&args.common)?;
            let scope = args.scope()?;
            filter.authorize_scope(&scope)?;
            let snapshot = service.load_snapshot(&facts, &scope)?;
            let view = service.scope_view(&facts, &snapshot, &scope)?;
            Ok(serde_json::to_value(filter.scope_view(&view))?)
        }
        Command::Items {
            scope: args,
            query,
            classes,
        } => {
            let (facts, filter) = load(&args.common)?;
            let scope = args.scope()?;
            filter.authorize_scope(&scope)?;
            let snapshot = service.load_snapshot(&facts, &scope)?;
            let items = service.item_view(&facts, &snapshot, &scope, &ItemFilter { query, classes })?;
            Ok(serde_json::to_value(filter.item_table(&items))?)
        }
        Command::SetClassDelta {
            target,
            class_id,
            qty,
        } => {
            let (facts, filter) = load(&target.common)?;
            let scope = Scope::account(&target.agent, &target.account);
            let mut snapshot = service.load_snapshot(&facts, &scope)?;
            let record = service
                .save_class_delta(&facts, &mut snapshot, &scope, ClassDeltaEdit { class_id, delta_qty: qty })
                .await?;
            let view = service.scope_view(&facts, &snapshot, &scope)?;
            Ok(json!({
                "saved": filter.saved_delta(&record),
                "view": filter.scope_view(&view),
            }))
        }
        Command::SetItemDelta {
            target,
            class_id,
            item_id,
            qty,
        } => {
            let (facts, filter) = load(&target.common)?;
            let scope = Scope::account(&target.agent, &target.account);
            let mut snapshot = service.load_snapshot(&facts, &scope)?;
            let record = service
                .save_item_delta(
                    &facts,
                    &mut snapshot,
                    &scope,
                    ItemDeltaEdit {
                        class_id,
                        item_id,
                        delta_qty: qty,
                    },
                )
                .await?;
            let view = service.scope_view(&facts, &snapshot, &scope)?;
            Ok(json!({
                "saved": filter.saved_delta(&record),
                "view": filter.scope_view(&view),
            }))
        }
        Command::Report(args) => {
            let (facts, filter) = load(&args.common)?;
            let scope = Scope::agent(&args.agent, Vec::<String>::new());
            let snapshot = service.load_snapshot(&facts, &scope)?;
            let report = service.selection_report(&facts, &snapshot, &args.agent, &args.accounts)?;
            Ok(serde_json::to_value(filter.selection_report(&report))?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scope_flags() {
        let cli = Cli::try_parse_from([
            "sales-targets",
            "classes",
            "--facts",
            "facts.csv",
            "--agent",
            "2",
            "--account",
            "X",
            "--account",
            "Y",
        ])
        .unwrap();
        match cli.command {
            Command::Classes(args) => {
                let scope = args.scope().unwrap();
                assert_eq!(scope.selected_accounts(), ["X".to_string(), "Y".to_string()]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_company_conflicts_with_agent() {
        assert!(Cli::try_parse_from([
            "sales-targets",
            "classes",
            "--facts",
            "facts.csv",
            "--company",
            "--agent",
            "2",
        ])
        .is_err());
        assert!(Cli::try_parse_from(["sales-targets", "classes", "--facts", "facts.csv"]).is_err());
    }

    #[test]
    fn test_negative_delta_is_accepted() {
        let cli = Cli::try_parse_from([
            "sales-targets",
            "set-class-delta",
            "--facts",
            "facts.csv",
            "--agent",
            "2",
            "--account",
            "X",
            "--class",
            "A",
            "--qty",
            "-3.5",
        ])
        .unwrap();
        match cli.command {
            Command::SetClassDelta { qty, class_id, .. } => {
                assert_eq!(class_id, "A");
                assert_eq!(qty, Decimal::new(-35, 1));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_saved_delta_respects_permissions() {
        use std::sync::Arc;

        use sales_targets_core::deltas::InMemoryDeltaRepository;
        use sales_targets_core::targets::TargetService;

        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let facts_path = temp_dir.path().join("facts.csv");
        std::fs::write(
            &facts_path,
            "agent_id,account_id,class_id,item_id,quantity,net_money\n2,X,A,Bolt,10,1000\n",
        )
        .unwrap();

        let state = AppState {
            target_service: Arc::new(TargetService::new(Arc::new(InMemoryDeltaRepository::new()))),
        };
        let cli = Cli::try_parse_from([
            "sales-targets",
            "set-class-delta",
            "--facts",
            facts_path.to_str().unwrap(),
            "--permissions",
            "money",
            "--agent",
            "2",
            "--account",
            "X",
            "--class",
            "A",
            "--qty",
            "2",
        ])
        .unwrap();

        let output = run(&state, cli.command).await.unwrap();
        let saved = output["saved"].to_string();
        assert!(saved.contains("updated_at"));
        assert!(!saved.contains("delta_qty"));
        assert!(!saved.contains("monthly_"));
        assert!(!output["view"].to_string().contains("sales_qty"));
        assert!(output["view"].to_string().contains("delta_money"));
    }
}
