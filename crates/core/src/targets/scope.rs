use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, ScopeError};
use crate::facts::FactTable;

/// How many accounts a scope covers, which decides whether it is editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeKind {
    /// Every account of every agent.
    Company,
    /// No account selected: every account of one agent.
    WholeAgent,
    /// Exactly one account; the only editable kind.
    SingleAccount,
    /// Several selected accounts of one agent.
    MultiAccount,
}

/// The set of customer accounts a computation runs over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    agent_id: Option<String>,
    account_ids: Vec<String>,
}

impl Scope {
    /// Every account under every agent.
    pub fn company() -> Self {
        Self {
            agent_id: None,
            account_ids: Vec::new(),
        }
    }

    /// One agent with an account selection; an empty selection covers every
    /// account of the agent. Duplicates collapse and order is normalized.
    pub fn agent<I, S>(agent_id: impl Into<String>, account_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let account_ids: BTreeSet<String> = account_ids.into_iter().map(Into::into).collect();
        Self {
            agent_id: Some(agent_id.into()),
            account_ids: account_ids.into_iter().collect(),
        }
    }

    /// A single editable account.
    pub fn account(agent_id: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self::agent(agent_id, [account_id.into()])
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    /// The explicit selection; empty for whole-agent and company scopes.
    pub fn selected_accounts(&self) -> &[String] {
        &self.account_ids
    }

    pub fn kind(&self) -> ScopeKind {
        match (&self.agent_id, self.account_ids.len()) {
            (None, _) => ScopeKind::Company,
            (Some(_), 0) => ScopeKind::WholeAgent,
            (Some(_), 1) => ScopeKind::SingleAccount,
            (Some(_), _) => ScopeKind::MultiAccount,
        }
    }

    pub fn is_editable(&self) -> bool {
        self.kind() == ScopeKind::SingleAccount
    }

    /// The (agent, account) a delta may be written against.
    pub fn editable_account(&self) -> Result<(&str, &str)> {
        match (self.agent_id.as_deref(), self.account_ids.as_slice()) {
            (Some(agent_id), [account_id]) => Ok((agent_id, account_id.as_str())),
            _ => Err(ScopeError::ReadOnly {
                selected: self.account_ids.len(),
            }
            .into()),
        }
    }

    /// Every (agent, account) pair the scope covers in `facts`, sorted.
    ///
    /// Selected accounts without facts are kept so edits against them can
    /// still be attributed.
    pub fn account_pairs(&self, facts: &FactTable) -> Result<Vec<(String, String)>> {
        match &self.agent_id {
            None => Ok(facts
                .agents()
                .into_iter()
                .flat_map(|agent| {
                    facts
                        .accounts_for_agent(&agent)
                        .into_iter()
                        .map(move |account| (agent.clone(), account))
                })
                .collect()),
            Some(agent_id) => {
                if !facts.has_agent(agent_id) {
                    return Err(ScopeError::UnknownAgent(agent_id.clone()).into());
                }
                let accounts = if self.account_ids.is_empty() {
                    facts.accounts_for_agent(agent_id)
                } else {
                    self.account_ids.clone()
                };
                Ok(accounts
                    .into_iter()
                    .map(|account| (agent_id.clone(), account))
                    .collect())
            }
        }
    }

    /// Users whose deltas the scope reads.
    pub fn user_ids(&self, facts: &FactTable) -> Vec<String> {
        match &self.agent_id {
            Some(agent_id) => vec![agent_id.clone()],
            None => facts.agents(),
        }
    }
}
