use rust_decimal::Decimal;

use super::delta_snapshot::UserDeltas;
use super::deltas_model::{DeltaSource, EffectiveClassDelta, ResolvedDelta};
use crate::utils::safe_div;

/// Resolves a class-level delta from its three possible inputs.
///
/// 1. A recorded quantity delta wins, even when it is zero.
/// 2. Otherwise a non-zero legacy money delta is converted at `avg_price`;
///    an undefined or zero price makes the conversion contribute nothing.
/// 3. Otherwise the delta is zero.
pub fn resolve_class_delta(
    recorded_qty: Option<Decimal>,
    legacy_money: Option<Decimal>,
    avg_price: Option<Decimal>,
) -> ResolvedDelta {
    if let Some(delta_qty) = recorded_qty {
        return ResolvedDelta {
            delta_qty,
            source: DeltaSource::Recorded,
        };
    }

    match legacy_money.filter(|money| !money.is_zero()) {
        Some(money) => match safe_div(money, avg_price) {
            Some(delta_qty) => ResolvedDelta {
                delta_qty,
                source: DeltaSource::LegacyMoney,
            },
            None => ResolvedDelta::none(),
        },
        None => ResolvedDelta::none(),
    }
}

/// Resolves effective deltas for one user against a snapshot.
#[derive(Debug, Clone, Copy)]
pub struct DeltaResolver<'a> {
    deltas: Option<&'a UserDeltas>,
}

impl<'a> DeltaResolver<'a> {
    pub fn new(deltas: Option<&'a UserDeltas>) -> Self {
        Self { deltas }
    }

    /// Class-level delta only, before item roll-up.
    pub fn class_delta(
        &self,
        account_id: &str,
        class_id: &str,
        avg_price: Option<Decimal>,
    ) -> ResolvedDelta {
        let Some(deltas) = self.deltas else {
            return ResolvedDelta::none();
        };
        resolve_class_delta(
            deltas
                .class_delta(account_id, class_id)
                .map(|record| record.delta_qty),
            deltas.legacy_money(account_id, class_id),
            avg_price,
        )
    }

    /// The item's own delta; items have no legacy fallback.
    pub fn item_delta(&self, account_id: &str, class_id: &str, item_id: &str) -> Decimal {
        self.deltas
            .and_then(|d| d.item_delta(account_id, class_id, item_id))
            .map(|record| record.delta_qty)
            .unwrap_or(Decimal::ZERO)
    }

    /// Class-level delta plus every item delta under the class.
    pub fn effective_class_delta(
        &self,
        account_id: &str,
        class_id: &str,
        avg_price: Option<Decimal>,
    ) -> EffectiveClassDelta {
        EffectiveClassDelta {
            class_level: self.class_delta(account_id, class_id, avg_price),
            items_qty: self
                .deltas
                .map(|d| d.item_delta_sum(account_id, class_id))
                .unwrap_or(Decimal::ZERO),
        }
    }
}
