//! Market-rate graph and path search.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use tokenrate_common::{fixed, Currency, CurrencyRateEdge};
use tracing::{trace, warn};

use crate::error::{RateError, RateResult};

/// Orientation of a search relative to the market quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Walk edges from base asset to quote asset, multiplying rates.
    Forward,
    /// Walk edges from quote asset to base asset, multiplying reciprocals.
    Backward,
}

#[derive(Debug, Clone)]
struct Neighbor {
    currency: Currency,
    /// Rate already oriented for the graph's direction.
    rate: Decimal,
}

/// Directed adjacency map built from one snapshot of market edges.
///
/// Neighbor lists keep provider order; duplicates are not collapsed.
#[derive(Debug, Clone)]
pub struct RateGraph {
    adjacency: HashMap<Currency, Vec<Neighbor>>,
}

impl RateGraph {
    /// Build the graph for the given direction.
    pub fn build(edges: &[CurrencyRateEdge], direction: Direction) -> Self {
        let mut adjacency: HashMap<Currency, Vec<Neighbor>> = HashMap::new();

        for edge in edges {
            let (from, to, rate) = match direction {
                Direction::Forward => (&edge.base_asset, &edge.quote_asset, Some(edge.rate)),
                Direction::Backward => (&edge.quote_asset, &edge.base_asset, fixed::recip(edge.rate)),
            };

            let Some(rate) = rate else {
                warn!(edge = %edge, "Skipping market rate with no reciprocal");
                continue;
            };

            adjacency.entry(from.clone()).or_default().push(Neighbor {
                currency: to.clone(),
                rate,
            });
        }

        Self { adjacency }
    }

    /// Whether the currency has outgoing edges.
    pub fn contains(&self, currency: &Currency) -> bool {
        self.adjacency.contains_key(currency)
    }

    /// Compose the rate along the first path found from `start` to `end`.
    ///
    /// Depth-first, in provider order. The visited set is shared by every
    /// branch of the search, so a currency reached once is never entered
    /// again, even along a different path. `start` itself is not marked.
    ///
    /// `Ok(None)` means no path exists. A product that overflows along the
    /// first path ends the search with [`RateError::InvalidRatePair`].
    pub fn find_rate(&self, start: &Currency, end: &Currency) -> RateResult<Option<Decimal>> {
        let mut visited = HashSet::new();
        self.search(start, end, &mut visited)
    }

    fn search<'a>(
        &'a self,
        node: &Currency,
        target: &Currency,
        visited: &mut HashSet<&'a Currency>,
    ) -> RateResult<Option<Decimal>> {
        let Some(neighbors) = self.adjacency.get(node) else {
            return Ok(None);
        };

        for neighbor in neighbors {
            if visited.contains(&neighbor.currency) {
                continue;
            }

            if neighbor.currency == *target {
                trace!(from = %node, to = %target, rate = %neighbor.rate, "Reached target");
                return Ok(Some(neighbor.rate));
            }

            visited.insert(&neighbor.currency);

            if let Some(rate) = self.search(&neighbor.currency, target, visited)? {
                let composed = fixed::mul(rate, neighbor.rate).ok_or_else(|| {
                    RateError::InvalidRatePair(format!(
                        "rate overflow on path {} -> {} -> {}",
                        node, neighbor.currency, target
                    ))
                })?;
                return Ok(Some(composed));
            }
        }

        Ok(None)
    }
}
