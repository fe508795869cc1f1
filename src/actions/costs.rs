use serde::Serialize;
use std::collections::BTreeMap;

/// Estimated cost per turnaround-time tier (`RTO-24`, `RTO-0`, ...) for a
/// single analyzer type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseTimeCosts {
    costs: BTreeMap<String, f64>,
}

impl ResponseTimeCosts {
    pub fn cost(&self, tier: &str) -> Option<f64> {
        self.costs.get(tier).copied()
    }

    /// Tier labels ordered from slowest to fastest turnaround.
    pub fn tiers(&self) -> Vec<&str> {
        let mut tiers: Vec<&str> = self.costs.keys().map(String::as_str).collect();
        tiers.sort_by_key(|tier| std::cmp::Reverse(rto_hours(tier).unwrap_or(0)));
        tiers
    }

    pub fn cheapest(&self) -> Option<(&str, f64)> {
        self.costs
            .iter()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(tier, cost)| (tier.as_str(), *cost))
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ResponseTimeCosts {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            costs: iter
                .into_iter()
                .map(|(tier, cost)| (tier.into(), cost))
                .collect(),
        }
    }
}

/// Turnaround hours encoded in a tier label, e.g. `RTO-24` -> 24.
pub fn rto_hours(tier: &str) -> Option<u32> {
    tier.trim()
        .strip_prefix("RTO-")
        .and_then(|hours| hours.parse::<u32>().ok())
}
