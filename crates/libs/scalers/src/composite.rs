//! `scalingModifiers` — combine trigger outputs through a small arithmetic
//! formula (spec.md §4.2 "Composite/meta scalers").
//!
//! The only operator specified is coalesce (`??`): take the first operand
//! that has a live (non-fallback-excluded) value, falling through to the
//! next, down to a trailing numeric literal. Evaluation happens after
//! individual scaler polls and replaces the per-trigger metrics the
//! autoscaler sees.

use std::collections::BTreeMap;

/// One term in a `??`-separated formula: either a reference to a trigger's
/// published metric name, or a trailing numeric literal default.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaTerm {
    /// Reference to another trigger's metric, by name.
    MetricRef(String),
    /// A literal fallback value, only valid as the last term.
    Literal(f64),
}

/// A parsed `scalingModifiers` declaration.
#[derive(Debug, Clone)]
pub struct CompositeScaler {
    /// Ordered operands of the `??` chain.
    pub formula: Vec<FormulaTerm>,
    /// The final target value the autoscaler scales the composite metric
    /// against.
    pub target: f64,
    /// Published name of the composite metric.
    pub metric_name: String,
}

/// Parse a formula string like `"primary ?? secondary ?? 8"`.
#[must_use]
pub fn parse_formula(raw: &str) -> Vec<FormulaTerm> {
    raw.split("??")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|term| match term.parse::<f64>() {
            Ok(literal) => FormulaTerm::Literal(literal),
            Err(_) => FormulaTerm::MetricRef(term.to_string()),
        })
        .collect()
}

impl CompositeScaler {
    /// Evaluate the formula against a map of currently-available metric
    /// values (trigger name -> value). A trigger absent from `available`
    /// is treated as failed/excluded (see the fallback evaluator) and the
    /// next term is tried.
    #[must_use]
    pub fn evaluate(&self, available: &BTreeMap<String, f64>) -> f64 {
        for term in &self.formula {
            match term {
                FormulaTerm::MetricRef(name) => {
                    if let Some(value) = available.get(name) {
                        return *value;
                    }
                }
                FormulaTerm::Literal(value) => return *value,
            }
        }
        0.0
    }

    /// The replica count this composite implies: `value / target`.
    #[must_use]
    pub fn desired_replicas(&self, available: &BTreeMap<String, f64>) -> f64 {
        if self.target <= 0.0 {
            return 0.0;
        }
        self.evaluate(available) / self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn parses_coalesce_chain_with_trailing_literal() {
        let terms = parse_formula("primary ?? secondary ?? 8");
        assert_eq!(
            terms,
            vec![
                FormulaTerm::MetricRef("primary".to_string()),
                FormulaTerm::MetricRef("secondary".to_string()),
                FormulaTerm::Literal(8.0),
            ]
        );
    }

    #[test]
    fn scenario_s1_two_trigger_failover() {
        let composite = CompositeScaler {
            formula: parse_formula("primary ?? secondary ?? 8"),
            target: 2.0,
            metric_name: "composite".to_string(),
        };

        // Both triggers healthy: primary wins.
        assert_eq!(composite.desired_replicas(&map(&[("primary", 16.0), ("secondary", 12.0)])), 8.0);
        // Primary excluded: secondary wins.
        assert_eq!(composite.desired_replicas(&map(&[("secondary", 12.0)])), 6.0);
        // Both excluded: literal default.
        assert_eq!(composite.desired_replicas(&map(&[])), 4.0);
    }
}
