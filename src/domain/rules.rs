//! Declarative rule descriptors and the accumulators that evaluate them.
//!
//! Rule tables are plain `static` slices of named function pointers. Each
//! entry can be unit-tested on its own and the tables read top to bottom in
//! evaluation order.

use crate::domain::patient::PatientRecord;

/// Which accumulator a contribution lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Risk,
    Protective,
}

/// Score delta produced by a rule that fired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    pub side: Side,
    pub delta: f64,
}

impl Contribution {
    #[must_use]
    pub const fn risk(delta: f64) -> Self {
        Self {
            side: Side::Risk,
            delta,
        }
    }

    #[must_use]
    pub const fn protective(delta: f64) -> Self {
        Self {
            side: Side::Protective,
            delta,
        }
    }
}

/// Additive scoring rule.
///
/// `evaluate` sees the card accumulated so far, which lets synergy rules
/// scale with the risk already present. Every other rule ignores it.
pub struct ScoreRule {
    pub id: &'static str,
    pub evaluate: fn(&PatientRecord, &ScoreCard) -> Option<Contribution>,
}

/// Record of one rule that fired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiredRule {
    pub id: &'static str,
    pub contribution: Contribution,
}

/// Risk and protective accumulators plus the trace of what fired.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreCard {
    risk: f64,
    protective: f64,
    fired: Vec<FiredRule>,
}

impl ScoreCard {
    /// Evaluate `rules` in order against `record`.
    #[must_use]
    pub fn evaluate(rules: &[ScoreRule], record: &PatientRecord) -> Self {
        let mut card = Self::default();
        for rule in rules {
            if let Some(contribution) = (rule.evaluate)(record, &card) {
                card.add(rule.id, contribution);
            }
        }
        card
    }

    fn add(&mut self, id: &'static str, contribution: Contribution) {
        match contribution.side {
            Side::Risk => self.risk += contribution.delta,
            Side::Protective => self.protective += contribution.delta,
        }
        self.fired.push(FiredRule { id, contribution });
    }

    #[must_use]
    pub fn risk(&self) -> f64 {
        self.risk
    }

    #[must_use]
    pub fn protective(&self) -> f64 {
        self.protective
    }

    /// `risk - protective`
    #[must_use]
    pub fn net(&self) -> f64 {
        self.risk - self.protective
    }

    /// `risk + protective`, how much evidence the rules found at all.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.risk + self.protective
    }

    #[must_use]
    pub fn fired(&self) -> &[FiredRule] {
        &self.fired
    }

    #[must_use]
    pub fn has_fired(&self, id: &str) -> bool {
        self.fired.iter().any(|f| f.id == id)
    }
}

/// Late-stage adjustment of a blended probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// Upper clamp: `min(p, limit)`
    Ceiling(f64),
    /// Lower clamp: `max(p, limit)`
    Floor(f64),
    /// Multiplicative factor
    Scale(f64),
}

impl Bound {
    /// Apply to `p`. Clamps only ever tighten toward their limit, so a
    /// stricter earlier clamp is never loosened by a later one.
    #[must_use]
    pub fn apply(self, p: f64) -> f64 {
        match self {
            Self::Ceiling(limit) => p.min(limit),
            Self::Floor(limit) => p.max(limit),
            Self::Scale(factor) => p * factor,
        }
    }
}

/// Special-case rule applied after blending.
pub struct OverrideRule {
    pub id: &'static str,
    pub evaluate: fn(&PatientRecord) -> Option<Bound>,
}

/// Override that matched, with the probability before and after.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedOverride {
    pub id: &'static str,
    pub bound: Bound,
    pub before: f64,
    pub after: f64,
}

/// Run `rules` in order over `p`.
#[must_use]
pub fn apply_overrides(
    rules: &[OverrideRule],
    record: &PatientRecord,
    mut p: f64,
) -> (f64, Vec<AppliedOverride>) {
    let mut applied = Vec::new();
    for rule in rules {
        if let Some(bound) = (rule.evaluate)(record) {
            let after = bound.apply(p);
            applied.push(AppliedOverride {
                id: rule.id,
                bound,
                before: p,
                after,
            });
            p = after;
        }
    }
    (p, applied)
}

/// First band whose threshold `value` reaches. Bands are listed descending.
#[must_use]
pub fn at_least<T: Copy>(value: f64, bands: &[(f64, T)]) -> Option<T> {
    bands
        .iter()
        .find(|(threshold, _)| value >= *threshold)
        .map(|(_, out)| *out)
}

/// First band whose threshold `value` does not exceed. Bands are listed ascending.
#[must_use]
pub fn at_most<T: Copy>(value: f64, bands: &[(f64, T)]) -> Option<T> {
    bands
        .iter()
        .find(|(threshold, _)| value <= *threshold)
        .map(|(_, out)| *out)
}
