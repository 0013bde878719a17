use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Scheduling phase an agent runs in. Execution order is fixed:
/// `Early` before `Main` before `Final`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Phase {
    Early,
    Main,
    Final,
}

pub const PHASE_SEQUENCE: [Phase; 3] = [Phase::Early, Phase::Main, Phase::Final];

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Early => "early",
            Phase::Main => "main",
            Phase::Final => "final",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown phase: {0}")]
pub struct ParsePhaseError(String);

impl FromStr for Phase {
    type Err = ParsePhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "early" => Ok(Phase::Early),
            "main" => Ok(Phase::Main),
            "final" => Ok(Phase::Final),
            other => Err(ParsePhaseError(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Phase {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Main
    }
}

/// Groups contexts by phase in fixed execution order, sorting each group
/// by name. Empty phase groups are omitted from the result.
pub fn group_by_phase<T>(items: Vec<T>, phase_of: impl Fn(&T) -> Phase, name_of: impl Fn(&T) -> &str) -> Vec<(Phase, Vec<T>)> {
    let mut groups: Vec<(Phase, Vec<T>)> = PHASE_SEQUENCE.iter().map(|p| (*p, Vec::new())).collect();
    for item in items {
        let phase = phase_of(&item);
        let idx = PHASE_SEQUENCE.iter().position(|p| *p == phase).unwrap();
        groups[idx].1.push(item);
    }
    for (_, group) in groups.iter_mut() {
        group.sort_by(|a, b| name_of(a).cmp(name_of(b)));
    }
    groups.into_iter().filter(|(_, g)| !g.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_in_fixed_order_and_sorts_names() {
        let items = vec![
            ("zeta".to_string(), Phase::Main),
            ("alpha".to_string(), Phase::Early),
            ("beta".to_string(), Phase::Main),
        ];
        let grouped = group_by_phase(items, |(_, p)| *p, |(n, _)| n.as_str());
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].0, Phase::Early);
        assert_eq!(grouped[1].0, Phase::Main);
        assert_eq!(grouped[1].1[0].0, "beta");
        assert_eq!(grouped[1].1[1].0, "zeta");
    }

    #[test]
    fn skips_empty_phases() {
        let items = vec![("a".to_string(), Phase::Final)];
        let grouped = group_by_phase(items, |(_, p)| *p, |(n, _)| n.as_str());
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].0, Phase::Final);
    }
}
