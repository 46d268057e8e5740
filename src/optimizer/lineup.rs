//! Lineup results.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::identity::teams;
use crate::types::{Candidate, ContestConfig};

/// One filled roster slot.
#[derive(Debug, Clone, Serialize)]
pub struct LineupSlot<'a> {
    /// Slot label, e.g. `P1`, `SS`, `OF3`.
    pub slot: String,
    /// Index of the contest slot group this slot belongs to.
    #[serde(skip)]
    pub group: usize,
    pub candidate: &'a Candidate,
    pub score: f64,
}

/// A complete roster. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct Lineup<'a> {
    pub slots: Vec<LineupSlot<'a>>,
    pub total_salary: u32,
    /// Sum of candidate scores.
    pub projected_points: f64,
    /// Projected points plus correlation terms.
    pub objective: f64,
    /// Hitters per team, for teams with at least one hitter.
    pub stacks: BTreeMap<String, usize>,
    /// False when the solve hit its time limit before proving optimality.
    pub proven_optimal: bool,
}

/// A way a lineup can break contest rules.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LineupViolation {
    #[error("salary {salary} above cap {cap}")]
    OverCap { salary: u32, cap: u32 },

    #[error("salary {salary} below floor {floor}")]
    UnderFloor { salary: u32, floor: u32 },

    #[error("slot group {group} has {filled} of {required} slots filled")]
    SlotCount { group: String, filled: usize, required: usize },

    #[error("{candidate} is not eligible for {slot}")]
    Ineligible { candidate: String, slot: String },

    #[error("{0} selected more than once")]
    Duplicate(String),

    #[error("{count} players from {team}, limit {limit}")]
    TeamLimit { team: String, count: usize, limit: usize },
}

impl<'a> Lineup<'a> {
    pub(crate) fn new(
        slots: Vec<LineupSlot<'a>>,
        contest: &ContestConfig,
        objective: f64,
        proven_optimal: bool,
    ) -> Self {
        let total_salary = slots.iter().map(|s| s.candidate.salary).sum();
        let projected_points = slots.iter().map(|s| s.score).sum();

        let mut stacks = BTreeMap::new();
        for slot in &slots {
            let pitching = contest.slots.get(slot.group).is_some_and(|g| g.is_pitching());
            if !pitching {
                *stacks.entry(teams::canonical(&slot.candidate.team)).or_insert(0) += 1;
            }
        }

        Self { slots, total_salary, projected_points, objective, stacks, proven_optimal }
    }

    /// Check every contest rule.
    pub fn validate(&self, contest: &ContestConfig) -> Result<(), LineupViolation> {
        if self.total_salary > contest.salary_cap {
            return Err(LineupViolation::OverCap { salary: self.total_salary, cap: contest.salary_cap });
        }
        if self.total_salary < contest.salary_floor {
            return Err(LineupViolation::UnderFloor {
                salary: self.total_salary,
                floor: contest.salary_floor,
            });
        }

        for (gi, group) in contest.slots.iter().enumerate() {
            let filled = self.slots.iter().filter(|s| s.group == gi).count();
            if filled != group.count {
                return Err(LineupViolation::SlotCount {
                    group: group.name.clone(),
                    filled,
                    required: group.count,
                });
            }
        }

        let mut seen = BTreeSet::new();
        let mut per_team: BTreeMap<String, usize> = BTreeMap::new();
        for slot in &self.slots {
            let eligible = contest.slots.get(slot.group).is_some_and(|g| g.accepts(slot.candidate));
            if !eligible {
                return Err(LineupViolation::Ineligible {
                    candidate: slot.candidate.name.clone(),
                    slot: slot.slot.clone(),
                });
            }
            if !seen.insert(slot.candidate.id.as_str()) {
                return Err(LineupViolation::Duplicate(slot.candidate.name.clone()));
            }
            *per_team.entry(teams::canonical(&slot.candidate.team)).or_insert(0) += 1;
        }

        if let Some((team, &count)) = per_team.iter().find(|(_, &n)| n > contest.max_per_team) {
            return Err(LineupViolation::TeamLimit {
                team: team.clone(),
                count,
                limit: contest.max_per_team,
            });
        }
        Ok(())
    }

    /// Ids of every rostered candidate.
    pub fn candidate_ids(&self) -> BTreeSet<&str> {
        self.slots.iter().map(|s| s.candidate.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Candidate in a named slot.
    pub fn get(&self, slot: &str) -> Option<&'a Candidate> {
        self.slots.iter().find(|s| s.slot == slot).map(|s| s.candidate)
    }

    /// Largest same-team hitter group, if any.
    pub fn primary_stack(&self) -> Option<(&str, usize)> {
        self.stacks
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(team, &n)| (team.as_str(), n))
    }
}

impl fmt::Display for Lineup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for slot in &self.slots {
            writeln!(
                f,
                "{:<4} {:<24} {:<4} ${:<6} {:>6.2}",
                slot.slot,
                slot.candidate.name,
                slot.candidate.team,
                slot.candidate.salary,
                slot.score,
            )?;
        }
        write!(
            f,
            "Salary ${} | Points {:.2} | Objective {:.2}{}",
            self.total_salary,
            self.projected_points,
            self.objective,
            if self.proven_optimal { "" } else { " (time limit)" },
        )
    }
}
