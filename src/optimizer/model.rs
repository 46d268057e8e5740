//! Integer-program formulation.
//!
//! One binary variable per (candidate, eligible slot group). Constraints
//! are kept as explicit linear rows so that exclusion cuts for earlier
//! lineups are just more rows, and so that a finished assignment can be
//! checked against the whole model independently of the search.

use std::collections::HashMap;

use crate::identity::teams;
use crate::strategy::ScoredCandidate;
use crate::types::{ContestConfig, CorrelationRules, SlotGroup};

/// Numeric slack used when comparing row activities.
pub const EPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

/// What a row enforces, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    SalaryCap,
    SalaryFloor,
    /// Slot group index.
    SlotCount(usize),
    /// Candidate index; one row per multi-eligible candidate.
    CandidateOnce(usize),
    /// Team index.
    TeamCap(usize),
    RosterSize,
    /// Ordinal of the excluded lineup.
    Exclusion(usize),
}

#[derive(Debug, Clone)]
pub struct Row {
    pub kind: RowKind,
    /// `(variable, coefficient)` pairs.
    pub terms: Vec<(usize, f64)>,
    pub sense: Sense,
    pub rhs: f64,
}

impl Row {
    pub fn satisfied_by(&self, activity: f64) -> bool {
        match self.sense {
            Sense::Le => activity <= self.rhs + EPS,
            Sense::Ge => activity >= self.rhs - EPS,
            Sense::Eq => (activity - self.rhs).abs() <= EPS,
        }
    }
}

/// A binary decision: put `candidate` in slot group `group`.
#[derive(Debug, Clone)]
pub struct Variable {
    pub candidate: usize,
    pub group: usize,
    /// Linear objective coefficient: the candidate's score.
    pub objective: f64,
    pub salary: f64,
}

/// The complete model for one pool under one contest.
#[derive(Debug, Clone)]
pub struct Model {
    pub groups: Vec<SlotGroup>,
    pub variables: Vec<Variable>,
    pub rows: Vec<Row>,
    pub salary_cap: f64,
    pub salary_floor: f64,
    pub roster_size: usize,
    pub correlation: CorrelationRules,
    /// Canonical team codes, indexed by team id.
    pub teams: Vec<String>,
    /// Per candidate: id, team id, opponent team id.
    pub candidate_ids: Vec<String>,
    pub candidate_team: Vec<usize>,
    pub candidate_opponent: Vec<Option<usize>>,
    exclusions: usize,
}

impl Model {
    /// Formulate the base model: everything except exclusion cuts.
    pub fn build(pool: &[ScoredCandidate<'_>], contest: &ContestConfig) -> Self {
        let mut team_ids: HashMap<String, usize> = HashMap::new();
        let mut teams_list: Vec<String> = Vec::new();
        let mut intern = |code: &str| -> usize {
            let code = teams::canonical(code);
            if let Some(&id) = team_ids.get(&code) {
                return id;
            }
            let id = teams_list.len();
            team_ids.insert(code.clone(), id);
            teams_list.push(code);
            id
        };

        let candidate_team: Vec<usize> = pool.iter().map(|s| intern(&s.candidate.team)).collect();
        let candidate_opponent: Vec<Option<usize>> = pool
            .iter()
            .map(|s| s.candidate.opponent.as_deref().map(&mut intern))
            .collect();

        let mut variables = Vec::new();
        for (ci, scored) in pool.iter().enumerate() {
            for (gi, group) in contest.slots.iter().enumerate() {
                if group.accepts(scored.candidate) {
                    variables.push(Variable {
                        candidate: ci,
                        group: gi,
                        objective: scored.score,
                        salary: scored.candidate.salary as f64,
                    });
                }
            }
        }

        let all: Vec<(usize, f64)> = (0..variables.len()).map(|v| (v, 1.0)).collect();
        let salary_terms: Vec<(usize, f64)> =
            variables.iter().enumerate().map(|(v, var)| (v, var.salary)).collect();

        let mut rows = vec![
            Row {
                kind: RowKind::SalaryCap,
                terms: salary_terms.clone(),
                sense: Sense::Le,
                rhs: contest.salary_cap as f64,
            },
            Row {
                kind: RowKind::SalaryFloor,
                terms: salary_terms,
                sense: Sense::Ge,
                rhs: contest.salary_floor as f64,
            },
        ];

        for (gi, group) in contest.slots.iter().enumerate() {
            rows.push(Row {
                kind: RowKind::SlotCount(gi),
                terms: ones(&variables, |var| var.group == gi),
                sense: Sense::Eq,
                rhs: group.count as f64,
            });
        }

        for ci in 0..pool.len() {
            let terms = ones(&variables, |var| var.candidate == ci);
            if terms.len() > 1 {
                rows.push(Row { kind: RowKind::CandidateOnce(ci), terms, sense: Sense::Le, rhs: 1.0 });
            }
        }

        for team in 0..teams_list.len() {
            let terms = ones(&variables, |var| candidate_team[var.candidate] == team);
            if terms.len() > contest.max_per_team {
                rows.push(Row {
                    kind: RowKind::TeamCap(team),
                    terms,
                    sense: Sense::Le,
                    rhs: contest.max_per_team as f64,
                });
            }
        }

        let roster_size = contest.roster_size();
        rows.push(Row { kind: RowKind::RosterSize, terms: all, sense: Sense::Eq, rhs: roster_size as f64 });

        Self {
            groups: contest.slots.clone(),
            variables,
            rows,
            salary_cap: contest.salary_cap as f64,
            salary_floor: contest.salary_floor as f64,
            roster_size,
            correlation: contest.correlation.clone(),
            teams: teams_list,
            candidate_ids: pool.iter().map(|s| s.candidate.id.clone()).collect(),
            candidate_team,
            candidate_opponent,
            exclusions: 0,
        }
    }

    /// Forbid the exact set of candidates from reappearing:
    /// `Σ x(v) over every variable of those candidates ≤ roster_size − 1`.
    pub fn exclude(&mut self, candidates: &[usize]) {
        let terms = ones(&self.variables, |var| candidates.contains(&var.candidate));
        self.rows.push(Row {
            kind: RowKind::Exclusion(self.exclusions),
            terms,
            sense: Sense::Le,
            rhs: candidates.len().saturating_sub(1) as f64,
        });
        self.exclusions += 1;
    }

    pub fn exclusion_count(&self) -> usize {
        self.exclusions
    }

    /// Variables of one slot group.
    pub fn group_variables(&self, group: usize) -> Vec<usize> {
        (0..self.variables.len()).filter(|&v| self.variables[v].group == group).collect()
    }

    /// Per variable, the rows it appears in with its coefficient.
    pub fn incidence(&self) -> Vec<Vec<(usize, f64)>> {
        let mut incidence = vec![Vec::new(); self.variables.len()];
        for (ri, row) in self.rows.iter().enumerate() {
            for &(v, coef) in &row.terms {
                incidence[v].push((ri, coef));
            }
        }
        incidence
    }

    /// First row violated by a set of chosen variables, if any.
    pub fn violated_row(&self, chosen: &[usize]) -> Option<&Row> {
        self.rows.iter().find(|row| {
            let activity: f64 = row
                .terms
                .iter()
                .filter(|(v, _)| chosen.contains(v))
                .map(|(_, coef)| coef)
                .sum();
            !row.satisfied_by(activity)
        })
    }

    /// Full objective of a set of chosen variables: scores plus
    /// correlation terms.
    pub fn objective(&self, chosen: &[usize]) -> f64 {
        let linear: f64 = chosen.iter().map(|&v| self.variables[v].objective).sum();
        linear + self.correlation_value(chosen)
    }

    /// Stack bonuses minus opposing-pitcher penalties for a selection.
    pub fn correlation_value(&self, chosen: &[usize]) -> f64 {
        let rules = &self.correlation;
        let mut hitters = vec![0usize; self.teams.len()];
        let mut pitchers_facing = vec![0usize; self.teams.len()];

        for &v in chosen {
            let var = &self.variables[v];
            if self.groups[var.group].is_pitching() {
                if let Some(opp) = self.candidate_opponent[var.candidate] {
                    pitchers_facing[opp] += 1;
                }
            } else {
                hitters[self.candidate_team[var.candidate]] += 1;
            }
        }

        let stacks = if rules.stack_min_hitters > 0 {
            hitters.iter().filter(|&&h| h >= rules.stack_min_hitters).count()
        } else {
            0
        };
        let conflicts: usize = hitters.iter().zip(&pitchers_facing).map(|(h, p)| h * p).sum();

        stacks as f64 * rules.stack_bonus - conflicts as f64 * rules.opposing_pitcher_penalty
    }
}

fn ones(variables: &[Variable], pred: impl Fn(&Variable) -> bool) -> Vec<(usize, f64)> {
    variables
        .iter()
        .enumerate()
        .filter(|(_, var)| pred(var))
        .map(|(v, _)| (v, 1.0))
        .collect()
}
