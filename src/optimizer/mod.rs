//! Constraint optimizer.
//!
//! Turns a scored pool into one or more valid, mutually distinct lineups.
//! Each call owns its own [`Model`]; lineups after the first are produced by
//! adding an exclusion cut for every earlier lineup and solving again.
//!
//! Per call: Formulating → Solving → {Optimal, Infeasible, TimedOut}; an
//! optimal solve with more lineups requested loops back to Formulating
//! with one more cut, until the request is met or a solve stops short.

pub mod lineup;
pub mod model;
pub mod solver;

use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};

use crate::strategy::ScoredCandidate;
use crate::types::{ContestConfig, StackerError};
pub use lineup::{Lineup, LineupSlot, LineupViolation};
pub use model::Model;
pub use solver::{BranchAndBound, Solution, SolveStatus};

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Why no (further) lineup could be produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Infeasibility {
    #[error("slot group {slot} needs {needed} eligible candidates, pool has {available}")]
    NotEnoughEligible { slot: String, needed: usize, available: usize },

    #[error("roster needs {needed} candidates, pool has {available}")]
    NotEnoughCandidates { needed: usize, available: usize },

    #[error("cheapest possible roster costs {cheapest}, above the {cap} cap")]
    CheapestRosterOverCap { cheapest: u32, cap: u32 },

    #[error("most expensive possible roster costs {richest}, below the {floor} floor")]
    RichestRosterUnderFloor { richest: u32, floor: u32 },

    #[error("no assignment satisfies every constraint")]
    NoFeasibleAssignment,
}

/// Why optimization stopped before producing every requested lineup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StopReason {
    #[error("infeasible: {0}")]
    Infeasible(Infeasibility),

    #[error("time limit reached without a feasible lineup")]
    TimedOut,
}

/// Lineups produced plus, when fewer than requested, the reason.
#[derive(Debug)]
pub struct OptimizationOutcome<'a> {
    pub lineups: Vec<Lineup<'a>>,
    pub stop: Option<StopReason>,
}

impl OptimizationOutcome<'_> {
    pub fn is_complete(&self) -> bool {
        self.stop.is_none()
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Produce up to `num_lineups` lineups from a scored pool.
///
/// Contest misconfiguration is an error; an unsatisfiable pool is not, and
/// comes back as an outcome with no lineups and a [`StopReason`].
pub fn optimize<'a>(
    pool: &[ScoredCandidate<'a>],
    contest: &ContestConfig,
    num_lineups: usize,
) -> Result<OptimizationOutcome<'a>, StackerError> {
    contest.validate()?;
    if num_lineups == 0 {
        return Err(StackerError::InvalidRequest("at least one lineup must be requested".into()));
    }

    info!(
        candidates = pool.len(),
        format = %contest.format,
        cap = contest.salary_cap,
        floor = contest.salary_floor,
        lineups = num_lineups,
        "Optimizing"
    );

    if let Some(reason) = presolve(pool, contest) {
        warn!(reason = %reason, "Pool cannot fill a lineup");
        return Ok(OptimizationOutcome {
            lineups: Vec::new(),
            stop: Some(StopReason::Infeasible(reason)),
        });
    }

    let mut model = Model::build(pool, contest);
    debug!(
        variables = model.variables.len(),
        rows = model.rows.len(),
        teams = model.teams.len(),
        "Model formulated"
    );

    let solver = BranchAndBound::new(contest.time_limit);
    let mut lineups = Vec::with_capacity(num_lineups);
    let mut stop = None;

    while lineups.len() < num_lineups {
        let (status, stats) = solver.solve(&model);
        let (solution, proven_optimal) = match status {
            SolveStatus::Optimal(solution) => (solution, true),
            SolveStatus::TimedOut(Some(solution)) => {
                warn!(
                    lineup = lineups.len() + 1,
                    nodes = stats.nodes,
                    "Time limit reached, returning best lineup found"
                );
                (solution, false)
            }
            SolveStatus::TimedOut(None) => {
                warn!(lineup = lineups.len() + 1, nodes = stats.nodes, "Time limit reached");
                stop = Some(StopReason::TimedOut);
                break;
            }
            SolveStatus::Infeasible => {
                stop = Some(StopReason::Infeasible(Infeasibility::NoFeasibleAssignment));
                break;
            }
        };

        let lineup = build_lineup(&model, pool, contest, &solution, proven_optimal);
        if let Err(violation) = lineup.validate(contest) {
            // The model encodes every contest rule, so this is a solver defect.
            error!(violation = %violation, "Solver produced an invalid lineup");
            stop = Some(StopReason::Infeasible(Infeasibility::NoFeasibleAssignment));
            break;
        }

        info!(
            lineup = lineups.len() + 1,
            salary = lineup.total_salary,
            points = format!("{:.2}", lineup.projected_points),
            objective = format!("{:.2}", lineup.objective),
            optimal = proven_optimal,
            nodes = stats.nodes,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "Lineup found"
        );

        let selected: BTreeSet<usize> =
            solution.variables.iter().map(|&v| model.variables[v].candidate).collect();
        model.exclude(&selected.into_iter().collect::<Vec<_>>());
        lineups.push(lineup);

        if !proven_optimal {
            // A timed-out solve gives no guarantee the next one fares better.
            if lineups.len() < num_lineups {
                stop = Some(StopReason::TimedOut);
            }
            break;
        }
    }

    if let Some(reason) = &stop {
        info!(produced = lineups.len(), requested = num_lineups, reason = %reason, "Stopped early");
    }
    Ok(OptimizationOutcome { lineups, stop })
}

/// Cheap checks that prove infeasibility before any search.
fn presolve(pool: &[ScoredCandidate<'_>], contest: &ContestConfig) -> Option<Infeasibility> {
    let roster = contest.roster_size();
    if pool.len() < roster {
        return Some(Infeasibility::NotEnoughCandidates { needed: roster, available: pool.len() });
    }

    let mut cheapest: u64 = 0;
    let mut richest: u64 = 0;
    for group in &contest.slots {
        let mut salaries: Vec<u32> = pool
            .iter()
            .filter(|s| group.accepts(s.candidate))
            .map(|s| s.candidate.salary)
            .collect();
        if salaries.len() < group.count {
            return Some(Infeasibility::NotEnoughEligible {
                slot: group.name.clone(),
                needed: group.count,
                available: salaries.len(),
            });
        }
        salaries.sort_unstable();
        cheapest += salaries.iter().take(group.count).map(|&s| s as u64).sum::<u64>();
        richest += salaries.iter().rev().take(group.count).map(|&s| s as u64).sum::<u64>();
    }

    if cheapest > contest.salary_cap as u64 {
        return Some(Infeasibility::CheapestRosterOverCap {
            cheapest: cheapest.min(u32::MAX as u64) as u32,
            cap: contest.salary_cap,
        });
    }
    if richest < contest.salary_floor as u64 {
        return Some(Infeasibility::RichestRosterUnderFloor {
            richest: richest as u32,
            floor: contest.salary_floor,
        });
    }
    None
}

/// Turn a solution into a lineup, slot groups in contest order and each
/// group's members by descending score.
fn build_lineup<'a>(
    model: &Model,
    pool: &[ScoredCandidate<'a>],
    contest: &ContestConfig,
    solution: &Solution,
    proven_optimal: bool,
) -> Lineup<'a> {
    let mut slots = Vec::with_capacity(model.roster_size);
    for (gi, group) in contest.slots.iter().enumerate() {
        let mut members: Vec<&ScoredCandidate<'a>> = solution
            .variables
            .iter()
            .map(|&v| &model.variables[v])
            .filter(|var| var.group == gi)
            .map(|var| &pool[var.candidate])
            .collect();
        members.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.candidate.id.cmp(&b.candidate.id))
        });

        for (name, member) in group.slot_names().into_iter().zip(members) {
            slots.push(LineupSlot {
                slot: name,
                group: gi,
                candidate: member.candidate,
                score: member.score,
            });
        }
    }

    Lineup::new(slots, contest, solution.objective, proven_optimal)
}
