//! Exact branch-and-bound solver for [`Model`].
//!
//! Slot groups are filled one at a time, scarcest first. Within a group,
//! variables are tried in descending score order (salary ascending, then
//! candidate id, for ties), so the search is fully deterministic. A node is
//! pruned when the salary bounds make the cap or floor unreachable, or
//! when an optimistic bound on the objective cannot beat the incumbent.
//!
//! The objective bound is the sum of:
//! - the best remaining scores per group, or a Lagrangian relaxation of the
//!   salary cap, whichever is tighter;
//! - the stack bonuses still reachable with the remaining hitter picks.
//!
//! Opposing-pitcher penalties only ever lower the objective, so they are
//! applied exactly as picks are made and ignored by the bound.

use std::time::{Duration, Instant};
use tracing::debug;

use super::model::{Model, Sense, EPS};

/// How many nodes are expanded between wall-clock checks.
const CLOCK_CHECK_INTERVAL: u64 = 1024;

/// A complete, feasible assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Chosen variable indices.
    pub variables: Vec<usize>,
    pub objective: f64,
}

/// Terminal state of one solve.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    Optimal(Solution),
    Infeasible,
    /// The time limit expired; carries the best assignment found, if any.
    TimedOut(Option<Solution>),
}

/// Search statistics, for logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolveStats {
    pub nodes: u64,
    pub elapsed: Duration,
}

pub struct BranchAndBound {
    time_limit: Duration,
}

impl BranchAndBound {
    pub fn new(time_limit: Duration) -> Self {
        Self { time_limit }
    }

    pub fn solve(&self, model: &Model) -> (SolveStatus, SolveStats) {
        let started = Instant::now();
        let mut search = Search::new(model, started + self.time_limit);
        search.descend(0, 0, 0);

        let stats = SolveStats { nodes: search.nodes, elapsed: started.elapsed() };
        let status = match (search.timed_out, search.best) {
            (true, best) => SolveStatus::TimedOut(best),
            (false, Some(best)) => SolveStatus::Optimal(best),
            (false, None) => SolveStatus::Infeasible,
        };
        debug!(
            nodes = stats.nodes,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            lambda = search.lambda,
            status = status_label(&status),
            "Branch and bound finished"
        );
        (status, stats)
    }
}

fn status_label(status: &SolveStatus) -> &'static str {
    match status {
        SolveStatus::Optimal(_) => "optimal",
        SolveStatus::Infeasible => "infeasible",
        SolveStatus::TimedOut(Some(_)) => "timed_out_with_incumbent",
        SolveStatus::TimedOut(None) => "timed_out",
    }
}

// ---------------------------------------------------------------------------
// Search state
// ---------------------------------------------------------------------------

/// Per-group precomputed tables.
struct GroupTables {
    /// Variables sorted by objective desc, salary asc, candidate id.
    vars: Vec<usize>,
    /// `score_prefix[i]` = sum of the first `i` sorted objectives.
    score_prefix: Vec<f64>,
    /// `adjusted_top[r]` = best sum of `r` values of `objective − λ·salary`.
    adjusted_top: Vec<f64>,
    /// `min_salary[r]` / `max_salary[r]` = r cheapest / dearest salaries.
    min_salary: Vec<f64>,
    max_salary: Vec<f64>,
    count: usize,
    pitching: bool,
}

struct Search<'m> {
    model: &'m Model,
    /// Group indices in search order.
    order: Vec<usize>,
    tables: Vec<GroupTables>,
    /// Bounds for the groups after position `k` in `order`.
    rest_score: Vec<f64>,
    rest_adjusted: Vec<f64>,
    rest_min_salary: Vec<f64>,
    rest_max_salary: Vec<f64>,
    rest_hitter_picks: Vec<usize>,
    lambda: f64,
    incidence: Vec<Vec<(usize, f64)>>,

    activity: Vec<f64>,
    used: Vec<bool>,
    team_hitters: Vec<usize>,
    pitchers_facing: Vec<usize>,
    chosen: Vec<usize>,
    deltas: Vec<f64>,
    salary: f64,
    objective: f64,

    best: Option<Solution>,
    nodes: u64,
    deadline: Instant,
    timed_out: bool,
}

impl<'m> Search<'m> {
    fn new(model: &'m Model, deadline: Instant) -> Self {
        let lambda = choose_lambda(model);

        let tables: Vec<GroupTables> = (0..model.groups.len())
            .map(|g| group_tables(model, g, lambda))
            .collect();

        let mut order: Vec<usize> = (0..model.groups.len()).collect();
        order.sort_by(|&a, &b| {
            let ra = tables[a].vars.len() as f64 / tables[a].count.max(1) as f64;
            let rb = tables[b].vars.len() as f64 / tables[b].count.max(1) as f64;
            ra.total_cmp(&rb).then(a.cmp(&b))
        });

        let n = order.len();
        let mut rest_score = vec![0.0; n + 1];
        let mut rest_adjusted = vec![0.0; n + 1];
        let mut rest_min_salary = vec![0.0; n + 1];
        let mut rest_max_salary = vec![0.0; n + 1];
        let mut rest_hitter_picks = vec![0usize; n + 1];
        for k in (0..n).rev() {
            let t = &tables[order[k]];
            // Groups short of variables are caught by the search itself.
            let top = t.count.min(t.vars.len());
            rest_score[k] = rest_score[k + 1] + t.score_prefix[top];
            rest_adjusted[k] = rest_adjusted[k + 1] + t.adjusted_top[top];
            rest_min_salary[k] = rest_min_salary[k + 1] + t.min_salary[top];
            rest_max_salary[k] = rest_max_salary[k + 1] + t.max_salary[top];
            rest_hitter_picks[k] = rest_hitter_picks[k + 1] + if t.pitching { 0 } else { t.count };
        }
        // Shift so index k means "groups strictly after position k".
        rest_score.remove(0);
        rest_adjusted.remove(0);
        rest_min_salary.remove(0);
        rest_max_salary.remove(0);
        rest_hitter_picks.remove(0);

        let team_count = model.teams.len();
        Self {
            model,
            order,
            tables,
            rest_score,
            rest_adjusted,
            rest_min_salary,
            rest_max_salary,
            rest_hitter_picks,
            lambda,
            incidence: model.incidence(),
            activity: vec![0.0; model.rows.len()],
            used: vec![false; model.candidate_ids.len()],
            team_hitters: vec![0; team_count],
            pitchers_facing: vec![0; team_count],
            chosen: Vec::with_capacity(model.roster_size),
            deltas: Vec::with_capacity(model.roster_size),
            salary: 0.0,
            objective: 0.0,
            best: None,
            nodes: 0,
            deadline,
            timed_out: false,
        }
    }

    /// Fill group `order[k]`, having already picked `picked` of its
    /// variables, trying sorted positions from `start` onward.
    fn descend(&mut self, k: usize, start: usize, picked: usize) {
        if self.timed_out {
            return;
        }
        self.nodes += 1;
        if self.nodes % CLOCK_CHECK_INTERVAL == 0 && Instant::now() >= self.deadline {
            self.timed_out = true;
            return;
        }

        if k == self.order.len() {
            self.evaluate_leaf();
            return;
        }

        let g = self.order[k];
        let need = self.tables[g].count - picked;
        if need == 0 {
            self.descend(k + 1, 0, 0);
            return;
        }

        let len = self.tables[g].vars.len();
        for pos in start..len {
            if len - pos < need {
                break;
            }
            // The bound only weakens as `pos` advances.
            if !self.promising(k, g, pos, need) {
                break;
            }
            let v = self.tables[g].vars[pos];
            if !self.push(v, g) {
                continue;
            }
            self.descend(k, pos + 1, picked + 1);
            self.pop(v, g);
            if self.timed_out {
                return;
            }
        }
    }

    /// Whether choosing `need` more variables of group `g` from sorted
    /// position `pos` onward could still reach a feasible, improving leaf.
    fn promising(&self, k: usize, g: usize, pos: usize, need: usize) -> bool {
        let t = &self.tables[g];

        let min_salary = self.salary + t.min_salary[need] + self.rest_min_salary[k];
        if min_salary > self.model.salary_cap + EPS {
            return false;
        }
        let max_salary = self.salary + t.max_salary[need] + self.rest_max_salary[k];
        if max_salary < self.model.salary_floor - EPS {
            return false;
        }

        let Some(best) = &self.best else {
            return true;
        };

        let plain = t.score_prefix[pos + need] - t.score_prefix[pos] + self.rest_score[k];
        let lagrangian = t.adjusted_top[need]
            + self.rest_adjusted[k]
            + self.lambda * (self.model.salary_cap - self.salary);
        let hitter_picks = self.rest_hitter_picks[k] + if t.pitching { 0 } else { need };
        let bound = self.objective + plain.min(lagrangian) + self.stack_bound(hitter_picks);

        bound > best.objective + EPS
    }

    /// Most stack bonuses still attainable with `picks` more hitters.
    fn stack_bound(&self, picks: usize) -> f64 {
        let rules = &self.model.correlation;
        if rules.stack_bonus <= 0.0 || rules.stack_min_hitters == 0 {
            return 0.0;
        }
        let mut shortfalls: Vec<usize> = self
            .team_hitters
            .iter()
            .filter(|&&h| h < rules.stack_min_hitters)
            .map(|&h| rules.stack_min_hitters - h)
            .collect();
        shortfalls.sort_unstable();

        let mut remaining = picks;
        let mut reachable = 0usize;
        for need in shortfalls {
            if need > remaining {
                break;
            }
            remaining -= need;
            reachable += 1;
        }
        reachable as f64 * rules.stack_bonus
    }

    /// Apply variable `v`. Returns false, leaving state untouched, when it
    /// would reuse a candidate or break a `≤` row.
    fn push(&mut self, v: usize, g: usize) -> bool {
        let var = &self.model.variables[v];
        if self.used[var.candidate] {
            return false;
        }

        for &(row, coef) in &self.incidence[v] {
            self.activity[row] += coef;
        }
        let overflow = self.incidence[v].iter().any(|&(row, _)| {
            let r = &self.model.rows[row];
            r.sense == Sense::Le && self.activity[row] > r.rhs + EPS
        });
        if overflow {
            for &(row, coef) in &self.incidence[v] {
                self.activity[row] -= coef;
            }
            return false;
        }

        let rules = &self.model.correlation;
        let mut delta = 0.0;
        if self.tables[g].pitching {
            if let Some(opp) = self.model.candidate_opponent[var.candidate] {
                delta -= rules.opposing_pitcher_penalty * self.team_hitters[opp] as f64;
                self.pitchers_facing[opp] += 1;
            }
        } else {
            let team = self.model.candidate_team[var.candidate];
            self.team_hitters[team] += 1;
            if rules.stack_min_hitters > 0 && self.team_hitters[team] == rules.stack_min_hitters {
                delta += rules.stack_bonus;
            }
            delta -= rules.opposing_pitcher_penalty * self.pitchers_facing[team] as f64;
        }

        self.used[var.candidate] = true;
        self.salary += var.salary;
        self.objective += var.objective + delta;
        self.chosen.push(v);
        self.deltas.push(delta);
        true
    }

    fn pop(&mut self, v: usize, g: usize) {
        let var = &self.model.variables[v];
        let delta = self.deltas.pop().unwrap_or(0.0);
        self.chosen.pop();

        if self.tables[g].pitching {
            if let Some(opp) = self.model.candidate_opponent[var.candidate] {
                self.pitchers_facing[opp] -= 1;
            }
        } else {
            self.team_hitters[self.model.candidate_team[var.candidate]] -= 1;
        }

        for &(row, coef) in &self.incidence[v] {
            self.activity[row] -= coef;
        }
        self.used[var.candidate] = false;
        self.salary -= var.salary;
        self.objective -= var.objective + delta;
    }

    fn evaluate_leaf(&mut self) {
        let feasible = self
            .model
            .rows
            .iter()
            .zip(&self.activity)
            .all(|(row, &activity)| row.satisfied_by(activity));
        if !feasible {
            return;
        }
        let improves = self
            .best
            .as_ref()
            .map_or(true, |best| self.objective > best.objective + EPS);
        if improves {
            self.best = Some(Solution { variables: self.chosen.clone(), objective: self.objective });
            // Past the deadline, the first incumbent is as far as the search goes.
            if Instant::now() >= self.deadline {
                self.timed_out = true;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Precomputation
// ---------------------------------------------------------------------------

fn group_tables(model: &Model, g: usize, lambda: f64) -> GroupTables {
    let mut vars = model.group_variables(g);
    vars.sort_by(|&a, &b| {
        let (va, vb) = (&model.variables[a], &model.variables[b]);
        vb.objective
            .total_cmp(&va.objective)
            .then(va.salary.total_cmp(&vb.salary))
            .then_with(|| model.candidate_ids[va.candidate].cmp(&model.candidate_ids[vb.candidate]))
    });

    let mut score_prefix = Vec::with_capacity(vars.len() + 1);
    score_prefix.push(0.0);
    for &v in &vars {
        let last = score_prefix.last().copied().unwrap_or(0.0);
        score_prefix.push(last + model.variables[v].objective);
    }

    let count = model.groups[g].count;
    let mut adjusted: Vec<f64> = vars
        .iter()
        .map(|&v| model.variables[v].objective - lambda * model.variables[v].salary)
        .collect();
    adjusted.sort_by(|a, b| b.total_cmp(a));
    let mut salaries: Vec<f64> = vars.iter().map(|&v| model.variables[v].salary).collect();
    salaries.sort_by(|a, b| a.total_cmp(b));

    let take = count.min(vars.len());
    GroupTables {
        adjusted_top: prefix_sums(adjusted.iter().take(take)),
        min_salary: prefix_sums(salaries.iter().take(take)),
        max_salary: prefix_sums(salaries.iter().rev().take(take)),
        vars,
        score_prefix,
        count,
        pitching: model.groups[g].is_pitching(),
    }
}

fn prefix_sums<'a>(values: impl Iterator<Item = &'a f64>) -> Vec<f64> {
    let mut out = vec![0.0];
    for v in values {
        let last = out.last().copied().unwrap_or(0.0);
        out.push(last + v);
    }
    out
}

/// Pick the salary multiplier giving the tightest root bound.
///
/// Any `λ ≥ 0` yields a valid bound; a small grid around the median
/// points-per-dollar is cheap and usually close to the best.
fn choose_lambda(model: &Model) -> f64 {
    let mut ratios: Vec<f64> = model
        .variables
        .iter()
        .filter(|v| v.salary > 0.0)
        .map(|v| v.objective / v.salary)
        .collect();
    if ratios.is_empty() {
        return 0.0;
    }
    ratios.sort_by(|a, b| a.total_cmp(b));
    let median = ratios[ratios.len() / 2];

    let root_bound = |lambda: f64| -> f64 {
        let mut total = lambda * model.salary_cap;
        for g in 0..model.groups.len() {
            let mut adjusted: Vec<f64> = model
                .variables
                .iter()
                .filter(|v| v.group == g)
                .map(|v| v.objective - lambda * v.salary)
                .collect();
            adjusted.sort_by(|a, b| b.total_cmp(a));
            total += adjusted.iter().take(model.groups[g].count).sum::<f64>();
        }
        total
    };

    [0.0, 0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 2.0]
        .iter()
        .map(|m| m * median)
        .map(|lambda| (lambda, root_bound(lambda)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(0.0, |(lambda, _)| lambda)
}
