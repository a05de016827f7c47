//! Planning pass sequences between dialects.
//!
//! The scheduler searches the graph whose nodes are dialects and whose edges
//! are passes. The goal is not a single node but every dialect that is a
//! subset of the goal dialect.
//!
//! Only passes that make progress are followed: at dialect `D` a pass must
//! be applicable and must eliminate at least one construct of
//! `D & !goal`. A catalog that can only be solved by first running a pass
//! that eliminates nothing unwanted (for example, to introduce a construct
//! that a later pass requires) is therefore reported as unreachable.

use crate::catalog::Catalog;
use crate::dialect::Dialect;
use crate::transform::Passes;
use crate::transformation::Transformation;
use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::fmt::Display;
use tracing::debug;
use tracing::info;
use tracing::warn;

fn spaces(indent: usize) -> String {
    "  ".repeat(indent)
}

/// How the dialect graph is explored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Strategy {
    /// Memoized recursive search that, at every dialect, keeps the shortest
    /// completion and stops at the first pass (in catalog order) that
    /// reaches the goal directly.
    #[default]
    DepthFirst,
    /// Level-by-level search with a global visited set.
    BreadthFirst,
}

impl Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::DepthFirst => write!(f, "depth-first"),
            Strategy::BreadthFirst => write!(f, "breadth-first"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerOptions {
    strategy: Strategy,
    max_depth: usize,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        SchedulerOptions {
            strategy: Strategy::default(),
            max_depth: SchedulerOptions::DEFAULT_MAX_DEPTH,
        }
    }
}

impl SchedulerOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
    /// The maximum number of passes in a plan.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// One pass of a plan together with the dialect it leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pass: Transformation,
    dialect: Dialect,
}

impl Step {
    pub fn new(pass: Transformation, dialect: Dialect) -> Step {
        Step { pass, dialect }
    }
    pub fn pass(&self) -> &Transformation {
        &self.pass
    }
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }
}

/// A sequence of passes starting at some dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    start: Dialect,
    steps: Vec<Step>,
}

impl Plan {
    pub fn new(start: Dialect) -> Plan {
        Plan {
            start,
            steps: vec![],
        }
    }
    fn from_steps(start: Dialect, steps: Vec<Step>) -> Plan {
        Plan { start, steps }
    }
    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }
    pub fn start(&self) -> Dialect {
        self.start
    }
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
    /// The dialect after the last step.
    pub fn last(&self) -> Dialect {
        self.steps.last().map_or(self.start, |step| step.dialect)
    }
    pub fn len(&self) -> usize {
        self.steps.len()
    }
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
    pub fn pass_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.pass.name()).collect()
    }
    /// The start dialect followed by the dialect after every step.
    pub fn dialects(&self) -> Vec<Dialect> {
        let mut dialects = vec![self.start];
        dialects.extend(self.steps.iter().map(|step| step.dialect));
        dialects
    }
    /// The plan as a pipeline that can be handed to [crate::run].
    pub fn passes(&self) -> Passes {
        Passes::from_vec(self.pass_names())
    }
}

impl Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "start {}", self.start)?;
        for step in &self.steps {
            write!(f, "\n{} -> {}", step.pass.name(), step.dialect)?;
        }
        Ok(())
    }
}

/// The result of [schedule].
///
/// Not finding a plan is an ordinary outcome; it is up to the caller whether
/// that is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reached(Plan),
    /// No progressing sequence of passes, of any length, reaches the goal.
    Unreachable,
    /// The goal is reachable, but only with more than `max_depth` passes.
    DepthExceeded { max_depth: usize },
}

impl Outcome {
    pub fn is_reached(&self) -> bool {
        matches!(self, Outcome::Reached(_))
    }
    pub fn plan(&self) -> Option<&Plan> {
        match self {
            Outcome::Reached(plan) => Some(plan),
            _ => None,
        }
    }
    /// Success flag, pass names, and intermediate dialects (starting with
    /// the start dialect). The lists are empty when no plan was found.
    pub fn into_parts(self) -> (bool, Vec<String>, Vec<Dialect>) {
        match self {
            Outcome::Reached(plan) => {
                let names = plan.pass_names().iter().map(|n| n.to_string()).collect();
                (true, names, plan.dialects())
            }
            _ => (false, vec![], vec![]),
        }
    }
}

/// Passes that are applicable to `dialect` and remove something the goal
/// does not permit, in catalog order.
fn useful_passes<'a>(
    catalog: &'a Catalog,
    dialect: Dialect,
    goal: Dialect,
) -> impl Iterator<Item = &'a Transformation> {
    let want = dialect & !goal;
    catalog
        .iter()
        .filter(move |pass| dialect.can_apply(pass) && (pass.eliminates() & want).any())
}

/// Whether some sequence of useful passes, of any length, leads from `start`
/// into the goal.
///
/// Every dialect is expanded once, so this terminates on any catalog.
fn reaches_goal(catalog: &Catalog, start: Dialect, goal: Dialect) -> bool {
    let mut visited: HashSet<Dialect> = HashSet::from([start]);
    let mut worklist = vec![start];
    while let Some(dialect) = worklist.pop() {
        for pass in useful_passes(catalog, dialect, goal) {
            let next = dialect.apply(pass);
            if next <= goal {
                return true;
            }
            if visited.insert(next) {
                worklist.push(next);
            }
        }
    }
    false
}

/// Length and first pass of the best completion from a dialect.
type Completion<'a> = Option<(usize, &'a Transformation)>;

struct DepthFirst<'a> {
    catalog: &'a Catalog,
    goal: Dialect,
    max_depth: usize,
    /// Keyed by dialect and the number of passes still allowed.
    memo: HashMap<(Dialect, usize), Completion<'a>>,
}

impl<'a> DepthFirst<'a> {
    /// Shortest completion from `dialect` that uses at most `budget` passes.
    ///
    /// Each dialect and budget pair is expanded once. Revisiting a dialect
    /// always costs a smaller budget, so cycles bottom out at zero.
    fn search(&mut self, dialect: Dialect, budget: usize) -> Completion<'a> {
        if let Some(known) = self.memo.get(&(dialect, budget)) {
            return *known;
        }
        let depth = self.max_depth - budget;
        let mut best: Completion<'a> = None;
        if budget == 0 {
            debug!("{}Cut off at {dialect}", spaces(depth));
        } else {
            for pass in useful_passes(self.catalog, dialect, self.goal) {
                let next = dialect.apply(pass);
                debug!("{}{} -> {next}", spaces(depth), pass.name());
                if next <= self.goal {
                    debug!("{}--> Reached goal", spaces(depth));
                    best = Some((1, pass));
                    break;
                }
                let Some((len, _)) = self.search(next, budget - 1) else {
                    continue;
                };
                let shorter = match best {
                    Some((shortest, _)) => len + 1 < shortest,
                    None => true,
                };
                if shorter {
                    best = Some((len + 1, pass));
                }
            }
        }
        self.memo.insert((dialect, budget), best);
        best
    }

    /// Follow the memoized first passes from `start` into the goal.
    fn plan(&self, start: Dialect) -> Plan {
        let mut plan = Plan::new(start);
        let mut dialect = start;
        let mut budget = self.max_depth;
        while let Some((_, pass)) = self.memo.get(&(dialect, budget)).copied().flatten() {
            dialect = dialect.apply(pass);
            plan.push(Step::new(pass.clone(), dialect));
            if dialect <= self.goal {
                break;
            }
            budget -= 1;
        }
        plan
    }
}

fn depth_first(
    catalog: &Catalog,
    start: Dialect,
    goal: Dialect,
    max_depth: usize,
) -> Option<Plan> {
    let mut search = DepthFirst {
        catalog,
        goal,
        max_depth,
        memo: HashMap::new(),
    };
    search.search(start, max_depth)?;
    Some(search.plan(start))
}

fn breadth_first(
    catalog: &Catalog,
    start: Dialect,
    goal: Dialect,
    max_depth: usize,
) -> Option<Plan> {
    let mut visited: HashSet<Dialect> = HashSet::from([start]);
    let mut parents: HashMap<Dialect, (Dialect, &Transformation)> = HashMap::new();
    let mut frontier = vec![start];
    for depth in 0..max_depth {
        let mut next_frontier = vec![];
        for dialect in frontier {
            for pass in useful_passes(catalog, dialect, goal) {
                let next = dialect.apply(pass);
                debug!("{}{dialect} --{}--> {next}", spaces(depth), pass.name());
                if next <= goal {
                    let mut steps = vec![Step::new(pass.clone(), next)];
                    let mut current = dialect;
                    while let Some((previous, pass)) = parents.get(&current) {
                        steps.push(Step::new((*pass).clone(), current));
                        current = *previous;
                    }
                    steps.reverse();
                    return Some(Plan::from_steps(start, steps));
                }
                if visited.insert(next) {
                    parents.insert(next, (dialect, pass));
                    next_frontier.push(next);
                }
            }
        }
        if next_frontier.is_empty() {
            return None;
        }
        frontier = next_frontier;
    }
    None
}

/// Find a shortest sequence of passes from `start` to a subset of `goal`.
///
/// Ties between equally short plans are broken by catalog order. When
/// `start` already satisfies the goal, the plan is empty.
pub fn schedule(
    catalog: &Catalog,
    start: Dialect,
    goal: Dialect,
    options: &SchedulerOptions,
) -> Outcome {
    info!(
        "Scheduling {start} -> {goal} ({}, max depth {})",
        options.strategy, options.max_depth
    );
    if start <= goal {
        return Outcome::Reached(Plan::new(start));
    }
    if !reaches_goal(catalog, start, goal) {
        info!("Goal {goal} is unreachable from {start}");
        return Outcome::Unreachable;
    }
    let plan = match options.strategy {
        Strategy::DepthFirst => depth_first(catalog, start, goal, options.max_depth),
        Strategy::BreadthFirst => breadth_first(catalog, start, goal, options.max_depth),
    };
    match plan {
        Some(plan) => {
            info!("Found plan with {} passes", plan.len());
            Outcome::Reached(plan)
        }
        None => {
            warn!(
                "Goal {goal} is reachable from {start}, but not within {} passes",
                options.max_depth
            );
            Outcome::DepthExceeded {
                max_depth: options.max_depth,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;
    use crate::construct::Construct::*;
    use crate::construct::ConstructSet;
    use indoc::indoc;

    fn scenario() -> (Catalog, Dialect, Dialect) {
        let catalog = default_catalog().unwrap();
        let start = Dialect::from([LocalVariable, NestedIf, GcseUnopt, LoopUnopt]);
        let goal = Dialect::from([CondBranch]);
        (catalog, start, goal)
    }

    #[test]
    fn test_depth_first_scenario() {
        let (catalog, start, goal) = scenario();
        let outcome = schedule(&catalog, start, goal, &SchedulerOptions::default());
        let plan = outcome.plan().unwrap();
        assert_eq!(
            plan.pass_names(),
            vec![
                "loop-induction",
                "gcse-elimination",
                "if-lowering",
                "staticise-locals"
            ]
        );
        assert_eq!(
            plan.dialects(),
            vec![
                start,
                Dialect::from([LocalVariable, NestedIf, GcseUnopt]),
                Dialect::from([LocalVariable, NestedIf]),
                Dialect::from([LocalVariable, CondBranch]),
                Dialect::from([CondBranch]),
            ]
        );
    }

    #[test]
    fn test_breadth_first_scenario() {
        let (catalog, start, goal) = scenario();
        let options = SchedulerOptions::default().with_strategy(Strategy::BreadthFirst);
        let outcome = schedule(&catalog, start, goal, &options);
        let plan = outcome.plan().unwrap();
        assert_eq!(
            plan.pass_names(),
            vec![
                "loop-induction",
                "gcse-elimination",
                "if-lowering",
                "staticise-locals"
            ]
        );
    }

    #[test]
    fn test_first_direct_completion_wins() {
        // Both passes reach the goal in one step; the first one is kept.
        let a = Transformation::new(
            "drop-classes",
            Dialect::universal(),
            ConstructSet::empty(),
            ConstructSet::from([CppClass]),
        )
        .unwrap();
        let b = Transformation::new(
            "modularise-everything",
            Dialect::universal(),
            ConstructSet::empty(),
            ConstructSet::from([CppClass, NestedIf]),
        )
        .unwrap();
        let catalog = Catalog::from_vec(vec![a, b]).unwrap();
        let start = Dialect::from([CppClass]);
        for strategy in [Strategy::DepthFirst, Strategy::BreadthFirst] {
            let options = SchedulerOptions::default().with_strategy(strategy);
            let outcome = schedule(&catalog, start, Dialect::empty(), &options);
            assert_eq!(outcome.plan().unwrap().pass_names(), vec!["drop-classes"]);
        }
    }

    #[test]
    fn test_max_depth() {
        let (catalog, start, goal) = scenario();
        for strategy in [Strategy::DepthFirst, Strategy::BreadthFirst] {
            let options = SchedulerOptions::default()
                .with_strategy(strategy)
                .with_max_depth(3);
            let outcome = schedule(&catalog, start, goal, &options);
            assert_eq!(outcome, Outcome::DepthExceeded { max_depth: 3 });

            let options = options.with_max_depth(4);
            let outcome = schedule(&catalog, start, goal, &options);
            assert_eq!(outcome.plan().map(Plan::len), Some(4));
        }
    }

    #[test]
    fn test_dead_end_at_max_depth_is_unreachable() {
        // Nothing eliminates cpp-class, so stopping there cuts nothing off.
        let to_class = Transformation::new(
            "to-class",
            Dialect::universal(),
            ConstructSet::from([CppClass]),
            ConstructSet::from([LocalVariable]),
        )
        .unwrap();
        let catalog = Catalog::from_vec(vec![to_class]).unwrap();
        let start = Dialect::from([LocalVariable]);
        for strategy in [Strategy::DepthFirst, Strategy::BreadthFirst] {
            let options = SchedulerOptions::default()
                .with_strategy(strategy)
                .with_max_depth(1);
            let outcome = schedule(&catalog, start, Dialect::empty(), &options);
            assert_eq!(outcome, Outcome::Unreachable);

            let outcome = schedule(&catalog, start, Dialect::empty(), &options.with_max_depth(0));
            assert_eq!(outcome, Outcome::Unreachable);
        }
    }

    #[test]
    fn test_into_parts() {
        let (catalog, start, goal) = scenario();
        let (success, names, dialects) =
            schedule(&catalog, start, goal, &SchedulerOptions::default()).into_parts();
        assert!(success);
        assert_eq!(names.len(), 4);
        assert_eq!(dialects.len(), 5);
        assert_eq!(dialects[0], start);

        let (success, names, dialects) = Outcome::Unreachable.into_parts();
        assert!(!success);
        assert!(names.is_empty() && dialects.is_empty());
    }

    #[test]
    fn test_plan_display() {
        let (catalog, _, goal) = scenario();
        let start = Dialect::from([NestedIf]);
        let outcome = schedule(&catalog, start, goal, &SchedulerOptions::default());
        let plan = outcome.plan().unwrap();
        let expected = indoc! {"
        start {nested-if}
        if-lowering -> {local-variable, cond-branch}
        staticise-locals -> {cond-branch}"
        };
        assert_eq!(plan.to_string(), expected);
    }
}
