use crate::catalog::Catalog;
use crate::dialect::Dialect;
use crate::init_subscriber;
use crate::schedule;
use crate::Outcome;
use crate::Plan;
use crate::SchedulerOptions;
use std::panic::Location;
use tracing::info;

pub struct Tester;

impl Tester {
    /// Initialize the subscriber for the tests.
    ///
    /// Cannot pass options, since the tests run concurrently.
    pub fn init_tracing() {
        let level = tracing::Level::INFO;
        match init_subscriber(level) {
            Ok(_) => (),
            Err(_e) => (),
        }
    }
    fn point_to_missing_line(expected: &str, index: usize) -> String {
        let mut result = String::new();
        result.push_str("A line is missing from the output:\n");
        result.push_str("```");
        for (i, line) in expected.lines().enumerate() {
            if i == index {
                let msg = format!("{line}   <== missing");
                result.push_str(&format!("\n{msg}"));
            } else {
                result.push_str(&format!("\n{line}"));
            }
        }
        result.push_str("\n```");
        result
    }
    /// Compare line by line, ignoring leading and trailing whitespace of the
    /// whole text.
    pub fn check_lines_exact(actual: &str, expected: &str, caller: &Location<'_>) {
        let actual = actual.trim().lines().collect::<Vec<_>>();
        let expected = expected.trim().lines().collect::<Vec<_>>();
        for (i, (actual_line, expected_line)) in actual.iter().zip(&expected).enumerate() {
            assert_eq!(actual_line, expected_line, "line {i}, called from {caller}");
        }
        assert_eq!(
            actual.len(),
            expected.len(),
            "number of lines differs, called from {caller}"
        );
    }
    /// Check whether the expected lines are present in the actual output.
    ///
    /// The actual output may contain additional lines that are not in the expected output.
    pub fn check_lines_contain(actual: &str, expected: &str, caller: &Location<'_>) {
        let actual = actual.trim();
        let expected = expected.trim();
        let mut actual_index = 0;
        'outer: for (i, expected_line) in expected.lines().enumerate() {
            let expected_line = expected_line.trim();
            // If not skipping these, an empty line will match any line (which
            // can then cause the next expected line to be reported as missing).
            if expected_line.is_empty() {
                continue;
            }
            for (j, actual_line) in actual.lines().enumerate().skip(actual_index) {
                if actual_line.contains(expected_line) {
                    actual_index = j + 1;
                    continue 'outer;
                }
            }
            let msg = Self::point_to_missing_line(expected, i);
            panic!("{msg}\nwhen called from {caller}");
        }
    }
    /// Schedule and return the plan, panicking if there is none.
    pub fn schedule(
        catalog: &Catalog,
        start: Dialect,
        goal: Dialect,
        options: &SchedulerOptions,
    ) -> Plan {
        let outcome = schedule(catalog, start, goal, options);
        match outcome {
            Outcome::Reached(plan) => {
                info!("Plan:\n```\n{plan}\n```\n");
                plan
            }
            other => panic!("Expected a plan from {start} to {goal}, got {other:?}"),
        }
    }
    /// Replay the plan from its start and check every step.
    ///
    /// Every pass must be applicable to the dialect before it, the recorded
    /// dialects must be exactly what applying the passes produces, and the
    /// last dialect must be within `goal`.
    #[track_caller]
    pub fn verify(plan: &Plan, goal: Dialect) {
        let caller = Location::caller();
        let mut dialect = plan.start();
        for (i, step) in plan.steps().iter().enumerate() {
            let pass = step.pass();
            assert!(
                dialect.can_apply(pass),
                "step {i}: {} is not applicable to {dialect}; called from {caller}",
                pass.name()
            );
            dialect = dialect.apply(pass);
            assert_eq!(
                dialect,
                step.dialect(),
                "step {i}: recorded dialect differs after {}; called from {caller}",
                pass.name()
            );
        }
        assert_eq!(dialect, plan.last(), "called from {caller}");
        assert!(
            dialect <= goal,
            "final dialect {dialect} is not within {goal}; called from {caller}"
        );
    }
}
