//! Pass scheduling for a C++ to SystemC raising compiler.
//!
//! The compiler moves a program through a series of semantics-preserving
//! rewrites. C++ as written by people contains classes, nested `if`s, local
//! variables, and so on, whereas the SystemC back end only accepts a much
//! smaller set of idioms. Each rewrite pass removes some of these idioms and,
//! as a side effect, may introduce others. For example, lowering nested `if`
//! statements to flat conditional branches removes the nested `if`s but
//! introduces local variables for the branch conditions.
//!
//! This crate decides in which order to run the passes. Every pass declares
//! three [ConstructSet]s:
//!
//! - the dialect it accepts (`allowed`),
//! - the constructs it may introduce,
//! - the constructs it eliminates.
//!
//! Given a [Catalog] of such passes, a start dialect and a goal dialect,
//! [schedule()] finds a shortest sequence of passes that moves the program
//! from the start into the goal. The actual rewrites are not done here;
//! the plan is handed to an external engine via [PassDispatch] and [run].
//!
//! ```
//! use sysraise::catalog::default_catalog;
//! use sysraise::construct::Construct::*;
//! use sysraise::schedule;
//! use sysraise::Dialect;
//! use sysraise::SchedulerOptions;
//!
//! let catalog = default_catalog().unwrap();
//! let start = Dialect::from([NestedIf, LocalVariable]);
//! let goal = Dialect::from([CondBranch]);
//! let outcome = schedule(&catalog, start, goal, &SchedulerOptions::default());
//! let plan = outcome.plan().unwrap();
//! assert_eq!(plan.pass_names(), vec!["if-lowering", "staticise-locals"]);
//! assert!(plan.last() <= goal);
//! ```

pub mod catalog;
pub mod construct;
pub mod dialect;
pub mod schedule;
#[cfg(feature = "test-utils")]
pub mod tester;
mod transform;
pub mod transformation;

pub use catalog::Catalog;
pub use construct::Construct;
pub use construct::ConstructSet;
pub use dialect::Dialect;
pub use schedule::schedule;
pub use schedule::Outcome;
pub use schedule::Plan;
pub use schedule::SchedulerOptions;
pub use schedule::Strategy;
pub use transform::default_arguments;
pub use transform::init_subscriber;
pub use transform::run;
pub use transform::PassDispatch;
pub use transform::Passes;
pub use transform::RewriteResult;
pub use transform::RunOptions;
pub use transform::SinglePass;
pub use transformation::Transformation;
