use crate::catalog::Catalog;
use crate::schedule::Plan;
use crate::transformation::Transformation;
use anyhow::Context;
use anyhow::Result;
use clap::Arg;
use clap::ArgAction;
use std::fmt;
use std::fmt::Display;
use tracing::info;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;

/// The name of a single pass in a pipeline (e.g., `--if-lowering`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinglePass {
    pass: String,
}

impl Display for SinglePass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pass)
    }
}

impl SinglePass {
    pub fn new(pass: &str) -> SinglePass {
        let pass = pass.strip_prefix("--").unwrap_or(pass);
        SinglePass {
            pass: pass.to_string(),
        }
    }
}

/// An ordered pipeline of [SinglePass]es.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Passes {
    passes: Vec<SinglePass>,
}

impl Display for Passes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.passes
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<String>>()
                .join(" ")
        )
    }
}

impl Passes {
    pub fn from_vec(passes: Vec<&str>) -> Passes {
        Passes {
            passes: passes.iter().map(|p| SinglePass::new(p)).collect(),
        }
    }
    /// Extract the passes (`--<name>` for every pass in the catalog) from the
    /// given command line arguments, keeping their order.
    pub fn from_args<I, S>(args: I, catalog: &Catalog) -> Passes
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut passes = vec![];
        for arg in args {
            let arg = arg.as_ref();
            if let Some(name) = arg.strip_prefix("--") {
                if catalog.get(name).is_some() {
                    passes.push(SinglePass::new(name));
                }
            }
        }
        Passes { passes }
    }
    pub fn vec(&self) -> &Vec<SinglePass> {
        &self.passes
    }
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

/// Whether running a pass changed the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteResult {
    Changed,
    Unchanged,
}

impl RewriteResult {
    pub fn is_changed(&self) -> bool {
        matches!(self, RewriteResult::Changed)
    }
}

/// Interface to the engine that performs the actual rewrites.
///
/// The scheduler only decides the order of the passes. Downstream crates
/// implement this trait to execute a pass, keyed by [Transformation::name],
/// on their own program representation.
pub trait PassDispatch {
    type Program;
    fn dispatch(program: &mut Self::Program, pass: &Transformation) -> Result<RewriteResult>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    print_dialect_before_all: bool,
}

impl RunOptions {
    pub fn set_print_dialect_before_all(&mut self, value: bool) {
        self.print_dialect_before_all = value;
    }
    pub fn print_dialect_before_all(&self) -> bool {
        self.print_dialect_before_all
    }
}

/// Initialize logging with the given level.
pub fn init_subscriber(level: Level) -> Result<(), SetGlobalDefaultError> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .with_test_writer()
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}

/// One flag per pass in the catalog (e.g., `--if-lowering`).
///
/// A flag may be repeated to run its pass more than once; the pipeline order
/// comes from [Passes::from_args].
///
/// `--debug` is not included to allow downstream projects to handle the
/// logging differently.
pub fn default_arguments(catalog: &Catalog) -> Vec<Arg> {
    catalog
        .iter()
        .map(|pass| {
            let help = format!(
                "Run {}; eliminates {}, introduces {}",
                pass.name(),
                pass.eliminates(),
                pass.introduces()
            );
            Arg::new(pass.name().to_string())
                .long(pass.name().to_string())
                .help(help)
                .action(ArgAction::Count)
        })
        .collect()
}

/// Execute the passes of `plan` on `program`, in order.
///
/// The result is [RewriteResult::Changed] if at least one pass changed the
/// program.
pub fn run<T: PassDispatch>(
    program: &mut T::Program,
    plan: &Plan,
    options: &RunOptions,
) -> Result<RewriteResult> {
    let mut result = RewriteResult::Unchanged;
    let mut dialect = plan.start();
    for step in plan.steps() {
        let pass = step.pass();
        if options.print_dialect_before_all() {
            info!("Dialect before {}: {}", pass.name(), dialect);
        }
        let new_result = T::dispatch(program, pass)
            .with_context(|| format!("Pass {} failed", pass.name()))?;
        info!("Ran {} ({:?})", pass.name(), new_result);
        if new_result.is_changed() {
            result = new_result;
        }
        dialect = step.dialect();
    }
    Ok(result)
}
