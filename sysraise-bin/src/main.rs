use anyhow::Context;
use anyhow::Result;
use clap::ArgMatches;
use clap::Args;
use clap::Command;
use clap::FromArgMatches;
use sysraise::catalog::default_catalog;
use sysraise::dialect::parse_dialect;
use sysraise::schedule;
use sysraise::Catalog;
use sysraise::Dialect;
use sysraise::Outcome;
use sysraise::Passes;
use sysraise::SchedulerOptions;
use sysraise::Strategy;
use tracing::Level;

/// Plan the passes that raise C++ to SystemC.
///
/// Without pass flags, a shortest pipeline from the start dialect to the goal
/// dialect is searched. With pass flags (e.g., `--if-lowering`), the given
/// pipeline is checked instead.
#[derive(Args, Debug)]
struct SysraiseArgs {
    /// Dialect of the input (a preset or a comma-separated list of constructs)
    #[arg(long, default_value = "cpp-input")]
    start: String,
    /// Dialect that the output must fit in
    #[arg(long, default_value = "systemc-output")]
    goal: String,
    /// How to search for a pipeline
    #[arg(long, value_enum, default_value_t = Strategy::DepthFirst)]
    strategy: Strategy,
    /// Maximum number of passes in a pipeline
    #[arg(long, default_value_t = SchedulerOptions::DEFAULT_MAX_DEPTH)]
    max_depth: usize,
    /// List the available passes and constructs
    #[arg(long)]
    list_passes: bool,
    /// Print debug information
    #[arg(long)]
    debug: bool,
}

fn cli(catalog: &Catalog) -> Command {
    let cli = Command::new("sysraise")
        .about("Plan the passes that raise C++ to SystemC")
        .args(sysraise::default_arguments(catalog));
    SysraiseArgs::augment_args(cli)
}

fn list(catalog: &Catalog) -> String {
    let mut lines = vec!["Passes:".to_string()];
    for pass in catalog {
        lines.push(format!("  {pass}"));
    }
    lines.push("Constructs:".to_string());
    for construct in sysraise::Construct::ALL {
        lines.push(format!("  {construct}: {}", construct.description()));
    }
    lines.push("Presets:".to_string());
    for name in sysraise::dialect::PRESETS {
        if let Some(dialect) = sysraise::dialect::preset(name) {
            lines.push(format!("  {name}: {dialect}"));
        }
    }
    lines.join("\n")
}

fn parse(which: &str, src: &str) -> Result<Dialect> {
    parse_dialect(src).with_context(|| format!("Invalid {which} dialect `{src}`"))
}

/// Produce the text to print for the given (already parsed) arguments.
fn output(matches: &ArgMatches, args: &[String], catalog: &Catalog) -> Result<String> {
    let parsed = SysraiseArgs::from_arg_matches(matches)?;
    if parsed.list_passes {
        return Ok(list(catalog));
    }
    let start = parse("start", &parsed.start)?;
    let goal = parse("goal", &parsed.goal)?;

    let passes = Passes::from_args(args, catalog);
    if !passes.is_empty() {
        let plan = catalog.replay(start, &passes)?;
        if !plan.last().is_subset(&goal) {
            anyhow::bail!(
                "Pipeline `{passes}` ends in {} which is not within {goal}",
                plan.last()
            );
        }
        return Ok(plan.to_string());
    }

    let options = SchedulerOptions::default()
        .with_strategy(parsed.strategy)
        .with_max_depth(parsed.max_depth);
    match schedule(catalog, start, goal, &options) {
        Outcome::Reached(plan) => Ok(plan.to_string()),
        Outcome::Unreachable => anyhow::bail!("Goal {goal} is unreachable from {start}"),
        Outcome::DepthExceeded { max_depth } => {
            anyhow::bail!("No pipeline from {start} to {goal} within {max_depth} passes")
        }
    }
}

fn main() -> Result<()> {
    let args = std::env::args_os()
        .map(|arg| arg.to_string_lossy().to_string())
        .collect::<Vec<String>>();
    let catalog = default_catalog()?;
    let matches = cli(&catalog).get_matches_from(&args);
    let level = if matches.get_flag("debug") {
        Level::DEBUG
    } else {
        Level::WARN
    };
    sysraise::init_subscriber(level)?;

    let result = output(&matches, &args, &catalog)?;
    println!("{result}");
    Ok(())
}
