// concheap: step-through simulator for a concurrent heap language

use std::io;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;
use tracing_subscriber::EnvFilter;

use concheap::interpreter::constants::{
    DEFAULT_ATOMIC_FUEL, DEFAULT_EXPLORE_DEPTH, DEFAULT_SNAPSHOT_LIMIT, DEFAULT_STEP_BUDGET,
};
use concheap::interpreter::explore::{explore, ExploreLimits};
use concheap::interpreter::scheduler::{LeftFirst, Random, RoundRobin, Scheduler};
use concheap::interpreter::{Limits, Machine, RunResult};
use concheap::primitives::scenarios::{self, Scenario};
use concheap::ui::App;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SchedulerKind {
    Left,
    RoundRobin,
    Random,
}

#[derive(Parser)]
#[command(name = "concheap")]
#[command(about = "Step through concurrent heap programs and catch data races")]
#[command(version)]
struct Cli {
    /// Scenario to run (see --list)
    #[arg(default_value = "one-slot")]
    scenario: String,

    /// Interleaving policy for parallel branches
    #[arg(long, value_enum, default_value_t = SchedulerKind::RoundRobin)]
    scheduler: SchedulerKind,

    /// Seed for the random scheduler
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Scheduled steps before the run is abandoned
    #[arg(long, default_value_t = DEFAULT_STEP_BUDGET)]
    budget: usize,

    /// Inner steps an atomic block may take
    #[arg(long, default_value_t = DEFAULT_ATOMIC_FUEL)]
    atomic_fuel: usize,

    /// Print the run instead of opening the trace viewer
    #[arg(long, default_value_t = false)]
    headless: bool,

    /// Explore every interleaving instead of running one schedule
    #[arg(long, default_value_t = false)]
    explore: bool,

    /// Longest path followed by --explore
    #[arg(long, default_value_t = DEFAULT_EXPLORE_DEPTH)]
    depth: usize,

    /// List the available scenarios and exit
    #[arg(long, default_value_t = false)]
    list: bool,
}

fn make_scheduler(cli: &Cli) -> Box<dyn Scheduler> {
    match cli.scheduler {
        SchedulerKind::Left => Box::new(LeftFirst),
        SchedulerKind::RoundRobin => Box::new(RoundRobin::new()),
        SchedulerKind::Random => Box::new(Random::seeded(cli.seed)),
    }
}

fn describe(result: &RunResult) -> String {
    match result {
        RunResult::Completed { value, heap } => format!("completed with {} in {}", value, heap),
        RunResult::Faulted(fault) => format!("faulted: {}", fault),
        RunResult::DivergedOrBudgetExceeded { steps } => {
            format!("diverged or exceeded the budget after {} steps", steps)
        }
    }
}

fn run_exploration(scenario: Scenario, depth: usize, atomic_fuel: usize) -> ExitCode {
    let limits = ExploreLimits {
        max_depth: depth,
        atomic_fuel,
        ..ExploreLimits::default()
    };
    let result = explore(scenario.command, scenario.heap, limits);

    println!("{}: {}", scenario.name, scenario.description);
    println!(
        "{} paths, {} truncated, {} stalled{}",
        result.paths,
        result.truncated,
        result.stalled,
        if result.path_limit_hit { " (path limit hit)" } else { "" }
    );
    for (value, heap) in &result.completed {
        println!("  outcome {} with {}", value, heap);
    }
    for fault in &result.faults {
        println!("  fault: {}", fault);
    }
    if let Some(trace) = &result.counterexample {
        println!("counterexample:");
        for event in trace {
            println!("  {}", event);
        }
    }

    if result.is_fault_free() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    if cli.list {
        for name in scenarios::NAMES {
            if let Some(Ok(scenario)) = scenarios::by_name(name) {
                println!("{:<14} {}", name, scenario.description);
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let Some(scenario) = scenarios::by_name(&cli.scenario) else {
        eprintln!("Error: unknown scenario '{}'", cli.scenario);
        eprintln!("Available: {}", scenarios::NAMES.join(", "));
        return Ok(ExitCode::FAILURE);
    };
    let scenario = scenario?;

    if cli.explore {
        return Ok(run_exploration(scenario, cli.depth, cli.atomic_fuel));
    }

    let limits = Limits {
        step_budget: cli.budget,
        atomic_fuel: cli.atomic_fuel,
    };
    let title = scenario.name.to_string();
    let mut machine =
        Machine::new(scenario.command, scenario.heap, make_scheduler(&cli), limits)
            .with_trace(DEFAULT_SNAPSHOT_LIMIT)?;

    info!(scenario = %title, scheduler = %machine.scheduler_name(), "running");
    let result = machine.run();
    eprintln!("{}: {}", title, describe(&result));
    if let Some(history) = machine.snapshots() {
        eprintln!(
            "Total snapshots: {} ({} KiB of {} KiB)",
            history.len(),
            history.memory_usage() / 1024,
            history.memory_limit() / 1024
        );
    }

    if cli.headless {
        if let Some(history) = machine.snapshots() {
            for (i, event) in history.events().enumerate() {
                println!("{:>5} {}", i + 1, event);
            }
        }
        println!("{}", describe(&result));
        return Ok(if result.is_completed() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    // Rewind to the beginning for the viewer
    machine.rewind_to_start();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(machine, title);
    let res = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explore_flag_leaves_scenario_positional() {
        let cli = Cli::try_parse_from(["concheap", "--explore", "shared-list"]).unwrap();
        assert!(cli.explore);
        assert_eq!(cli.scenario, "shared-list");
        assert_eq!(cli.depth, DEFAULT_EXPLORE_DEPTH);
    }

    #[test]
    fn test_depth_and_scheduler_flags() {
        let cli = Cli::try_parse_from([
            "concheap",
            "counter",
            "--explore",
            "--depth",
            "30",
            "--scheduler",
            "random",
            "--seed",
            "9",
        ])
        .unwrap();
        assert_eq!(cli.depth, 30);
        assert_eq!(cli.scheduler, SchedulerKind::Random);
        assert_eq!(make_scheduler(&cli).name(), "random (seed 9)");
    }
}
