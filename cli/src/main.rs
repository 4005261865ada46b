use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dicegraph::config::DEFAULT_PREFS_FILE;
use dicegraph::{
    filter_arity, per_position_counts, simulate_run, sum_distribution, summary_statistics, Dice,
    DiceSetConfig, FairnessAnalyzer, FairnessReport, Preferences, Roll, RollStore,
    ValidityChecker,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Subcommand)]
enum Cmd {
    /// Append one roll to a dice set's log
    Log {
        /// Dice set name
        #[arg(long)]
        set: String,
        /// Number of dice thrown together
        #[arg(long, default_value_t = 1)]
        dice: usize,
        /// Faces per die (defaults to the preference)
        #[arg(long)]
        faces: Option<u32>,
        /// Face values, one per die
        #[arg(required = true)]
        values: Vec<u32>,
    },
    /// Clear a dice set's history
    Reset {
        #[arg(long)]
        set: String,
        #[arg(long, default_value_t = 1)]
        dice: usize,
    },
    /// List stored dice sets
    Sets {
        /// 1 for single-die sets, anything larger for multi-die sets
        #[arg(long, default_value_t = 1)]
        dice: usize,
    },
    /// Frequency and fairness statistics for a dice set
    Stats {
        #[arg(long)]
        set: String,
        #[arg(long, default_value_t = 1)]
        dice: usize,
        #[arg(long)]
        faces: Option<u32>,
        /// Significance level (defaults to the preference)
        #[arg(long)]
        alpha: Option<f64>,
        /// Emit JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Simulate fair dice and analyze the result
    Simulate {
        #[arg(long, default_value_t = 1)]
        dice: usize,
        #[arg(long)]
        faces: Option<u32>,
        /// Number of rolls
        #[arg(long, default_value_t = 30)]
        rolls: usize,
        /// RNG seed for determinism (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Save the run under this name
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        alpha: Option<f64>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List saved simulations
    Simulations,
}

#[derive(Parser)]
#[command(name = "dicegraph")]
#[command(about = "Log dice rolls and test them for fairness")]
struct Cli {
    /// Preferences file (JSON, or YAML by extension)
    #[arg(long, global = true, default_value = DEFAULT_PREFS_FILE)]
    prefs: PathBuf,
    /// Directory holding roll logs (overrides the preference)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Debug logging on stderr
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Everything `stats --json` prints for one set.
#[derive(Serialize)]
struct SetStatistics<'a> {
    set: &'a DiceSetConfig,
    report: &'a FairnessReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    per_position: Option<std::collections::BTreeMap<usize, dicegraph::FaceCounts>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sum_distribution: Option<std::collections::BTreeMap<u64, u64>>,
}

fn analyzer(prefs: &Preferences, alpha: Option<f64>) -> anyhow::Result<FairnessAnalyzer> {
    let alpha = alpha.unwrap_or(prefs.statistical_alpha);
    Ok(FairnessAnalyzer::new(alpha)?
        .with_validity(ValidityChecker::new(prefs.min_expected_per_face))?)
}

fn print_multi_die_extras(rolls: &[Roll], num_dice: usize, faces: u32) -> anyhow::Result<()> {
    let consistent = filter_arity(rolls, num_dice);
    println!();
    println!("Per-die counts");
    for (pos, counts) in per_position_counts(&consistent, faces)? {
        let row: Vec<String> = counts.iter().map(|(f, c)| format!("{f}:{c}")).collect();
        println!("  die {}: {}", pos + 1, row.join(" "));
    }
    println!();
    println!("Sum distribution");
    for (sum, count) in sum_distribution(&consistent, faces)? {
        println!("  {sum:>4}  {count}");
    }
    if let Some(summary) = summary_statistics(&consistent) {
        println!(
            "  mean {:.2}, min {}, max {}",
            summary.mean, summary.min, summary.max
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let prefs = Preferences::load(&cli.prefs)?;
    tracing::debug!(?prefs, "loaded preferences");
    let store = RollStore::new(cli.data_dir.clone().unwrap_or_else(|| prefs.data_dir.clone()));

    match cli.cmd {
        Cmd::Log {
            set,
            dice,
            faces,
            values,
        } => {
            let cfg = DiceSetConfig::new(set, dice, faces.unwrap_or(prefs.default_faces))?;
            if values.len() != dice {
                bail!("expected {} values for {} dice, got {}", dice, dice, values.len());
            }
            let roll = if dice == 1 {
                Roll::Single(values[0])
            } else {
                Roll::Set(values)
            };
            store.log_roll(&cfg, roll)?;
            let count = store.read_history(&cfg)?.len();
            println!("logged roll #{} to '{}'", count, cfg.name);
        }
        Cmd::Reset { set, dice } => {
            let cfg = DiceSetConfig::new(set, dice, prefs.default_faces)?;
            store.reset(&cfg)?;
            println!("cleared '{}'", cfg.name);
        }
        Cmd::Sets { dice } => {
            for name in store.list_sets(dice)? {
                println!("{name}");
            }
        }
        Cmd::Stats {
            set,
            dice,
            faces,
            alpha,
            json,
        } => {
            let faces = faces.unwrap_or(prefs.default_faces);
            let cfg = DiceSetConfig::new(set, dice, faces)?;
            let history = store.read_history(&cfg)?;
            let report = analyzer(&prefs, alpha)?
                .analyze(history.rolls(), faces)
                .with_context(|| format!("failed to analyze '{}'", cfg.name))?;
            if json {
                let multi = !cfg.is_single();
                let stats = SetStatistics {
                    set: &cfg,
                    report: &report,
                    per_position: if multi {
                        Some(per_position_counts(history.rolls(), faces)?)
                    } else {
                        None
                    },
                    sum_distribution: if multi {
                        Some(sum_distribution(history.rolls(), faces)?)
                    } else {
                        None
                    },
                };
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("{}", report.render_text());
                if !cfg.is_single() {
                    print_multi_die_extras(history.rolls(), dice, faces)?;
                }
            }
        }
        Cmd::Simulate {
            dice,
            faces,
            rolls,
            seed,
            name,
            alpha,
            json,
        } => {
            let faces = faces.unwrap_or(prefs.default_faces);
            let mut rng = match seed {
                Some(s) => Dice::from_seed(s),
                None => Dice::from_entropy(),
            };
            let run = simulate_run(&mut rng, rolls, dice, faces)?;
            if let Some(name) = name.as_deref() {
                let path = store.save_simulation(name, &run)?;
                eprintln!("saved simulation to {}", path.display());
            }
            let as_rolls = run.to_rolls();
            let report = analyzer(&prefs, alpha)?.analyze(&as_rolls, faces)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Simulation: {} rolls of {} {}-sided dice",
                    run.num_rolls, run.num_dice, run.faces
                );
                println!();
                println!("{}", report.render_text());
                if dice > 1 {
                    print_multi_die_extras(&as_rolls, dice, faces)?;
                }
            }
        }
        Cmd::Simulations => {
            for sim in store.list_simulations()? {
                println!(
                    "{} dice, {} faces, {} rolls - {}",
                    sim.num_dice, sim.faces, sim.num_rolls, sim.name
                );
            }
        }
    }
    Ok(())
}
