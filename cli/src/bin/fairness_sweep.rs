use clap::Parser;
use dicegraph::{simulate, simulate_weighted, Dice, FairnessAnalyzer, Roll};

#[derive(Parser)]
#[command(name = "fairness-sweep")]
#[command(about = "Monte Carlo check of the fairness test on fair or loaded dice")]
struct Args {
    /// Number of independent simulated histories
    #[arg(long, default_value_t = 200)]
    trials: u32,

    /// Rolls per history
    #[arg(long, default_value_t = 600)]
    rolls: usize,

    /// Dice per roll
    #[arg(long, default_value_t = 1)]
    dice: usize,

    /// Faces per die
    #[arg(long, default_value_t = 6)]
    faces: u32,

    /// Face to load (1-based); omit for a fair die
    #[arg(long)]
    bias_face: Option<u32>,

    /// Relative weight of the loaded face (others weigh 1)
    #[arg(long, default_value_t = 1.5)]
    bias: f64,

    /// Significance level
    #[arg(long, default_value_t = 0.05)]
    alpha: f64,

    /// RNG base seed (trial i uses seed+i)
    #[arg(long, default_value_t = 12345)]
    seed: u64,
}

fn weights_for(args: &Args) -> anyhow::Result<Option<Vec<f64>>> {
    let Some(face) = args.bias_face else {
        return Ok(None);
    };
    if face < 1 || face > args.faces {
        anyhow::bail!("--bias-face must be within 1..={}", args.faces);
    }
    let mut weights = vec![1.0; args.faces as usize];
    weights[(face - 1) as usize] = args.bias;
    Ok(Some(weights))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let analyzer = FairnessAnalyzer::new(args.alpha)?;
    let weights = weights_for(&args)?;

    let mut judged_fair = 0u32;
    let mut judged_unfair = 0u32;
    let mut undetermined = 0u32;
    let mut p_values: Vec<f64> = Vec::with_capacity(args.trials as usize);

    for i in 0..args.trials {
        let trial_seed = args.seed.wrapping_add(i as u64);
        let mut dice = Dice::from_seed(trial_seed);
        let raw = match &weights {
            Some(w) => simulate_weighted(&mut dice, args.rolls, args.dice, w)?,
            None => simulate(&mut dice, args.rolls, args.dice, args.faces)?,
        };
        let rolls: Vec<Roll> = raw.into_iter().map(Roll::Set).collect();
        let report = analyzer.analyze(&rolls, args.faces)?;
        match report.is_fair() {
            Some(true) => judged_fair += 1,
            Some(false) => judged_unfair += 1,
            None => undetermined += 1,
        }
        if let Some(p) = report.fairness_test.p_value {
            p_values.push(p);
        }
    }

    p_values.sort_by(f64::total_cmp);
    let decided = judged_fair + judged_unfair;
    let unfair_rate = if decided == 0 {
        0.0
    } else {
        judged_unfair as f64 / decided as f64
    };
    let median_p = if p_values.is_empty() {
        None
    } else {
        let m = p_values.len() / 2;
        Some(if p_values.len() % 2 == 1 {
            p_values[m]
        } else {
            (p_values[m - 1] + p_values[m]) / 2.0
        })
    };

    println!("fairness-sweep results");
    println!("----------------------");
    println!("trials:             {}", args.trials);
    println!(
        "dice:               {} x d{} ({} rolls each)",
        args.dice, args.faces, args.rolls
    );
    match args.bias_face {
        Some(face) => println!("loaded face:        {} (weight {})", face, args.bias),
        None => println!("loaded face:        none"),
    }
    println!("alpha:              {}", args.alpha);
    println!();
    println!("judged fair:        {}", judged_fair);
    println!("judged unfair:      {}", judged_unfair);
    println!("undetermined:       {}", undetermined);
    println!("unfair rate:        {:.1}%", unfair_rate * 100.0);
    match median_p {
        Some(p) => println!("median p-value:     {:.4}", p),
        None => println!("median p-value:     n/a"),
    }

    Ok(())
}
