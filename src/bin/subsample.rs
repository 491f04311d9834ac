use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sfle::app::filters::subsample::subsample;
use sfle::config::cli::{exit_on_error, IoArgs};
use sfle::utils::validation::validate_range;

#[derive(Parser)]
#[command(name = "subsample")]
#[command(about = "Outputs a random subsample of input lines")]
struct Args {
    /// Probability with which each input line is included in output
    #[arg(short = 'f', value_name = "fraction")]
    fraction: f64,

    /// Seed for a reproducible selection
    #[arg(long)]
    seed: Option<u64>,

    #[command(flatten)]
    io: IoArgs,
}

fn main() {
    let args = Args::parse();
    args.io.init_logger();
    exit_on_error(run(&args));
}

fn run(args: &Args) -> sfle::Result<()> {
    validate_range("fraction", args.fraction, 0.0, 1.0)?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    subsample(args.io.reader()?, args.io.writer()?, args.fraction, &mut rng)?;
    Ok(())
}
