use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sfle::app::filters::random_table::{generate, RandomTableOptions};
use sfle::config::cli::{exit_on_error, OutputArgs};
use sfle::core::table::write_rows;
use sfle::utils::validation::validate_range;

#[derive(Parser)]
#[command(name = "generate_random_table")]
#[command(about = "Generates a random tab-delimited text table")]
struct Args {
    /// Number of rows
    #[arg(short = 'r', value_name = "rows", default_value_t = 100)]
    rows: usize,

    /// Number of columns
    #[arg(short = 'c', value_name = "columns", default_value_t = 10)]
    cols: usize,

    /// Fraction of missing values
    #[arg(short = 'd', value_name = "missing", default_value_t = 0.0)]
    missing: f64,

    /// First row ID
    #[arg(short = 'f', value_name = "first", default_value_t = 0)]
    first: usize,

    /// Maximum value to output
    #[arg(short = 'x', value_name = "maximum", default_value_t = 1.0)]
    max: f64,

    /// Seed for a reproducible table
    #[arg(long)]
    seed: Option<u64>,

    #[command(flatten)]
    out: OutputArgs,
}

fn main() {
    let args = Args::parse();
    args.out.init_logger();
    exit_on_error(run(&args));
}

fn run(args: &Args) -> sfle::Result<()> {
    validate_range("missing", args.missing, 0.0, 1.0)?;
    let options = RandomTableOptions {
        rows: args.rows,
        cols: args.cols,
        missing: args.missing,
        first: args.first,
        max: args.max,
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let table = generate(&options, &mut rng)?;
    write_rows(args.out.writer()?, &table)
}
