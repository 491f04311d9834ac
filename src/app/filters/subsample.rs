use std::io::{BufRead, Write};

use rand::Rng;

use crate::utils::error::Result;

/// Copies each input line to `out` with probability `fraction`. Lines are
/// written byte for byte, terminator included. Returns the number kept.
pub fn subsample<R, W, G>(mut input: R, mut out: W, fraction: f64, rng: &mut G) -> Result<usize>
where
    R: BufRead,
    W: Write,
    G: Rng,
{
    let mut line = Vec::new();
    let mut seen = 0usize;
    let mut kept = 0usize;
    loop {
        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        seen += 1;
        // gen() is in [0, 1): fraction 1 keeps all, fraction 0 keeps none
        if rng.gen::<f64>() < fraction {
            out.write_all(&line)?;
            kept += 1;
        }
    }
    out.flush()?;
    tracing::debug!("subsample: kept {} of {} lines", kept, seen);
    Ok(kept)
}
