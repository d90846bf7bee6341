use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::errors::AppError;
use crate::models::bar::Bar;

/// Validate the arguments of a permutation request. Shared with the
/// Monte Carlo driver so a bad configuration fails before any trial runs.
pub(crate) fn validate_args(
    bars: &[Bar],
    probability: f64,
    start_index: usize,
) -> Result<(), AppError> {
    if bars.is_empty() {
        return Err(AppError::EmptySeries);
    }
    if !(probability > 0.0 && probability <= 1.0) {
        return Err(AppError::InvalidProbability(probability));
    }
    if start_index + 1 >= bars.len() {
        return Err(AppError::NoResamplePool {
            start_index,
            bars: bars.len(),
        });
    }
    Ok(())
}

/// Produce a permuted copy of `bars` whose tail is a stationary-bootstrap
/// reconstruction of the original and whose first `start_index + 1` bars
/// are kept untouched.
///
/// The series is decomposed in log space into an overnight gap delta and
/// three intrabar deltas per bar. Two independent index walks resample
/// the pool beyond the kept prefix: one picks the (high, low, close)
/// deltas jointly per synthetic bar, the other picks the gap deltas.
/// Each synthetic bar chains off the previous synthetic close, so the
/// tail is a random walk driven by resampled increments.
///
/// With `seed: Some(_)` the output is bit-reproducible; `None` draws the
/// generator from OS entropy.
pub fn permute(
    bars: &[Bar],
    probability: f64,
    start_index: usize,
    seed: Option<u64>,
) -> Result<Vec<Bar>, AppError> {
    validate_args(bars, probability, start_index)?;

    let mut rng = match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    };

    let n = bars.len();
    let perm_index = start_index + 1;

    let log_open: Vec<f64> = bars.iter().map(|b| b.open.ln()).collect();
    let log_high: Vec<f64> = bars.iter().map(|b| b.high.ln()).collect();
    let log_low: Vec<f64> = bars.iter().map(|b| b.low.ln()).collect();
    let log_close: Vec<f64> = bars.iter().map(|b| b.close.ln()).collect();

    // Delta pools over the resampled region.
    let pool_n = n - perm_index;
    let mut pool_o = Vec::with_capacity(pool_n);
    let mut pool_h = Vec::with_capacity(pool_n);
    let mut pool_l = Vec::with_capacity(pool_n);
    let mut pool_c = Vec::with_capacity(pool_n);
    for i in perm_index..n {
        pool_o.push(log_open[i] - log_close[i - 1]);
        pool_h.push(log_high[i] - log_open[i]);
        pool_l.push(log_low[i] - log_open[i]);
        pool_c.push(log_close[i] - log_open[i]);
    }

    // Intrabar deltas share one walk (preserves their co-movement within
    // a bar); gaps get an independent walk.
    let idx_intrabar = stationary_bootstrap_indices(pool_n, probability, &mut rng);
    let idx_gap = stationary_bootstrap_indices(pool_n, probability, &mut rng);

    let shuffled_h: Vec<f64> = idx_intrabar.iter().map(|&j| pool_h[j]).collect();
    let shuffled_l: Vec<f64> = idx_intrabar.iter().map(|&j| pool_l[j]).collect();
    let shuffled_c: Vec<f64> = idx_intrabar.iter().map(|&j| pool_c[j]).collect();
    let shuffled_o: Vec<f64> = idx_gap.iter().map(|&j| pool_o[j]).collect();

    let prefix: Vec<[f64; 4]> = (0..perm_index)
        .map(|i| [log_open[i], log_high[i], log_low[i], log_close[i]])
        .collect();

    let log_bars = reconstruct(&prefix, &shuffled_o, &shuffled_h, &shuffled_l, &shuffled_c, n);

    Ok(bars
        .iter()
        .zip(log_bars.iter())
        .map(|(bar, lb)| Bar {
            datetime: bar.datetime.clone(),
            open: lb[0].exp(),
            high: lb[1].exp(),
            low: lb[2].exp(),
            close: lb[3].exp(),
        })
        .collect())
}

/// Stationary-bootstrap index walk: with probability `probability` jump
/// to a uniformly random pool position, otherwise advance by one with
/// wrap-around. Expected block length is 1/probability. The walk is
/// sequential; each index depends on the previous one.
fn stationary_bootstrap_indices(n: usize, probability: f64, rng: &mut impl Rng) -> Vec<usize> {
    let mut indices = Vec::with_capacity(n);
    let mut current = rng.gen_range(0..n);
    for _ in 0..n {
        if rng.gen::<f64>() < probability {
            current = rng.gen_range(0..n);
        } else {
            current = (current + 1) % n;
        }
        indices.push(current);
    }
    indices
}

/// Rebuild the full log-space bar matrix: the prefix is copied verbatim,
/// then each synthetic bar opens at the previous synthetic close plus a
/// gap delta and places high/low/close relative to that open.
fn reconstruct(
    prefix: &[[f64; 4]],
    shuffled_o: &[f64],
    shuffled_h: &[f64],
    shuffled_l: &[f64],
    shuffled_c: &[f64],
    n_total: usize,
) -> Vec<[f64; 4]> {
    let perm_index = prefix.len();
    let mut output = Vec::with_capacity(n_total);
    output.extend_from_slice(prefix);

    for i in perm_index..n_total {
        let k = i - perm_index;
        let open = output[i - 1][3] + shuffled_o[k];
        output.push([
            open,
            open + shuffled_h[k],
            open + shuffled_l[k],
            open + shuffled_c[k],
        ]);
    }
    output
}
