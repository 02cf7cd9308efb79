use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Marker stress-ng prints in front of its per-stressor metrics row.
pub const METRICS_MARKER: &str = "stress-ng: metrc:";

/// Trailing numeric tokens a metrics row must carry:
/// bogo ops, real time, usr time, sys time, ops/s (real), ops/s (cpu).
pub const REQUIRED_TOKENS: usize = 6;

static NUMERIC_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-+]?\d*\.\d+|[-+]?\d+").expect("numeric token regex"));

/// Extraction failure for a workload report line.
///
/// The positional contract is brittle by design: a token-count mismatch must
/// fail loudly here rather than misassign fields downstream.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("metrics line carries {found} numeric tokens, expected at least 6: {line:?}")]
    TooFewTokens { found: usize, line: String },
    #[error("numeric token {token:?} failed to parse")]
    BadToken {
        token: String,
        #[source]
        source: std::num::ParseFloatError,
    },
}

/// Raw timing fields pulled out of one workload report line.
///
/// The workload's own ops/sec figures are dropped at extraction time; derived
/// metrics are always recomputed from these four fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawMetrics {
    pub ops: f64,
    pub real_time: f64,
    pub usr_time: f64,
    pub sys_time: f64,
}

/// Pick the metrics report line out of captured workload output.
/// stress-ng prints a header row with the same marker, so the stressor tag is
/// required too; the last matching line wins.
pub fn find_metrics_line<'a>(output: &'a str, stressor: &str) -> Option<&'a str> {
    output
        .lines()
        .filter(|line| line.contains(METRICS_MARKER) && line.contains(stressor))
        .last()
        .map(str::trim)
}

/// Extract the last six numeric tokens of a metrics report line, in fixed
/// positional order.
pub fn extract_metrics(line: &str) -> Result<RawMetrics, ExtractError> {
    let tokens: Vec<&str> = NUMERIC_TOKEN.find_iter(line).map(|m| m.as_str()).collect();
    if tokens.len() < REQUIRED_TOKENS {
        return Err(ExtractError::TooFewTokens {
            found: tokens.len(),
            line: line.to_string(),
        });
    }

    let tail = &tokens[tokens.len() - REQUIRED_TOKENS..];
    let mut values = [0.0_f64; REQUIRED_TOKENS];
    for (slot, token) in values.iter_mut().zip(tail) {
        *slot = token.parse().map_err(|source| ExtractError::BadToken {
            token: token.to_string(),
            source,
        })?;
    }

    Ok(RawMetrics {
        ops: values[0],
        real_time: values[1],
        usr_time: values[2],
        sys_time: values[3],
    })
}
