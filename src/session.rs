//! Line-oriented query loop.
//!
//! Each input line is `location;air_temp;snow_type;snow_moisture`. Blank lines
//! and `#` comments are skipped and `quit` ends the loop. The snapshot is
//! fetched through a [`SnapshotCache`] per query, so a cleaning run that
//! rewrites the file is visible on the next line.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, anyhow};
use log::warn;

use crate::{
    dataset::SnapshotCache,
    recommend::{Outcome, Query, Recommender},
    table,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub answered: usize,
    pub rejected: usize,
}

pub fn parse_query_line(line: &str) -> Result<Query> {
    let parts: Vec<&str> = line.split(';').map(str::trim).collect();
    let [location, air_temp, snow_type, snow_moisture] = parts.as_slice() else {
        return Err(anyhow!(
            "Expected 'location;air_temp;snow_type;snow_moisture' but found {} field(s)",
            parts.len()
        ));
    };
    if location.is_empty() {
        return Err(anyhow!("Location cannot be empty"));
    }
    let air_temp: f64 = air_temp
        .parse()
        .with_context(|| format!("Invalid air temperature '{air_temp}'"))?;
    Ok(Query {
        location: location.to_string(),
        air_temp,
        snow_type: snow_type.parse()?,
        snow_moisture: snow_moisture.parse()?,
    })
}

pub fn run<R, W>(
    cache: &mut SnapshotCache,
    recommender: &Recommender,
    input: R,
    mut output: W,
) -> Result<SessionStats>
where
    R: BufRead,
    W: Write,
{
    let mut stats = SessionStats::default();
    for line in input.lines() {
        let line = line.context("Reading query from input")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") {
            break;
        }
        let answer = parse_query_line(line).and_then(|query| {
            let dataset = cache.get()?;
            Ok(recommender.recommend(&dataset, &query))
        });
        match answer {
            Ok(Outcome::Ranked(rows)) => {
                write!(output, "{}", table::render_recommendations(&rows))?;
                stats.answered += 1;
            }
            Ok(Outcome::Diagnostic(diagnostic)) => {
                writeln!(output, "{diagnostic}")?;
                stats.answered += 1;
            }
            Err(err) => {
                warn!("Rejected query '{line}': {err:#}");
                writeln!(output, "error: {err:#}")?;
                stats.rejected += 1;
            }
        }
        output.flush()?;
    }
    Ok(stats)
}
