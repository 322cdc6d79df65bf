use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(about, long_about = None)]
pub struct LoadCheckScenarioCli {
    /// Base URL of the service under test, for example `http://localhost:8080`
    ///
    /// Defaults to the target configured by the scenario.
    #[clap(short, long)]
    pub target_url: Option<String>,

    /// The number of virtual users to run
    #[clap(long)]
    pub vus: Option<usize>,

    /// Assign a behaviour to a number of virtual users. Specify the behaviour and number of virtual
    /// users to assign it to in the format `behaviour:count`. For example `--behaviour=browse:5`.
    ///
    /// Specifying the count is optional and will default to 1.
    ///
    /// You can specify multiple behaviours by using the flag multiple times. For example `--behaviour=browse:5 --behaviour=search:5`.
    ///
    /// The total assigned must not exceed the number of virtual users. Any remaining virtual users
    /// are assigned the default behaviour.
    #[clap(long, short, value_parser = parse_vu_behaviour)]
    pub behaviour: Vec<(String, usize)>,

    /// How long to run for, such as `10s`, `5m` or `1h30m`. A bare number is read as seconds.
    #[clap(long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Run as a soak test, ignoring any configured duration and continuing until stopped
    #[clap(long, default_value = "false")]
    pub soak: bool,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,

    /// Where to send operation and check records
    #[clap(long, value_enum, default_value_t = ReporterOpt::InMemory)]
    pub reporter: ReporterOpt,

    /// Directory for the `influx-file` reporter output
    #[clap(long, default_value = "influx")]
    pub influx_dir: PathBuf,

    /// Give up on a request after this many seconds
    #[clap(long, default_value = "60")]
    pub request_timeout_s: u64,

    /// Identifier for this run, generated when not set
    #[clap(long)]
    pub run_id: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ReporterOpt {
    /// Print summary tables of requests and checks at the end of the run
    #[default]
    InMemory,
    /// Write records in the InfluxDB line protocol to `--influx-dir`
    InfluxFile,
    /// Discard all records
    Noop,
}

impl Default for LoadCheckScenarioCli {
    fn default() -> Self {
        Self {
            target_url: None,
            vus: None,
            behaviour: Vec::new(),
            duration: None,
            soak: false,
            no_progress: false,
            reporter: ReporterOpt::default(),
            influx_dir: PathBuf::from("influx"),
            request_timeout_s: 60,
            run_id: None,
        }
    }
}

fn parse_vu_behaviour(s: &str) -> anyhow::Result<(String, usize)> {
    let mut parts = s.split(':');
    let name = parts
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or(anyhow::anyhow!("No name specified for behaviour"))?;

    let count = match parts.next() {
        Some(count) => count
            .parse::<usize>()
            .map_err(|e| anyhow::anyhow!("Invalid count for behaviour {name}: {e}"))?,
        None => 1,
    };

    Ok((name, count))
}

/// Parse a span such as `250ms`, `10s`, `5m` or `1h30m`. A bare number is read as seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Duration cannot be empty".to_string());
    }

    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            return Err(format!("Expected a number in duration '{s}'"));
        }
        let value = rest[..digits]
            .parse::<u64>()
            .map_err(|e| format!("Invalid number in duration '{s}': {e}"))?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        total += match unit {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value * 60),
            "h" => Duration::from_secs(value * 3600),
            "" => return Err(format!("Missing unit in duration '{s}'")),
            other => {
                return Err(format!(
                    "Unknown unit '{other}' in duration '{s}', use ms, s, m or h"
                ))
            }
        };
    }

    Ok(total)
}
