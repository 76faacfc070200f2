use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use core::time::Duration;
use jobfetch::{LoadFactor, RunConfig, WorkerCap, WorkerPlan, endpoint_url};
use std::path::PathBuf;

/// Command-line interface for the `jobfetch` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file in the working directory is loaded first).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "jobfetch",
    version,
    about = "Harvest job identifiers from an HTTP endpoint with a bounded worker pool"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Issue one GET per job index and write the harvested identifiers.
    Fetch(FetchArgs),
    /// Run the demo job server.
    Serve(ServeArgs),
    /// Write a fresh dataset of random job identifiers.
    Generate(GenerateArgs),
    /// Compare an output document against a dataset.
    Validate(ValidateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Number of requests to make, one per job index in `[0, N)`.
    ///
    /// Environment variable: `NUM_REQUESTS`
    #[arg(long, env = "NUM_REQUESTS", default_value_t = 2000)]
    pub num_requests: usize,

    /// Host of the job endpoint.
    ///
    /// Environment variable: `HOST`
    #[arg(long, env = "HOST", default_value_t = String::from("127.0.0.1"))]
    pub host: String,

    /// Port of the job endpoint.
    ///
    /// Environment variable: `PORT`
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// URL path under which jobs are served; the job index is appended.
    ///
    /// Environment variable: `RESOURCE_PATH`
    #[arg(long, env = "RESOURCE_PATH", default_value_t = String::from("getjobdetails/"))]
    pub resource_path: String,

    /// Per-request timeout, in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 60.0)]
    pub request_timeout: f64,

    /// Upper bound on concurrent workers. Zero or negative disables the cap.
    ///
    /// Environment variable: `MAX_THREADS`
    #[arg(long, env = "MAX_THREADS", default_value_t = 500, allow_negative_numbers = true)]
    pub max_threads: i64,

    /// Workers per request before the cap is applied (`1.0` = one worker per
    /// request).
    ///
    /// Environment variable: `LOAD_FACTOR`
    #[arg(long, env = "LOAD_FACTOR", default_value_t = 1.0)]
    pub load_factor: f64,

    /// Destination of the output document.
    ///
    /// Environment variable: `OUTPUT_FILE`
    #[arg(long, env = "OUTPUT_FILE", default_value = "output.json")]
    pub output_file: PathBuf,
}

impl TryFrom<FetchArgs> for RunConfig {
    type Error = anyhow::Error;

    fn try_from(args: FetchArgs) -> Result<Self, Self::Error> {
        if args.num_requests == 0 {
            bail!("NUM_REQUESTS must be greater than 0");
        }

        let request_timeout = match Duration::try_from_secs_f64(args.request_timeout) {
            Ok(timeout) if !timeout.is_zero() => timeout,
            _ => bail!(
                "REQUEST_TIMEOUT must be a positive number of seconds (got {})",
                args.request_timeout
            ),
        };

        let load_factor = LoadFactor::new(args.load_factor)?;

        Ok(Self {
            base_url: endpoint_url(&args.host, args.port, &args.resource_path),
            num_requests: args.num_requests,
            plan: WorkerPlan::new(load_factor, WorkerCap::from_max_threads(args.max_threads)),
            request_timeout,
            output_file: args.output_file,
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind the server to.
    ///
    /// Environment variable: `HOST`
    #[arg(long, env = "HOST", default_value_t = String::from("127.0.0.1"))]
    pub host: String,

    /// Port to listen on.
    ///
    /// Environment variable: `PORT`
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Number of jobs to generate when the dataset file is missing.
    ///
    /// Environment variable: `MAX_JOBS`
    #[arg(long, env = "MAX_JOBS", default_value_t = 2000)]
    pub max_jobs: u64,

    /// Minimum artificial delay per request, in seconds.
    ///
    /// Environment variable: `DELAY_MIN`
    #[arg(long, env = "DELAY_MIN", default_value_t = 1.0)]
    pub delay_min: f64,

    /// Maximum artificial delay per request, in seconds.
    ///
    /// Environment variable: `DELAY_MAX`
    #[arg(long, env = "DELAY_MAX", default_value_t = 10.0)]
    pub delay_max: f64,

    /// Dataset file served by the endpoint; generated if missing.
    ///
    /// Environment variable: `INPUT_FILE`
    #[arg(long, env = "INPUT_FILE", default_value = "jobDetails.json")]
    pub input_file: PathBuf,

    /// URL path under which jobs are served.
    ///
    /// Environment variable: `RESOURCE_PATH`
    #[arg(long, env = "RESOURCE_PATH", default_value_t = String::from("getjobdetails/"))]
    pub resource_path: String,
}

/// Inclusive range from which each request's artificial delay is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    min: f64,
    max: f64,
}

impl DelayRange {
    pub fn new(min: f64, max: f64) -> anyhow::Result<Self> {
        if !(min.is_finite() && max.is_finite()) || min < 0.0 {
            bail!("DELAY_MIN and DELAY_MAX must be finite and non-negative");
        }
        if min > max {
            bail!("DELAY_MIN ({min}) must not exceed DELAY_MAX ({max})");
        }
        Ok(Self { min, max })
    }

    #[cfg(test)]
    pub const fn none() -> Self {
        Self { min: 0.0, max: 0.0 }
    }

    /// Draws a delay uniformly from `[min, max]`.
    pub fn sample(&self) -> Duration {
        use rand::Rng;

        if self.max <= 0.0 {
            return Duration::ZERO;
        }
        let secs = rand::rng().random_range(self.min..=self.max);
        Duration::from_secs_f64(secs)
    }
}

#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub addr: String,
    pub max_jobs: u64,
    pub delay: DelayRange,
    pub input_file: PathBuf,
    pub resource_path: String,
}

impl TryFrom<ServeArgs> for ServeConfig {
    type Error = anyhow::Error;

    fn try_from(args: ServeArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            addr: format!("{}:{}", args.host, args.port),
            max_jobs: args.max_jobs,
            delay: DelayRange::new(args.delay_min, args.delay_max)?,
            input_file: args.input_file,
            resource_path: args.resource_path,
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Number of jobs to generate.
    ///
    /// Environment variable: `MAX_JOBS`
    #[arg(long, env = "MAX_JOBS", default_value_t = 2000)]
    pub max_jobs: u64,

    /// Dataset file to write (overwritten if present).
    ///
    /// Environment variable: `INPUT_FILE`
    #[arg(long, env = "INPUT_FILE", default_value = "jobDetails.json")]
    pub input_file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Output document produced by `fetch`.
    ///
    /// Environment variable: `OUTPUT_FILE`
    #[arg(long, env = "OUTPUT_FILE", default_value = "output.json")]
    pub output_file: PathBuf,

    /// Dataset the server was started with.
    ///
    /// Environment variable: `INPUT_FILE`
    #[arg(long, env = "INPUT_FILE", default_value = "jobDetails.json")]
    pub input_file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch_args(extra: &[&str]) -> FetchArgs {
        let mut argv = vec!["jobfetch", "fetch"];
        argv.extend_from_slice(extra);
        match CliArgs::try_parse_from(argv).unwrap().command {
            Command::Fetch(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn negative_max_threads_disables_cap() {
        let config =
            RunConfig::try_from(fetch_args(&["--num-requests", "50", "--max-threads", "-1"]))
                .unwrap();
        assert_eq!(config.plan.cap, WorkerCap::Unlimited);
        assert_eq!(config.plan.effective_workers(50).unwrap(), 50);
    }

    #[test]
    fn max_threads_caps_workers() {
        let config =
            RunConfig::try_from(fetch_args(&["--num-requests", "50", "--max-threads", "5"]))
                .unwrap();
        assert_eq!(config.plan.effective_workers(50).unwrap(), 5);
    }

    #[test]
    fn composes_base_url() {
        let config = RunConfig::try_from(fetch_args(&[
            "--host",
            "10.0.0.1",
            "--port",
            "9000",
            "--resource-path",
            "/jobs/",
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://10.0.0.1:9000/jobs");
    }

    #[test]
    fn rejects_zero_requests_and_bad_timeout() {
        assert!(RunConfig::try_from(fetch_args(&["--num-requests", "0"])).is_err());
        assert!(RunConfig::try_from(fetch_args(&["--request-timeout", "0"])).is_err());
        assert!(RunConfig::try_from(fetch_args(&["--load-factor", "0"])).is_err());
    }

    #[test]
    fn delay_range_validation() {
        assert!(DelayRange::new(2.0, 1.0).is_err());
        assert!(DelayRange::new(-1.0, 1.0).is_err());
        let fixed = DelayRange::new(0.5, 0.5).unwrap();
        assert_eq!(fixed.sample(), Duration::from_millis(500));
        assert_eq!(DelayRange::none().sample(), Duration::ZERO);

        let range = DelayRange::new(0.1, 0.2).unwrap();
        let d = range.sample();
        assert!(d >= Duration::from_millis(99) && d <= Duration::from_millis(201));
    }
}
