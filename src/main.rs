mod config;
mod logger;
mod sink;

use std::io;
use std::process::ExitCode;

use kan_vod_core::{HttpClient, Router, VodError};
use tracing::{error, info};

use config::read_config;
use sink::JsonLinesSink;

/// `kan-vod <plugin-url> <handle> [<?paramstring>]`, as passed by the host.
struct Invocation {
    plugin_url: String,
    handle: i32,
    paramstring: String,
}

impl Invocation {
    fn from_args(args: &[String]) -> Result<Self, VodError> {
        let plugin_url = args
            .get(1)
            .cloned()
            .ok_or_else(|| VodError::invalid_request("missing plugin url"))?;
        let handle = args
            .get(2)
            .ok_or_else(|| VodError::invalid_request("missing plugin handle"))?
            .parse::<i32>()
            .map_err(|e| VodError::invalid_request(format!("bad plugin handle: {e}")))?;
        let paramstring = args.get(3).cloned().unwrap_or_default();
        Ok(Self { plugin_url, handle, paramstring })
    }
}

fn run(invocation: &Invocation, cfg: &config::AppConfig) -> Result<(), VodError> {
    let client = HttpClient::new(&cfg.core)?;
    let stdout = io::stdout();
    let mut sink = JsonLinesSink::new(stdout.lock(), invocation.handle);
    Router::new(&cfg.core, &client, &mut sink, &invocation.plugin_url).dispatch(&invocation.paramstring)
}

fn main() -> ExitCode {
    let cfg = match read_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("could not read config, using defaults: {e}");
            config::AppConfig::default()
        }
    };
    logger::init(&cfg);

    let args: Vec<String> = std::env::args().collect();
    let invocation = match Invocation::from_args(&args) {
        Ok(invocation) => invocation,
        Err(e) => {
            error!(error = %e, "bad invocation");
            eprintln!("{e}\nusage: kan-vod <plugin-url> <handle> [<?paramstring>]");
            return ExitCode::FAILURE;
        }
    };
    info!(params = %invocation.paramstring, handle = invocation.handle, "invoked");

    match run(&invocation, &cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, params = %invocation.paramstring, "invocation failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
