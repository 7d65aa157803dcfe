// nutsock-line: send command lines to a line-protocol server and print each reply
use clap::Parser;
use nutsock::{Timeout, TransportConfig};
use std::process;

#[derive(Parser)]
#[command(name = "nutsock-line")]
#[command(about = "Send newline-terminated commands and print one reply line for each", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    /// Server host (default: $NUTSOCK_HOST or localhost)
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Server port (default: $NUTSOCK_PORT or 3493)
    #[arg(short, long)]
    port: Option<u16>,

    /// Per-operation timeout in seconds, negative blocks forever
    #[arg(short, long, allow_negative_numbers = true, value_name = "SECS")]
    timeout: Option<i64>,

    /// Commands to send, one line each (e.g. "VER" "LIST UPS")
    #[arg(value_name = "COMMAND", required = true)]
    commands: Vec<String>,
}

impl Cli {
    fn config(&self) -> TransportConfig {
        let mut config = nutsock::default_config().clone();
        if let Some(ref host) = self.host {
            config = config.with_host(host.clone());
        }
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Timeout::from_secs(secs));
        }
        config
    }
}

fn run(config: &TransportConfig, commands: &[String]) -> nutsock::Result<()> {
    let mut transport = nutsock::open(config)?;
    for command in commands {
        tracing::debug!(%command, "sending");
        transport.write_line(command)?;
        println!("{}", transport.read_line()?);
    }
    transport.disconnect();
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let config = cli.config();

    if let Err(e) = run(&config, &cli.commands) {
        eprintln!("nutsock-line: {}:{}: {}", config.host, config.port, e);
        process::exit(1);
    }
}
