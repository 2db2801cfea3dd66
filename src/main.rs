use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, Command};
use pam_authd::{Authenticator, Config, PamAuthenticator, PamOptions};
use tracing::{debug, info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const EXIT_DENIED: i32 = 1;
const EXIT_USAGE: i32 = 2;

#[tokio::main]
async fn main() {
    let matches = command().get_matches();

    match run(&matches).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_DENIED),
        Err(e) => {
            eprintln!("pam-authd: {:#}", e);
            std::process::exit(EXIT_USAGE);
        }
    }
}

fn command() -> Command {
    Command::new("pam-authd")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Check a username and password against the host PAM stack")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("pam-authd.yml"),
        )
        .arg(
            Arg::new("generate-config")
                .short('g')
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .conflicts_with_all(["config", "user"]),
        )
        .arg(
            Arg::new("user")
                .short('u')
                .long("user")
                .value_name("NAME")
                .help("User to authenticate; the password is read from stdin")
                .required_unless_present("generate-config"),
        )
        .arg(
            Arg::new("service")
                .short('s')
                .long("service")
                .value_name("NAME")
                .help("PAM service to use instead of the configured one"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .num_args(0)
                .help("Enable verbose logging")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .num_args(0)
                .action(ArgAction::SetTrue)
                .help("Suppress all output except errors")
                .conflicts_with("verbose"),
        )
}

/// Ok(true) when authenticated, Ok(false) when denied. Every error is a
/// usage or setup problem.
async fn run(matches: &clap::ArgMatches) -> Result<bool> {
    if let Some(config_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(config_path)?;
        return Ok(true);
    }

    let config = load_config(matches)?;
    // flushes the file writer when dropped at the end of this function
    let _guard = setup_logging(&config, matches)?;

    let username = matches
        .get_one::<String>("user")
        .ok_or_else(|| anyhow!("--user is required"))?;
    let password = read_password()?;

    let options = PamOptions::from_config(&config.pam);
    info!("Authenticating '{}' against PAM service '{}'", username, options.service);

    let authenticator: Arc<dyn Authenticator> = Arc::new(PamAuthenticator::new(options)?);

    let authenticated = authenticator.authenticate(username, &password).await?;
    println!("{}", if authenticated { "authenticated" } else { "denied" });
    Ok(authenticated)
}

fn load_config(matches: &clap::ArgMatches) -> Result<Config> {
    let config_path = matches
        .get_one::<String>("config")
        .ok_or_else(|| anyhow!("missing configuration path"))?;

    let mut config = if Path::new(config_path).exists() {
        Config::load_from_file(config_path)
            .map_err(|e| anyhow!("failed to load configuration from {}: {}", config_path, e))?
    } else {
        Config::default()
    };

    if let Some(service) = matches.get_one::<String>("service") {
        config.pam.service = service.clone();
        config.validate()?;
    }

    Ok(config)
}

fn read_password() -> Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| anyhow!("cannot read password from stdin: {}", e))?;
    let password = line.strip_suffix('\n').unwrap_or(&line);
    let password = password.strip_suffix('\r').unwrap_or(password);
    debug!("Read {} byte password from stdin", password.len());
    Ok(password.to_string())
}

fn generate_default_config(path: &str) -> Result<()> {
    let config = Config::default();
    config
        .save_to_file(path)
        .map_err(|e| anyhow!("cannot write {}: {}", path, e))?;

    println!("Generated default configuration file: {}", path);
    println!("Edit this file to choose the PAM service and logging outputs.");

    Ok(())
}

fn setup_logging(config: &Config, matches: &clap::ArgMatches) -> Result<Option<WorkerGuard>> {
    let log_level = if matches.get_flag("quiet") {
        Level::ERROR
    } else {
        match matches.get_count("verbose") {
            0 => match config.logging.level.as_str() {
                "trace" => Level::TRACE,
                "debug" => Level::DEBUG,
                "info" => Level::INFO,
                "warn" => Level::WARN,
                "error" => Level::ERROR,
                _ => Level::INFO,
            },
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(log_level).into())
        .from_env_lossy();

    let console = config.logging.console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
    });

    let (file, guard) = match &config.logging.file {
        Some(path) => {
            let path = Path::new(path);
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow!("Invalid log file path: {}", path.display()))?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(file_name.to_string_lossy())
                .build(directory)
                .map_err(|e| anyhow!("cannot open log file {}: {}", path.display(), e))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    let journald = if config.logging.journald {
        Some(tracing_journald::layer().map_err(|e| anyhow!("cannot connect to journald: {}", e))?)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .with(journald)
        .try_init()?;

    Ok(guard)
}
