// FILE: src/cli/mod.rs

mod config;
mod handlers;

pub use config::ConfigFile;

use crate::error::{CompilerError, Result};
use crate::server::{ServerConfig, DEFAULT_HOST, DEFAULT_PORT};
use crate::CompilerOptions;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::time::Instant;

pub struct TeraCli {
    config: ConfigFile,
    start_time: Instant,
}

impl Default for TeraCli {
    fn default() -> Self {
        Self::new()
    }
}

impl TeraCli {
    pub fn new() -> Self {
        Self {
            config: ConfigFile::default(),
            start_time: Instant::now(),
        }
    }

    /// Parse the process arguments, set up logging and run. `--help` and
    /// `--version` print and exit successfully; bad arguments exit with
    /// clap's usage error.
    pub fn run(&mut self) -> Result<()> {
        let matches = build_cli().get_matches();
        self.load_config(&matches)?;
        setup_logging(self.log_level(&matches));
        if let Some(config_path) = matches.get_one::<String>("config") {
            log::info!("Loaded configuration from {}", config_path);
        }
        self.dispatch(&matches)
    }

    /// Same as `run`, with an explicit argument list
    pub fn run_from<I, T>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = build_cli()
            .try_get_matches_from(args)
            .map_err(|e| CompilerError::InvalidConfig {
                message: e.to_string(),
            })?;
        self.run_matches(&matches)
    }

    pub fn run_matches(&mut self, matches: &ArgMatches) -> Result<()> {
        self.load_config(matches)?;
        self.dispatch(matches)
    }

    fn load_config(&mut self, matches: &ArgMatches) -> Result<()> {
        if let Some(config_path) = matches.get_one::<String>("config") {
            self.config = config::load(config_path)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, matches: &ArgMatches) -> Result<()> {
        self.start_time = Instant::now();

        if matches.get_flag("dump") {
            handlers::handle_dump(self, matches)
        } else if matches.get_flag("check") {
            handlers::handle_check(self, matches)
        } else {
            handlers::handle_serve(self, matches)
        }
    }

    fn debug_mode(&self, matches: &ArgMatches) -> bool {
        matches.get_flag("debug") || self.config.debug_mode.unwrap_or(false)
    }

    /// Level requested on the command line or in the config file. `None`
    /// leaves the level to `RUST_LOG`.
    pub fn log_level(&self, matches: &ArgMatches) -> Option<log::LevelFilter> {
        if self.debug_mode(matches) {
            return Some(log::LevelFilter::Trace);
        }
        if matches.get_flag("quiet") {
            return Some(log::LevelFilter::Warn);
        }
        match matches.get_count("verbose") {
            0 => None,
            1 => Some(log::LevelFilter::Debug),
            _ => Some(log::LevelFilter::Trace),
        }
    }

    pub fn build_compiler_options(&self, matches: &ArgMatches) -> CompilerOptions {
        let mut options = CompilerOptions::default();
        options.debug_mode = self.debug_mode(matches);
        if let Some(extension) = &self.config.import_extension {
            options.import_extension = extension.trim_start_matches('.').to_string();
        }
        options
    }

    /// Command line flags win over the config file, which wins over defaults
    pub fn build_server_config(&self, matches: &ArgMatches) -> ServerConfig {
        let host = matches
            .get_one::<String>("host")
            .cloned()
            .or_else(|| self.config.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = matches
            .get_one::<u16>("port")
            .copied()
            .or(self.config.port)
            .unwrap_or(DEFAULT_PORT);
        ServerConfig { host, port }
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }
}

pub fn build_cli() -> Command {
    Command::new(crate::NAME)
        .version(crate::VERSION)
        .about(crate::DESCRIPTION)
        .author("Tera Development Team")
        .arg(Arg::new("input").value_name("FILE").help("Entrypoint .tera file").required(true).index(1))
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .value_parser(clap::value_parser!(u16))
                .help("HTTP listen port [default: 3000]"),
        )
        .arg(Arg::new("host").long("host").value_name("ADDR").help("HTTP listen address [default: 127.0.0.1]"))
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path (.toml or .json)")
                .action(ArgAction::Set),
        )
        .arg(Arg::new("check").long("check").help("Compile only and report the result").action(ArgAction::SetTrue))
        .arg(
            Arg::new("dump")
                .long("dump")
                .help("Compile and print the route table as JSON")
                .action(ArgAction::SetTrue)
                .conflicts_with("check"),
        )
        .arg(Arg::new("debug").short('d').long("debug").help("Trace-log parsed syntax trees").action(ArgAction::SetTrue))
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase verbosity (can be used multiple times)")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only log warnings and errors")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
}

/// Initialise `env_logger`. An explicit level replaces whatever `RUST_LOG`
/// says; without one `RUST_LOG` applies, falling back to info.
pub fn setup_logging(level: Option<log::LevelFilter>) {
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(level) = effective_level(level, std::env::var_os(env_logger::DEFAULT_FILTER_ENV).is_some()) {
        builder.filter_level(level);
    }
    builder.format_timestamp_secs().init();
}

fn effective_level(requested: Option<log::LevelFilter>, env_filter_set: bool) -> Option<log::LevelFilter> {
    match requested {
        Some(level) => Some(level),
        None if env_filter_set => None,
        None => Some(log::LevelFilter::Info),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(args: &[&str]) -> ArgMatches {
        build_cli().try_get_matches_from(args).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = TeraCli::new();
        let m = matches(&["teralang", "routes.tera"]);
        assert_eq!(m.get_one::<String>("input").map(String::as_str), Some("routes.tera"));
        assert_eq!(cli.build_server_config(&m), ServerConfig::default());
        assert_eq!(cli.log_level(&m), None);
        assert!(!cli.build_compiler_options(&m).debug_mode);
    }

    #[test]
    fn test_port_flag() {
        let cli = TeraCli::new();
        let m = matches(&["teralang", "-p", "8080", "routes.tera"]);
        assert_eq!(cli.build_server_config(&m).port, 8080);

        let m = matches(&["teralang", "routes.tera", "--port", "9090"]);
        assert_eq!(cli.build_server_config(&m).port, 9090);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(build_cli().try_get_matches_from(["teralang", "-p", "http", "x.tera"]).is_err());
        assert!(build_cli().try_get_matches_from(["teralang", "-p", "70000", "x.tera"]).is_err());
    }

    #[test]
    fn test_help_is_not_an_error_kind() {
        let err = build_cli().try_get_matches_from(["teralang", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        let err = build_cli().try_get_matches_from(["teralang", "-h"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let err = build_cli().try_get_matches_from(["teralang"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut cli = TeraCli::new();
        cli.config = ConfigFile {
            host: Some("0.0.0.0".to_string()),
            port: Some(4000),
            import_extension: Some(".routes".to_string()),
            debug_mode: Some(true),
        };

        let m = matches(&["teralang", "routes.tera"]);
        assert_eq!(
            cli.build_server_config(&m),
            ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 4000
            }
        );
        let options = cli.build_compiler_options(&m);
        assert!(options.debug_mode);
        assert_eq!(options.import_extension, "routes");

        let m = matches(&["teralang", "routes.tera", "-p", "5000", "--host", "localhost"]);
        assert_eq!(
            cli.build_server_config(&m),
            ServerConfig {
                host: "localhost".to_string(),
                port: 5000
            }
        );
    }

    #[test]
    fn test_verbosity() {
        let cli = TeraCli::new();
        let level = |args: &[&str]| cli.log_level(&matches(args));
        assert_eq!(level(&["teralang", "-v", "x.tera"]), Some(log::LevelFilter::Debug));
        assert_eq!(level(&["teralang", "-vvv", "x.tera"]), Some(log::LevelFilter::Trace));
        assert_eq!(level(&["teralang", "-q", "x.tera"]), Some(log::LevelFilter::Warn));
    }

    #[test]
    fn test_debug_flag_enables_tree_tracing() {
        let cli = TeraCli::new();
        let m = matches(&["teralang", "-d", "x.tera"]);
        assert_eq!(cli.log_level(&m), Some(log::LevelFilter::Trace));
        assert!(cli.build_compiler_options(&m).debug_mode);

        let m = matches(&["teralang", "-q", "--debug", "x.tera"]);
        assert_eq!(cli.log_level(&m), Some(log::LevelFilter::Trace));
    }

    #[test]
    fn test_config_debug_mode_enables_tree_tracing() {
        let mut cli = TeraCli::new();
        cli.config.debug_mode = Some(true);
        assert_eq!(
            cli.log_level(&matches(&["teralang", "x.tera"])),
            Some(log::LevelFilter::Trace)
        );
    }

    #[test]
    fn test_rust_log_applies_without_flags() {
        assert_eq!(effective_level(None, true), None);
        assert_eq!(effective_level(None, false), Some(log::LevelFilter::Info));
        assert_eq!(
            effective_level(Some(log::LevelFilter::Trace), true),
            Some(log::LevelFilter::Trace)
        );
    }

    #[test]
    fn test_check_and_dump_conflict() {
        assert!(build_cli()
            .try_get_matches_from(["teralang", "--check", "--dump", "x.tera"])
            .is_err());
    }

    #[test]
    fn test_run_from_reports_compile_errors() {
        let mut cli = TeraCli::new();
        let err = cli
            .run_from(["teralang", "--check", "/definitely/not/here.tera"])
            .unwrap_err();
        assert!(matches!(err, CompilerError::Io { .. }));
    }
}
