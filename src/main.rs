//! multiping - concurrent ICMP connectivity check
//!
//! Prints one monitoring-plugin line on stdout and exits with the plugin
//! status code: 0 OK, 1 WARNING, 2 CRITICAL, 3 UNKNOWN.

use clap::{error::ErrorKind, Parser};
use multiping::{
    app::App,
    cli::Cli,
    config::{display_config_summary, load_config, validate_config, EnvManager, ValidationLevel},
    error::{ErrorReporter, Result},
    models::Status,
    PKG_NAME,
};
use std::process;

#[tokio::main]
async fn main() {
    // A panic must still look like UNKNOWN to the monitoring system
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("{}: internal error: {}", PKG_NAME, panic_info);
        process::exit(Status::Unknown.exit_code());
    }));

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => Status::Unknown.exit_code(),
            };
            let _ = e.print();
            process::exit(code);
        }
    };

    if cli.env_example {
        print!("{}", EnvManager::create_example_env_content());
        return;
    }

    let reporter = ErrorReporter::new(cli.use_colors(), cli.verbose);

    match run_application(cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            reporter.report_error(&e);
            process::exit(e.exit_code());
        }
    }
}

/// Main application logic, returning the plugin exit code
async fn run_application(cli: Cli) -> Result<i32> {
    let app = App::new(load_config(cli)?);
    let config = app.config();
    let logger = app.loggers().create_logger("APP").await;

    if config.debug {
        logger
            .debug(&format!("{} v{} starting", PKG_NAME, multiping::VERSION))
            .field("session", app.loggers().session_id())
            .log()
            .await;
        for line in display_config_summary(config).lines() {
            logger.debug(line).log().await;
        }
    }

    for warning in validate_config(config)? {
        let entry = match warning.level {
            ValidationLevel::Info => logger.info(&warning.message),
            ValidationLevel::Warning => logger.warn(&warning.message),
        };
        entry.field("advisory", warning.level.as_str()).log().await;
    }

    let report = match app.run().await {
        Ok(report) => report,
        Err(e) => {
            if config.debug {
                app.loggers().create_error_logger().log_error(&e, Some("probe run"), None).await;
            }
            return Err(e);
        }
    };

    if let Some(table) = &report.verbose {
        eprint!("{}", table);
    }
    println!("{}", report.rendered);

    Ok(report.exit_code())
}
