use cartograph_core::{execute_survey, print_banner, report, FsArtifactWriter, SurveyProgressCallback};
use cartograph_engine::config::SurveyConfig;
use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber;
use url::Url;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    match chosen_command.subcommand() {
        Some(("survey", primary_command)) => handle_survey(primary_command, quiet).await,
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

async fn handle_survey(args: &ArgMatches, quiet: bool) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let url = args.get_one::<Url>("url").unwrap();
    let email = args.get_one::<String>("email");
    let password = args
        .get_one::<String>("password")
        .cloned()
        .or_else(|| std::env::var("CARTOGRAPH_PASSWORD").ok());
    let output = args.get_one::<String>("output").unwrap();
    let login_path = args.get_one::<String>("login-path").unwrap();
    let max_attempts = *args.get_one::<u32>("max-attempts").unwrap();
    let timeout = *args.get_one::<u64>("timeout").unwrap();
    let delay_ms = *args.get_one::<u64>("delay-ms").unwrap();
    let discovery_cap = *args.get_one::<usize>("discovery-cap").unwrap();
    let memory_threshold = *args.get_one::<f64>("memory-threshold").unwrap();

    let mut config = SurveyConfig::new(url.clone())
        .with_max_login_attempts(max_attempts)
        .with_navigation_timeout(Duration::from_secs(timeout))
        .with_visit_delay(Duration::from_millis(delay_ms))
        .with_discovery_cap(discovery_cap)
        .with_memory_warn_percent(memory_threshold);
    config.login_path = login_path.clone();

    match (email, password) {
        (Some(email), Some(password)) => {
            config = config.with_credentials(email.clone(), password);
        }
        (Some(_), None) => {
            eprintln!(
                "{} --email given but no password; pass --password or set CARTOGRAPH_PASSWORD",
                "✗".red().bold()
            );
            std::process::exit(1);
        }
        _ => {
            if !quiet {
                println!(
                    "{} No credentials given, surveying unauthenticated",
                    "→".yellow().bold()
                );
            }
        }
    }

    if let Some(routes) = args.get_many::<String>("route") {
        config = config.with_seed_routes(routes.cloned().collect());
    }

    let expanded_output = shellexpand::tilde(output);
    let writer = match FsArtifactWriter::create(expanded_output.as_ref()) {
        Ok(writer) => writer,
        Err(e) => {
            eprintln!("{} Cannot create output directory: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    if !quiet {
        println!("Target:  {}", url);
        println!("Output:  {}", writer.root().display());
        println!();
    }

    // Spinner fed by the survey's progress callback
    let (progress_callback, spinner): (Option<SurveyProgressCallback>, Option<ProgressBar>) =
        if quiet {
            (None, None)
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} {msg}")
                    .unwrap(),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb.set_message("Starting survey...");
            let pb_clone = pb.clone();
            let callback: SurveyProgressCallback = Arc::new(move |msg: String| {
                pb_clone.set_message(msg);
            });
            (Some(callback), Some(pb))
        };

    let outcome = execute_survey(config, &writer, progress_callback).await;

    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }

    if let Err(e) = writer.persist_run(&outcome.result, &outcome.summary) {
        eprintln!("{} Writing artifacts failed: {}", "✗".red().bold(), e);
        std::process::exit(1);
    }

    if quiet {
        println!(
            "{} pages, {} exchanges, {} errors -> {}",
            outcome.summary.total_pages,
            outcome.summary.total_exchanges,
            outcome.summary.total_errors,
            writer.root().display()
        );
    } else {
        report::print_summary(&outcome.summary);
        println!("  Artifacts: {}", writer.root().display());
    }

    if outcome.is_fatal() {
        std::process::exit(1);
    }
}
