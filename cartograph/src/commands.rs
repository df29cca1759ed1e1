use clap::{arg, command};
use url::Url;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("cartograph")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("cartograph")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("survey")
                .about(
                    "Sign in to a web application and map its pages, forms, and API traffic. \
                Writes a numbered artifact set to the output directory.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("Base URL of the target application")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-e --"email" <EMAIL>)
                        .required(false)
                        .help("Login email; omit to survey unauthenticated"),
                )
                .arg(
                    arg!(-p --"password" <PASSWORD>)
                        .required(false)
                        .help("Login password (falls back to the CARTOGRAPH_PASSWORD env var)"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Directory for run artifacts")
                        .default_value("./cartograph-output"),
                )
                .arg(
                    arg!(--"login-path" <PATH>)
                        .required(false)
                        .help("Path of the login route under the base URL")
                        .default_value("/login"),
                )
                .arg(
                    arg!(-r --"route" <PATH> ... )
                        .required(false)
                        .help("Seed route to visit; repeatable, replaces the default seed list"),
                )
                .arg(
                    arg!(--"max-attempts" <NUM>)
                        .required(false)
                        .help("Login attempts before giving up")
                        .value_parser(clap::value_parser!(u32))
                        .default_value("3"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-navigation timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("60"),
                )
                .arg(
                    arg!(--"delay-ms" <MILLIS>)
                        .required(false)
                        .help("Pause between page visits, in milliseconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("1500"),
                )
                .arg(
                    arg!(--"discovery-cap" <NUM>)
                        .required(false)
                        .help("Maximum pages queued from link discovery, beyond the seed list")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("50"),
                )
                .arg(
                    arg!(--"memory-threshold" <PERCENT>)
                        .required(false)
                        .help("Memory usage percentage that triggers warnings")
                        .value_parser(clap::value_parser!(f64))
                        .default_value("65"),
                ),
        )
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
