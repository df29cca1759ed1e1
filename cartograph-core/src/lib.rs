pub mod artifacts;
pub mod report;
pub mod run;

pub use artifacts::FsArtifactWriter;
pub use run::{execute_survey, SurveyOutcome, SurveyProgressCallback};

use colored::Colorize;

pub fn print_banner() {
    println!();
    println!("{}", r"                 _                        _    ".bright_blue());
    println!("{}", r"  __ __ _ _ _ __| |_ ___  __ _ _ _ __ _ _| |_  ".bright_blue());
    println!("{}", r" / _/ _` | '_|  _/ _ \/ _` | '_/ _` | '_ \ ' \ ".bright_blue());
    println!("{}", r" \__\__,_|_|  \__\___/\__, |_| \__,_| .__/_||_|".bright_blue());
    println!("{}", r"                      |___/         |_|        ".bright_blue());
    println!(
        "{}",
        format!("  authenticated surface mapper v{}", env!("CARGO_PKG_VERSION")).bright_white()
    );
    println!();
}
