// Tests for CLI argument parsing

use cartograph::command_argument_builder;
use url::Url;

// ============================================================================
// Survey Subcommand Tests
// ============================================================================

#[test]
fn test_survey_requires_url() {
    let result =
        command_argument_builder().try_get_matches_from(["cartograph", "survey"]);
    assert!(result.is_err());
}

#[test]
fn test_survey_rejects_invalid_url() {
    let result = command_argument_builder()
        .try_get_matches_from(["cartograph", "survey", "--url", "not a url"]);
    assert!(result.is_err());
}

#[test]
fn test_survey_minimal_invocation() {
    let matches = command_argument_builder()
        .try_get_matches_from(["cartograph", "survey", "--url", "https://app.example.com"])
        .unwrap();
    let (name, sub) = matches.subcommand().unwrap();
    assert_eq!(name, "survey");
    assert_eq!(
        sub.get_one::<Url>("url").unwrap().as_str(),
        "https://app.example.com/"
    );
}

#[test]
fn test_survey_defaults() {
    let matches = command_argument_builder()
        .try_get_matches_from(["cartograph", "survey", "-u", "https://app.example.com"])
        .unwrap();
    let (_, sub) = matches.subcommand().unwrap();
    assert_eq!(sub.get_one::<String>("output").unwrap(), "./cartograph-output");
    assert_eq!(sub.get_one::<String>("login-path").unwrap(), "/login");
    assert_eq!(*sub.get_one::<u32>("max-attempts").unwrap(), 3);
    assert_eq!(*sub.get_one::<u64>("timeout").unwrap(), 60);
    assert_eq!(*sub.get_one::<u64>("delay-ms").unwrap(), 1500);
    assert_eq!(*sub.get_one::<usize>("discovery-cap").unwrap(), 50);
    assert_eq!(*sub.get_one::<f64>("memory-threshold").unwrap(), 65.0);
}

#[test]
fn test_survey_repeatable_routes() {
    let matches = command_argument_builder()
        .try_get_matches_from([
            "cartograph",
            "survey",
            "-u",
            "https://app.example.com",
            "-r",
            "/home",
            "-r",
            "/fonts",
        ])
        .unwrap();
    let (_, sub) = matches.subcommand().unwrap();
    let routes: Vec<&String> = sub.get_many::<String>("route").unwrap().collect();
    assert_eq!(routes, vec!["/home", "/fonts"]);
}

#[test]
fn test_survey_credentials_and_overrides() {
    let matches = command_argument_builder()
        .try_get_matches_from([
            "cartograph",
            "survey",
            "-u",
            "https://app.example.com",
            "-e",
            "user@example.com",
            "-p",
            "secret",
            "--discovery-cap",
            "5",
            "--timeout",
            "10",
        ])
        .unwrap();
    let (_, sub) = matches.subcommand().unwrap();
    assert_eq!(sub.get_one::<String>("email").unwrap(), "user@example.com");
    assert_eq!(sub.get_one::<String>("password").unwrap(), "secret");
    assert_eq!(*sub.get_one::<usize>("discovery-cap").unwrap(), 5);
    assert_eq!(*sub.get_one::<u64>("timeout").unwrap(), 10);
}

// ============================================================================
// Global Flag Tests
// ============================================================================

#[test]
fn test_quiet_flag() {
    let matches = command_argument_builder()
        .try_get_matches_from(["cartograph", "-q"])
        .unwrap();
    assert!(matches.get_flag("quiet"));
}

#[test]
fn test_no_subcommand_is_allowed() {
    let matches = command_argument_builder()
        .try_get_matches_from(["cartograph"])
        .unwrap();
    assert!(matches.subcommand().is_none());
}
