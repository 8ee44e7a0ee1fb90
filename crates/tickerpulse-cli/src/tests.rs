use std::path::PathBuf;

use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["tickerpulse"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_collect_defaults() {
    let cli = Cli::try_parse_from(["tickerpulse", "collect"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Collect {
            symbol: None,
            dry_run: false,
            report: None,
        })
    ));
}

#[test]
fn parses_collect_with_symbol_and_dry_run() {
    let cli =
        Cli::try_parse_from(["tickerpulse", "collect", "--symbol", "NVDA", "--dry-run"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Collect {
            symbol: Some(ref s),
            dry_run: true,
            ..
        }) if s == "NVDA"
    ));
}

#[test]
fn parses_collect_report_path() {
    let cli =
        Cli::try_parse_from(["tickerpulse", "collect", "--report", "out/today.csv"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Collect {
            report: Some(ref p),
            ..
        }) if *p == PathBuf::from("out/today.csv")
    ));
}

#[test]
fn parses_status_with_symbol() {
    let cli = Cli::try_parse_from(["tickerpulse", "status", "--symbol", "aapl"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Status {
            symbol: Some(ref s)
        }) if s == "aapl"
    ));
}

#[test]
fn rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["tickerpulse", "serve"]).is_err());
}
