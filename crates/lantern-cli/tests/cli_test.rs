use clap::Parser;
use lantern_auth::{Confidence, SessionStatus};
use lantern_cli::{describe_status, init_config, load_config, read_identifiers, Cli, Command};
use std::fs;
use tempfile::TempDir;

const SESSION_ID: &str = "1234567890:AbCdEfGhIjKl:12:AYc";

#[test]
fn test_parse_scrape_command() {
    let cli = Cli::try_parse_from([
        "lantern",
        "scrape",
        "--session-id",
        SESSION_ID,
        "--caller",
        "team-a",
        "alice",
        "@bob",
    ])
    .expect("valid arguments");

    let Command::Scrape(args) = cli.command else {
        panic!("expected scrape command");
    };
    assert_eq!(args.session.session_id, SESSION_ID);
    assert!(args.session.csrf_token.is_none());
    assert_eq!(args.caller.as_deref(), Some("team-a"));
    assert_eq!(args.identifiers, vec!["alice", "@bob"]);
}

#[test]
fn test_parse_verify_with_global_config() {
    let cli = Cli::try_parse_from([
        "lantern",
        "verify",
        "--session-id",
        SESSION_ID,
        "--csrf-token",
        "tok",
        "--config",
        "/tmp/lantern.toml",
    ])
    .expect("valid arguments");

    assert_eq!(
        cli.config.as_deref(),
        Some(std::path::Path::new("/tmp/lantern.toml"))
    );
    assert!(matches!(cli.command, Command::Verify(ref a) if a.csrf_token.as_deref() == Some("tok")));
}

#[test]
fn test_read_identifiers_from_file_and_args() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let input = temp_dir.path().join("handles.txt");
    fs::write(&input, "# team accounts\nalice\n\n bob , carol\n").expect("write input");

    let ids = read_identifiers(Some(input.as_path()), &["dave,erin".to_string()]).expect("identifiers");

    assert_eq!(ids, vec!["alice", "bob", "carol", "dave", "erin"]);
}

#[test]
fn test_read_identifiers_requires_input() {
    assert!(read_identifiers(None, &[]).is_err());
    assert!(read_identifiers(None, &[" , ".to_string()]).is_err());
}

#[test]
fn test_load_config_from_path() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = temp_dir.path().join("config.toml");
    fs::write(
        &path,
        "[scraping]\nmax_concurrent_workers = 5\n\n[platform]\nbase_url = \"https://platform.test\"\n",
    )
    .expect("write config");

    let config = load_config(Some(path.as_path())).expect("load config");

    assert_eq!(config.scraping.max_concurrent_workers, 5);
    assert_eq!(config.scraping.max_retries, 3);
}

#[test]
fn test_load_config_rejects_invalid_values() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "[scraping]\nmax_concurrent_workers = 0\n").expect("write config");

    assert!(load_config(Some(path.as_path())).is_err());
}

#[test]
fn test_describe_status() {
    assert_eq!(
        describe_status(SessionStatus::Valid(Confidence::High)),
        "valid (high confidence)"
    );
    assert_eq!(describe_status(SessionStatus::Expired), "expired");
}

#[test]
fn test_init_writes_loadable_defaults() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = temp_dir.path().join("lantern").join("config.toml");

    let written = init_config(Some(path.as_path()), false).expect("init config");
    assert_eq!(written, path);

    let config = load_config(Some(path.as_path())).expect("load written config");
    assert_eq!(config.scraping.max_concurrent_workers, 3);
    assert_eq!(config.quota.max_requests, 50);
}

#[test]
fn test_init_keeps_existing_file_without_force() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "[scraping]\nmax_retries = 9\n").expect("write config");

    assert!(init_config(Some(path.as_path()), false).is_err());
    assert!(fs::read_to_string(&path).expect("read").contains("max_retries = 9"));

    init_config(Some(path.as_path()), true).expect("forced init");
    assert!(!fs::read_to_string(&path).expect("read").contains("max_retries = 9"));
}

#[test]
fn test_parse_init_command() {
    let cli = Cli::try_parse_from(["lantern", "init", "--force"]).expect("valid arguments");
    assert!(matches!(cli.command, Command::Init(ref a) if a.force));
}
