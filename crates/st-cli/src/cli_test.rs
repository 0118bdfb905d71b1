use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_migrate_defaults_to_latest() {
    let cli = Cli::try_parse_from(["strata", "migrate"]).unwrap();
    match cli.command {
        Commands::Migrate(args) => {
            assert_eq!(args.target, "latest");
            assert!(!args.dry_run);
        }
        other => panic!("unexpected command: {other:?}"),
    }
    assert_eq!(cli.global.project_dir, ".");
    assert_eq!(cli.global.verbosity_override(), None);
}

#[test]
fn test_execute_parses_direction_and_force() {
    let cli = Cli::try_parse_from([
        "strata",
        "execute",
        "20200101000000",
        "down",
        "--force",
        "--dry-run",
    ])
    .unwrap();
    match cli.command {
        Commands::Execute(args) => {
            assert_eq!(args.version, "20200101000000");
            assert_eq!(args.direction, DirectionArg::Down);
            assert!(args.force);
            assert!(args.dry_run);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["strata", "status", "-q", "-p", "/tmp/project", "-t", "ci"])
        .unwrap();
    assert_eq!(cli.global.verbosity_override(), Some(false));
    assert_eq!(cli.global.project_dir, "/tmp/project");
    assert_eq!(cli.global.target.as_deref(), Some("ci"));
}

#[test]
fn test_verbose_conflicts_with_quiet() {
    assert!(Cli::try_parse_from(["strata", "-v", "-q", "status"]).is_err());
}

#[test]
fn test_version_requires_known_op() {
    let cli = Cli::try_parse_from(["strata", "version", "20200101000000", "delete"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Version(VersionArgs {
            op: VersionOpArg::Delete,
            ..
        })
    ));
    assert!(Cli::try_parse_from(["strata", "version", "20200101000000", "toggle"]).is_err());
}
