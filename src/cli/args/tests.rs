use super::*;
use clap::CommandFactory;

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn parser_accepts_global_flags_after_subcommand() {
    let parsed = Cli::try_parse_from([
        "upm",
        "list",
        "--lang",
        "elisp-cask",
        "--format",
        "json",
        "--lockfile",
    ])
    .expect("list with global flags should parse");

    assert_eq!(parsed.global.lang.as_deref(), Some("elisp-cask"));
    assert_eq!(parsed.global.format, OutputFormat::Json);
    assert!(matches!(parsed.command, Command::List { lockfile: true }));
}

#[test]
fn parser_keeps_package_spec_words_together() {
    let parsed = Cli::try_parse_from(["upm", "add", "--no-install", "requests ^2.31", "flask"])
        .expect("add should parse");

    match parsed.command {
        Command::Add {
            packages,
            guess,
            no_install,
        } => {
            assert_eq!(packages, vec!["requests ^2.31", "flask"]);
            assert!(!guess);
            assert!(no_install);
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn parser_requires_remove_names() {
    assert!(Cli::try_parse_from(["upm", "remove"]).is_err());
}

#[test]
fn parser_rejects_quiet_with_verbose() {
    assert!(Cli::try_parse_from(["upm", "-q", "-v", "backends"]).is_err());
}

#[test]
fn parser_rejects_unknown_format() {
    assert!(Cli::try_parse_from(["upm", "--format", "xml", "backends"]).is_err());
}
