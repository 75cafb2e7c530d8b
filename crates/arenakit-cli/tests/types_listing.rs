use arenakit_cli::{Classic, describe_types};
use arenakit_host::ArenaHost;

#[test]
fn test_listing_includes_sentinels_and_extension_kinds() {
    let mut host = ArenaHost::new();
    host.load_extension(Box::new(Classic)).unwrap();

    let lines = describe_types(&host);
    assert_eq!(lines[0], "Arena kinds (6):");
    assert!(lines[1].starts_with("  ANY"));
    assert!(lines[2].starts_with("  VERSUS"));

    let skirmish = lines
        .iter()
        .find(|line| line.trim_start().starts_with("Skirmish"))
        .unwrap();
    assert!(skirmish.contains("[classic]"));
    assert!(skirmish.ends_with("matches: Skirmish, Arena, Battleground"));

    assert!(lines.contains(&"Victory kinds (2):".to_string()));
    assert!(
        lines
            .iter()
            .any(|line| line.contains("LASTMANSTANDING") && line.ends_with("(default)"))
    );
    assert!(lines.iter().any(|line| line.contains("Classic Arenas (classic)")));
}

#[test]
fn test_listing_without_extensions() {
    let host = ArenaHost::new();
    let lines = describe_types(&host);
    assert_eq!(
        lines,
        vec![
            "Arena kinds (2):".to_string(),
            format!("  {:<14} [arenakit] matches: ANY", "ANY"),
            format!("  {:<14} [arenakit] matches: VERSUS", "VERSUS"),
            "Victory kinds (1):".to_string(),
            format!("  {:<14} [arenakit] (default)", "LASTMANSTANDING"),
        ]
    );
}
