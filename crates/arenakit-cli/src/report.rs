use arenakit_host::ArenaHost;

/// Human-readable listing of every registered arena and victory kind
pub fn describe_types(host: &ArenaHost) -> Vec<String> {
    let arenas = host.arenas();
    let victories = host.victories();
    let mut lines = Vec::new();

    lines.push(format!("Arena kinds ({}):", arenas.registry().len()));
    for token in arenas.registry().list() {
        lines.push(format!(
            "  {:<14} [{}] matches: {}",
            token.name(),
            token.owner(),
            arenas.compatible_names(token)
        ));
    }

    lines.push(format!("Victory kinds ({}):", victories.registry().len()));
    for token in victories.registry().list() {
        let marker = if token == victories.default_type() {
            " (default)"
        } else {
            ""
        };
        lines.push(format!("  {:<14} [{}]{}", token.name(), token.owner(), marker));
    }

    if !host.loaded_extensions().is_empty() {
        lines.push("Extensions:".to_string());
        for ext in host.loaded_extensions() {
            lines.push(format!("  {} ({}) {}", ext.name, ext.id, ext.description));
        }
    }

    lines
}
