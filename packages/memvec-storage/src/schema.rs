pub fn render_schema() -> String {
	let init = include_str!("../../../sql/init.sql");

	expand_includes(init)
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_events.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_events.sql")),
				"tables/002_memories.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_memories.sql")),
				"tables/003_graph_nodes.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_graph_nodes.sql")),
				"tables/004_graph_edges.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_graph_edges.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

/// Splits rendered SQL into executable statements, dropping blanks and comment-only chunks.
pub(crate) fn statements(sql: &str) -> impl Iterator<Item = &str> {
	sql.split(';').map(str::trim).filter(|statement| {
		statement.lines().any(|line| {
			let line = line.trim();

			!line.is_empty() && !line.starts_with("--")
		})
	})
}
