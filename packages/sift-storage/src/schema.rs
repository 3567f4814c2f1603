pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		match trimmed.strip_prefix("\\ir ").map(str::trim) {
			Some("tables/001_search_results.sql") =>
				out.push_str(include_str!("../../../sql/tables/001_search_results.sql")),
			Some("tables/002_search_history.sql") =>
				out.push_str(include_str!("../../../sql/tables/002_search_history.sql")),
			_ => out.push_str(line),
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn expands_every_table() {
		let sql = render_schema();

		assert!(sql.contains("CREATE TABLE IF NOT EXISTS search_results"));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS search_history"));
		assert!(!sql.contains("\\ir "));
	}

	#[test]
	fn unknown_include_is_kept_verbatim() {
		let sql = expand_includes("BEGIN;\n\\ir tables/999_missing.sql\nCOMMIT;\n");

		assert_eq!(sql, "BEGIN;\n\\ir tables/999_missing.sql\nCOMMIT;\n");
	}
}
