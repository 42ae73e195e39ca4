pub fn render_schema() -> &'static str {
	include_str!("../../../sql/init.sql")
}

/// Splits the schema script into executable statements.
pub fn statements(sql: &str) -> impl Iterator<Item = &str> {
	sql.split(';').map(str::trim).filter(|statement| !statement.is_empty())
}
