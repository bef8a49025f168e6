/// Canonical form of a CSV header: no BOM, no unit suffix, lowercase, snake_case.
pub(crate) fn normalize_header(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let without_unit = match cleaned.find('(') {
        Some(index) if cleaned.trim_end().ends_with(')') => &cleaned[..index],
        _ => cleaned.as_str(),
    };
    let collapsed = without_unit
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    collapsed.to_ascii_lowercase()
}
