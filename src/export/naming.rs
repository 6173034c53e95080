use crate::combine::combination::Combination;

/// Deterministic output file name for a combination.
///
/// `"{group}_{variant_stem}"` per pick in combination order, joined by `_`, with a `.png`
/// extension. Characters that are not valid in file names on common platforms become `_`.
pub fn output_file_name(combination: &Combination<'_>) -> String {
    if combination.is_empty() {
        return format!("combination_{}.png", combination.id);
    }
    let stem = combination
        .picks
        .iter()
        .map(|p| format!("{}_{}", p.group.name, p.variant.base_name()))
        .collect::<Vec<_>>()
        .join("_");
    format!("{}.png", sanitize(&stem))
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/export/naming.rs"]
mod tests;
