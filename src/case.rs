//! Naming helpers: Rust type names to resource paths and table names.

/// Last path segment of a fully qualified type name, generics stripped.
/// e.g. "my_app::models::Book" -> "Book", "crate::Wrapper<u8>" -> "Wrapper"
pub fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Convert a single identifier from CamelCase to snake_case.
/// e.g. "BookAuthor" -> "book_author", "Book" -> "book"
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Base path for a model: "/" + lowercase name + "s".
/// Pluralization is naive on purpose: "Category" -> "/categorys".
pub fn resource_path(type_name: &str) -> String {
    format!("/{}s", type_name.to_lowercase())
}

/// Default table name: snake_case name + "s".
pub fn table_name(type_name: &str) -> String {
    format!("{}s", to_snake_case(type_name))
}
