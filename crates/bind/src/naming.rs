//! Conversion between column names and record field identifiers.
//!
//! Columns are `snake_case`, optionally dot-separated for nested records
//! (`profile.user_name`). Field identifiers are `PascalCase` words
//! (`Profile.UserName`).

/// Converts a column name into a field identifier, mapping each dotted
/// segment independently.
///
/// ```rust
/// assert_eq!(sqlbind::column_to_field("xiao_mei"), "XiaoMei");
/// assert_eq!(sqlbind::column_to_field("profile.http_status"), "Profile.HttpStatus");
/// ```
#[must_use]
pub fn column_to_field(column: &str) -> String {
    column_to_field_path(column).join(".")
}

/// Converts a column name into the sequence of field identifiers it
/// addresses.
#[must_use]
pub fn column_to_field_path(column: &str) -> Vec<String> {
    if column.is_empty() {
        return Vec::new();
    }
    column.split('.').map(snake_to_pascal).collect()
}

fn snake_to_pascal(segment: &str) -> String {
    let mut field = String::with_capacity(segment.len());
    for word in segment.split('_') {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            field.extend(first.to_uppercase());
            field.push_str(chars.as_str());
        }
    }
    field
}

/// Converts a field identifier into a column name, mapping each dotted
/// segment independently.
///
/// A word boundary sits between a non-uppercase character and a following
/// uppercase one, and between two uppercase characters when the character
/// after them is not uppercase. Acronym runs stay together.
///
/// ```rust
/// assert_eq!(sqlbind::field_to_column("HTTPStatus"), "http_status");
/// assert_eq!(sqlbind::field_to_column("You123"), "you123");
/// ```
#[must_use]
pub fn field_to_column(field: &str) -> String {
    field.split('.').map(pascal_to_snake).collect::<Vec<_>>().join(".")
}

fn pascal_to_snake(segment: &str) -> String {
    let chars: Vec<char> = segment.chars().collect();
    let mut column = String::with_capacity(segment.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        column.extend(ch.to_lowercase());

        let Some(&next) = chars.get(i + 1) else {
            break;
        };
        let boundary = if ch.is_ascii_uppercase() {
            next.is_ascii_uppercase() && chars.get(i + 2).is_some_and(|c| !c.is_ascii_uppercase())
        } else {
            next.is_ascii_uppercase()
        };
        if boundary {
            column.push('_');
        }
    }
    column
}

/// Maps a list of column names to field identifiers.
#[must_use]
pub fn columns_to_fields(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|column| column_to_field(column)).collect()
}

/// Maps a list of field identifiers to column names.
#[must_use]
pub fn fields_to_columns(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|field| field_to_column(field)).collect()
}

/// Builds a comma-separated column list for `fields`, prefixing each column
/// (e.g. with a table alias such as `"t."`) and leaving out any field named
/// in `exclude`.
#[must_use]
pub fn fields_to_columns_str(fields: &[&str], prefix: &str, exclude: &[&str]) -> String {
    fields
        .iter()
        .filter(|field| !exclude.contains(field))
        .map(|field| format!("{prefix}{}", field_to_column(field)))
        .collect::<Vec<_>>()
        .join(",")
}
