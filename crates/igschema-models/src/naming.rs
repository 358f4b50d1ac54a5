/// Field name of the identifier in stored documents.
pub const STORAGE_ID: &str = "_id";

/// Field name of the identifier inside the models.
pub const INTERNAL_ID: &str = "id";

/// snake_case → camelCase, the same rule serde applies for
/// `rename_all = "camelCase"`: drop each underscore and upper-case the
/// character that follows it.
pub fn to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
