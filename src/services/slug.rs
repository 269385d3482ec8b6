use slug::slugify;

/// Human readable path segment for an event name.
pub fn generate_slug(title: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        "event".to_string()
    } else if slug.len() > 80 {
        slug[..80].trim_end_matches('-').to_string()
    } else {
        slug
    }
}

pub fn validate_slug(slug: &str) -> bool {
    if slug.is_empty() || slug.len() > 200 {
        return false;
    }
    slug.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
