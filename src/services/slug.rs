use rand::distributions::Alphanumeric;
use rand::Rng;
use slug::slugify;

pub const SLUG_SUFFIX_LENGTH: usize = 6;
const FALLBACK_BASE: &str = "post";

pub fn generate_slug(title: &str) -> String {
    slugify(title)
}

/// Lowercase alphanumeric suffix that keeps post slugs unique.
pub fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SLUG_SUFFIX_LENGTH)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}

/// `<slugified title>-<random suffix>`; titles that slugify to nothing use `post`.
pub fn generate_post_slug(title: &str) -> String {
    let base = generate_slug(title);
    let base = if base.is_empty() { FALLBACK_BASE } else { &base };
    format!("{}-{}", base, random_suffix())
}
