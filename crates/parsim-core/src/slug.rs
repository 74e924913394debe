//! Listing slugs: URL-safe identifiers derived from a listing title.
//!
//! Generated slugs only contain lowercase ASCII letters, digits and `-`.
//! Hand-written slugs may also use uppercase letters and `_`.

pub const SLUG_MAX_LEN: usize = 50;

/// Used when a title has no letters or digits at all.
const FALLBACK_SLUG: &str = "listing";

/// ASCII-folds the title, lowercases it and collapses every run of other
/// characters into a single `-`.
pub fn slugify(raw: &str) -> String {
	::slug::slugify(raw)
}

/// Build a slug for `title`, adding `-{attempt + 1}` when `attempt > 0`.
///
/// Callers probe `attempt = 0, 1, 2, ...` until the slug is free, so the first
/// collision becomes `-2`. The result always fits in [`SLUG_MAX_LEN`].
pub fn make_slug(title: &str, attempt: u32) -> String {
	let mut base = slugify(title);
	if base.is_empty() {
		base.push_str(FALLBACK_SLUG);
	}

	let suffix = if attempt == 0 {
		String::new()
	} else {
		format!("-{}", attempt + 1)
	};

	let max_base_len = SLUG_MAX_LEN.saturating_sub(suffix.len());
	if base.len() > max_base_len {
		base.truncate(max_base_len);
	}
	while base.ends_with('-') {
		base.pop();
	}
	if base.is_empty() {
		base.push_str(&FALLBACK_SLUG[..FALLBACK_SLUG.len().min(max_base_len)]);
	}

	base.push_str(&suffix);
	base
}

pub fn is_valid_slug(slug: &str) -> bool {
	!slug.is_empty()
		&& slug.len() <= SLUG_MAX_LEN
		&& slug
			.bytes()
			.all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
