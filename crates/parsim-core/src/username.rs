/// Account username rules.
///
/// Requirements:
/// - Length: 1..=150 characters
/// - Allowed characters: letters, digits and `@ . + - _`
/// - Uniqueness: exact match (enforced by the `users.username` unique key)

pub const USERNAME_MAX_LEN: usize = 150;

pub fn normalize_username(username: &str) -> String {
	username.trim().to_string()
}

pub fn is_valid_username(username: &str) -> bool {
	let u = username.trim();
	let len = u.chars().count();
	if len == 0 || len > USERNAME_MAX_LEN {
		return false;
	}

	u.chars()
		.all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
}

pub fn validate_username(username: &str) -> Result<(), &'static str> {
	if is_valid_username(username) {
		Ok(())
	} else {
		Err("Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.")
	}
}
