//! Method-name tokenizing.
//!
//! Controller methods are written in `snake_case` in Rust, but names coming
//! from generated code or manual registration may still be `CamelCase`.
//! Both spellings split into the same lowercase word list:
//!
//! ```
//! use tariq_support::naming::split_words;
//!
//! assert_eq!(split_words("get_admin_login"), ["get", "admin", "login"]);
//! assert_eq!(split_words("GetAdminLogin"), ["get", "admin", "login"]);
//! ```

/// Splits a method name into lowercase words.
///
/// Underscores separate words, and every uppercase letter starts a new word.
/// Empty pieces (leading, trailing or doubled underscores) are dropped.
pub fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();

    for part in name.split('_') {
        let mut current = String::new();
        for ch in part.chars() {
            if ch.is_uppercase() && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            current.extend(ch.to_lowercase());
        }
        if !current.is_empty() {
            words.push(current);
        }
    }

    words
}

/// Returns `true` if `word` equals `token`, ignoring ASCII case.
#[inline]
pub fn is_word(word: &str, token: &str) -> bool {
    word.eq_ignore_ascii_case(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_words() {
        assert_eq!(
            split_words("get_something_by_else_this_by"),
            ["get", "something", "by", "else", "this", "by"]
        );
    }

    #[test]
    fn camel_case_words() {
        assert_eq!(
            split_words("GetSomethingNewBy"),
            ["get", "something", "new", "by"]
        );
    }

    #[test]
    fn single_word() {
        assert_eq!(split_words("get"), ["get"]);
        assert_eq!(split_words("Any"), ["any"]);
    }

    #[test]
    fn stray_underscores_are_ignored() {
        assert_eq!(split_words("_get__login_"), ["get", "login"]);
    }

    #[test]
    fn empty_name() {
        assert!(split_words("").is_empty());
    }

    #[test]
    fn word_comparison_ignores_case() {
        assert!(is_word("By", "by"));
        assert!(!is_word("bye", "by"));
    }
}
