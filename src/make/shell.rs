//! POSIX shell quoting for recipe words.
//!
//! Recipes are executed by `/bin/sh`, so words are quoted with the `Sh`
//! dialect regardless of the host platform.

use shell_quote::{QuoteRefExt, Sh};

/// Quote `word` so `/bin/sh` reads it back as exactly one argument.
///
/// Words made only of inert characters are returned unchanged; the empty
/// string becomes `''`.
///
/// # Examples
/// ```rust
/// use mkgen::make::shell::quote;
///
/// assert_eq!(quote("main.c"), "main.c");
/// assert_eq!(quote(""), "''");
/// ```
#[must_use]
pub fn quote(word: &str) -> String {
    let bytes: Vec<u8> = word.quoted(Sh);
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            debug_assert!(false, "shell quoting produced non UTF-8 bytes: {err}");
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("plain")]
    #[case("needs space")]
    #[case("it's")]
    #[case("semi;colon")]
    #[case("")]
    fn quoted_words_split_back_to_one_argument(#[case] word: &str) {
        let quoted = quote(word);
        let words = shlex::split(&quoted).expect("quoted word should parse");
        assert_eq!(words, vec![word.to_owned()]);
    }

    #[test]
    fn inert_words_are_left_alone() {
        assert_eq!(quote("-O2"), "-O2");
        assert_eq!(quote("src/main.c"), "src/main.c");
    }
}
