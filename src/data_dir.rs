//! Purpose: Data-directory and language resolution for the CLI.
//! Exports: `default_data_dir`, `parse_language`.
//! Role: Keep flag/environment precedence in one place.
//! Invariants: `--dir` beats `$EXDVIEW_DIR`, which beats the current directory.

use std::path::PathBuf;

use exdview::api::{Error, ErrorKind, Language};

pub(crate) const DATA_DIR_ENV: &str = "EXDVIEW_DIR";

pub(crate) fn default_data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub(crate) fn parse_language(input: Option<&str>) -> Result<Language, Error> {
    let Some(input) = input else {
        return Ok(Language::None);
    };
    Language::from_code(input).ok_or_else(|| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("unknown language '{input}'"))
            .with_hint("Use one of: none, ja, en, de, fr, chs, cht, ko.")
    })
}

#[cfg(test)]
mod tests {
    use super::parse_language;
    use exdview::api::{ErrorKind, Language};

    #[test]
    fn parses_language_codes() {
        assert_eq!(parse_language(None).expect("default"), Language::None);
        assert_eq!(parse_language(Some("EN")).expect("en"), Language::English);
        assert_eq!(parse_language(Some("none")).expect("none"), Language::None);
        let err = parse_language(Some("xx")).expect_err("unknown");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
