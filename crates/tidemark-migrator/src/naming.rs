//! File-name conventions shared by the loader and the generator.

use std::sync::LazyLock;

use regex::Regex;

static MIGRATION_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+)_([_a-z0-9]*)\.([A-Za-z0-9]+)$").expect("static regex is valid")
});

/// Pieces of a `<version>_<snake_name>.<ext>` file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileNameParts<'a> {
    pub version: &'a str,
    pub name: &'a str,
    pub extension: &'a str,
}

pub fn parse_file_name(file_name: &str) -> Option<FileNameParts<'_>> {
    let caps = MIGRATION_FILE.captures(file_name)?;
    Some(FileNameParts {
        version: caps.get(1)?.as_str(),
        name: caps.get(2)?.as_str(),
        extension: caps.get(3)?.as_str(),
    })
}

/// `add_survey_schema` -> `AddSurveySchema`.
pub fn camelize(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// `AddSurveySchema` or `add survey-schema` -> `add_survey_schema`.
pub fn underscore(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower_or_digit = false;
    for c in name.trim().chars() {
        if c.is_ascii_uppercase() {
            if prev_lower_or_digit {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower_or_digit = false;
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
            prev_lower_or_digit = true;
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower_or_digit = false;
        }
    }
    out.trim_end_matches('_').to_string()
}
