use crate::error::ExecError;
use std::mem;

/// The handful of `[Desktop Entry]` keys the launcher cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesktopEntry {
    pub name: Option<String>,
    pub comment: String,
    pub icon: String,
    pub exec: String,
    pub terminal: bool,
    pub no_display: bool,
    pub hidden: bool,
}

impl DesktopEntry {
    /// Reads the `[Desktop Entry]` group. Other groups, comments and localized
    /// keys (`Name[de]=...`) are ignored.
    pub fn parse(content: &str) -> Self {
        let mut entry = DesktopEntry::default();
        let mut is_desktop_entry = false;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') { continue; }

            if line.starts_with('[') {
                is_desktop_entry = line == "[Desktop Entry]";
                continue;
            }

            if !is_desktop_entry { continue; }

            let Some((key, value)) = line.split_once('=') else { continue };
            let value = value.trim();

            match key.trim() {
                "Name" => entry.name = Some(value.to_string()),
                "Comment" => entry.comment = value.to_string(),
                "Icon" => entry.icon = value.to_string(),
                "Exec" => entry.exec = value.to_string(),
                "Terminal" => entry.terminal = value == "true",
                "NoDisplay" => entry.no_display = value == "true",
                "Hidden" => entry.hidden = value == "true",
                _ => {}
            }
        }

        entry
    }

    pub fn is_visible(&self) -> bool {
        !self.no_display && !self.hidden
    }
}

/// Splits a command line into words the way a POSIX shell would tokenize it:
/// single quotes are literal, double quotes honour `\"`, `\\`, `\$` and `` \` ``,
/// and a bare backslash escapes the next character.
pub fn split_exec(command: &str) -> Result<Vec<String>, ExecError> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(mem::take(&mut word));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => word.push(c),
                        None => return Err(ExecError::UnterminatedQuote('\'')),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\' | '$' | '`')) => word.push(c),
                            Some(c) => {
                                word.push('\\');
                                word.push(c);
                            }
                            None => return Err(ExecError::UnterminatedQuote('"')),
                        },
                        Some(c) => word.push(c),
                        None => return Err(ExecError::UnterminatedQuote('"')),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(c) => word.push(c),
                    None => return Err(ExecError::TrailingEscape),
                }
            }
            c => {
                in_word = true;
                word.push(c);
            }
        }
    }

    if in_word {
        words.push(word);
    }
    Ok(words)
}
