//! Terminal input for the screens that need it.

use std::io::{self, Write};

use anyhow::Result;

/// Maximum length for line input.
const MAX_INPUT_LENGTH: usize = 128;

/// Read one trimmed line, offering `default` when the user just presses enter.
pub fn line(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) => print!("{} [{}]: ", label, d),
        None => print!("{}: ", label),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input: String = input.trim().chars().take(MAX_INPUT_LENGTH).collect();

    Ok(match default {
        Some(d) if input.is_empty() => d.to_string(),
        _ => input,
    })
}

pub fn password(label: &str) -> Result<String> {
    let password = rpassword::prompt_password(format!("{}: ", label))?;
    Ok(password)
}
