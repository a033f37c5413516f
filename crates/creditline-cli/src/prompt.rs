//! Interactive terminal input.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use anyhow::{Context, Result};

/// Read one line after printing `label`. Falls back to `default` on empty input.
pub fn line(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) => print!("{} [{}]: ", label, d),
        None => print!("{}: ", label),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    let input = input.trim();

    if input.is_empty() {
        if let Some(d) = default {
            return Ok(d.to_string());
        }
    }
    Ok(input.to_string())
}

/// Like [`line`] but rejects empty input.
pub fn required(label: &str, default: Option<&str>) -> Result<String> {
    let value = line(label, default)?;
    if value.is_empty() {
        anyhow::bail!("{} is required", label);
    }
    Ok(value)
}

/// Read and parse a value, e.g. an amount or a tier.
pub fn parsed<T>(label: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = required(label, None)?;
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("Invalid {}: {}", label.to_lowercase(), e))
}

/// Read a password without echo.
pub fn password(label: &str) -> Result<String> {
    let password = rpassword::prompt_password(format!("{}: ", label))
        .context("Failed to read password")?;
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }
    Ok(password)
}
