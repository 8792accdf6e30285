pub mod feed;
pub mod session;
pub mod setup;
pub mod weather;

use std::io::Write;

use anyhow::Result;

/// Read one trimmed line from stdin after printing `label`.
pub fn prompt(label: &str) -> Result<String> {
    eprint!("{}", label);
    std::io::stderr().flush()?;
    let mut s = String::new();
    std::io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

/// Like `prompt`, falling back to `default` on an empty answer.
pub fn prompt_default(label: &str, default: &str) -> Result<String> {
    let answer = if default.is_empty() {
        prompt(&format!("{}: ", label))?
    } else {
        prompt(&format!("{} [{}]: ", label, default))?
    };
    Ok(if answer.is_empty() {
        default.to_string()
    } else {
        answer
    })
}
