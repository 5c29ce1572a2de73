pub mod file;
pub mod prices;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Resolve a typed input from `--input <file>` or piped stdin JSON.
pub fn from_file_or_stdin<T: DeserializeOwned>(
    path: &Option<String>,
    command: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(ref path) = path {
        file::read_input(path)
    } else if let Some(data) = stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err(format!("--input <file.json> or stdin required for {command}").into())
    }
}
