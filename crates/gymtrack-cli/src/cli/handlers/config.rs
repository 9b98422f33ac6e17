//! Configuration display

use super::session_dir;
use crate::error::{CliError, Result};
use crate::output::{compress_path, json_output};
use gymtrack_sdk::ClientConfig;

/// Handle config show command
pub fn handle_show(config: &ClientConfig, json: bool) -> Result<()> {
    if json {
        return json_output(config);
    }

    let rendered = toml::to_string_pretty(config)
        .map_err(|e| CliError::internal(format!("Failed to render configuration: {e}")))?;
    print!("{rendered}");
    println!();
    println!("# session stored in {}", compress_path(&session_dir(config)?));
    Ok(())
}
