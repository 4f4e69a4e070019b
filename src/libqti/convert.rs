use crate::libqti::error::{Error, Result};
use log::{debug, info};
use std::path::Path;
use std::process::Command;

pub const DEFAULT_CONVERTER: &str = "text2qti";

/// Feeds a rendered quiz file back through an external text-to-QTI converter.
pub fn run_converter(program: &str, quiz_file: &Path) -> Result<()> {
    if !quiz_file.is_file() {
        return Err(Error::InputNotFound(quiz_file.to_path_buf()));
    }
    if quiz_file.extension().and_then(|e| e.to_str()) != Some("txt") {
        return Err(Error::Converter(format!("{:?} is not a .txt file", quiz_file)));
    }

    info!("[Convert] Running {program} on {:?}", quiz_file);
    let output = Command::new(program)
        .arg(quiz_file)
        .output()
        .map_err(|e| Error::Converter(format!("cannot start {program}: {e}")))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    debug!("[Convert] stdout: {}", stdout.trim());
    debug!("[Convert] stderr: {}", stderr.trim());

    if output.status.success() {
        Ok(())
    } else {
        Err(Error::Converter(stderr.trim().to_string()))
    }
}
