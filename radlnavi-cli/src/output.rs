//! Shared output helpers for command responses.

use std::io::Write;

use serde::Serialize;

use crate::CliError;

/// Write `response` as pretty-printed JSON followed by a newline.
pub(crate) fn write_json_response<T: Serialize>(
    writer: &mut dyn Write,
    response: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(response).map_err(CliError::SerializeResponse)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}
