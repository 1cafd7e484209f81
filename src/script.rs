//! Jobfile templating: the shell preamble and the DONE/FAILURE trailer
//! wrapped around a command to make a self-contained executable jobfile.

use std::path::Path;

use crate::error::Result;

/// Interpreter line every generated jobfile starts with.
pub fn job_preamble() -> &'static str {
    "#!/usr/bin/env bash"
}

/// Trailer that reports the preceding command's outcome on stdout.
pub fn job_conclusion() -> &'static str {
    "if [ $? -eq 0 ]; then\n    echo DONE\nelse\n    echo FAILURE\nfi\n"
}

/// Wrap a command into full jobfile text.
pub fn wrap_command(command: &str) -> String {
    format!("{}\n{}\n{}", job_preamble(), command, job_conclusion())
}

/// Write a wrapped, executable jobfile to `path`.
pub fn write_jobfile(path: impl AsRef<Path>, command: &str) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, wrap_command(command))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }

    tracing::debug!(path = %path.display(), "Wrote jobfile");
    Ok(())
}
