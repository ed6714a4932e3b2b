//! Sample configuration CLI command

use std::path::PathBuf;

use crate::cli::error::CliError;
use crate::config::sample_config;
use crate::status::RunStatus;

/// Init-config command arguments
#[derive(Debug, Clone)]
pub struct InitConfigArgs {
    /// Where to write the sample
    pub path: PathBuf,
    /// Overwrite an existing file
    pub force: bool,
}

/// Write a commented sample configuration file
pub fn handle_init_config(args: &InitConfigArgs) -> Result<RunStatus, CliError> {
    if args.path.exists() && !args.force {
        return Err(CliError::FileExists(args.path.clone()));
    }

    std::fs::write(&args.path, sample_config())
        .map_err(|e| CliError::FileWriteError(args.path.clone(), e.to_string()))?;

    println!("Wrote {}", args.path.display());
    Ok(RunStatus::Succeeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoaderConfig;
    use tempfile::TempDir;

    #[test]
    fn test_writes_parseable_sample_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("oecd-loader.toml");
        let args = InitConfigArgs {
            path: path.clone(),
            force: false,
        };

        assert_eq!(handle_init_config(&args).unwrap(), RunStatus::Succeeded);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(LoaderConfig::parse(&content).is_ok());

        assert!(matches!(
            handle_init_config(&args),
            Err(CliError::FileExists(_))
        ));

        let forced = InitConfigArgs { path, force: true };
        assert!(handle_init_config(&forced).is_ok());
    }
}
