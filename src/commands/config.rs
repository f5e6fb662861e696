//! Opens the configuration file in an editor.

use crate::config::file::config_path;
use crate::config::VrecConfig;
use anyhow::{anyhow, bail};
use std::io::ErrorKind;
use std::process::Command;

/// Opens the configuration file in the user's editor.
///
/// Honors `$VISUAL` then `$EDITOR`, then tries a few common terminal
/// editors until one launches. The default config file is written first if
/// none exists, so the editor always opens a populated file.
///
/// # Errors
/// - If no editor can be launched
/// - If the editor exits with a failure status
pub fn handle_config() -> anyhow::Result<()> {
    let path = config_path()?;
    if !path.exists() {
        VrecConfig::load()?;
    }

    let candidates = editor_candidates(
        std::env::var("VISUAL").ok(),
        std::env::var("EDITOR").ok(),
    );
    for editor in &candidates {
        match Command::new(editor).arg(&path).status() {
            Ok(status) if status.success() => {
                tracing::info!("Edited {} with {editor}", path.display());
                return Ok(());
            }
            Ok(status) => bail!("{editor} exited with {status}"),
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(anyhow!("could not launch {editor}: {e}")),
        }
    }
    bail!("no editor found; set $VISUAL or $EDITOR")
}

/// Editors to try, in order: the environment overrides, then common
/// terminal editors. Blank overrides are skipped.
fn editor_candidates(visual: Option<String>, editor: Option<String>) -> Vec<String> {
    let mut candidates: Vec<String> = [visual, editor]
        .into_iter()
        .flatten()
        .filter(|v| !v.trim().is_empty())
        .collect();
    candidates.extend(["nano", "vim", "vi"].map(String::from));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_overrides_come_first() {
        let candidates = editor_candidates(Some("hx".into()), Some("emacs".into()));
        assert_eq!(&candidates[..2], &["hx".to_string(), "emacs".to_string()]);
        assert!(candidates.contains(&"vi".to_string()));
    }

    #[test]
    fn test_blank_overrides_are_skipped() {
        let candidates = editor_candidates(Some(String::new()), None);
        assert_eq!(candidates, vec!["nano", "vim", "vi"]);
    }
}
