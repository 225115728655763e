use crate::render::Renderer;
use anyhow::Result;
use std::path::PathBuf;
use til_core::Til;

/// Stages every file it can; fails afterwards if any could not be staged.
pub fn add_mode(til: &Til, files: &[PathBuf], renderer: &Renderer) -> Result<()> {
    let mut failed = 0;
    for file in files {
        match til.add_file(file) {
            Ok(name) => renderer.print_info(&format!("Added {name}")),
            Err(e) if e.kind() == til_core::ErrorKind::NotInitialized => return Err(e.into()),
            Err(e) => {
                renderer.print_warning(&e.to_string());
                failed += 1;
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} files could not be staged", files.len());
    }
    Ok(())
}
