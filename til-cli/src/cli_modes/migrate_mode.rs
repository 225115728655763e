use super::prompt::confirm;
use crate::render::Renderer;
use anyhow::Result;
use til_core::{StorageFormat, Til, TilError};

pub fn migrate_mode(til: &mut Til, yes: bool, renderer: &Renderer) -> Result<()> {
    if til.format() == StorageFormat::Yaml && !til.paths().markdown_file().is_file() {
        return Err(TilError::NothingToMigrate.into());
    }
    if !yes && !confirm("This will migrate all entries from Markdown to YAML format. Continue?")? {
        renderer.print_info("Migration aborted");
        return Ok(());
    }

    let count = til.migrate()?;
    renderer.print_info(&format!(
        "Migrated {count} entries to {}",
        til.paths().yaml_file().display()
    ));
    renderer.print_info("Your old til.md file has been backed up as til.md.bak");
    Ok(())
}
