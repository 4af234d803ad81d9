use crate::output::print_json;
use anyhow::Context;
use sprint_core::{config::Config, io, paths, JsonFiles};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let project_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());

    for dir in [paths::SPRINT_DIR, paths::DATA_DIR] {
        let p = root.join(dir);
        io::ensure_dir(&p).with_context(|| format!("failed to create {}", p.display()))?;
    }

    let config_path = paths::config_path(root);
    let config_created = !config_path.exists();
    if config_created {
        Config::new(&project_name)
            .save(root)
            .context("failed to write config.yaml")?;
    }

    let created = JsonFiles::new(root)
        .create_missing()
        .context("failed to create data files")?;

    if json {
        let files: Vec<String> = created.iter().map(|p| p.display().to_string()).collect();
        print_json(&serde_json::json!({
            "root": root.display().to_string(),
            "project": project_name,
            "config_created": config_created,
            "data_files_created": files,
        }))?;
        return Ok(());
    }

    println!("Initializing sprint in: {}", root.display());
    if config_created {
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }
    for path in &created {
        let shown = path.strip_prefix(root).unwrap_or(path);
        println!("  created: {}", shown.display());
    }
    Ok(())
}
