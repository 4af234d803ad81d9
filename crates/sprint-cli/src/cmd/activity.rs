use super::open_store;
use crate::output::{print_json, print_table};
use anyhow::Context;
use std::path::Path;

pub fn run(root: &Path, limit: usize, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let entries = store
        .recent_activities(limit)
        .context("failed to read activity log")?;

    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No activity yet.");
        return Ok(());
    }
    let rows = entries
        .iter()
        .map(|a| {
            vec![
                a.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                a.kind.to_string(),
                a.description.clone(),
            ]
        })
        .collect();
    print_table(&["WHEN", "TYPE", "DESCRIPTION"], rows);
    Ok(())
}
