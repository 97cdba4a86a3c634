//! `maestro projects ...`: one-shot catalog operations.

use std::io::{BufRead, Write};

use maestro_session::catalog::{CatalogView, ProjectCatalog};
use maestro_session::ApiClient;

use crate::render;

pub async fn list(api: &ApiClient) -> anyhow::Result<()> {
    let mut catalog = ProjectCatalog::new();
    let snapshot = catalog.refresh(api).await;
    println!("{}", render::catalog(&snapshot));
    if let CatalogView::Error(message) = snapshot.view {
        anyhow::bail!(message);
    }
    Ok(())
}

pub async fn open(api: &ApiClient, path: &str) -> anyhow::Result<()> {
    let mut catalog = ProjectCatalog::new();
    let project = catalog.open(api, path).await?;
    println!();
    println!("  Opened {}", project.name);
    if !project.objective.is_empty() {
        println!("  Objective: {}", project.objective);
    }
    println!("  Steer it with: maestro console, then /open {path}");
    println!();
    Ok(())
}

pub async fn delete(api: &ApiClient, path: &str, yes: bool) -> anyhow::Result<()> {
    let mut catalog = ProjectCatalog::new();
    catalog.refresh(api).await;
    let pending = catalog.request_delete(path);

    if !yes {
        let label = pending.name().unwrap_or(path);
        print!("Delete {label}? This cannot be undone. [y/N] ");
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer)?;
        if !matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
            println!("Kept {path}");
            return Ok(());
        }
    }

    catalog.confirm_delete(api, pending).await?;
    println!("Deleted {path}");
    Ok(())
}

pub async fn analyze(api: &ApiClient, path: &str) -> anyhow::Result<()> {
    let project_type = api.analyze_folder(path).await?;
    println!();
    println!("  Framework: {}", project_type.framework);
    println!("  Language:  {}", project_type.language);
    if !project_type.detected_files.is_empty() {
        println!("  Detected:  {}", project_type.detected_files.join(", "));
    }
    println!();
    Ok(())
}

pub async fn import(api: &ApiClient, path: &str, name: Option<&str>) -> anyhow::Result<()> {
    let imported = api.import_project(path, name).await?;
    let label = imported.name.as_deref().unwrap_or(path);
    println!(
        "Imported {label} ({} / {})",
        imported.project_type.framework, imported.project_type.language
    );
    Ok(())
}
