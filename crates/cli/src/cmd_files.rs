//! `maestro files ...` and `maestro logs <agent>`.

use maestro_session::ApiClient;

use crate::render;

pub async fn list(api: &ApiClient) -> anyhow::Result<()> {
    let files = api.list_files().await?;
    println!("{}", render::files(&files));
    Ok(())
}

pub async fn read(api: &ApiClient, path: &str) -> anyhow::Result<()> {
    let content = api.read_file(path).await?;
    print!("{content}");
    if !content.ends_with('\n') {
        println!();
    }
    Ok(())
}

pub async fn logs(api: &ApiClient, agent: &str) -> anyhow::Result<()> {
    let lines = api.agent_logs(agent).await?;
    if lines.is_empty() {
        println!("No log entries for {agent}.");
        return Ok(());
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}
