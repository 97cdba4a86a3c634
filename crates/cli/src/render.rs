//! Terminal rendering: styled event lines and tables.

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};
use console::style;
use maestro_protocol::{FileEntry, ProjectStatus, StatusKind};
use maestro_session::activity::ActivityEntry;
use maestro_session::catalog::{CatalogSnapshot, CatalogView};
use maestro_session::connection::ConnectionState;
use maestro_session::status_board::{AgentSlot, VisualState};
use maestro_session::{ConsoleEvent, Notice, NoticeLevel, SessionSnapshot, View};

pub const EMPTY_CATALOG: &str = "No projects yet. Start one with /start <objective>.";

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// One line per event; `None` for events that only matter to snapshots.
pub fn event_line(event: &ConsoleEvent) -> Option<String> {
    match event {
        ConsoleEvent::Connection { .. } => None,
        ConsoleEvent::Notice(notice) => Some(notice_line(notice)),
        ConsoleEvent::AgentUpdated { agent, status } => Some(format!(
            "{} {} {}",
            visual_marker(status.visual_state),
            style(agent).bold(),
            style(&status.action_summary).dim()
        )),
        ConsoleEvent::BoardReset => Some(format!("{}", style("All agents idle").dim())),
        ConsoleEvent::Activity(entry) => Some(activity_line(entry)),
        ConsoleEvent::FinalOutput(output) => {
            let mut line = format!("{}\n{}", style("Final output").green().bold(), output.text);
            if let Some(path) = &output.output_path {
                line.push_str(&format!("\n{} {}", style("Saved to").dim(), path));
            }
            Some(line)
        }
        ConsoleEvent::RunControl { start_enabled } => Some(if *start_enabled {
            format!("{}", style("Ready for a new run").dim())
        } else {
            format!("{}", style("Run in progress").dim())
        }),
        ConsoleEvent::ProjectBound { project_id } => Some(format!(
            "{} {}",
            style("Project").dim(),
            style(project_id).cyan()
        )),
        ConsoleEvent::GuidanceSent { text, .. } => {
            Some(format!("{} {}", style("you >").magenta().bold(), text))
        }
        ConsoleEvent::Catalog(snapshot) => Some(catalog(snapshot)),
        ConsoleEvent::ViewChanged(view) => Some(format!(
            "{}",
            style(match view {
                View::Console => "-- console --",
                View::Projects => "-- projects --",
            })
            .dim()
        )),
        ConsoleEvent::ConfirmDelete { id, name } => Some(format!(
            "Delete {}? This cannot be undone. [y/N]",
            style(name.as_deref().unwrap_or(id)).bold()
        )),
    }
}

pub fn notice_line(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Info => format!("{} {}", style("[info]").blue(), notice.text),
        NoticeLevel::Warn => format!("{} {}", style("[warn]").yellow(), notice.text),
        NoticeLevel::Error => format!("{} {}", style("[error]").red().bold(), notice.text),
    }
}

pub fn activity_line(entry: &ActivityEntry) -> String {
    let agent = match entry.status {
        StatusKind::Error => style(&entry.agent).red(),
        StatusKind::Waiting => style(&entry.agent).yellow(),
        StatusKind::Complete => style(&entry.agent).green(),
        StatusKind::Active => style(&entry.agent).cyan(),
    };
    format!("[{}] {}", agent, entry.text)
}

fn visual_marker(state: VisualState) -> String {
    match state {
        VisualState::Idle => style("○").dim().to_string(),
        VisualState::Active => style("●").cyan().to_string(),
        VisualState::Waiting => style("◐").yellow().to_string(),
        VisualState::Error => style("✕").red().to_string(),
    }
}

fn visual_label(state: VisualState) -> &'static str {
    match state {
        VisualState::Idle => "idle",
        VisualState::Active => "active",
        VisualState::Waiting => "waiting",
        VisualState::Error => "error",
    }
}

pub fn board(slots: &[AgentSlot]) -> String {
    let mut table = table();
    table.set_header(vec!["Agent", "State", "Doing"]);
    for slot in slots {
        table.add_row(vec![
            slot.name.clone(),
            visual_label(slot.status.visual_state).to_string(),
            slot.status.action_summary.clone(),
        ]);
    }
    table.to_string()
}

pub fn status(snapshot: &SessionSnapshot) -> String {
    let connection = match snapshot.connection {
        ConnectionState::Open => style("connected").green().to_string(),
        ConnectionState::Connecting => style("connecting").yellow().to_string(),
        ConnectionState::Closed => format!(
            "{} (attempt {})",
            style("disconnected").red(),
            snapshot.reconnect_attempt
        ),
    };
    let mut lines = vec![
        format!("Connection: {connection}"),
        format!(
            "Project:    {}",
            snapshot.bound_project.as_deref().unwrap_or("none")
        ),
        format!(
            "Run:        {}",
            if snapshot.start_enabled {
                "idle"
            } else {
                "in progress"
            }
        ),
    ];
    if snapshot.pending_requests > 0 {
        lines.push(format!("Requests:   {} pending", snapshot.pending_requests));
    }
    if snapshot.pending_polls > 0 {
        lines.push(format!("Pulls:      {} pending", snapshot.pending_polls));
    }
    lines.push(board(&snapshot.agents));
    lines.join("\n")
}

fn project_status(status: &ProjectStatus) -> String {
    match status {
        ProjectStatus::Running => style(status).cyan().to_string(),
        ProjectStatus::Completed => style(status).green().to_string(),
        ProjectStatus::Failed => style(status).red().to_string(),
        ProjectStatus::Pending => style(status).dim().to_string(),
    }
}

pub fn catalog(snapshot: &CatalogSnapshot) -> String {
    match &snapshot.view {
        CatalogView::Unloaded => style("Projects not loaded").dim().to_string(),
        CatalogView::Empty => EMPTY_CATALOG.to_string(),
        CatalogView::Error(message) => format!(
            "{} {}",
            style("Could not load projects:").red(),
            message
        ),
        CatalogView::Grid => {
            let mut recent = table();
            recent.set_header(vec!["Recent", "Status", "Updated"]);
            for project in &snapshot.recent {
                recent.add_row(vec![
                    project.name.clone(),
                    project_status(&project.status),
                    project.updated_at.clone(),
                ]);
            }

            let mut all = table();
            all.set_header(vec!["Name", "Status", "Objective", "Path"]);
            for project in &snapshot.projects {
                all.add_row(vec![
                    project.name.clone(),
                    project_status(&project.status),
                    project.objective.clone(),
                    project.path.clone(),
                ]);
            }
            format!("{recent}\n{all}")
        }
    }
}

pub fn files(files: &[FileEntry]) -> String {
    if files.is_empty() {
        return "No files in the workspace.".to_string();
    }
    let mut table = table();
    table.set_header(vec!["Name", "Path"]);
    for file in files {
        table.add_row(vec![file.name.clone(), file.path.clone()]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use maestro_protocol::{FinalOutput, ProjectSummary};
    use maestro_session::status_board::AgentStatus;

    fn plain() {
        console::set_colors_enabled(false);
    }

    fn project(name: &str, updated_at: &str) -> ProjectSummary {
        ProjectSummary {
            path: format!("/work/{name}"),
            name: name.to_string(),
            objective: format!("Build {name}"),
            status: ProjectStatus::Completed,
            updated_at: updated_at.to_string(),
        }
    }

    #[test]
    fn empty_catalog_shows_placeholder() {
        plain();
        let snapshot = CatalogSnapshot {
            view: CatalogView::Empty,
            projects: Vec::new(),
            recent: Vec::new(),
        };
        assert_eq!(catalog(&snapshot), EMPTY_CATALOG);
    }

    #[test]
    fn grid_lists_recent_and_all_projects() {
        plain();
        let todo = project("todo", "2024-01-02");
        let blog = project("blog", "2024-01-01");
        let snapshot = CatalogSnapshot {
            view: CatalogView::Grid,
            projects: vec![blog.clone(), todo.clone()],
            recent: vec![todo, blog],
        };
        let rendered = catalog(&snapshot);
        assert!(rendered.contains("Recent"));
        assert!(rendered.contains("/work/todo"));
        assert!(rendered.contains("Build blog"));
    }

    #[test]
    fn final_output_line_includes_path() {
        plain();
        let line = event_line(&ConsoleEvent::FinalOutput(FinalOutput {
            text: "Done".into(),
            output_path: Some("/out".into()),
        }))
        .expect("rendered");
        assert!(line.contains("Done"));
        assert!(line.contains("Saved to /out"));
    }

    #[test]
    fn connection_events_are_not_printed() {
        assert!(event_line(&ConsoleEvent::Connection { open: true }).is_none());
    }

    #[test]
    fn board_renders_every_slot() {
        plain();
        let slots = vec![
            AgentSlot {
                name: "Developer".into(),
                status: AgentStatus {
                    visual_state: VisualState::Active,
                    action_summary: "Writing main.py".into(),
                },
            },
            AgentSlot {
                name: "Research".into(),
                status: AgentStatus::idle(),
            },
        ];
        let rendered = board(&slots);
        assert!(rendered.contains("Developer"));
        assert!(rendered.contains("Writing main.py"));
        assert!(rendered.contains("idle"));
    }
}
