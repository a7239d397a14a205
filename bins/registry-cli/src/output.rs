//! Terminal rendering of registry snapshots

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use component_registry::{ComponentRegistry, LifecycleState};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StateRow {
    pub name: String,
    pub version: String,
    pub state: LifecycleState,
    pub last_error: Option<String>,
}

pub fn state_rows(registry: &ComponentRegistry) -> Vec<StateRow> {
    registry
        .list()
        .into_iter()
        .map(|info| StateRow {
            last_error: registry.last_error(&info.name).map(|f| f.message),
            name: info.name,
            version: info.version,
            state: info.state,
        })
        .collect()
}

pub fn render_states(rows: &[StateRow]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Component", "Version", "State", "Last error"]);

    for row in rows {
        table.add_row(vec![
            Cell::new(&row.name),
            Cell::new(&row.version),
            Cell::new(row.state),
            Cell::new(row.last_error.as_deref().unwrap_or("-")),
        ]);
    }

    table.to_string()
}

pub fn render_order(order: &[String]) -> String {
    order
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{:>3}. {}", i + 1, name))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_order() {
        let order = vec!["audit-log".to_string(), "crypto".to_string()];
        assert_eq!(render_order(&order), "  1. audit-log\n  2. crypto");
    }

    #[test]
    fn test_render_states_includes_every_row() {
        let rows = vec![
            StateRow {
                name: "crypto".to_string(),
                version: "2.0.1".to_string(),
                state: LifecycleState::Error,
                last_error: Some("bad key".to_string()),
            },
            StateRow {
                name: "audit-log".to_string(),
                version: "1.2.0".to_string(),
                state: LifecycleState::Running,
                last_error: None,
            },
        ];

        let rendered = render_states(&rows);
        assert!(rendered.contains("crypto"));
        assert!(rendered.contains("ERROR"));
        assert!(rendered.contains("bad key"));
        assert!(rendered.contains("RUNNING"));
    }
}
