//! CLI Scenarios and Agents Commands

use pulsedrive_core::ScenarioLibrary;

use crate::terminal_output::{render_agents, render_table, Column};

pub fn scenarios() {
    let library = ScenarioLibrary::builtin();
    println!("{}", render_scenarios(&library));
}

pub fn agents() {
    println!("{}", render_agents());
}

fn render_scenarios(library: &ScenarioLibrary) -> String {
    let columns = vec![
        Column::left("Id"),
        Column::left("Name"),
        Column::right("Steps"),
        Column::left("Halts at"),
    ];
    let mut rows: Vec<Vec<String>> = library
        .iter()
        .map(|s| {
            vec![
                s.id.clone(),
                s.label.clone(),
                s.steps.len().to_string(),
                s.halting_step()
                    .map(|i| s.steps[i].agent.display_name().to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();

    let default = library.default_scenario();
    rows.push(vec![
        format!("{} (default)", default.id),
        default.label.clone(),
        default.steps.len().to_string(),
        "-".to_string(),
    ]);
    render_table(&columns, &rows)
}
