//! `parley models`: the selectable model catalog.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use parley_types::model::MODEL_CATALOG;

use crate::state::AppState;

pub fn list_models(state: &AppState, json: bool) -> Result<()> {
    let default_model = state.config.gateway.default_model.as_str();

    if json {
        println!("{}", serde_json::to_string_pretty(MODEL_CATALOG)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Vendor").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("ID").fg(Color::White),
        Cell::new("Vision").fg(Color::White),
    ]);

    for model in MODEL_CATALOG {
        let name = if model.id == default_model {
            Cell::new(format!("{} (default)", model.name)).fg(Color::Green)
        } else {
            Cell::new(model.name).fg(Color::Cyan)
        };
        table.add_row(vec![
            Cell::new(model.category),
            name,
            Cell::new(model.id).fg(Color::DarkGrey),
            Cell::new(if model.supports_vision() { "yes" } else { "" }),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  Switch inside a chat with {}",
        style("/model <id>").yellow()
    );
    println!();
    Ok(())
}
