//! Offline commands that work on a page description without talking to a
//! server.

use std::error::Error;
use std::path::Path;

use crate::core::default_link::decode;
use crate::core::ui_state::{EventDisposition, UiState};
use crate::page::selector::Matched;
use crate::page::Page;

/// Toggles the default link for `link`, matched by its decoded or its
/// encoded field name, and records the field as edited. Returns the new
/// link label.
pub fn toggle_default_link(
    page: &mut Page,
    ui: &mut UiState,
    link: &str,
    tooltip: Option<&str>,
) -> Result<String, Box<dyn Error>> {
    let wanted = decode(link);
    let default_link = page
        .default_links
        .iter_mut()
        .find(|candidate| candidate.field_name() == wanted || candidate.name == link)
        .ok_or_else(|| format!("No default link for field '{wanted}'"))?;
    let field_name = default_link.field_name();
    let form = page
        .forms
        .iter_mut()
        .find(|form| form.controls_named(&field_name).next().is_some())
        .ok_or_else(|| format!("No form has a field named '{field_name}'"))?;

    default_link.activate(form);
    ui.value_changed(&field_name);
    if let Some(template) = tooltip {
        println!("{}", default_link.tooltip(template));
    }
    Ok(default_link.label().to_string())
}

pub fn reset_default(
    page_path: &Path,
    link: &str,
    tooltip: Option<&str>,
    write: bool,
) -> Result<(), Box<dyn Error>> {
    let mut page = Page::load_from_path(page_path)?;
    let mut ui = UiState::new();
    let label = toggle_default_link(&mut page, &mut ui, link, tooltip)?;
    println!("✅ Toggled default for {}; link now reads \"{label}\"", decode(link));
    if ui.save_enabled() {
        let fields: Vec<&str> = ui.changed_fields.iter().map(String::as_str).collect();
        println!("Unsaved changes: {}", fields.join(", "));
    }
    if write {
        page.save_to_path(page_path)?;
    }
    Ok(())
}

/// Visibility switches applied on top of the page-load state.
#[derive(Debug, Clone, Default)]
pub struct ViewToggles {
    pub expand_all: bool,
    pub experts: bool,
    pub info: bool,
    pub open_info: Vec<String>,
}

/// Section state after page load and a navigation to `anchor`.
pub fn navigate(
    page: &Page,
    anchor: Option<&str>,
    toggles: &ViewToggles,
) -> (UiState, EventDisposition) {
    let mut ui = UiState::new();
    for tab in &page.tabs {
        ui.register_tab_link(tab);
    }
    let has_welcome = page
        .tabs
        .iter()
        .any(|tab| tab.trim_start_matches('#') == "Welcome");
    let mut disposition = ui.init_section(None, has_welcome);
    if let Some(anchor) = anchor {
        disposition = ui.show_section(anchor);
    }
    if toggles.expand_all {
        ui.toggle_sections();
        disposition = EventDisposition::Default;
    }
    if toggles.experts {
        ui.toggle_experts_mode();
    }
    if toggles.info {
        ui.toggle_info_mode();
    }
    for id in &toggles.open_info {
        ui.toggle_info(id);
    }
    (ui, disposition)
}

fn shown_or_hidden(shown: bool) -> &'static str {
    if shown {
        "shown"
    } else {
        "hidden"
    }
}

pub fn show_section(
    page_path: &Path,
    anchor: Option<&str>,
    toggles: &ViewToggles,
) -> Result<(), Box<dyn Error>> {
    let page = Page::load_from_path(page_path)?;
    let (ui, disposition) = navigate(&page, anchor, toggles);

    println!("Current section: {}", ui.menu.main.as_deref().unwrap_or("(none)"));
    if ui.menu.all_opened {
        println!("All sections expanded");
    } else {
        for section in &ui.shown_sections {
            println!("  shown: {section}");
        }
    }
    for tab in &ui.selected_tabs {
        println!("  selected tab: {tab}");
    }
    println!("Expert settings: {}", shown_or_hidden(ui.experts_shown));
    println!("Info texts: {}", shown_or_hidden(ui.info_shown));
    for id in &ui.open_info_blocks {
        println!("  info open: {id}");
    }
    if disposition == EventDisposition::Default {
        println!("Anchor scrolls the page");
    }
    Ok(())
}

pub fn query_page(page_path: &Path, selector: &str, json: bool) -> Result<(), Box<dyn Error>> {
    let page = Page::load_from_path(page_path)?;
    match page.select(selector)? {
        None => {
            eprintln!("⚠️  Nothing matches {selector}");
            std::process::exit(1);
        }
        Some(Matched::Status(status)) if json => println!("{}", serde_json::to_string_pretty(status)?),
        Some(Matched::Controls(controls)) if json => {
            println!("{}", serde_json::to_string_pretty(&controls)?)
        }
        Some(Matched::Status(status)) => {
            let state = if status.pending { " (working)" } else { "" };
            println!("status{state}: {}", status.html);
        }
        Some(Matched::Controls(controls)) => {
            for control in controls {
                println!(
                    "{} [{:?}]: {}",
                    control.name.as_deref().unwrap_or("(unnamed)"),
                    control.kind,
                    control.current_value()
                );
            }
        }
    }
    Ok(())
}
