//! Presentation state of the configure screen: expert/info visibility,
//! section navigation and change tracking.
//!
//! Everything here is plain data owned by the event loop; nothing is global.

use std::collections::{BTreeMap, BTreeSet};

/// Whether a UI event should go on to its default browser action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventDisposition {
    /// Let the event proceed (e.g. follow an anchor).
    Default,
    PreventDefault,
}

/// Main and sub section named by an anchor such as `#Sub$Main`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectionParts {
    pub main: String,
    /// `"<sub>$<main>"`, or empty for a main section.
    pub sub: String,
}

/// Splits an anchor into its main and sub section ids.
///
/// `#Main` names a main section; `#Sub$Main` names sub section `Sub$Main`
/// inside `Main`. With several `$`, the text after the last one is the main
/// section.
pub fn section_parts(anchor: &str) -> SectionParts {
    let anchor = anchor.trim_start_matches('#');
    let (head, tail) = match (anchor.find('$'), anchor.rfind('$')) {
        (Some(first), Some(last)) => (&anchor[..first], &anchor[last + 1..]),
        _ => (anchor, ""),
    };
    if head.is_empty() {
        return SectionParts::default();
    }
    if tail.is_empty() {
        return SectionParts {
            main: head.to_string(),
            sub: String::new(),
        };
    }
    SectionParts {
        main: tail.to_string(),
        sub: format!("{head}${tail}"),
    }
}

#[derive(Clone, Debug, Default)]
pub struct MenuState {
    pub main: Option<String>,
    /// Last sub section shown per main section.
    pub sub: BTreeMap<String, String>,
    /// First sub section registered per main section.
    pub default_sub: BTreeMap<String, String>,
    /// Every section shown at once ("expand all").
    pub all_opened: bool,
}

#[derive(Clone, Debug)]
pub struct UiState {
    pub experts_shown: bool,
    pub info_shown: bool,
    pub menu: MenuState,
    /// Sections currently carrying the "shown" marker.
    pub shown_sections: BTreeSet<String>,
    /// Section ids that have a tab in the menu.
    pub tab_links: BTreeSet<String>,
    pub selected_tabs: BTreeSet<String>,
    /// Ids of per-setting info blocks that are unfolded.
    pub open_info_blocks: BTreeSet<String>,
    /// Names of fields edited since load; the save button shows once any exist.
    pub changed_fields: BTreeSet<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    /// The state right after page load: expert settings and info texts hidden.
    pub fn new() -> Self {
        Self {
            experts_shown: false,
            info_shown: false,
            menu: MenuState::default(),
            shown_sections: BTreeSet::new(),
            tab_links: BTreeSet::new(),
            selected_tabs: BTreeSet::new(),
            open_info_blocks: BTreeSet::new(),
            changed_fields: BTreeSet::new(),
        }
    }

    pub fn toggle_experts_mode(&mut self) {
        self.experts_shown = !self.experts_shown;
    }

    pub fn toggle_info_mode(&mut self) {
        self.info_shown = !self.info_shown;
    }

    /// Folds or unfolds the info block of one setting.
    pub fn toggle_info(&mut self, id: &str) -> EventDisposition {
        if !self.open_info_blocks.remove(id) {
            self.open_info_blocks.insert(id.to_string());
        }
        EventDisposition::PreventDefault
    }

    pub fn is_info_open(&self, id: &str) -> bool {
        self.open_info_blocks.contains(id)
    }

    /// Registers a menu tab pointing at `anchor`. The first sub section
    /// registered for a main section becomes its default.
    pub fn register_tab_link(&mut self, anchor: &str) {
        let parts = section_parts(anchor);
        let section_id = if parts.sub.is_empty() {
            parts.main
        } else {
            self.menu
                .default_sub
                .entry(parts.main)
                .or_insert_with(|| parts.sub.clone());
            parts.sub
        };
        self.tab_links.insert(section_id);
    }

    fn set_tab_selected(&mut self, section_id: &str, selected: bool) {
        if !self.tab_links.contains(section_id) {
            return;
        }
        if selected {
            self.selected_tabs.insert(section_id.to_string());
        } else {
            self.selected_tabs.remove(section_id);
        }
    }

    /// Shows the section named by `anchor`, hiding the previous one.
    ///
    /// With every section expanded the anchor is left to scroll the page,
    /// so the event keeps its default action.
    pub fn show_section(&mut self, anchor: &str) -> EventDisposition {
        let parts = section_parts(anchor);
        let main_id = parts.main;
        let sub_id = Some(parts.sub)
            .filter(|sub| !sub.is_empty())
            .or_else(|| self.menu.sub.get(&main_id).cloned())
            .or_else(|| self.menu.default_sub.get(&main_id).cloned())
            .unwrap_or_default();

        let old_main = self.menu.main.clone().unwrap_or_default();
        if old_main != main_id {
            self.shown_sections.remove(&old_main);
            self.shown_sections.insert(main_id.clone());
            self.set_tab_selected(&old_main, false);
            self.set_tab_selected(&main_id, true);
        }

        if let Some(old_sub) = self.menu.sub.get(&old_main).cloned() {
            self.shown_sections.remove(&old_sub);
            self.set_tab_selected(&old_sub, false);
        }
        if !sub_id.is_empty() {
            self.shown_sections.insert(sub_id.clone());
            self.set_tab_selected(&sub_id, true);
        }

        self.menu.main = Some(main_id.clone());
        self.menu.sub.insert(main_id, sub_id);

        if self.menu.all_opened {
            EventDisposition::Default
        } else {
            EventDisposition::PreventDefault
        }
    }

    /// Opens the section from the location hash, or the landing section.
    pub fn init_section(&mut self, hash: Option<&str>, has_welcome: bool) -> EventDisposition {
        match hash.filter(|hash| !hash.is_empty() && *hash != "#") {
            Some(hash) => self.show_section(hash),
            None if has_welcome => self.show_section("Welcome"),
            None => self.show_section("Introduction"),
        }
    }

    /// Flips between "all sections expanded" and "one section at a time".
    pub fn toggle_sections(&mut self) {
        if self.menu.all_opened {
            self.menu.all_opened = false;
            let current = self.menu.main.take().unwrap_or_default();
            self.show_section(&current);
        } else {
            self.menu.all_opened = true;
        }
    }

    /// Whether `section_id` is visible, accounting for "expand all".
    pub fn is_section_visible(&self, section_id: &str) -> bool {
        self.menu.all_opened || self.shown_sections.contains(section_id)
    }

    pub fn value_changed(&mut self, field: &str) {
        self.changed_fields.insert(field.to_string());
    }

    pub fn save_enabled(&self) -> bool {
        !self.changed_fields.is_empty()
    }
}
