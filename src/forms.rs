use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const ADD_HABIT_FIELDS: &[&str] = &["name", "icon", "target"];
// `icon` keeps the last pick.
pub const ADD_HABIT_RESET: &[&str] = &["name", "target"];
pub const ADD_DAY_FIELDS: &[&str] = &["comment"];

pub const ICONS: &[&str] = &["Sport", "Water", "Food", "Book", "Sleep", "Music"];

pub type FormData = BTreeMap<String, String>;

#[derive(Debug, Clone, Default)]
pub struct FormState {
    values: BTreeMap<String, String>,
    invalid: BTreeSet<String>,
}

impl FormState {
    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map_or("", String::as_str)
    }

    pub fn set_value(&mut self, field: &str, value: impl Into<String>) {
        self.values.insert(field.to_string(), value.into());
    }

    pub fn is_invalid(&self, field: &str) -> bool {
        self.invalid.contains(field)
    }

    pub fn mark_invalid(&mut self, field: &str) {
        self.invalid.insert(field.to_string());
    }

    pub fn validate(
        &mut self,
        submission: &HashMap<String, String>,
        fields: &[&str],
    ) -> Option<FormData> {
        let mut data = FormData::new();
        for field in fields {
            let value = submission
                .get(*field)
                .map(|raw| raw.trim().to_string())
                .unwrap_or_default();

            self.invalid.remove(*field);
            if value.is_empty() {
                self.mark_invalid(field);
            }
            self.set_value(field, value.clone());
            data.insert(field.to_string(), value);
        }

        if data.values().any(String::is_empty) {
            return None;
        }
        Some(data)
    }

    pub fn reset(&mut self, fields: &[&str]) {
        for field in fields {
            self.set_value(field, "");
        }
    }
}

#[derive(Debug, Clone)]
pub struct IconPicker {
    options: Vec<String>,
    active: usize,
}

impl IconPicker {
    pub fn new(options: &[&str]) -> Self {
        Self {
            options: options.iter().map(|tag| tag.to_string()).collect(),
            active: 0,
        }
    }

    pub fn options(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.options
            .iter()
            .enumerate()
            .map(move |(index, tag)| (tag.as_str(), index == self.active))
    }

    pub fn active_tag(&self) -> &str {
        self.options.get(self.active).map_or("", String::as_str)
    }

    pub fn pick(&mut self, tag: &str, form: &mut FormState) -> bool {
        let Some(index) = self.options.iter().position(|option| option == tag) else {
            return false;
        };
        self.active = index;
        form.set_value("icon", tag);
        true
    }
}

#[derive(Debug, Clone)]
pub struct Forms {
    pub add_habit: FormState,
    pub add_day: FormState,
    pub icons: IconPicker,
    pub popup_open: bool,
}

impl Forms {
    pub fn new() -> Self {
        let icons = IconPicker::new(ICONS);
        let mut add_habit = FormState::default();
        add_habit.set_value("icon", icons.active_tag());
        Self {
            add_habit,
            add_day: FormState::default(),
            icons,
            popup_open: false,
        }
    }

    pub fn pick_icon(&mut self, tag: &str) -> bool {
        self.icons.pick(tag, &mut self.add_habit)
    }

    pub fn toggle_popup(&mut self) {
        self.popup_open = !self.popup_open;
    }
}

impl Default for Forms {
    fn default() -> Self {
        Self::new()
    }
}
