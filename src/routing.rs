use crate::models::HabitId;
use crate::store::HabitStore;

pub fn parse_fragment(raw: &str) -> Option<HabitId> {
    let digits = raw.trim().trim_start_matches('#');
    digits.parse::<u64>().ok().filter(|id| *id > 0).map(HabitId)
}

pub fn fragment(active: Option<HabitId>) -> String {
    active.map(|id| format!("#{id}")).unwrap_or_default()
}

pub fn location(active: Option<HabitId>) -> String {
    format!("/{}", fragment(active))
}

// The habit named by `raw` if it exists, else the first one.
pub fn restore(store: &mut HabitStore, raw: Option<&str>) -> Option<HabitId> {
    let requested = raw.and_then(parse_fragment);
    let chosen = requested
        .filter(|id| store.get(*id).is_some())
        .or_else(|| store.first_id())?;
    store.select(chosen);
    Some(chosen)
}
