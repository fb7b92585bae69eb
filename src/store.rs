use crate::models::{Day, Habit, HabitId, NewHabit};
use std::collections::HashSet;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct HabitStore {
    habits: Vec<Habit>,
    active: Option<HabitId>,
}

impl HabitStore {
    // A later habit reusing an id already seen is dropped.
    pub fn new(habits: Vec<Habit>) -> Self {
        let mut seen = HashSet::new();
        let habits = habits
            .into_iter()
            .filter(|habit| {
                let fresh = seen.insert(habit.id);
                if !fresh {
                    warn!(id = %habit.id, "dropping habit with duplicate id");
                }
                fresh
            })
            .collect();

        Self {
            habits,
            active: None,
        }
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn active_id(&self) -> Option<HabitId> {
        self.active
    }

    pub fn active(&self) -> Option<&Habit> {
        let id = self.active?;
        self.get(id)
    }

    pub fn get(&self, id: HabitId) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == id)
    }

    pub fn first_id(&self) -> Option<HabitId> {
        self.habits.first().map(|habit| habit.id)
    }

    pub fn next_id(&self) -> Option<HabitId> {
        match self.habits.iter().map(|habit| habit.id).max() {
            Some(max) => max.next(),
            None => Some(HabitId::FIRST),
        }
    }

    pub fn select(&mut self, id: HabitId) -> bool {
        if self.get(id).is_none() {
            debug!(%id, "ignoring selection of unknown habit");
            return false;
        }
        self.active = Some(id);
        true
    }

    pub fn create(&mut self, new: NewHabit) -> Option<HabitId> {
        let id = self.next_id()?;
        self.habits.push(Habit {
            id,
            icon: new.icon,
            name: new.name,
            target: new.target,
            days: Vec::new(),
        });
        self.active = Some(id);
        Some(id)
    }

    pub fn delete_active(&mut self, id: HabitId) -> Option<Habit> {
        self.active_mut(id)?;
        let position = self.habits.iter().position(|habit| habit.id == id)?;
        let removed = self.habits.remove(position);
        self.active = self.first_id();
        Some(removed)
    }

    pub fn add_day(&mut self, id: HabitId, comment: String) -> Option<usize> {
        let habit = self.active_mut(id)?;
        habit.days.push(Day { comment });
        Some(habit.days.len())
    }

    pub fn delete_day(&mut self, id: HabitId, index: usize) -> Option<Day> {
        let habit = self.active_mut(id)?;
        if index >= habit.days.len() {
            return None;
        }
        Some(habit.days.remove(index))
    }

    // Day and delete operations only reach the habit the page was showing.
    fn active_mut(&mut self, id: HabitId) -> Option<&mut Habit> {
        if self.active != Some(id) {
            debug!(%id, active = ?self.active, "ignoring operation on inactive habit");
            return None;
        }
        self.habits.iter_mut().find(|habit| habit.id == id)
    }
}
