use serde::{de, Deserialize, Deserializer, Serialize};
use std::{fmt, num::NonZeroU32};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(pub u64);

impl HabitId {
    pub const FIRST: HabitId = HabitId(1);

    pub fn next(self) -> Option<HabitId> {
        self.0.checked_add(1).map(HabitId)
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Target(NonZeroU32);

impl Target {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<u32>().ok().and_then(Self::new)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

// Older snapshots stored the target exactly as typed into the form, so a
// numeric string is accepted alongside a number.
impl<'de> Deserialize<'de> for Target {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        let parsed = match Raw::deserialize(deserializer)? {
            Raw::Number(value) => u32::try_from(value).ok().and_then(Target::new),
            Raw::Text(text) => Target::parse(&text),
        };
        parsed.ok_or_else(|| de::Error::custom("target must be a positive integer"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub icon: String,
    pub name: String,
    pub target: Target,
    #[serde(default)]
    pub days: Vec<Day>,
}

impl Habit {
    pub fn progress(&self) -> Progress {
        Progress {
            done: self.days.len(),
            target: self.target,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    pub name: String,
    pub icon: String,
    pub target: Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub target: Target,
}

impl Progress {
    fn raw_percent(&self) -> f64 {
        self.done as f64 * 100.0 / f64::from(self.target.get())
    }

    pub fn percent(&self) -> u32 {
        self.raw_percent().min(100.0).round() as u32
    }

    pub fn label(&self) -> String {
        format!("{}%", self.percent())
    }

    // Not capped, unlike the label.
    pub fn bar_width(&self) -> String {
        format!("{}%", self.raw_percent())
    }
}

pub fn default_habits() -> Vec<Habit> {
    [("Sport", "Push-ups"), ("Water", "Water Balance"), ("Food", "Diet")]
        .into_iter()
        .zip(1..)
        .map(|((icon, name), id)| Habit {
            id: HabitId(id),
            icon: icon.to_string(),
            name: name.to_string(),
            target: Target(NonZeroU32::MIN.saturating_add(9)),
            days: Vec::new(),
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct StateSnapshot {
    pub habits: Vec<Habit>,
    pub active_habit_id: Option<HabitId>,
    pub location: String,
}
