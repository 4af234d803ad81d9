//! Sprint retrospectives: feedback items, votes, action items and mood.
//!
//! A retrospective is keyed by its sprint's id, so each sprint has at most
//! one. Index arguments refer to positions within the named list.

use crate::error::{Result, SprintError};
use crate::sprint::Sprint;
use crate::store::{Backend, Kind, Record, Store};
use crate::types::normalize;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MOOD: u8 = 3;
pub const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Section {
    WentWell,
    ToImprove,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::WentWell => f.write_str("went well"),
            Section::ToImprove => f.write_str("to improve"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    #[default]
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

impl ActionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionStatus::Open => "Open",
            ActionStatus::InProgress => "In Progress",
            ActionStatus::Done => "Done",
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionStatus {
    type Err = SprintError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize(s).as_str() {
            "open" => Ok(ActionStatus::Open),
            "inprogress" => Ok(ActionStatus::InProgress),
            "done" => Ok(ActionStatus::Done),
            _ => Err(SprintError::InvalidValue(format!(
                "action status '{s}' (expected Open, In Progress or Done)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetroItem {
    pub text: String,
    #[serde(default)]
    pub votes: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub text: String,
    #[serde(default = "unassigned")]
    pub owner: String,
    #[serde(default)]
    pub status: ActionStatus,
    pub created_at: DateTime<Utc>,
}

fn unassigned() -> String {
    UNASSIGNED.to_string()
}

fn default_mood() -> u8 {
    DEFAULT_MOOD
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retrospective {
    /// The sprint id.
    pub id: String,
    pub sprint_name: String,
    #[serde(default)]
    pub went_well: Vec<RetroItem>,
    #[serde(default)]
    pub to_improve: Vec<RetroItem>,
    #[serde(default)]
    pub action_items: Vec<ActionItem>,
    /// 1 (low) to 5 (high).
    #[serde(default = "default_mood")]
    pub team_mood: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Retrospective {
    pub fn for_sprint(sprint: &Sprint) -> Self {
        Self {
            id: sprint.id.clone(),
            sprint_name: sprint.name.clone(),
            went_well: Vec::new(),
            to_improve: Vec::new(),
            action_items: Vec::new(),
            team_mood: DEFAULT_MOOD,
            insights: None,
            created_at: Utc::now(),
        }
    }

    pub fn items(&self, section: Section) -> &[RetroItem] {
        match section {
            Section::WentWell => &self.went_well,
            Section::ToImprove => &self.to_improve,
        }
    }

    fn items_mut(&mut self, section: Section) -> &mut Vec<RetroItem> {
        match section {
            Section::WentWell => &mut self.went_well,
            Section::ToImprove => &mut self.to_improve,
        }
    }

    pub fn add_item(&mut self, section: Section, text: impl Into<String>) {
        self.items_mut(section).push(RetroItem {
            text: text.into(),
            votes: 0,
            timestamp: Utc::now(),
        });
    }

    /// Returns the new vote count, or `None` for a bad index.
    pub fn vote(&mut self, section: Section, index: usize) -> Option<u32> {
        let item = self.items_mut(section).get_mut(index)?;
        item.votes += 1;
        Some(item.votes)
    }

    pub fn remove_item(&mut self, section: Section, index: usize) -> bool {
        let items = self.items_mut(section);
        if index < items.len() {
            items.remove(index);
            true
        } else {
            false
        }
    }

    /// Blank owners fall back to "Unassigned".
    pub fn add_action(&mut self, text: impl Into<String>, owner: Option<&str>) {
        let owner = owner
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map_or_else(unassigned, str::to_string);
        self.action_items.push(ActionItem {
            text: text.into(),
            owner,
            status: ActionStatus::Open,
            created_at: Utc::now(),
        });
    }

    pub fn set_action_status(&mut self, index: usize, status: ActionStatus) -> bool {
        match self.action_items.get_mut(index) {
            Some(action) => {
                action.status = status;
                true
            }
            None => false,
        }
    }

    pub fn remove_action(&mut self, index: usize) -> bool {
        if index < self.action_items.len() {
            self.action_items.remove(index);
            true
        } else {
            false
        }
    }

    pub fn set_mood(&mut self, mood: u8) -> Result<()> {
        if !(1..=5).contains(&mood) {
            return Err(SprintError::InvalidValue(format!(
                "team mood must be between 1 and 5, got {mood}"
            )));
        }
        self.team_mood = mood;
        Ok(())
    }
}

impl Record for Retrospective {
    const KIND: Kind = Kind::Retrospectives;

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> String {
        self.sprint_name.clone()
    }
}

/// An unfinished action item with the sprint it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAction {
    pub sprint_name: String,
    pub index: usize,
    pub action: ActionItem,
}

/// Load the sprint's retrospective, creating an empty one in memory when
/// none exists yet. `None` when the sprint itself is missing.
pub fn load_or_new<B: Backend>(store: &Store<B>, sprint_id: &str) -> Result<Option<Retrospective>> {
    if let Some(retro) = store.get::<Retrospective>(sprint_id)? {
        return Ok(Some(retro));
    }
    Ok(store
        .get::<Sprint>(sprint_id)?
        .map(|sprint| Retrospective::for_sprint(&sprint)))
}

/// Apply `edit` to the sprint's retrospective and persist it.
///
/// Fails with `SprintNotFound` when the sprint has no retrospective and
/// does not exist, and with whatever `edit` returns otherwise.
pub fn update<B, T, F>(store: &Store<B>, sprint_id: &str, edit: F) -> Result<T>
where
    B: Backend,
    F: FnOnce(&mut Retrospective) -> Result<T>,
{
    let mut retro = load_or_new(store, sprint_id)?
        .ok_or_else(|| SprintError::SprintNotFound(sprint_id.to_string()))?;
    let out = edit(&mut retro)?;
    store.save(&retro)?;
    Ok(out)
}

/// Every action item not yet Done, across all retrospectives.
pub fn open_actions<B: Backend>(store: &Store<B>) -> Result<Vec<OpenAction>> {
    Ok(store
        .list::<Retrospective>()?
        .into_iter()
        .flat_map(|retro| {
            let sprint_name = retro.sprint_name;
            retro
                .action_items
                .into_iter()
                .enumerate()
                .filter(|(_, a)| a.status != ActionStatus::Done)
                .map(move |(index, action)| OpenAction {
                    sprint_name: sprint_name.clone(),
                    index,
                    action,
                })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrum::create_sprint;

    fn setup() -> (Store<crate::store::InMemory>, Sprint) {
        let store = Store::in_memory();
        let sprint = create_sprint("Sprint-7", 2, None, 30);
        store.save(&sprint).unwrap();
        (store, sprint)
    }

    #[test]
    fn update_creates_retro_for_existing_sprint() {
        let (store, sprint) = setup();
        update(&store, &sprint.id, |r| {
            r.add_item(Section::WentWell, "pairing");
            Ok(())
        })
        .unwrap();

        let retro: Retrospective = store.get(&sprint.id).unwrap().unwrap();
        assert_eq!(retro.sprint_name, "Sprint-7");
        assert_eq!(retro.team_mood, DEFAULT_MOOD);
        assert_eq!(retro.went_well[0].text, "pairing");
        assert_eq!(retro.went_well[0].votes, 0);
    }

    #[test]
    fn update_rejects_missing_sprint() {
        let store = Store::in_memory();
        let err = update(&store, "ghost", |_| Ok(())).unwrap_err();
        assert!(matches!(err, SprintError::SprintNotFound(_)));
        assert!(store.list::<Retrospective>().unwrap().is_empty());
    }

    #[test]
    fn votes_and_removal_respect_indices() {
        let (_, sprint) = setup();
        let mut r = Retrospective::for_sprint(&sprint);
        r.add_item(Section::ToImprove, "flaky CI");
        assert_eq!(r.vote(Section::ToImprove, 0), Some(1));
        assert_eq!(r.vote(Section::ToImprove, 0), Some(2));
        assert_eq!(r.vote(Section::ToImprove, 1), None);
        assert_eq!(r.vote(Section::WentWell, 0), None);
        assert!(!r.remove_item(Section::WentWell, 0));
        assert!(r.remove_item(Section::ToImprove, 0));
        assert!(r.items(Section::ToImprove).is_empty());
    }

    #[test]
    fn mood_outside_range_is_rejected() {
        let (store, sprint) = setup();
        let err = update(&store, &sprint.id, |r| r.set_mood(6)).unwrap_err();
        assert!(matches!(err, SprintError::InvalidValue(_)));
        assert!(store.get::<Retrospective>(&sprint.id).unwrap().is_none());

        update(&store, &sprint.id, |r| r.set_mood(5)).unwrap();
        let retro: Retrospective = store.get(&sprint.id).unwrap().unwrap();
        assert_eq!(retro.team_mood, 5);
    }

    #[test]
    fn action_owner_defaults_and_open_actions() {
        let (store, sprint) = setup();
        update(&store, &sprint.id, |r| {
            r.add_action("fix CI", None);
            r.add_action("write docs", Some("bob"));
            r.add_action("ship it", Some("  "));
            assert!(r.set_action_status(1, ActionStatus::Done));
            assert!(!r.set_action_status(9, ActionStatus::Done));
            Ok(())
        })
        .unwrap();

        let open = open_actions(&store).unwrap();
        assert_eq!(open.len(), 2);
        assert_eq!(open[0].action.owner, UNASSIGNED);
        assert_eq!(open[1].index, 2);
        assert_eq!(open[1].action.owner, UNASSIGNED);
        assert_eq!(open[0].sprint_name, "Sprint-7");
    }

    #[test]
    fn action_status_parses_loosely() {
        assert_eq!("in progress".parse::<ActionStatus>().unwrap(), ActionStatus::InProgress);
        assert_eq!("In-Progress".parse::<ActionStatus>().unwrap(), ActionStatus::InProgress);
        assert_eq!("DONE".parse::<ActionStatus>().unwrap(), ActionStatus::Done);
        assert!("later".parse::<ActionStatus>().is_err());
        assert_eq!(serde_json::to_value(ActionStatus::InProgress).unwrap(), "In Progress");
    }
}
