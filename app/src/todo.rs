//! A single todo item and its reducer.

use composable_core::{Effects, Identifiable, Reducer};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a todo item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(Uuid);

impl TodoId {
    /// Creates a `TodoId` from a UUID
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single todo item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier, fixed at creation
    pub id: TodoId,
    /// What needs doing
    pub description: String,
    /// Whether the todo is done
    pub completed: bool,
}

impl Todo {
    /// An empty, incomplete todo
    #[must_use]
    pub const fn new(id: TodoId) -> Self {
        Self {
            id,
            description: String::new(),
            completed: false,
        }
    }

    /// Sets the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the completed flag
    #[must_use]
    pub const fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}

impl Identifiable for Todo {
    type Id = TodoId;

    fn id(&self) -> TodoId {
        self.id
    }
}

/// Actions on a single todo
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoAction {
    /// Flip the completed flag
    CheckboxToggled,
    /// Replace the description
    TextFieldChanged(String),
}

/// Reducer for a single todo
///
/// Needs nothing from its environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct TodoReducer;

impl Reducer for TodoReducer {
    type State = Todo;
    type Action = TodoAction;
    type Environment = ();

    fn reduce(&self, state: &mut Todo, action: TodoAction, _env: &()) -> Effects<TodoAction> {
        match action {
            TodoAction::CheckboxToggled => state.completed = !state.completed,
            TodoAction::TextFieldChanged(text) => state.description = text,
        }
        Effects::new()
    }
}
