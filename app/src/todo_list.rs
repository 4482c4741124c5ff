//! The todo list feature: adding, editing, filtering and reordering todos.
//!
//! Completed todos sink below incomplete ones, but never immediately: a
//! checkbox toggle waits for a quiet period (debounced under
//! [`TODO_COMPLETION_ID`]) and a manual move waits a short moment (under
//! [`SORT_AFTER_MOVE_ID`]) so the user sees the change before the list
//! re-sorts.

use crate::config::Timings;
use crate::todo::{Todo, TodoAction, TodoId, TodoReducer};
use composable_core::composition::{CombinedReducer, combine_reducers};
use composable_core::environment::{Scheduler, UuidGenerator};
use composable_core::{Effect, EffectId, Effects, IdentifiedVec, Reducer, ReducerExt, debounce, smallvec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Debounce key for the sort that follows a checkbox toggle
///
/// Shared by every todo: toggles on different todos coalesce into one sort.
pub const TODO_COMPLETION_ID: EffectId = EffectId::new("todo_completion");

/// Key for the sort that follows a move
pub const SORT_AFTER_MOVE_ID: EffectId = EffectId::new("todo_sort_after_move");

/// Whether rows can be deleted and reordered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditMode {
    /// Rows are read-only
    #[default]
    Inactive,
    /// Rows can be deleted and moved
    Active,
}

/// Which todos are visible
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Filter {
    /// Every todo
    #[default]
    All,
    /// Incomplete todos only
    Active,
    /// Completed todos only
    Completed,
}

impl Filter {
    /// Every filter, in display order
    pub const ALL_CASES: [Self; 3] = [Self::All, Self::Active, Self::Completed];

    /// Whether `todo` is visible under this filter
    #[must_use]
    pub const fn matches(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.completed,
            Self::Completed => todo.completed,
        }
    }
}

/// State of the todo list
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoListState {
    /// Edit mode of the list
    pub edit_mode: EditMode,
    /// Active filter
    pub filter: Filter,
    /// Every todo, in display order
    pub todos: IdentifiedVec<Todo>,
}

impl TodoListState {
    /// A list holding `todos`, no filter, not editing
    #[must_use]
    pub fn with_todos(todos: impl IntoIterator<Item = Todo>) -> Self {
        Self {
            todos: todos.into_iter().collect(),
            ..Self::default()
        }
    }

    /// The todos visible under the active filter, in collection order
    pub fn filtered_todos(&self) -> impl Iterator<Item = &Todo> {
        let filter = self.filter;
        self.todos.iter().filter(move |todo| filter.matches(todo))
    }

    /// Ids of the visible todos, in collection order
    #[must_use]
    pub fn filtered_ids(&self) -> Vec<TodoId> {
        self.filtered_todos().map(|todo| todo.id).collect()
    }

    /// Whether "clear completed" has nothing to clear
    #[must_use]
    pub fn is_clear_completed_disabled(&self) -> bool {
        !self.todos.iter().any(|todo| todo.completed)
    }

    /// Translate offsets in the filtered view to offsets in the full collection
    fn collection_offsets(&self, visible: &[TodoId], offsets: &BTreeSet<usize>) -> BTreeSet<usize> {
        offsets
            .iter()
            .filter_map(|&offset| visible.get(offset))
            .filter_map(|id| self.todos.index_of(id))
            .collect()
    }

    /// Translate a drop position in the filtered view to one in the full collection
    ///
    /// Dropping past the last visible todo lands just after it, not at the end
    /// of the whole collection.
    fn collection_destination(&self, visible: &[TodoId], destination: usize) -> usize {
        match visible.get(destination) {
            Some(id) => self.todos.index_of(id).unwrap_or(destination),
            None => visible
                .last()
                .and_then(|id| self.todos.index_of(id))
                .map_or(destination, |index| index + 1),
        }
    }
}

/// Actions of the todo list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoListAction {
    /// Insert a new empty todo at the top
    AddButtonTapped,
    /// Remove every completed todo
    ClearCompletedButtonTapped,
    /// Remove the todos at these offsets of the filtered view
    Delete(BTreeSet<usize>),
    /// Enter or leave edit mode
    EditModeChanged(EditMode),
    /// Pick the visible subset
    FilterPicked(Filter),
    /// Move the todos at `source` offsets of the filtered view before `destination`
    Move {
        /// Offsets being moved
        source: BTreeSet<usize>,
        /// Drop position, in filtered-view offsets before the move
        destination: usize,
    },
    /// Stable-sort completed todos below incomplete ones
    SortCompletedTodos,
    /// An action for one todo
    Todo {
        /// Which todo
        id: TodoId,
        /// What happened to it
        action: TodoAction,
    },
}

/// Dependencies of the todo list
#[derive(Clone)]
pub struct TodoListEnvironment {
    /// Source of new todo ids
    pub uuid: Arc<dyn UuidGenerator>,
    /// Scheduler for the delayed sorts
    pub scheduler: Arc<dyn Scheduler>,
    /// Effect timings
    pub timings: Timings,
}

impl std::fmt::Debug for TodoListEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoListEnvironment")
            .field("timings", &self.timings)
            .finish_non_exhaustive()
    }
}

/// List-level logic of the todo list
///
/// Per-todo actions are handled by [`TodoReducer`]; this reducer only reacts to
/// them by scheduling the debounced sort. Use [`todo_list_reducer`] for the
/// full feature.
#[derive(Clone, Copy, Debug, Default)]
pub struct TodoListReducer;

impl Reducer for TodoListReducer {
    type State = TodoListState;
    type Action = TodoListAction;
    type Environment = TodoListEnvironment;

    fn reduce(
        &self,
        state: &mut TodoListState,
        action: TodoListAction,
        env: &TodoListEnvironment,
    ) -> Effects<TodoListAction> {
        match action {
            TodoListAction::AddButtonTapped => {
                let id = TodoId::from_uuid(env.uuid.generate());
                if !state.todos.insert(0, Todo::new(id)) {
                    tracing::warn!(%id, "Generated a todo id that is already in use; ignoring add");
                }
                Effects::new()
            },
            TodoListAction::ClearCompletedButtonTapped => {
                state.todos.retain(|todo| !todo.completed);
                Effects::new()
            },
            TodoListAction::Delete(offsets) => {
                let visible = state.filtered_ids();
                let offsets = state.collection_offsets(&visible, &offsets);
                state.todos.remove_at_offsets(&offsets);
                Effects::new()
            },
            TodoListAction::EditModeChanged(edit_mode) => {
                state.edit_mode = edit_mode;
                Effects::new()
            },
            TodoListAction::FilterPicked(filter) => {
                state.filter = filter;
                Effects::new()
            },
            TodoListAction::Move { source, destination } => {
                let (source, destination) = if state.filter == Filter::All {
                    (source, destination)
                } else {
                    let visible = state.filtered_ids();
                    (
                        state.collection_offsets(&visible, &source),
                        state.collection_destination(&visible, destination),
                    )
                };
                state.todos.move_items(&source, destination);

                smallvec![
                    Effect::just(TodoListAction::SortCompletedTodos)
                        .delay(env.timings.move_sort_delay, Arc::clone(&env.scheduler))
                        .cancellable(SORT_AFTER_MOVE_ID, false)
                ]
            },
            TodoListAction::SortCompletedTodos => {
                state.todos.sort_by_key(|todo| todo.completed);
                Effects::new()
            },
            TodoListAction::Todo {
                action: TodoAction::CheckboxToggled,
                ..
            } => smallvec![debounce! {
                id: TODO_COMPLETION_ID,
                duration: env.timings.sort_debounce,
                scheduler: env.scheduler,
                action: TodoListAction::SortCompletedTodos
            }],
            TodoListAction::Todo { .. } => Effects::new(),
        }
    }
}

/// Concrete type of the assembled todo list reducer
pub type TodoListFeature = CombinedReducer<TodoListState, TodoListAction, TodoListEnvironment>;

/// The todo list feature: per-todo reducers followed by the list logic
#[must_use]
pub fn todo_list_reducer() -> TodoListFeature {
    combine_reducers(vec![
        TodoReducer
            .for_each(todos, todo_action, embed_todo_action, todo_environment)
            .boxed(),
        TodoListReducer.boxed(),
    ])
}

fn todos(state: &mut TodoListState) -> &mut IdentifiedVec<Todo> {
    &mut state.todos
}

fn todo_action(action: TodoListAction) -> Option<(TodoId, TodoAction)> {
    match action {
        TodoListAction::Todo { id, action } => Some((id, action)),
        _ => None,
    }
}

const fn embed_todo_action(id: TodoId, action: TodoAction) -> TodoListAction {
    TodoListAction::Todo { id, action }
}

const fn todo_environment(_env: &TodoListEnvironment) {}
