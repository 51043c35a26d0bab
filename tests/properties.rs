//! Property-based tests for the data store and the derived todo views

use proptest::prelude::*;
use tdo_manager::{
    ids::{Clock, ManualClock, new_id},
    models::{
        filter::{FilterSpec, SortField, SortOrder, StatusFilter},
        project::Project,
        store::AppData,
        todo::{NewTodo, Priority},
    },
    query::filter_todos,
    storage::{Storage, memory::MemoryStorage},
};
use uuid::Uuid;

#[derive(Debug, Clone)]
enum Op {
    AddProject,
    AddTodo { project: usize, priority: Priority },
    DeleteProject(usize),
    DeleteTodo(usize),
    ToggleTodo(usize),
    Reorder { dragged: usize, target: usize },
}

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::High),
        Just(Priority::Medium),
        Just(Priority::Low),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::AddProject),
        (any::<usize>(), priority_strategy())
            .prop_map(|(project, priority)| Op::AddTodo { project, priority }),
        any::<usize>().prop_map(Op::DeleteProject),
        any::<usize>().prop_map(Op::DeleteTodo),
        any::<usize>().prop_map(Op::ToggleTodo),
        (any::<usize>(), any::<usize>())
            .prop_map(|(dragged, target)| Op::Reorder { dragged, target }),
    ]
}

fn pick<T: Copy>(items: &[T], index: usize) -> Option<T> {
    if items.is_empty() {
        None
    } else {
        Some(items[index % items.len()])
    }
}

/// Applies an op, ignoring the not-found and cross-project rejections
fn apply(store: &mut AppData, clock: &ManualClock, op: &Op) {
    let project_ids: Vec<Uuid> = store.projects.iter().map(|p| p.id).collect();
    let todo_ids: Vec<Uuid> = store.todos.iter().map(|t| t.id).collect();

    match op {
        Op::AddProject => {
            let name = format!("Project {}", project_ids.len());
            store.add_project(Project::new(new_id(), name, String::new(), clock.now()));
        }
        Op::AddTodo { project, priority } => {
            let fields = NewTodo {
                title: format!("Todo {}", todo_ids.len()),
                priority: *priority,
                ..NewTodo::default()
            };
            let _ = store.add_todo(new_id(), pick(&project_ids, *project), fields, clock.now());
        }
        Op::DeleteProject(index) => {
            if let Some(id) = pick(&project_ids, *index) {
                let _ = store.delete_project(id);
            }
        }
        Op::DeleteTodo(index) => {
            if let Some(id) = pick(&todo_ids, *index) {
                let _ = store.delete_todo(id);
            }
        }
        Op::ToggleTodo(index) => {
            if let Some(id) = pick(&todo_ids, *index) {
                let _ = store.toggle_todo(id, clock.now());
            }
        }
        Op::Reorder { dragged, target } => {
            if let (Some(a), Some(b)) = (pick(&todo_ids, *dragged), pick(&todo_ids, *target)) {
                let _ = store.reorder_todos(a, b, clock.now());
            }
        }
    }
}

fn filter_strategy() -> impl Strategy<Value = FilterSpec> {
    (
        prop_oneof![
            Just(StatusFilter::All),
            Just(StatusFilter::Active),
            Just(StatusFilter::Completed),
        ],
        prop::option::of(priority_strategy()),
        prop_oneof![
            Just(SortField::Position),
            Just(SortField::CreatedAt),
            Just(SortField::UpdatedAt),
            Just(SortField::Priority),
            Just(SortField::Deadline),
            Just(SortField::Title),
        ],
        prop_oneof![Just(SortOrder::Asc), Just(SortOrder::Desc)],
        prop_oneof![Just(String::new()), Just(String::from("1"))],
    )
        .prop_map(|(status, priority, sort_field, sort_order, search)| FilterSpec {
            status,
            priority,
            tag: String::new(),
            search,
            sort_field,
            sort_order,
        })
}

proptest! {
    /// Property: after any sequence of mutations, every todo belongs to an existing project
    /// and no entity was updated before it was created.
    #[test]
    fn prop_no_orphans_after_any_mutations(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let clock = ManualClock::ticking();
        let mut store = AppData::default();

        for op in &ops {
            apply(&mut store, &clock, op);
            prop_assert!(store.orphaned_todos().is_empty(), "orphan after {:?}", op);
        }

        for todo in &store.todos {
            prop_assert!(todo.updated_at >= todo.created_at);
        }
        for project in &store.projects {
            prop_assert!(project.updated_at >= project.created_at);
        }
    }

    /// Property: reordering yields dense positions 0..n within the project and puts the
    /// dragged todo at the target's former index.
    #[test]
    fn prop_reorder_renumbers_densely(
        count in 1usize..12,
        dragged in any::<usize>(),
        target in any::<usize>(),
    ) {
        let clock = ManualClock::ticking();
        let mut store = AppData::default();
        let project_id = store
            .add_project(Project::new(new_id(), String::from("P"), String::new(), clock.now()))
            .id;
        for i in 0..count {
            let fields = NewTodo { title: format!("T{i}"), ..NewTodo::default() };
            store.add_todo(new_id(), Some(project_id), fields, clock.now()).unwrap();
        }
        let ordered: Vec<Uuid> = store.todos.iter().map(|t| t.id).collect();
        let dragged_id = ordered[dragged % count];
        let target_index = target % count;
        let target_id = ordered[target_index];

        store.reorder_todos(dragged_id, target_id, clock.now()).unwrap();

        let mut positions: Vec<u32> = store.todos.iter().map(|t| t.position).collect();
        positions.sort_unstable();
        prop_assert_eq!(positions, (0..count as u32).collect::<Vec<_>>());
        prop_assert_eq!(store.get_todo(dragged_id).unwrap().position, target_index as u32);

        // Everything else keeps its relative order
        let mut after: Vec<_> = store.todos.iter().collect();
        after.sort_by_key(|t| t.position);
        let others_after: Vec<Uuid> =
            after.iter().map(|t| t.id).filter(|id| *id != dragged_id).collect();
        let others_before: Vec<Uuid> =
            ordered.iter().copied().filter(|id| *id != dragged_id).collect();
        prop_assert_eq!(others_after, others_before);
    }

    /// Property: dropping a todo onto itself changes nothing.
    #[test]
    fn prop_reorder_onto_itself_is_noop(count in 1usize..8, index in any::<usize>()) {
        let clock = ManualClock::ticking();
        let mut store = AppData::default();
        let project_id = store
            .add_project(Project::new(new_id(), String::from("P"), String::new(), clock.now()))
            .id;
        for i in 0..count {
            let fields = NewTodo { title: format!("T{i}"), ..NewTodo::default() };
            store.add_todo(new_id(), Some(project_id), fields, clock.now()).unwrap();
        }
        let id = store.todos[index % count].id;
        let before = store.clone();

        prop_assert_eq!(store.reorder_todos(id, id, clock.now()).unwrap(), 0);
        prop_assert_eq!(store, before);
    }

    /// Property: filtering the same input twice gives the same sequence, and equal sort
    /// keys keep their stored order.
    #[test]
    fn prop_filter_is_idempotent_and_stable(
        ops in prop::collection::vec(op_strategy(), 0..40),
        filters in filter_strategy(),
    ) {
        let clock = ManualClock::ticking();
        let mut store = AppData::default();
        apply(&mut store, &clock, &Op::AddProject);
        for op in &ops {
            apply(&mut store, &clock, op);
        }
        let active = store.projects.first().map(|p| p.id);

        let first: Vec<Uuid> = filter_todos(&store.todos, active, &filters).iter().map(|t| t.id).collect();
        let second: Vec<Uuid> = filter_todos(&store.todos, active, &filters).iter().map(|t| t.id).collect();
        prop_assert_eq!(&first, &second);

        let stored_index = |id: &Uuid| store.todos.iter().position(|t| t.id == *id).unwrap();
        let visible = filter_todos(&store.todos, active, &filters);
        for pair in visible.windows(2) {
            if tdo_manager::query::compare_by(pair[0], pair[1], filters.sort_field).is_eq() {
                prop_assert!(stored_index(&pair[0].id) < stored_index(&pair[1].id));
            }
        }
    }

    /// Property: saving then loading an already valid record is a fixed point.
    #[test]
    fn prop_save_load_round_trip(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let clock = ManualClock::ticking();
        let mut store = AppData::default();
        for op in &ops {
            apply(&mut store, &clock, op);
        }
        let storage = MemoryStorage::new();

        storage.save(&store).unwrap();
        let loaded = storage.load().unwrap();
        storage.save(&loaded).unwrap();

        prop_assert_eq!(&loaded, &store);
        prop_assert_eq!(storage.load().unwrap(), store);
    }
}
