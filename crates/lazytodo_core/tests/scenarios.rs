//! End-to-end flows against a SQLite-backed manager.

use lazytodo_core::{
    ManualClock, SqliteTodoStore, StoreConfig, TodoHandle, TodoManager, TodoStore,
};

fn setup() -> (TodoManager<SqliteTodoStore>, ManualClock) {
    let clock = ManualClock::new(1_700_000_000_000);
    let store = SqliteTodoStore::open_in_memory(StoreConfig::default()).unwrap();
    (TodoManager::with_clock(store, clock.clone()), clock)
}

#[test]
fn single_add_from_empty() {
    let (mut manager, _clock) = setup();
    assert!(manager.is_empty());

    manager.add("Buy milk").unwrap();

    let todos = manager.list();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].title, "Buy milk");
    assert!(!todos[0].completed);
    assert_eq!(todos[0].created_at, todos[0].updated_at);
}

#[test]
fn reorder_three_items() {
    let (mut manager, clock) = setup();
    let a = manager.add("A").unwrap();
    clock.advance(1);
    let b = manager.add("B").unwrap();
    clock.advance(1);
    let c = manager.add("C").unwrap();

    manager.reorder(&[c.id, a.id, b.id]).unwrap();

    let titles: Vec<&str> = manager.list().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["C", "A", "B"]);
    assert_eq!(manager.store().load(), manager.list());
}

#[test]
fn toggle_back_and_forth() {
    let (mut manager, _clock) = setup();
    let x = manager.add("X").unwrap();

    manager.toggle(x.id).unwrap();
    assert!(manager.list()[0].completed);

    manager.toggle(x.id).unwrap();
    assert!(!manager.list()[0].completed);
}

#[test]
fn delete_twice_is_harmless() {
    let (mut manager, _clock) = setup();
    let y = manager.add("Y").unwrap();

    manager.delete(y.id).unwrap();
    assert!(manager.list().is_empty());

    manager.delete(y.id).unwrap();
    assert!(manager.list().is_empty());
    assert!(manager.store().load().is_empty());
}

#[test]
fn shared_handle_drives_the_same_flow() {
    let (manager, _clock) = setup();
    let handle = TodoHandle::new(manager);
    let ui = handle.clone();

    let milk = ui.add("Buy milk").unwrap();
    let eggs = ui.add("Buy eggs").unwrap();
    handle.toggle(milk.id).unwrap();
    ui.reorder(&[eggs.id, milk.id]).unwrap();
    handle.delete_many(&[eggs.id]).unwrap();

    let todos = handle.list();
    assert_eq!(todos.len(), 1);
    assert!(todos[0].completed);
    assert_eq!(handle.get(milk.id), Some(todos[0].clone()));
    assert_eq!(handle.with(|m| m.store().load()), todos);
}
