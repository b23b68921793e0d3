use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Colour, TodoEvent, TodoItem, TodoList};
use persistence::{
    ChangeSet, EventPublisher, InMemoryTodoStore, SystemClock, TodoStore, UnitOfWork,
    unique_index,
};

fn bench_save_list_with_items(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("persistence/save_list_with_10_items", |b| {
        b.iter(|| {
            rt.block_on(async {
                let uow = UnitOfWork::new(
                    Arc::new(InMemoryTodoStore::new()),
                    Arc::new(EventPublisher::<TodoEvent>::new()),
                    Arc::new(SystemClock),
                );

                let mut list = TodoList::new("Benchmark", Colour::BLUE).unwrap();
                let mut items: Vec<TodoItem> = (0..10)
                    .map(|i| TodoItem::new(list.id(), &format!("Task {i}")).unwrap())
                    .collect();

                let mut changes = ChangeSet::new();
                changes.add_list(&mut list);
                for item in &mut items {
                    changes.add_item(item);
                }
                uow.save(&mut changes, None).await.unwrap();
            });
        });
    });
}

fn bench_items_in_list(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryTodoStore::new();
    let list_id = rt.block_on(async {
        let uow = UnitOfWork::new(
            Arc::new(store.clone()),
            Arc::new(EventPublisher::<TodoEvent>::new()),
            Arc::new(SystemClock),
        );
        let mut list = TodoList::new("Large list", Colour::GREY).unwrap();
        let mut items: Vec<TodoItem> = (0..1000)
            .map(|i| TodoItem::new(list.id(), &format!("Task {i}")).unwrap())
            .collect();

        let mut changes = ChangeSet::new();
        changes.add_list(&mut list);
        for item in &mut items {
            changes.add_item(item);
        }
        uow.save(&mut changes, None).await.unwrap();
        list.id()
    });

    c.bench_function("persistence/items_in_list_1000", |b| {
        b.iter(|| {
            rt.block_on(async { store.items_in_list(list_id).await.unwrap() });
        });
    });
}

fn bench_interpret_unique_violation(c: &mut Criterion) {
    let error = persistence::DatabaseError {
        code: Some("23505".to_string()),
        constraint: Some("ix_todo_lists_title".to_string()),
        table: Some("todo_lists".to_string()),
        message: "duplicate key value violates unique constraint".to_string(),
        detail: Some("Key (title)=(Groceries) already exists.".to_string()),
    };

    c.bench_function("persistence/interpret_unique_violation", |b| {
        b.iter(|| unique_index::interpret(&error));
    });
}

criterion_group!(
    benches,
    bench_save_list_with_items,
    bench_items_in_list,
    bench_interpret_unique_violation
);
criterion_main!(benches);
