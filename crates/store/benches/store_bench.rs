use std::sync::Arc;

use chrono::Utc;
use common::{FixedClock, PageRequest, UserSession};
use criterion::{Criterion, criterion_group, criterion_main};
use serde::{Deserialize, Serialize};
use store::{Entity, EntityId, EntityStore, InMemoryEntityStore, UnitOfWork};

#[derive(Clone, Serialize, Deserialize)]
struct Item {
    id: EntityId,
    title: String,
    quantity: u32,
}

impl Item {
    fn new(n: u32) -> Self {
        Self {
            id: EntityId::new(),
            title: format!("item-{n}"),
            quantity: n,
        }
    }
}

impl Entity for Item {
    const ENTITY_TYPE: &'static str = "Item";

    fn id(&self) -> EntityId {
        self.id
    }
}

fn uow(store: &InMemoryEntityStore) -> UnitOfWork<InMemoryEntityStore> {
    UnitOfWork::new(
        store.clone(),
        UserSession::anonymous(),
        Arc::new(FixedClock(Utc::now())),
    )
}

fn bench_save_single(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("store/save_single", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEntityStore::new();
                let mut uow = uow(&store);
                uow.set::<Item>().add(&Item::new(1)).unwrap();
                uow.save_changes().await.unwrap();
            });
        });
    });
}

fn bench_save_batch_10(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("store/save_batch_10", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEntityStore::new();
                let mut uow = uow(&store);
                for n in 0..10 {
                    uow.set::<Item>().add(&Item::new(n)).unwrap();
                }
                uow.save_changes().await.unwrap();
            });
        });
    });
}

fn bench_load_update_save(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEntityStore::new();
    let item = Item::new(1);
    rt.block_on(async {
        let mut setup = uow(&store);
        setup.set::<Item>().add(&item).unwrap();
        setup.save_changes().await.unwrap();
    });

    c.bench_function("store/load_update_save", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut uow = uow(&store);
                let mut loaded = uow.set::<Item>().get(item.id).await.unwrap();
                loaded.quantity += 1;
                uow.set::<Item>().update(&loaded).unwrap();
                uow.save_changes().await.unwrap();
            });
        });
    });
}

fn bench_list_page(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEntityStore::new();
    rt.block_on(async {
        let mut setup = uow(&store);
        for n in 0..500 {
            setup.set::<Item>().add(&Item::new(n)).unwrap();
        }
        setup.save_changes().await.unwrap();
    });

    c.bench_function("store/list_page_of_500", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.list("Item", PageRequest::new(3, 50)).await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_save_single,
    bench_save_batch_10,
    bench_load_update_save,
    bench_list_page
);
criterion_main!(benches);
