use async_trait::async_trait;
use common::{Outcome, UserSession};
use cqrs::{BoxError, Command, CommandHandler, Dispatcher, JsonRouter};
use criterion::{Criterion, criterion_group, criterion_main};
use serde::Deserialize;

#[derive(Deserialize)]
struct Touch {
    #[allow(dead_code)]
    key: String,
}

impl Command for Touch {
    const NAME: &'static str = "Touch";
}

struct TouchHandler;

#[async_trait]
impl CommandHandler<Touch> for TouchHandler {
    async fn handle(&self, _session: &UserSession, _command: Touch) -> Result<Outcome, BoxError> {
        Ok(Outcome::ok())
    }
}

fn dispatcher() -> Dispatcher {
    Dispatcher::builder()
        .command::<Touch, _>(TouchHandler)
        .build()
        .unwrap()
}

fn bench_send(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dispatcher = dispatcher();

    c.bench_function("cqrs/send", |b| {
        b.iter(|| {
            rt.block_on(async {
                dispatcher
                    .send(Touch {
                        key: "k".to_string(),
                    })
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_route_json(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let router = JsonRouter::builder(dispatcher())
        .command::<Touch>()
        .build()
        .unwrap();

    c.bench_function("cqrs/route_json", |b| {
        b.iter(|| {
            rt.block_on(async {
                router
                    .route_json(r#"{"type":"Touch","payload":{"key":"k"}}"#)
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_send, bench_route_json);
criterion_main!(benches);
