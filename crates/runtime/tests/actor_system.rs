use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use battle_runtime::{
    Actor, ActorFactory, ActorFailure, ActorSnapshot, ActorSystem, InMemorySnapshotRepository,
    PersistOutcome, RuntimeError, SnapshotError,
};

/// Minimal actor whose updates are split across an await point, so
/// interleaved handlers would lose writes.
struct Counter {
    value: i64,
    dirty: bool,
}

enum CounterMsg {
    Add(i64),
    Get,
    Sleep(Duration),
    Explode,
}

#[async_trait]
impl Actor for Counter {
    const ACTOR_TYPE: &'static str = "counter";

    type Message = CounterMsg;
    type Reply = Result<i64, String>;

    async fn handle(&mut self, message: CounterMsg) -> Result<i64, String> {
        match message {
            CounterMsg::Add(n) => {
                let read = self.value;
                tokio::task::yield_now().await;
                self.value = read + n;
                self.dirty = true;
                Ok(self.value)
            }
            CounterMsg::Get => Ok(self.value),
            CounterMsg::Sleep(duration) => {
                tokio::time::sleep(duration).await;
                Ok(self.value)
            }
            CounterMsg::Explode => panic!("counter exploded"),
        }
    }

    fn failure_reply(failure: ActorFailure) -> Result<i64, String> {
        Err(failure.to_string())
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn snapshot(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(self.value.to_le_bytes().to_vec())
    }
}

struct CounterFactory;

impl ActorFactory for CounterFactory {
    type Actor = Counter;
    type Spec = i64;

    fn create(&self, _actor_id: &str, start: i64) -> Counter {
        Counter {
            value: start,
            dirty: false,
        }
    }

    fn restore(&self, _actor_id: &str, snapshot: ActorSnapshot) -> Counter {
        let value = snapshot
            .state
            .as_slice()
            .try_into()
            .map(i64::from_le_bytes)
            .unwrap_or_default();
        Counter {
            value,
            dirty: false,
        }
    }
}

const TIMEOUT: Duration = Duration::from_secs(5);

fn system() -> (Arc<ActorSystem<CounterFactory>>, Arc<InMemorySnapshotRepository>) {
    let snapshots = Arc::new(InMemorySnapshotRepository::new());
    let system = Arc::new(ActorSystem::new(
        Arc::new(CounterFactory),
        snapshots.clone(),
        16,
        TIMEOUT,
    ));
    (system, snapshots)
}

#[tokio::test]
async fn concurrent_asks_apply_as_if_serialized() {
    let (system, _) = system();
    system.get_or_create_actor("c1", 0);

    let mut tasks = Vec::new();
    for _ in 0..50 {
        let system = system.clone();
        tasks.push(tokio::spawn(async move {
            system.ask("c1", CounterMsg::Add(1), TIMEOUT).await
        }));
    }

    let mut replies = Vec::new();
    for task in tasks {
        replies.push(task.await.unwrap().unwrap().unwrap());
    }
    replies.sort_unstable();
    assert_eq!(replies, (1..=50).collect::<Vec<i64>>());

    let total = system.ask("c1", CounterMsg::Get, TIMEOUT).await.unwrap();
    assert_eq!(total, Ok(50));
}

#[tokio::test(start_paused = true)]
async fn ask_times_out_but_the_message_still_runs() {
    let (system, _) = system();
    system.get_or_create_actor("c1", 0);

    let err = system
        .ask("c1", CounterMsg::Sleep(Duration::from_secs(10)), Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::AskTimeout { ref actor_id, .. } if actor_id == "c1"));

    // Queued behind the sleeper; answered once it finishes.
    let value = system
        .ask("c1", CounterMsg::Add(3), Duration::from_secs(30))
        .await
        .unwrap();
    assert_eq!(value, Ok(3));
    assert_eq!(system.metrics().ask_timeouts, 1);
}

#[tokio::test]
async fn handler_panic_becomes_a_failure_reply() {
    let (system, _) = system();
    system.get_or_create_actor("c1", 0);

    let reply = system.ask("c1", CounterMsg::Explode, TIMEOUT).await.unwrap();
    let message = reply.unwrap_err();
    assert!(message.contains("counter exploded"), "{message}");

    // The actor keeps serving.
    let reply = system.ask("c1", CounterMsg::Add(1), TIMEOUT).await.unwrap();
    assert_eq!(reply, Ok(1));
    assert_eq!(system.metrics().panics, 1);
}

#[tokio::test(start_paused = true)]
async fn slow_actor_does_not_block_others() {
    let (system, _) = system();
    system.get_or_create_actor("slow", 0);
    system.get_or_create_actor("fast", 0);

    let slow = {
        let system = system.clone();
        tokio::spawn(async move {
            system
                .ask("slow", CounterMsg::Sleep(Duration::from_secs(60)), Duration::from_secs(120))
                .await
        })
    };
    tokio::task::yield_now().await;

    let started = tokio::time::Instant::now();
    let reply = system
        .ask("fast", CounterMsg::Add(1), Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(reply, Ok(1));
    assert!(started.elapsed() < Duration::from_secs(1));

    assert_eq!(slow.await.unwrap().unwrap(), Ok(0));
}

#[tokio::test]
async fn tell_is_applied_in_order_with_asks() {
    let (system, _) = system();
    system.get_or_create_actor("c1", 10);

    system.tell("c1", CounterMsg::Add(5)).await.unwrap();
    system.tell("c1", CounterMsg::Add(-2)).await.unwrap();
    let value = system.ask("c1", CounterMsg::Get, TIMEOUT).await.unwrap();
    assert_eq!(value, Ok(13));
}

#[tokio::test]
async fn unknown_actor_is_reported() {
    let (system, _) = system();
    let err = system.ask("ghost", CounterMsg::Get, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, RuntimeError::ActorNotFound(ref id) if id == "ghost"));
}

#[tokio::test]
async fn dirty_actors_are_snapshotted_and_restored() {
    let (system, snapshots) = system();
    system.get_or_create_actor("c1", 5);
    system.get_or_create_actor("c2", 0);
    system.ask("c1", CounterMsg::Add(2), TIMEOUT).await.unwrap().unwrap();

    let report = system.persist_all().await;
    assert_eq!(report.saved, 1);
    assert_eq!(report.clean, 1);
    assert_eq!(snapshots.len(), 1);

    // Nothing changed since.
    let report = system.persist_all().await;
    assert_eq!(report.saved, 0);
    assert_eq!(report.clean, 2);

    assert_eq!(system.stop_actor("c1").await, Some(PersistOutcome::Clean));
    assert!(system.get_actor("c1").is_none());

    // The spec is ignored when a snapshot exists.
    system.get_or_create_actor("c1", 100);
    let value = system.ask("c1", CounterMsg::Get, TIMEOUT).await.unwrap();
    assert_eq!(value, Ok(7));
    assert_eq!(system.metrics().restored, 1);
}

#[tokio::test]
async fn stop_takes_a_final_snapshot() {
    let (system, snapshots) = system();
    system.get_or_create_actor("c1", 0);
    system.ask("c1", CounterMsg::Add(9), TIMEOUT).await.unwrap().unwrap();

    assert_eq!(system.stop_actor("c1").await, Some(PersistOutcome::Saved));
    assert_eq!(system.stop_actor("c1").await, None);
    assert!(system.get_or_restore_actor("c1").is_some());
    assert_eq!(snapshots.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn idle_actors_are_reported_after_the_threshold() {
    let (system, _) = system();
    system.get_or_create_actor("busy", 0);
    system.get_or_create_actor("idle", 0);

    tokio::time::advance(Duration::from_secs(90)).await;
    system.ask("busy", CounterMsg::Get, TIMEOUT).await.unwrap().unwrap();

    assert_eq!(system.idle_actors(Duration::from_secs(60)), vec!["idle".to_owned()]);
}

#[tokio::test]
async fn shutdown_stops_every_actor() {
    let (system, snapshots) = system();
    for id in ["a", "b", "c"] {
        system.get_or_create_actor(id, 0);
        system.ask(id, CounterMsg::Add(1), TIMEOUT).await.unwrap().unwrap();
    }

    let report = system.shutdown().await;
    assert_eq!(report.saved, 3);
    assert!(system.is_empty());
    assert_eq!(snapshots.len(), 3);
}
