#![cfg(not(loom))]

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use runnel::channel;
use runnel::process::Process;

fn init_tracing() {
  use tracing_subscriber::EnvFilter;

  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .try_init();
}

async fn settle<F>(what: &str, cond: F)
where
  F: Fn() -> bool,
{
  let wait = async {
    while !cond() {
      tokio::time::sleep(Duration::from_millis(2)).await;
    }
  };

  tokio::time::timeout(Duration::from_secs(5), wait)
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"));
}

// -----------------------------------------------------------------------------
// Test Processes
// -----------------------------------------------------------------------------

/// Terminal sink recording every value it accepts.
#[derive(Clone)]
struct Collect<T> {
  seen: Arc<Mutex<Vec<T>>>,
}

impl<T> Collect<T> {
  fn new() -> Self {
    Self {
      seen: Arc::new(Mutex::new(Vec::new())),
    }
  }

  fn values(&self) -> Vec<T>
  where
    T: Clone,
  {
    self.seen.lock().clone()
  }

  fn len(&self) -> usize {
    self.seen.lock().len()
  }
}

impl<T> Process<T> for Collect<T>
where
  T: Send + 'static,
{
  type Output = ();

  fn accept(&mut self, input: T) {
    self.seen.lock().push(input);
  }

  fn emit(&mut self) {}
}

/// Sink asserting its steps never overlap, with a close notification.
struct SerialProbe {
  active: Arc<AtomicUsize>,
  overlap: Arc<AtomicBool>,
  accepted: Arc<AtomicUsize>,
  closed: Arc<AtomicBool>,
}

impl Process<u64> for SerialProbe {
  type Output = ();

  fn accept(&mut self, _input: u64) {
    if self.active.fetch_add(1, Ordering::SeqCst) != 0 {
      self.overlap.store(true, Ordering::SeqCst);
    }

    // Widen the race window a little.
    std::thread::yield_now();

    self.active.fetch_sub(1, Ordering::SeqCst);
    self.accepted.fetch_add(1, Ordering::SeqCst);
  }

  fn emit(&mut self) {}

  fn close(&mut self) {
    self.closed.store(true, Ordering::SeqCst);
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pipeline_delivers_in_order() {
  init_tracing();

  let (sender, receiver) = channel::<u64>();

  let out: Collect<u64> = Collect::new();
  let _sink = receiver.map(|x| x + 1).map(|x| x * 2).pipe(out.clone());

  let producer = tokio::spawn(async move {
    for value in 0..200 {
      sender.send(value);
    }
  });

  producer.await.unwrap();

  settle("all values", || out.len() == 200).await;

  assert_eq!(out.values(), (0..200).map(|x| (x + 1) * 2).collect::<Vec<u64>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn steps_never_overlap() {
  let active: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));
  let overlap: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
  let accepted: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));
  let closed: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));

  let (sender, receiver) = channel::<u64>();

  let _sink = receiver.pipe(SerialProbe {
    active: Arc::clone(&active),
    overlap: Arc::clone(&overlap),
    accepted: Arc::clone(&accepted),
    closed: Arc::clone(&closed),
  });

  let producers: Vec<_> = (0..4)
    .map(|_| {
      let sender = sender.clone();

      tokio::spawn(async move {
        for value in 0..50 {
          sender.send(value);
        }
      })
    })
    .collect();

  for producer in producers {
    producer.await.unwrap();
  }

  drop(sender);

  settle("close", || closed.load(Ordering::SeqCst)).await;

  // The close hook fires only after the queue fully drained.
  assert_eq!(accepted.load(Ordering::SeqCst), 200);
  assert!(!overlap.load(Ordering::SeqCst), "two steps ran concurrently");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fanout_is_faithful_under_parallelism() {
  let (sender, receiver) = channel::<u64>();

  let out1: Collect<u64> = Collect::new();
  let out2: Collect<u64> = Collect::new();

  let _sink1 = receiver.map(|x| x).pipe(out1.clone());
  let _sink2 = receiver.map(|x| x).pipe(out2.clone());

  let producer = tokio::spawn(async move {
    for value in 0..100 {
      sender.send(value);
    }
  });

  producer.await.unwrap();

  settle("both branches", || out1.len() == 100 && out2.len() == 100).await;

  let expected: Vec<u64> = (0..100).collect();

  assert_eq!(out1.values(), expected);
  assert_eq!(out2.values(), expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn producers_keep_per_producer_order() {
  let (sender, receiver) = channel::<(usize, u64)>();

  let out: Collect<(usize, u64)> = Collect::new();
  let _sink = receiver.pipe(out.clone());

  let producers: Vec<_> = (0..4)
    .map(|id| {
      let sender = sender.clone();

      tokio::spawn(async move {
        for seq in 0..50 {
          sender.send((id, seq));
        }
      })
    })
    .collect();

  for producer in producers {
    producer.await.unwrap();
  }

  drop(sender);

  settle("all values", || out.len() == 200).await;

  for id in 0..4 {
    let seqs: Vec<u64> = out
      .values()
      .into_iter()
      .filter(|(producer, _)| *producer == id)
      .map(|(_, seq)| seq)
      .collect();

    assert_eq!(seqs, (0..50).collect::<Vec<u64>>(), "producer {id} reordered");
  }
}
