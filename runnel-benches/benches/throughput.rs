use criterion::BenchmarkGroup;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use runnel::Receiver;
use runnel::Sender;
use runnel::channel_on;
use runnel::exec::ExecutorRef;
use runnel::exec::InlineExecutor;
use runnel::process::Process;

const DEPTHS: &[usize] = &[1, 2, 4, 8];
const BRANCHES: &[usize] = &[2, 4, 8];
const VALUES: u64 = 1_000;

/// Terminal sink folding every value into a checksum.
struct Checksum {
  total: Arc<AtomicU64>,
}

impl Process<u64> for Checksum {
  type Output = ();

  fn accept(&mut self, input: u64) {
    self.total.fetch_add(input, Ordering::Relaxed);
  }

  fn emit(&mut self) {}
}

fn build_linear(depth: usize, total: &Arc<AtomicU64>) -> (Sender<u64>, Receiver<()>) {
  let executor: ExecutorRef = Arc::new(InlineExecutor);
  let (sender, receiver) = channel_on::<u64>(executor);

  let mut tail: Receiver<u64> = receiver.map(|x| x.wrapping_add(1));

  for _ in 1..depth {
    tail = tail.map(|x| x.wrapping_add(1));
  }

  let sink: Receiver<()> = tail.pipe(Checksum {
    total: Arc::clone(total),
  });

  (sender, sink)
}

fn bench_linear(criterion: &mut Criterion) {
  let mut group: BenchmarkGroup<_> = criterion.benchmark_group("linear");

  for depth in DEPTHS {
    let id: BenchmarkId = BenchmarkId::new("depth", depth);

    group.bench_with_input(id, depth, |bench, &depth| {
      bench.iter(|| {
        let total: Arc<AtomicU64> = Arc::new(AtomicU64::new(0));
        let (sender, _sink) = build_linear(depth, &total);

        for value in 0..VALUES {
          sender.send(value);
        }

        drop(sender);

        total.load(Ordering::Relaxed)
      })
    });
  }

  group.finish();
}

fn bench_fanout(criterion: &mut Criterion) {
  let mut group: BenchmarkGroup<_> = criterion.benchmark_group("fanout");

  for branches in BRANCHES {
    let id: BenchmarkId = BenchmarkId::new("branches", branches);

    group.bench_with_input(id, branches, |bench, &branches| {
      bench.iter(|| {
        let executor: ExecutorRef = Arc::new(InlineExecutor);
        let total: Arc<AtomicU64> = Arc::new(AtomicU64::new(0));
        let (sender, receiver) = channel_on::<u64>(executor);

        let sinks: Vec<Receiver<()>> = (0..branches)
          .map(|_| {
            receiver.map(|x| x).pipe(Checksum {
              total: Arc::clone(&total),
            })
          })
          .collect();

        for value in 0..VALUES {
          sender.send(value);
        }

        drop(sender);
        drop(sinks);

        total.load(Ordering::Relaxed)
      })
    });
  }

  group.finish();
}

criterion_group! {
  name = benches;
  config = Criterion::default();
  targets = bench_linear, bench_fanout
}

criterion_main!(benches);
