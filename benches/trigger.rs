use std::hint::black_box;
use std::time::Duration;

use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;

use cv_theremin::timing::Trigger;

fn benchmark_trigger_arming(c: &mut Criterion) {
    let trigger = Trigger::with_state(Duration::from_secs(3600), 0u32, |_| Ok(())).unwrap();
    trigger.stop().unwrap();

    c.bench_function("arm and cancel", |b| {
        b.iter(|| {
            trigger.start().unwrap();
            black_box(trigger.stop().unwrap());
        });
    });

    c.bench_function("update state", |b| {
        b.iter(|| trigger.update(|value| *value = black_box(value.wrapping_add(1))));
    });
}

criterion_group!(benches, benchmark_trigger_arming);
criterion_main!(benches);
