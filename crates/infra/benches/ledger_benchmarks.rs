use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use larder_core::{OrderId, Sku};
use larder_infra::ledger::{NewOrder, ReservationLedger, RowReservationLedger};
use larder_infra::row_store::InMemoryRowStore;
use larder_inventory::ReservationLine;
use larder_orders::ClientInfo;
use std::sync::Arc;

const SKUS: usize = 50;
const HORIZON_DAYS: i64 = 60;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 8, 12, 0, 0).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 8).unwrap()
}

fn sku(i: usize) -> Sku {
    format!("{}", 100 + i % SKUS).parse().unwrap()
}

fn line(i: usize) -> ReservationLine {
    let date = today() + Duration::days((i as i64) % HORIZON_DAYS);
    ReservationLine::new(sku(i), "item", 1 + (i as i64 % 3), date).unwrap()
}

fn ledger() -> RowReservationLedger<Arc<InMemoryRowStore>> {
    let ledger = RowReservationLedger::new(Arc::new(InMemoryRowStore::new()), "RESERVATIONS", "ORDERS");
    ledger.ensure_headers().unwrap();
    ledger
}

fn new_order(lines: usize, created_at: DateTime<Utc>) -> NewOrder {
    NewOrder {
        order_id: OrderId::generate(),
        lines: (0..lines).map(line).collect(),
        client: ClientInfo::default(),
        total: None,
        created_at,
    }
}

fn bench_ledger_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_append");

    for lines in [1usize, 10, 50].iter() {
        group.throughput(Throughput::Elements(*lines as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), lines, |b, &lines| {
            let ledger = ledger();
            b.iter(|| black_box(ledger.add(&new_order(lines, now())).unwrap()));
        });
    }

    group.finish();
}

fn bench_sweep_lapsed(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep_lapsed");

    for orders in [10usize, 100, 500].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(orders), orders, |b, &orders| {
            b.iter_batched(
                || {
                    let ledger = ledger();
                    for _ in 0..orders {
                        ledger.add(&new_order(3, now())).unwrap();
                    }
                    ledger
                },
                |ledger| black_box(ledger.sweep_expired(now() + Duration::hours(3)).unwrap()),
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_ledger_append,
    bench_sweep_lapsed
);
criterion_main!(benches);
