use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use larder_core::{OrderId, Sku};
use larder_inventory::{IncomingShipment, Reservation, ReservationLine, StockProjector};

fn ledger(skus: usize, holds_per_sku: usize) -> (Vec<Reservation>, Vec<IncomingShipment>) {
    let created = Utc.with_ymd_and_hms(2025, 1, 8, 12, 0, 0).unwrap();
    let first_day = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap();

    let mut reservations = Vec::with_capacity(skus * holds_per_sku);
    let mut shipments = Vec::with_capacity(skus);
    for s in 0..skus {
        let sku: Sku = format!("{}", 400_000 + s * 7).parse().unwrap();
        for h in 0..holds_per_sku {
            let date = first_day + Duration::days((h % 20) as i64);
            let line = ReservationLine::new(sku.clone(), "bench", 1 + (h % 4) as i64, date).unwrap();
            reservations.push(Reservation::hold(OrderId::generate(), line, "bench", created));
        }
        shipments.push(IncomingShipment::new(sku, 25, first_day + Duration::days(3)).unwrap());
    }
    (reservations, shipments)
}

fn bench_snapshots(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2025, 1, 8, 13, 0, 0).unwrap();
    let dates: Vec<NaiveDate> = (0..5)
        .map(|d| NaiveDate::from_ymd_opt(2025, 1, 9).unwrap() + Duration::days(d))
        .collect();
    let target: Sku = "400000".parse().unwrap();

    let mut group = c.benchmark_group("stock_snapshots");
    for ledger_rows in [100usize, 1_000, 10_000] {
        let (reservations, shipments) = ledger(ledger_rows / 10, 10);
        group.throughput(Throughput::Elements(ledger_rows as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(ledger_rows),
            &ledger_rows,
            |b, _| {
                let projector = StockProjector::new(&reservations, &shipments, now);
                b.iter(|| black_box(projector.snapshots(&target, black_box(120.0), &dates)));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_snapshots);
criterion_main!(benches);
