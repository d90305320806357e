use criterion::{black_box, criterion_group, criterion_main, Criterion};

use marketplace_pricing::pricing::{calculate_price, parse_fee_label, CalculationRequest};
use marketplace_pricing::{OptionalServicePolicy, PricingEngine, StoreTier};

fn bench_calculate(c: &mut Criterion) {
    let request = CalculationRequest {
        cost: 100_000.0,
        product_fee_percent: 5.0,
        desired_profit_percent: 20.0,
        store_tier: StoreTier::Premium,
        use_content_service: true,
        use_voucher_service: true,
        use_freeship_service: true,
        use_shipping_subsidy: true,
        ..Default::default()
    };

    c.bench_function("calculate_price/highest_only", |b| {
        b.iter(|| calculate_price(black_box(&request)))
    });

    let sum = PricingEngine::new(OptionalServicePolicy::Sum);
    c.bench_function("calculate_price/sum", |b| {
        b.iter(|| sum.calculate(black_box(&request)))
    });
}

fn bench_parse_label(c: &mut Criterion) {
    c.bench_function("parse_fee_label", |b| {
        b.iter(|| parse_fee_label(black_box("Phí cố định 2,59% (tối đa 50.000)")))
    });
}

criterion_group!(benches, bench_calculate, bench_parse_label);
criterion_main!(benches);
