//! Performance benchmarks for the payroll engine.
//!
//! Covers the calculators called directly and the HTTP surface:
//! - Single withholding and single vacation: pure calculation cost
//! - Vacation request through the router: adds JSON and routing overhead
//! - Termination settlement and DAS through the router
//! - Batch of 1000 vacation calculations, as in a monthly payroll run
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use folha_engine::api::{AppState, create_router};
use folha_engine::calculation::{
    VacationInput, WithholdingInput, calculate_vacation, calculate_withholding,
};
use folha_engine::config::ConfigLoader;
use folha_engine::models::Employee;

use axum::{body::Body, http::Request};
use tower::ServiceExt;

fn load_config() -> ConfigLoader {
    ConfigLoader::load("./config/brazil").expect("Failed to load config")
}

fn create_employee(index: usize) -> Employee {
    Employee {
        id: format!("emp_bench_{:04}", index),
        company_id: "cmp_bench".to_string(),
        name: "Bench Employee".to_string(),
        // 1518.00 .. 11418.00, covering every INSS and IRRF bracket
        base_salary: Decimal::new(151_800 + (index as i64 % 100) * 10_000, 2),
        admission_date: NaiveDate::from_ymd_opt(2018, 3, 1).unwrap(),
        dependents: (index % 4) as u32,
    }
}

fn vacation_input(index: usize) -> VacationInput {
    VacationInput {
        employee: create_employee(index),
        start_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        days: 30,
        sell_one_third: index % 2 == 0,
        advance_thirteenth: index % 3 == 0,
    }
}

fn post(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

/// Benchmark: progressive withholding over a range of bases.
fn bench_withholding(c: &mut Criterion) {
    let config = load_config();
    let tables = config
        .payroll_tables(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap())
        .unwrap();

    let mut group = c.benchmark_group("withholding");
    for base in ["1518.00", "4000.00", "25000.00"] {
        let gross: Decimal = base.parse().unwrap();
        group.bench_with_input(BenchmarkId::new("inss", base), &gross, |b, gross| {
            b.iter(|| {
                calculate_withholding(black_box(&WithholdingInput::new(*gross)), &tables.inss, 1)
                    .unwrap()
            })
        });
        group.bench_with_input(BenchmarkId::new("irrf", base), &gross, |b, gross| {
            let input =
                WithholdingInput::with_dependents(*gross, 2, tables.irrf_dependent_deduction);
            b.iter(|| calculate_withholding(black_box(&input), &tables.irrf, 1).unwrap())
        });
    }
    group.finish();
}

/// Benchmark: single vacation, calculator only.
fn bench_single_vacation(c: &mut Criterion) {
    let config = load_config();
    let input = vacation_input(0);
    let tables = config.payroll_tables(input.start_date).unwrap();

    c.bench_function("single_vacation", |b| {
        b.iter(|| calculate_vacation(black_box(&input), tables).unwrap())
    });
}

/// Benchmark: one request per endpoint through the router.
fn bench_endpoints(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let router = create_router(AppState::new(load_config()));

    let requests = [
        (
            "/vacation",
            serde_json::json!({
                "company_id": "cmp_bench",
                "employee": {
                    "id": "emp_bench_0001",
                    "base_salary": "3000.00",
                    "admission_date": "2020-01-01"
                },
                "start_date": "2025-07-01",
                "days": 30
            }),
        ),
        (
            "/termination",
            serde_json::json!({
                "company_id": "cmp_bench",
                "employee": {
                    "id": "emp_bench_0001",
                    "base_salary": "3000.00",
                    "admission_date": "2022-03-01"
                },
                "termination_date": "2025-06-15",
                "reason": "without_cause",
                "notice": "indemnified",
                "fgts_balance": "10000.00"
            }),
        ),
        (
            "/simples",
            serde_json::json!({
                "company_id": "cmp_bench",
                "period": "2025-06-01",
                "annex": "I",
                "rpa": "90000.00",
                "rbt12": "1000000.00"
            }),
        ),
    ];

    let mut group = c.benchmark_group("endpoints");
    for (uri, request) in requests {
        let body = request.to_string();
        group.bench_function(uri.trim_start_matches('/'), |b| {
            b.to_async(&rt).iter(|| async {
                let router = router.clone();
                let response = router.oneshot(post(uri, body.clone())).await.unwrap();
                black_box(response)
            })
        });
    }
    group.finish();
}

/// Benchmark: monthly run of 1000 vacation calculations.
fn bench_batch_1000(c: &mut Criterion) {
    let config = load_config();
    let inputs: Vec<VacationInput> = (0..1000).map(vacation_input).collect();
    let tables = config.payroll_tables(inputs[0].start_date).unwrap();

    let mut group = c.benchmark_group("large_batch_processing");
    group.throughput(Throughput::Elements(1000));
    // Reduce sample size for large batches to keep benchmark time reasonable
    group.sample_size(10);

    group.bench_function("vacation_batch_1000", |b| {
        b.iter(|| {
            let results: Vec<_> = inputs
                .iter()
                .map(|input| calculate_vacation(input, tables).unwrap())
                .collect();
            black_box(results)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_withholding,
    bench_single_vacation,
    bench_endpoints,
    bench_batch_1000,
);
criterion_main!(benches);
