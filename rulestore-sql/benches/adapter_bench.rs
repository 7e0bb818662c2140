//! Adapter hot-path benchmarks: row encoding, statement building, and
//! full-table loads over the bundled SQLite executor.

use criterion::{criterion_group, criterion_main, Criterion};

use rulestore_core::{FilteredPolicyAdapter, PolicyAdapter, PolicyFilter, PolicyModel};
use rulestore_sql::builder::StatementBuilder;
use rulestore_sql::{Dialect, RuleRow, SqlAdapter, SqliteDb, StatementSet};

fn seeded_adapter(rules: usize) -> SqlAdapter<SqliteDb> {
    let mut model = PolicyModel::new();
    for i in 0..rules {
        model.add_tuple(
            "p",
            vec![
                format!("user_{i}"),
                format!("resource_{}", i % 50),
                "read".to_string(),
            ],
        );
    }
    let mut adapter = SqlAdapter::new(SqliteDb::open_in_memory().unwrap()).unwrap();
    adapter.save_policy(&model).unwrap();
    adapter
}

fn bench_adapter(c: &mut Criterion) {
    // ── Benchmark: encode one rule into a bound row ──
    let rule: Vec<String> = vec!["alice".into(), "data1".into(), "read".into()];
    c.bench_function("encode_rule_row", |b| {
        b.iter(|| {
            let row = RuleRow::from_rule("p", &rule).unwrap();
            row.bind_args(Dialect::Sqlite)
        })
    });

    // ── Benchmark: compose and rebind a filtered select (IN list) ──
    let stmts = StatementSet::build(Dialect::Postgres, "policy_rules").unwrap();
    let filter = PolicyFilter {
        ptype: vec!["p".to_string()],
        v0: vec!["alice".to_string(), "bob".to_string(), "carol".to_string()],
        ..PolicyFilter::default()
    };
    c.bench_function("build_filtered_select", |b| {
        b.iter(|| StatementBuilder::new(&stmts).select_by_filter(&filter))
    });

    // ── Benchmark: full load of 1000 rules ──
    let mut adapter = seeded_adapter(1000);
    c.bench_function("load_policy_1000_rules", |b| {
        b.iter(|| {
            let mut model = PolicyModel::new();
            adapter.load_policy(&mut model).unwrap();
            model
        })
    });

    // ── Benchmark: filtered load hitting 20 of 1000 rules ──
    let narrow = PolicyFilter {
        v1: vec!["resource_7".to_string()],
        ..PolicyFilter::default()
    };
    c.bench_function("load_filtered_20_of_1000", |b| {
        b.iter(|| {
            let mut model = PolicyModel::new();
            adapter.load_filtered_policy(&mut model, Some(&narrow)).unwrap();
            model
        })
    });
}

criterion_group!(benches, bench_adapter);
criterion_main!(benches);
