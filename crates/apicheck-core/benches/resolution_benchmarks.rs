//! Benchmarks for resource resolution, parameter validation and full checks
//!
//! Copyright (c) 2025 Apicheck Team
//! Licensed under the Apache-2.0 license

use apicheck_core::params::{ParameterChecker, ParameterKind};
use apicheck_core::resolver;
use apicheck_core::{
    Action, Body, ContractChecker, ParamType, ParameterDef, Resource, ResponseDef, SimpleRequest, SimpleResponse,
    SpecModel, Values, ViolationSink,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// A contract with `width` top-level collections, each with an item resource
/// and a few nested sub-collections
fn create_model(width: usize) -> SpecModel {
    let mut model = SpecModel::default();
    for i in 0..width {
        let mut item = Resource::new("/{id}")
            .with_uri_parameter(ParameterDef::new("id", ParamType::Integer))
            .with_action(Action::new("GET").with_response(
                200,
                ResponseDef::default().with_body(Body::new("application/json").with_schema(r#"{"type":"object"}"#)),
            ));
        for sub in ["comments", "likes", "tags"] {
            item = item.with_resource(Resource::new(format!("/{}", sub)).with_action(Action::new("GET")));
        }
        model.resources.push(
            Resource::new(format!("/collection{}", i))
                .with_action(Action::new("GET"))
                .with_resource(item),
        );
    }
    model
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    for width in [10, 100, 1000] {
        let model = create_model(width);
        let path = format!("/collection{}/42/tags", width - 1);
        group.bench_with_input(BenchmarkId::new("nested", width), &path, |b, path| {
            b.iter(|| resolver::resolve(black_box(&model.resources), black_box(path)))
        });
    }
    group.finish();
}

fn bench_parameters(c: &mut Criterion) {
    let defs: Vec<ParameterDef> = (0..20)
        .map(|i| match i % 4 {
            0 => ParameterDef::new(format!("int{}", i), ParamType::Integer),
            1 => ParameterDef::new(format!("num{}", i), ParamType::Number),
            2 => ParameterDef::new(format!("str{}", i), ParamType::String).pattern("[a-z]+"),
            _ => ParameterDef::new(format!("date{}", i), ParamType::Date),
        })
        .collect();
    let values: Values = defs
        .iter()
        .map(|def| {
            let value = match def.param_type {
                ParamType::Integer => "123",
                ParamType::Number => "1.5e3",
                ParamType::Date => "Fri, 28 Feb 2014 12:34:56 GMT",
                _ => "abc",
            };
            (def.name.clone(), value)
        })
        .collect();
    let checker = ParameterChecker::new(ParameterKind::Query, "action(GET /bench)");

    c.bench_function("parameters_20", |b| {
        b.iter(|| {
            let mut sink = ViolationSink::new();
            let _ = checker.check_parameters(black_box(&defs), black_box(&values), &mut sink);
            sink.len()
        })
    });
}

fn bench_full_check(c: &mut Criterion) {
    let model = create_model(100);
    let checker = ContractChecker::new(&model);
    let request = SimpleRequest::get("/collection50/7");
    let response = SimpleResponse::new(200)
        .with_content_type("application/json")
        .with_content(r#"{"id": 7}"#);

    c.bench_function("check_exchange", |b| {
        b.iter(|| checker.check(black_box(&request), black_box(&response)))
    });
}

criterion_group!(benches, bench_resolution, bench_parameters, bench_full_check);
criterion_main!(benches);
