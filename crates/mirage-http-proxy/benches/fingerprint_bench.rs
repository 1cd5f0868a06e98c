use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mirage_http_proxy::recording::{
    fingerprint, Fingerprinter, HeaderValues, RecordedRequest, DEFAULT_IGNORED_HEADERS,
};
use mirage_http_proxy::proxy::target::normalize_target_url;

fn create_request(header_count: usize, body_len: usize) -> RecordedRequest {
    let mut headers = HeaderValues::new();
    headers.insert("host".to_string(), vec!["localhost:8080".to_string()]);
    headers.insert("content-type".to_string(), vec!["application/json".to_string()]);
    for i in 0..header_count {
        headers.insert(format!("x-custom-{i}"), vec![format!("value-{i}")]);
    }

    RecordedRequest {
        method: "POST".to_string(),
        url: "/v1/users/42/orders?target=api.example.com&page=2&size=50".to_string(),
        headers,
        body: vec![b'x'; body_len],
    }
}

fn bench_fingerprint_headers(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint_headers");

    for header_count in [0, 10, 50] {
        let request = create_request(header_count, 256);
        group.bench_with_input(
            BenchmarkId::from_parameter(header_count),
            &request,
            |b, request| b.iter(|| fingerprint(black_box(request))),
        );
    }

    group.finish();
}

fn bench_fingerprint_body(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint_body");

    for body_len in [0, 4 * 1024, 256 * 1024] {
        let request = create_request(10, body_len);
        group.throughput(Throughput::Bytes(body_len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(body_len), &request, |b, request| {
            b.iter(|| fingerprint(black_box(request)))
        });
    }

    group.finish();
}

fn bench_ignore_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint_ignore_list");
    let request = create_request(20, 256);

    let default = Fingerprinter::default();
    group.bench_function("default_list", |b| {
        b.iter(|| default.fingerprint(black_box(&request)))
    });

    let none = Fingerprinter::new(Vec::<String>::new());
    group.bench_function("empty_list", |b| {
        b.iter(|| none.fingerprint(black_box(&request)))
    });

    let extended = Fingerprinter::new(
        DEFAULT_IGNORED_HEADERS
            .iter()
            .copied()
            .chain(["user-agent", "x-request-id", "traceparent"]),
    );
    group.bench_function("extended_list", |b| {
        b.iter(|| extended.fingerprint(black_box(&request)))
    });

    group.finish();
}

fn bench_normalize_target(c: &mut Criterion) {
    c.bench_function("normalize_target_url", |b| {
        b.iter(|| {
            normalize_target_url(black_box(
                "api.example.com/search?q=new york&tag=a&tag=b&redirect=/cb?x=1",
            ))
        })
    });
}

criterion_group!(
    benches,
    bench_fingerprint_headers,
    bench_fingerprint_body,
    bench_ignore_list,
    bench_normalize_target
);
criterion_main!(benches);
