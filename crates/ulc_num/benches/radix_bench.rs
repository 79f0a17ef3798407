use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ulc_core::GrowableBuffer;
use ulc_num::{canonicalize_decimal, RadixConverter};

fn bench_hex_of(c: &mut Criterion) {
    let mut group = c.benchmark_group("hex_of");
    let cases: [(&str, u32, &str); 5] = [
        ("binary", 2, "1011011101111011111011111101111111011111111"),
        ("octal", 8, "1234567012345670123456701234567"),
        ("decimal_fast", 10, "1234567890123456"),
        ("decimal_slow", 10, "123456789012345678901234567890123456789"),
        ("base36", 36, "ZYXWVUTSRQPONMLKJIHGFEDCBA"),
    ];

    for (name, radix, digits) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), &digits, |b, digits| {
            let mut conv = RadixConverter::new();
            let mut out = GrowableBuffer::new(64);
            b.iter(|| {
                out.reset();
                conv.hex_into(black_box(digits.as_bytes()), radix, &mut out)
            });
        });
    }
    group.finish();
}

fn bench_canonicalize(c: &mut Criterion) {
    c.bench_function("canonicalize_decimal", |b| {
        b.iter(|| canonicalize_decimal(black_box(b"000123_456.789000e-12"), b'_'))
    });
}

criterion_group!(benches, bench_hex_of, bench_canonicalize);
criterion_main!(benches);
