use criterion::{black_box, criterion_group, criterion_main, Criterion};
use primecert::certificate::{build_certificate, verify_certificate, CertificateBounds};
use primecert::modexp::pow_mod;
use primecert::probable::{run_test, TestKind};
use primecert::witness::RandWitnesses;
use rug::Integer;

fn mersenne_127() -> Integer {
    (Integer::from(1u32) << 127u32) - 1u32
}

fn bench_pow_mod(c: &mut Criterion) {
    let m = mersenne_127();
    let e = Integer::from(&m - 1u32);
    let b = Integer::from(3u32);
    c.bench_function("pow_mod(3, M127-1, M127)", |bench| {
        bench.iter(|| pow_mod(black_box(&b), black_box(&e), black_box(&m)).unwrap());
    });
}

fn bench_tests_prime(c: &mut Criterion) {
    let prime = mersenne_127();
    for kind in [TestKind::Fermat, TestKind::Lehmann, TestKind::MillerRabin] {
        let mut src = RandWitnesses::seeded(1);
        c.bench_function(&format!("{}(M127, 10)", kind.name()), |b| {
            b.iter(|| run_test(kind, black_box(&prime), 10, &mut src).unwrap());
        });
    }
}

fn bench_miller_rabin_carmichael(c: &mut Criterion) {
    let composite = Integer::from(561);
    let mut src = RandWitnesses::seeded(1);
    c.bench_function("miller-rabin(561, 10)", |b| {
        b.iter(|| run_test(TestKind::MillerRabin, black_box(&composite), 10, &mut src).unwrap());
    });
}

fn bench_certificate(c: &mut Criterion) {
    let prime = Integer::from(8675309u32);
    let bounds = CertificateBounds::new(6, 6).unwrap();
    c.bench_function("build_certificate(8675309, 6, 6)", |b| {
        b.iter(|| build_certificate(black_box(&prime), bounds).unwrap());
    });

    let m127 = mersenne_127();
    let bounds = CertificateBounds::new(12, 64).unwrap();
    c.bench_function("build_certificate(M127, 12, 64)", |b| {
        b.iter(|| build_certificate(black_box(&m127), bounds).unwrap());
    });

    let cert = build_certificate(&m127, bounds).unwrap();
    c.bench_function("verify_certificate(M127)", |b| {
        b.iter(|| verify_certificate(black_box(&cert)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_pow_mod,
    bench_tests_prime,
    bench_miller_rabin_carmichael,
    bench_certificate,
);
criterion_main!(benches);
