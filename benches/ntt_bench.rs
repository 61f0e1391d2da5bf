use criterion::{black_box, criterion_group, criterion_main, Criterion};

use fhe_core::modulus::CoefficientModulus;
use fhe_core::parameters::DegreeType;
use fhe_core::util::ntt::NttTables;

fn make_tables(n: usize, degree: DegreeType) -> NttTables {
	let modulus = CoefficientModulus::create(degree, &[55])
		.expect("failed to find an NTT-admissible prime")
		.remove(0);
	NttTables::new(n, modulus).expect("modulus does not admit the requested NTT size")
}

fn criterion_benchmark(c: &mut Criterion) {
	let mut group = c.benchmark_group("ntt_forward_inverse");

	for &n in &[1024usize, 4096, 16384] {
		let degree = DegreeType::try_from(n as u64).unwrap();
		let tables = make_tables(n, degree);
		let values: Vec<u64> = (0..n as u64).collect();

		group.bench_function(format!("forward n={n}"), |b| {
			b.iter(|| {
				let mut data = values.clone();
				tables.forward(black_box(&mut data)).unwrap();
				data
			})
		});

		let mut transformed = values.clone();
		tables.forward(&mut transformed).unwrap();
		group.bench_function(format!("inverse n={n}"), |b| {
			b.iter(|| {
				let mut data = transformed.clone();
				tables.inverse(black_box(&mut data)).unwrap();
				data
			})
		});
	}

	group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
