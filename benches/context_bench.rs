use criterion::{black_box, criterion_group, criterion_main, Criterion};

use fhe_core::modulus::{CoefficientModulus, SecurityLevel};
use fhe_core::parameters::{BfvEncryptionParametersBuilder, DegreeType};
use fhe_core::Context;

fn bfv_parms(degree: DegreeType, bit_sizes: &[u32]) -> fhe_core::EncryptionParameters {
	let modulus_chain = CoefficientModulus::create(degree, bit_sizes).expect("failed to build coefficient modulus");
	BfvEncryptionParametersBuilder::new()
		.set_poly_modulus_degree(degree)
		.set_coefficient_modulus(modulus_chain)
		.set_plain_modulus_u64(1 << 20)
		.unwrap()
		.build()
		.expect("failed to build encryption parameters")
}

fn criterion_benchmark(c: &mut Criterion) {
	let mut group = c.benchmark_group("context_construction");

	let small = bfv_parms(DegreeType::D4096, &[36, 36]);
	group.bench_function("two_levels_d4096", |b| {
		b.iter(|| Context::new(black_box(small.clone()), true, SecurityLevel::Tc128).unwrap())
	});

	let deep = bfv_parms(DegreeType::D8192, &[50, 30, 30, 30, 30, 50]);
	group.bench_function("six_levels_d8192", |b| {
		b.iter(|| Context::new(black_box(deep.clone()), true, SecurityLevel::Tc128).unwrap())
	});

	group.bench_function("unexpanded_chain_d8192", |b| {
		b.iter(|| Context::new(black_box(deep.clone()), false, SecurityLevel::Tc128).unwrap())
	});

	group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
