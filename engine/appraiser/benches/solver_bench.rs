use appraiser::{AnchorLayeredSolver, OfferBook, SolverParameters, TradeRecord};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const ANCHOR: &str = "Perfect Amethyst";

/// A chain of `len` items, each traded for the previous one plus some anchors,
/// with `trades_per_item` trades per item so trimming is active
fn chain_book(len: usize, trades_per_item: usize) -> OfferBook {
    let mut book = OfferBook::new();
    book.insert(ANCHOR, vec![TradeRecord::new(2, vec![vec![(1.0, "item_0")]])]);
    book.insert("item_0", vec![]);

    for i in 1..len {
        let previous = format!("item_{}", i - 1);
        let trades = (0..trades_per_item)
            .map(|t| {
                let extra = 1.0 + (t % 7) as f64;
                let count = 1 + (t % 3) as i64;
                TradeRecord::new(
                    count,
                    vec![vec![(1.0, previous.clone()), (extra, ANCHOR.to_string())], vec![(3.0, previous.clone())]],
                )
            })
            .collect();
        book.insert(format!("item_{i}"), trades);
    }

    book
}

fn bench_appraise_chain(c: &mut Criterion) {
    let solver = AnchorLayeredSolver::new(SolverParameters { max_rounds: 500, ..Default::default() });
    let book = chain_book(200, 20);

    c.bench_function("appraise_chain_200", |b| {
        b.iter(|| black_box(solver.appraise(black_box(&book))))
    });
}

fn bench_solve_with_trimming(c: &mut Criterion) {
    let solver = AnchorLayeredSolver::new(SolverParameters { max_rounds: 500, ..Default::default() });
    let book = chain_book(200, 20);

    c.bench_function("solve_with_trimming_chain_200", |b| {
        b.iter(|| black_box(solver.solve_with_trimming(black_box(&book), 3)))
    });
}

criterion_group!(benches, bench_appraise_chain, bench_solve_with_trimming);
criterion_main!(benches);
