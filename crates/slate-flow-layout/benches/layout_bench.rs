use std::hint::black_box;
use std::time::Instant;

use slate_flow::{BlockKind, SegmentStyle, StepBlock, StepSegment};
use slate_flow_layout::{
    AutoLayoutEngine, ColumnFlowOracle, LayoutContext, LayoutOptions, PageRatio,
};

const CASES: &[(&str, usize, usize)] = &[
    ("lecture-60-1col", 60, 1),
    ("lecture-60-2col", 60, 2),
    ("lecture-400-1col", 400, 1),
    ("lecture-400-3col", 400, 3),
];

#[derive(Clone, Debug)]
struct CaseResult {
    case: String,
    iterations: usize,
    pages: usize,
    min_ns: u128,
    median_ns: u128,
    mean_ns: u128,
    max_ns: u128,
}

fn percentile_u128(sorted: &[u128], percentile: f64) -> u128 {
    let idx = ((sorted.len().saturating_sub(1) as f64) * percentile).round() as usize;
    sorted[idx]
}

fn lecture(blocks: usize) -> Vec<StepBlock> {
    (0..blocks)
        .map(|idx| match idx % 10 {
            0..=5 => StepBlock::content(
                format!("b{idx}"),
                vec![StepSegment::text(
                    format!("b{idx}-t"),
                    0,
                    format!("Step {idx}: <b>f</b>(x) = x<sup>{}</sup> + {idx}", idx % 7),
                    SegmentStyle::default(),
                )],
            ),
            6 => StepBlock::content(
                format!("b{idx}"),
                vec![
                    StepSegment::image(format!("b{idx}-a"), 0, "plot.png", Some((800.0, 600.0))),
                    StepSegment::video(format!("b{idx}-v"), 1, "demo.mp4", None),
                ],
            ),
            7 => StepBlock::marker(format!("b{idx}"), BlockKind::LineBreak),
            8 => StepBlock::marker(format!("b{idx}"), BlockKind::ColumnBreak),
            _ => StepBlock::marker(format!("b{idx}"), BlockKind::PageBreak),
        })
        .collect()
}

fn run_case<F>(case: &str, warmup_iters: usize, measure_iters: usize, mut op: F) -> CaseResult
where
    F: FnMut() -> usize,
{
    let mut pages = 0;
    for _ in 0..warmup_iters {
        pages = black_box(op());
    }
    let mut time_samples = Vec::with_capacity(measure_iters);
    for _ in 0..measure_iters {
        let start = Instant::now();
        pages = black_box(op());
        time_samples.push(start.elapsed().as_nanos());
    }
    time_samples.sort_unstable();
    let time_sum: u128 = time_samples.iter().copied().sum();
    CaseResult {
        case: case.to_string(),
        iterations: measure_iters,
        pages,
        min_ns: time_samples[0],
        median_ns: percentile_u128(&time_samples, 0.5),
        mean_ns: time_sum / time_samples.len() as u128,
        max_ns: time_samples[time_samples.len() - 1],
    }
}

fn main() {
    let quick = std::env::args().any(|arg| arg == "--quick");
    let warmup_iters = if quick { 1 } else { 3 };
    let measure_iters = if quick { 3 } else { 20 };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap_or_else(|e| panic!("runtime: {}", e));

    println!("# slate-flow-layout benchmark");
    println!(
        "# mode={} warmup_iters={} measure_iters={}",
        if quick { "quick" } else { "full" },
        warmup_iters,
        measure_iters
    );
    println!("case,iterations,pages,min_ns,median_ns,mean_ns,max_ns");

    let engine = AutoLayoutEngine::new(ColumnFlowOracle::default(), LayoutOptions::default());
    for (case, blocks, columns) in CASES {
        let blocks = lecture(*blocks);
        let ctx = LayoutContext::new(PageRatio::Widescreen, *columns, "slide");
        let result = run_case(case, warmup_iters, measure_iters, || {
            runtime
                .block_on(engine.run_auto_layout(&blocks, &ctx))
                .unwrap_or_else(|e| panic!("layout failed: {}", e))
                .page_count()
        });
        println!(
            "{},{},{},{},{},{},{}",
            result.case,
            result.iterations,
            result.pages,
            result.min_ns,
            result.median_ns,
            result.mean_ns,
            result.max_ns
        );
    }
}
