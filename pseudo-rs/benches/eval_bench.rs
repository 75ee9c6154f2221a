use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pseudo::config::Config;
use pseudo::host::ScriptedHost;
use pseudo::script::expr::eval_str;
use pseudo::script::Interpreter;
use pseudo::var::Variables;

fn bench_eval(c: &mut Criterion) {
    let mut vars = Variables::new();
    vars.set("x", 12.0.into());
    vars.set("name", "Ada".into());
    vars.set("a", vec![1.0.into(), 2.0.into(), 3.0.into()].into());

    let mut g = c.benchmark_group("eval");

    g.bench_function("arithmetic", |b| {
        b.iter(|| eval_str(black_box("2 + 3 * 4 - (10 / 5) * -1"), &vars))
    });
    g.bench_function("boolean", |b| {
        b.iter(|| eval_str(black_box("NOT x > 10 AND x != 3 OR x <= 12"), &vars))
    });
    g.bench_function("concat", |b| {
        b.iter(|| eval_str(black_box("\"hello \" + name + \", x is \" + x"), &vars))
    });
    g.bench_function("indexed", |b| {
        b.iter(|| eval_str(black_box("a[0] + a[1] * a[2]"), &vars))
    });

    g.finish();
}

/// Program with a nested loop, so most of the time goes to classifying and
/// re-classifying loop lines.
const LOOP_PROGRAM: &str = "\
BEGIN
    total = 0
    FOR i = 1 to 50
        j = 0
        WHILE j < 10
            IF j == 5 THEN
                total = total + i
            ELSE
                total = total + 1
            ENDIF
            j = j + 1
        ENDWHILE
    NEXT i
    display total
END
";

fn bench_run(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    // Measure the interpreter, not the scheduler.
    let config = Config { yield_each_line: false, ..Config::default() };

    let mut g = c.benchmark_group("run");
    g.bench_function("nested_loops", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut host = ScriptedHost::new();
                let mut interp = Interpreter::with_config(black_box(LOOP_PROGRAM), &config);
                interp.run(&mut host).await.unwrap();
                host.output
            })
        })
    });
    g.finish();
}

criterion_group!(benches, bench_eval, bench_run);
criterion_main!(benches);
