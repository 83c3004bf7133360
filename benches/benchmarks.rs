use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use page_cloner::css_parser::scan_css_links;
use page_cloner::html_parser::scan_document;
use page_cloner::rewriter::rewrite_document;
use page_cloner::{NameMapping, ResolutionContext};
use url::Url;

const PAGE: &str = r#"
    <html>
        <head>
            <link rel="stylesheet" href="/style.css">
            <script src="/script.js"></script>
            <link rel="stylesheet" href="/theme.css">
            <script src="/utils.js"></script>
            <style>.hero { background: url(hero.jpg) } .cta { background: url('/img/cta.png') }</style>
        </head>
        <body>
            <img src="/logo.png" alt="Logo">
            <img src="/banner.jpg" alt="Banner">
            <div style="background-image: url(./tile.gif)"></div>
            <form action="/subscribe"><input name="email"></form>
        </body>
    </html>
"#;

fn bench_document_scan(c: &mut Criterion) {
    c.bench_function("scan_document", |b| {
        b.iter(|| scan_document(black_box(PAGE)));
    });
}

fn bench_css_scan(c: &mut Criterion) {
    let css = r#"
        @import url(print.css);
        body { background: url(bg.png) repeat-x; }
        @media (min-width: 800px) { .wide { background-image: url("/img/wide.webp"); } }
        @font-face { font-family: Icons; src: url(fonts/icons.woff2) format("woff2"); }
    "#;

    c.bench_function("scan_css_links", |b| {
        b.iter(|| scan_css_links(black_box(css)));
    });
}

fn bench_resolution(c: &mut Criterion) {
    let context = ResolutionContext::new(&Url::parse("https://example.com/subdir/page").unwrap());
    let references = ["../style.css", "./script.js", "images/photo.jpg", "/assets/app.js", "../../x.png"];

    c.bench_function("resolve_references", |b| {
        b.iter(|| {
            for reference in &references {
                let _ = context.resolve(black_box(reference));
            }
        });
    });
}

fn bench_document_rewrite(c: &mut Criterion) {
    let mut mapping = NameMapping::default();
    for (i, reference) in ["/script.js", "/utils.js", "hero.jpg", "/img/cta.png", "/logo.png", "/banner.jpg"]
        .iter()
        .enumerate()
    {
        let ext = reference.rsplit('.').next().unwrap();
        mapping.push(reference.to_string(), format!("content/content{}.{}", i, ext));
    }
    let actions = vec!["/subscribe".to_string()];

    c.bench_function("rewrite_document", |b| {
        b.iter(|| rewrite_document(black_box(PAGE.as_bytes()), &mapping, &actions, Some("https://example.com/new")));
    });
}

criterion_group!(
    benches,
    bench_document_scan,
    bench_css_scan,
    bench_resolution,
    bench_document_rewrite
);
criterion_main!(benches);
