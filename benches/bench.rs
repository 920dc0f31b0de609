// Criterion benchmarks for PinkVanity

use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use pinkvanity::core::classify::Classification;
use pinkvanity::core::{detect_site, parse_price, scrape_product, PageSnapshot};

const TARGET_URL: &str = "https://www.target.com/p/venus-smooth-razor/-/A-12345";

/// A Target product page padded with `filler` paragraphs of unrelated copy
fn target_page(filler: usize) -> String {
    let mut html = String::from(
        r#"<html><head><script>window.__DATA__ = {"womens": true};</script></head><body>
        <h1 data-test="product-title">Venus Smooth Razor for Women</h1>
        <span data-test="product-price">$12.99</span>
        <div data-test="item-details-description">Ingredients: Aloe, Vitamin E, Glycerin. Five blades.</div>"#,
    );
    for i in 0..filler {
        html.push_str(&format!(
            "<p>Customers also viewed item {} with free shipping on orders over $35.</p>",
            i
        ));
    }
    html.push_str("</body></html>");
    html
}

fn bench_detect_site(c: &mut Criterion) {
    c.bench_function("detect_site", |b| {
        b.iter(|| detect_site(black_box("www.walmart.com")));
    });
}

fn bench_parse_price(c: &mut Criterion) {
    c.bench_function("parse_price", |b| {
        b.iter(|| parse_price(black_box("Sale: USD 1,299.00 ")));
    });
}

fn bench_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("classification");

    for filler in [0, 50, 500].iter() {
        let page = PageSnapshot::parse(TARGET_URL, &target_page(*filler));
        let text = page.text();

        group.bench_with_input(BenchmarkId::from_parameter(filler), &text, |b, text| {
            b.iter(|| Classification::score(black_box(TARGET_URL), black_box(text)));
        });
    }

    group.finish();
}

fn bench_scrape(c: &mut Criterion) {
    let mut group = c.benchmark_group("scrape_product");

    for filler in [0, 50, 500].iter() {
        let html = target_page(*filler);

        group.bench_with_input(BenchmarkId::new("parse_and_scrape", filler), &html, |b, html| {
            b.iter(|| {
                let page = PageSnapshot::parse(TARGET_URL, black_box(html));
                scrape_product(&page)
            });
        });

        let page = PageSnapshot::parse(TARGET_URL, &html);
        group.bench_with_input(BenchmarkId::new("scrape_only", filler), &page, |b, page| {
            b.iter(|| scrape_product(black_box(page)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_detect_site,
    bench_parse_price,
    bench_classification,
    bench_scrape
);
criterion_main!(benches);
