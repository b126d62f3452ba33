use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tui_news_preview::internal::models::Article;
use tui_news_preview::internal::page::Page;
use tui_news_preview::internal::render::render;
use tui_news_preview::internal::search::FilterEngine;

fn articles(n: usize) -> Vec<Article> {
    (0..n)
        .map(|i| Article {
            title: format!("Notícia número {} sobre a feira de ciências", i),
            description: "Os alunos apresentaram projetos de robótica, química e astronomia para a comunidade escolar. ".repeat(3),
            date: format!("2024-{:02}-{:02}", i % 12 + 1, i % 28 + 1),
            published: true,
            ..Default::default()
        })
        .collect()
}

fn benchmark_render(c: &mut Criterion) {
    let feed = articles(200);
    c.bench_function("render 200 articles", |b| {
        b.iter(|| {
            let mut page = Page::new();
            render(&mut page, black_box(&feed))
        })
    });
}

fn benchmark_filter(c: &mut Criterion) {
    let mut page = Page::new();
    render(&mut page, &articles(200));
    let Some(mut filter) = FilterEngine::init(&mut page) else {
        return;
    };

    filter.set_query("feira");
    c.bench_function("filter 200 cards", |b| {
        b.iter(|| filter.apply(black_box(&mut page)))
    });

    filter.set_query("zzz");
    c.bench_function("filter 200 cards no matches", |b| {
        b.iter(|| filter.apply(black_box(&mut page)))
    });
}

criterion_group!(benches, benchmark_render, benchmark_filter);
criterion_main!(benches);
