use c4clean_filters::quality::SentencePredicates;
use c4clean_filters::redaction::PiiRedactor;
use c4clean_filters::segmenter::{SentenceSegmenter, UnicodeSentenceSegmenter};
use c4clean_filters::text_preprocessing::{normalize_whitespace, normalize_whitespace_into, TextNormalizer};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn bench_encoding_repair(c: &mut Criterion) {
    let mut group = c.benchmark_group("encoding_repair");

    let sample_texts = vec![
        "The quick brown fox jumps over the lazy dog.",
        "He said â€œhelloâ€\u{9d} and left.",
        "MÃ¶bius strips and cafÃ© au lait.",
        "Fish &amp; chips &#8212; a classic.",
        "Ｆｕｌｌｗｉｄｔｈ text with ﬁne ligatures.",
        "café résumé naïve",
    ];

    group.throughput(Throughput::Elements(sample_texts.len() as u64));
    group.bench_function("full", |b| {
        let normalizer = TextNormalizer::full();
        b.iter(|| {
            for text in &sample_texts {
                black_box(normalizer.fix_encoding(text));
            }
        });
    });

    group.bench_function("encoding_only", |b| {
        let normalizer = TextNormalizer::encoding_only();
        b.iter(|| {
            for text in &sample_texts {
                black_box(normalizer.fix_encoding(text));
            }
        });
    });

    group.finish();
}

fn bench_sentence_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("sentence_stages");

    let document: String = (0..200)
        .map(|i| {
            format!(
                "Sentence number {} talks about Dr. Smith and the U.S. economy. Call 555-123-4567 now! \
                 Visit www.example.com for more. Sooooo good, really. ",
                i
            )
        })
        .collect();

    let segmenter = UnicodeSentenceSegmenter::new();
    let sentences = segmenter.segment(&document).unwrap();

    group.throughput(Throughput::Bytes(document.len() as u64));
    group.bench_function("segment", |b| {
        b.iter(|| black_box(segmenter.segment(black_box(&document)).unwrap()));
    });

    group.throughput(Throughput::Elements(sentences.len() as u64));
    group.bench_function("predicates", |b| {
        let predicates = SentencePredicates::default();
        b.iter(|| {
            for sentence in &sentences {
                black_box(predicates.accepts(sentence));
            }
        });
    });

    group.bench_function("redact", |b| {
        let redactor = PiiRedactor::default();
        b.iter(|| {
            for sentence in &sentences {
                black_box(redactor.redact(sentence));
            }
        });
    });

    group.finish();
}

fn bench_whitespace_reuse(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_reuse");

    let texts = vec![
        "   Multiple   spaces   and   tabs\t\there   ",
        "thin\u{2009}space and\u{3000}ideographic",
        "plain text",
    ];

    group.bench_function("with_reuse", |b| {
        let mut buffer = String::new();
        b.iter(|| {
            for text in &texts {
                normalize_whitespace_into(text, &mut buffer);
                black_box(&buffer);
            }
        });
    });

    group.bench_function("without_reuse", |b| {
        b.iter(|| {
            for text in &texts {
                black_box(normalize_whitespace(text));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_encoding_repair, bench_sentence_stages, bench_whitespace_reuse);
criterion_main!(benches);
