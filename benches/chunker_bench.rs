use criterion::{black_box, criterion_group, criterion_main, Criterion};
use itertools::Itertools;
use std::path::PathBuf;
use tempfile::TempDir;
use treebank_ingest::io::reader::InputFormat;
use treebank_ingest::processing::sentence::split_sentences;
use treebank_ingest::processing::{chunk, MetadataDiscovery, NoConverter, Normalizer};

const NB_FILES: usize = 10;
const NB_SENTENCES: usize = 500;

fn document(file: usize) -> String {
    let sentences = (0..NB_SENTENCES)
        .map(|s| {
            let nodes = (0..8)
                .map(|w| format!(r#"<node begin="{}" end="{}" word="w{}"/>"#, w, w + 1, w))
                .join("");
            format!(
                r#"<alpino_ds xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" version="1.6"><metadata><meta type="text" name="file" value="{}"/><meta type="text" name="n" value="{}"/></metadata><node cat="top" begin="0" end="8">{}</node></alpino_ds>"#,
                file, s, nodes
            )
        })
        .join("\n");
    format!("<treebank>\n{}\n</treebank>", sentences)
}

fn corpus() -> (TempDir, Vec<PathBuf>) {
    let dir = TempDir::new().unwrap();
    let files = (0..NB_FILES)
        .map(|i| {
            let path = dir.path().join(format!("{}.xml", i));
            std::fs::write(&path, document(i)).unwrap();
            path
        })
        .collect();
    (dir, files)
}

pub fn split(c: &mut Criterion) {
    let doc = document(0);
    c.bench_function("split sentences", |b| {
        b.iter(|| black_box(split_sentences(&doc, 1, "main", 0).unwrap()))
    });
}

pub fn chunk_corpus(c: &mut Criterion) {
    let (_dir, files) = corpus();
    let normalizer = Normalizer::new(&NoConverter, InputFormat::Alpino);

    for max_size in [64 * 1024, 1024 * 1024] {
        c.bench_function(&format!("chunk corpus max_size={}", max_size), |b| {
            b.iter(|| {
                let mut discovery = MetadataDiscovery::new(100);
                let blocks: Vec<_> = chunk(&normalizer, &mut discovery, &files, "main", max_size)
                    .collect::<Result<_, _>>()
                    .unwrap();
                black_box((blocks, discovery.snapshot()))
            })
        });
    }
}

criterion_group!(benches, split, chunk_corpus);
criterion_main!(benches);
