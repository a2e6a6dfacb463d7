use criterion::{criterion_group, criterion_main, Criterion};
use std::path::Path;

use emlvfs::model::mail::FileMeta;
use emlvfs::vfs::VirtualUri;

fn fixture() -> (std::path::PathBuf, Vec<u8>, FileMeta) {
    let fixture_path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("inbox.eml");
    let data = std::fs::read(&fixture_path).unwrap();
    let meta = FileMeta::from_metadata(&std::fs::metadata(&fixture_path).unwrap());
    (fixture_path, data, meta)
}

fn bench_parse_eml(c: &mut Criterion) {
    let (path, data, meta) = fixture();

    c.bench_function("parse_inbox_eml", |b| {
        b.iter(|| emlvfs::parser::eml::parse_eml(&path, &data, meta).unwrap())
    });
}

fn bench_render_index(c: &mut Criterion) {
    let (path, data, meta) = fixture();
    let email = emlvfs::parser::eml::parse_eml(&path, &data, meta).unwrap();
    let container = VirtualUri::new("eml", "/mail/inbox.eml");

    c.bench_function("render_inbox_index", |b| {
        b.iter(|| emlvfs::vfs::render::render_index(&email, &container))
    });
}

criterion_group!(benches, bench_parse_eml, bench_render_index);
criterion_main!(benches);
