use criterion::{Criterion, criterion_group, criterion_main};
use prism_highlighter::{
    BundleBuilder, Component, ComponentCatalog, Configuration, MemorySource, Plugin,
};

fn bundle_benchmark(c: &mut Criterion) {
    let catalog = ComponentCatalog::load_from_file("src/fixtures/components.json")
        .expect("Failed to load catalog");

    let mut source = MemorySource::new();
    let grammar = "Prism.languages.x={comment:/\\/\\/.*/,string:/\"(?:\\\\.|[^\"])*\"/};".repeat(40);
    for language in catalog.languages() {
        source.insert(Component::Language(&language.id), grammar.clone());
    }
    for plugin in Plugin::ALL {
        source.insert(Component::PluginScript(plugin), "(function(){})()");
        source.insert(Component::PluginStyle(plugin), "pre { position: relative; }");
    }
    source.insert(Component::Language("core"), grammar.repeat(5));
    source.insert(Component::Theme("prism"), "code { color: black; }");

    let config = Configuration {
        languages: catalog.languages().map(|l| l.id.clone()).collect(),
        ..Configuration::default()
    }
    .normalized();
    let builder = BundleBuilder::new(&source, Some(&catalog));

    c.bench_function("build every language", |b| {
        b.iter(|| {
            let artifact = builder.build(&config);
            std::hint::black_box(artifact);
        })
    });
}

fn catalog_benchmark(c: &mut Criterion) {
    let json = std::fs::read_to_string("src/fixtures/components.json")
        .expect("Failed to read catalog");

    c.bench_function("catalog parse", |b| {
        b.iter(|| {
            let catalog = ComponentCatalog::from_json_str(&json).expect("Failed to parse catalog");
            std::hint::black_box(catalog);
        })
    });
}

criterion_group!(benches, bundle_benchmark, catalog_benchmark);
criterion_main!(benches);
