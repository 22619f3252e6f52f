mod error;
mod html;

mod annotation;
mod assets;
mod bundle;
mod catalog;
mod config;
mod processor;

pub use annotation::{Annotation, Gutter, STYLE_ONLY_CLASS_PREFIX};
pub use assets::{AssetLinks, BUILD_DIR};
pub use bundle::{
    BUNDLE_FILE_PREFIX, BuildReport, BuildWarning, BundleArtifact, BundleBuilder, Component,
    ComponentSource, DirectorySource, MemorySource,
};
pub use catalog::{CatalogCache, ComponentCatalog, ComponentRecord, LanguageOption, PLAIN_VARIANTS};
pub use config::{
    BASE_ENGINE, CORE_DEPENDENCIES, Configuration, DEFAULT_THEME, DEFAULT_THEME_FILE,
    GRAMMAR_DEPENDENCIES, PSEUDO_LANGUAGE_PREFIX, Plugin,
};
pub use error::Error;
pub use processor::{AnnotationProcessor, CONTAINER_CLASS, LINE_NUMBERS_CLASS, ProcessedContent};
