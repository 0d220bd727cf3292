//! Integration tests for the TOML configuration file
//!
//! Tests parsing, validation, and how config feeds the injector

use middleware_injector::config::{
    load_from_path, load_from_str, ConfigError, LineEndingSetting, ValidationIssue,
};
use middleware_injector::{
    AssetKind, Document, DryRunStore, FormattingOptions, Injector, LineEnding,
};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_full_config() {
    let toml = r#"
[format]
tab_size = 2
insert_spaces = true
line_ending = "crlf"

[imports]
module_prefix = "@acme/widgets/middleware"

[[capabilities]]
name = "resource"
symbol = "createResourceMiddleware"
instantiate = true

[[capabilities]]
name = "styles"
follow_up = "const classes = styles.classes(css);"
asset = "stylesheet"
"#;

    let config = load_from_str(toml).expect("Failed to parse config");

    assert_eq!(config.format.tab_size, 2);
    assert!(config.format.insert_spaces);
    assert_eq!(config.format.line_ending, LineEndingSetting::Crlf);
    assert_eq!(config.imports.module_prefix, "@acme/widgets/middleware");
    assert_eq!(config.capabilities.len(), 2);

    let options = config.formatting();
    assert_eq!(options.tab(), "  ");
    assert_eq!(options.line_ending, Some(LineEnding::CrLf));

    let registry = config.registry();
    let resource = registry.resolve("resource");
    assert_eq!(
        resource.pre_call_line().as_deref(),
        Some("const resource = createResourceMiddleware();")
    );
    assert_eq!(registry.resolve("styles").asset, Some(AssetKind::Stylesheet));
    // Built-ins remain available
    assert_eq!(registry.resolve("store").symbol, "createStoreMiddleware");
}

#[test]
fn test_empty_config_uses_defaults() {
    let config = load_from_str("").unwrap();
    assert_eq!(config.formatting(), FormattingOptions::default());
    assert_eq!(
        config.imports.module_prefix,
        "@dojo/framework/core/middleware"
    );
    assert!(config.capabilities.is_empty());
}

#[test]
fn test_validation_collects_all_issues() {
    let toml = r#"
[format]
tab_size = 0
insert_spaces = true

[imports]
module_prefix = ""

[[capabilities]]
name = "my-thing"

[[capabilities]]
name = "cache"
symbol = "1cache"

[[capabilities]]
name = "cache"
"#;

    let err = load_from_str(toml).unwrap_err();
    let source = match err {
        ConfigError::Validation { source, .. } => source,
        other => panic!("expected validation error, got {other}"),
    };

    assert_eq!(source.issues.len(), 5);
    assert!(source
        .issues
        .iter()
        .any(|i| matches!(i, ValidationIssue::Duplicate { capability } if capability == "cache")));
    assert!(source.to_string().contains("imports.module_prefix"));
}

#[test]
fn test_unknown_asset_kind_rejected() {
    let toml = r#"
[[capabilities]]
name = "styles"
asset = "sprite"
"#;
    assert!(matches!(
        load_from_str(toml),
        Err(ConfigError::Toml { .. })
    ));
}

#[test]
fn test_load_from_path_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = load_from_path(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_config_drives_injection() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[imports]
module_prefix = "@acme/middleware"

[[capabilities]]
name = "resource"
symbol = "createResourceMiddleware"
instantiate = true
follow_up = "const data = resource.get();"
"#,
    )
    .unwrap();

    let config = load_from_path(&config_path).unwrap();
    let injector = Injector::new(config.registry())
        .unwrap()
        .with_module_prefix(config.imports.module_prefix.clone());

    let source = "\
import { create, tsx } from '@dojo/framework/core/vdom';
const factory = create();
export default factory(function List() {
});
";
    let document = Document::new("List.tsx", source);
    let injection = injector
        .inject(
            &document,
            &config.formatting(),
            "resource",
            &mut DryRunStore::default(),
        )
        .unwrap();
    let updated = injection.edits.apply_to_str(source).unwrap();

    assert_eq!(
        updated,
        "\
import { create, tsx } from '@dojo/framework/core/vdom';
import createResourceMiddleware from '@acme/middleware/resource';
const resource = createResourceMiddleware();
const factory = create({ resource });
export default factory(function List({ middleware: { resource } }) {
\tconst data = resource.get();
});
"
    );
}
