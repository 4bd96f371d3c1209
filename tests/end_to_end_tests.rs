use serde_json::json;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tailwind_config::{
    handle_check_command, handle_files_command, handle_show_command, render_config, resolve_scan_set,
    run_scan, scan_project, to_js_module, BuildConfiguration, ConfigArgs, ConfigError, CorePlugins,
    DarkMode, DarkModeStrategy, DesignTokens, FilesArgs, OutputFormat, PluginRef, ScanArgs,
    ScanOptions, ShowArgs,
};
use tempfile::tempdir;

const SHIPPED_CONFIG: &str = r#"/** @type {import('tailwindcss').Config} */
module.exports = {
  // corePlugins: {
  //   preflight: false,
  // },
  content: {
    relative: true,
    files: [
      "./frontend/**/*.{html,js}",
    ],
  },
  theme: {
    extend: {},
  },
  plugins: [],
}
"#;

/// Lay out a project shaped like the one the configuration ships with
fn create_project(root: &Path) -> PathBuf {
    let files: &[(&str, &str)] = &[
        ("frontend/templates/pages/index.html", r#"<main class="flex flex-col gap-4 p-6">{{ .Title }}</main>"#),
        ("frontend/templates/components/nav.html", r#"<nav class="bg-gray-800 text-white md:px-8"></nav>"#),
        ("frontend/static/app.js", "document.body.classList.add('dark', 'hover:underline');"),
        ("frontend/static/deep/nested/widget.js", "el.className = `rounded-lg shadow-md`;"),
        ("frontend/static/style.css", ".should-not-scan { color: red }"),
        ("frontend/README.md", "should-not-scan-either"),
        ("frontend/types.go", "package frontend"),
        ("outside/page.html", r#"<p class="outside-only"></p>"#),
    ];
    for (path, content) in files {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    let config = root.join("tailwind.config.js");
    fs::write(&config, SHIPPED_CONFIG).unwrap();
    config
}

fn options_with_cwd(cwd: &Path) -> ScanOptions {
    ScanOptions {
        cwd: cwd.to_path_buf(),
        ..ScanOptions::default()
    }
}

fn relative_paths(root: &Path, files: &[tailwind_config::ScannedFile]) -> BTreeSet<String> {
    files
        .iter()
        .map(|f| f.path.strip_prefix(root).unwrap().display().to_string())
        .collect()
}

#[test]
fn test_loads_shipped_config_file() {
    let project = tempdir().unwrap();
    let config_path = create_project(project.path());

    let loaded = BuildConfiguration::from_file(&config_path).unwrap();
    assert_eq!(loaded.config, BuildConfiguration::shipped());
    assert_eq!(loaded.dir(), project.path());
}

#[test]
fn test_scan_set_is_exactly_html_and_js_under_frontend() {
    let project = tempdir().unwrap();
    let config_path = create_project(project.path());
    let loaded = BuildConfiguration::from_file(&config_path).unwrap();

    let (_, files) = resolve_scan_set(&loaded, &options_with_cwd(project.path())).unwrap();
    let found = relative_paths(project.path(), &files);

    let expected: BTreeSet<String> = [
        "frontend/static/app.js",
        "frontend/static/deep/nested/widget.js",
        "frontend/templates/components/nav.html",
        "frontend/templates/pages/index.html",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assert_eq!(found, expected);
}

#[test]
fn test_relative_mode_ignores_working_directory() {
    let project = tempdir().unwrap();
    let elsewhere = tempdir().unwrap();
    let config_path = create_project(project.path());
    let loaded = BuildConfiguration::from_file(&config_path).unwrap();

    let (base_a, from_project) = resolve_scan_set(&loaded, &options_with_cwd(project.path())).unwrap();
    let (base_b, from_elsewhere) = resolve_scan_set(&loaded, &options_with_cwd(elsewhere.path())).unwrap();

    assert_eq!(base_a, project.path());
    assert_eq!(base_b, project.path());
    assert_eq!(from_project, from_elsewhere);
    assert_eq!(from_project.len(), 4);
}

#[test]
fn test_non_relative_mode_follows_working_directory() {
    let project = tempdir().unwrap();
    let elsewhere = tempdir().unwrap();
    let config_path = create_project(project.path());

    let mut loaded = BuildConfiguration::from_file(&config_path).unwrap();
    loaded.config.content.relative = false;

    let (_, from_project) = resolve_scan_set(&loaded, &options_with_cwd(project.path())).unwrap();
    let (_, from_elsewhere) = resolve_scan_set(&loaded, &options_with_cwd(elsewhere.path())).unwrap();

    assert_eq!(from_project.len(), 4);
    assert!(from_elsewhere.is_empty());
}

#[test]
fn test_negated_pattern_excludes_files() {
    let project = tempdir().unwrap();
    let config_path = create_project(project.path());
    let mut loaded = BuildConfiguration::from_file(&config_path).unwrap();
    loaded.config.content.files.push("!./frontend/static/deep/**".to_string());

    let (_, files) = resolve_scan_set(&loaded, &options_with_cwd(project.path())).unwrap();
    let found = relative_paths(project.path(), &files);

    assert_eq!(found.len(), 3);
    assert!(!found.contains("frontend/static/deep/nested/widget.js"));
}

#[test]
fn test_relative_exclude_resolves_against_working_directory() {
    let project = tempdir().unwrap();
    let config_path = create_project(project.path());
    let loaded = BuildConfiguration::from_file(&config_path).unwrap();

    let options = ScanOptions {
        exclude: vec!["frontend/static/**".to_string()],
        ..options_with_cwd(project.path())
    };
    let (_, files) = resolve_scan_set(&loaded, &options).unwrap();
    let found = relative_paths(project.path(), &files);

    let expected: BTreeSet<String> = [
        "frontend/templates/components/nav.html",
        "frontend/templates/pages/index.html",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assert_eq!(found, expected);
}

#[test]
fn test_exclude_with_braces_and_absolute_path() {
    let project = tempdir().unwrap();
    let config_path = create_project(project.path());
    let loaded = BuildConfiguration::from_file(&config_path).unwrap();

    let options = ScanOptions {
        exclude: vec![
            "./frontend/templates/{pages,components}/**".to_string(),
            format!("{}/frontend/static/deep/**", project.path().display()),
        ],
        ..options_with_cwd(project.path())
    };
    let (_, files) = resolve_scan_set(&loaded, &options).unwrap();
    let found = relative_paths(project.path(), &files);

    assert_eq!(found.len(), 1);
    assert!(found.contains("frontend/static/app.js"));
}

#[test]
fn test_scan_collects_candidates_and_defaults_pass_through() {
    let project = tempdir().unwrap();
    let config_path = create_project(project.path());
    let loaded = BuildConfiguration::from_file(&config_path).unwrap();

    let mut defaults = DesignTokens::new();
    defaults.insert("colors".to_string(), json!({ "gray": { "800": "#1f2937" } }));
    defaults.insert("spacing".to_string(), json!({ "4": "1rem" }));

    let options = ScanOptions {
        default_theme: defaults.clone(),
        ..options_with_cwd(project.path())
    };
    let outcome = scan_project(&loaded, &options).unwrap();
    let manifest = &outcome.manifest;

    for class in ["flex", "gap-4", "bg-gray-800", "md:px-8", "hover:underline", "rounded-lg"] {
        assert!(manifest.classes.contains_key(class), "missing {}", class);
    }
    assert!(!manifest.classes.contains_key("should-not-scan"));
    assert!(!manifest.classes.contains_key("outside-only"));

    // Empty extend and no plugins leave the generator's defaults untouched
    assert_eq!(manifest.theme, defaults);
    assert!(manifest.plugins.is_empty());
    assert!(manifest.disabled_core_plugins.is_empty());
    assert!(manifest.preflight);
    assert!(manifest.metadata.relative);
    assert_eq!(manifest.metadata.files_scanned, 4);
}

#[test]
fn test_round_trip_shipped_config() {
    let config = BuildConfiguration::shipped();
    let rendered = to_js_module(&config).unwrap();
    let reloaded = BuildConfiguration::from_js_str(&rendered).unwrap();
    assert_eq!(reloaded, config);

    let original = BuildConfiguration::from_js_str(SHIPPED_CONFIG).unwrap();
    assert_eq!(original, config);
}

#[test]
fn test_round_trip_populated_config() {
    let mut config = BuildConfiguration::shipped();
    config
        .theme
        .extend
        .insert("colors".to_string(), json!({ "brand": { "DEFAULT": "#0066cc", "dark": "#003366" } }));
    config
        .theme
        .overrides
        .insert("screens".to_string(), json!({ "sm": "480px", "lg": "976px" }));
    config.plugins = vec![
        PluginRef::Module("@tailwindcss/forms".to_string()),
        PluginRef::Module("@tailwindcss/aspect-ratio".to_string()),
        PluginRef::Configured {
            name: "@tailwindcss/typography".to_string(),
            options: json!({ "className": "prose", "levels": [1, 2, 3] }),
        },
    ];
    let mut toggles = indexmap::IndexMap::new();
    toggles.insert("preflight".to_string(), false);
    config.core_plugins = Some(CorePlugins::Toggles(toggles));
    config.dark_mode = Some(DarkMode::Custom(
        DarkModeStrategy::Selector,
        r#"[data-mode="dark"]"#.to_string(),
    ));
    config.important = Some(true);
    config.safelist = vec!["bg-red-500".to_string()];
    config.extra.insert("future".to_string(), json!({ "hoverOnlyWhenSupported": true }));

    let rendered = to_js_module(&config).unwrap();
    let reloaded = BuildConfiguration::from_js_str(&rendered).unwrap();
    assert_eq!(reloaded, config);

    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(BuildConfiguration::from_json_str(&json).unwrap(), config);

    let yaml = config.to_yaml().unwrap();
    assert_eq!(BuildConfiguration::from_yaml_str(&yaml).unwrap(), config);
}

#[test]
fn test_plugin_called_without_options_round_trips() {
    let source = r#"module.exports = {
  plugins: [require("@tailwindcss/forms")(), require("@tailwindcss/typography")({ className: "prose" })],
  darkMode: ["selector", '[data-mode="dark"]'],
}"#;
    let config = BuildConfiguration::from_js_str(source).unwrap();
    assert_eq!(config.plugins[0], PluginRef::Module("@tailwindcss/forms".to_string()));
    assert_eq!(config.dark_mode.as_ref().unwrap().strategy(), DarkModeStrategy::Selector);

    let reloaded = BuildConfiguration::from_js_str(&to_js_module(&config).unwrap()).unwrap();
    assert_eq!(reloaded, config);
}

#[tokio::test]
async fn test_run_scan_writes_manifest() {
    let project = tempdir().unwrap();
    let config_path = create_project(project.path());
    let output = project.path().join("build/manifest.json");

    let args = ScanArgs {
        config: ConfigArgs {
            config: Some(config_path),
            cwd: None,
        },
        output_manifest: Some(output.clone()),
        exclude: vec![],
        jobs: Some(2),
        defaults: None,
        max_file_size_mb: 10,
        allow_symlinks: false,
        dry_run: false,
        no_progress: true,
    };

    let outcome = run_scan(args, false).await.unwrap();
    assert_eq!(outcome.files.len(), 4);

    let manifest: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(manifest["metadata"]["files_scanned"], 4);
    assert!(manifest["classes"]["flex"]["count"].as_u64().unwrap() >= 1);
    assert_eq!(manifest["preflight"], true);
}

#[tokio::test]
async fn test_run_scan_dry_run_writes_nothing() {
    let project = tempdir().unwrap();
    let config_path = create_project(project.path());
    let output = project.path().join("manifest.json");

    let args = ScanArgs {
        config: ConfigArgs {
            config: Some(config_path),
            cwd: None,
        },
        output_manifest: Some(output.clone()),
        exclude: vec![],
        jobs: None,
        defaults: None,
        max_file_size_mb: 10,
        allow_symlinks: false,
        dry_run: true,
        no_progress: true,
    };

    run_scan(args, false).await.unwrap();
    assert!(!output.exists());
}

#[test]
fn test_repository_config_matches_shipped() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tailwind.config.js");
    let loaded = BuildConfiguration::from_file(&path).unwrap();
    assert_eq!(loaded.config, BuildConfiguration::shipped());
    assert!(loaded.config.preflight_enabled());
}

#[tokio::test]
async fn test_run_scan_applies_relative_excludes() {
    let project = tempdir().unwrap();
    let config_path = create_project(project.path());

    let args = ScanArgs {
        config: ConfigArgs {
            config: Some(config_path),
            cwd: Some(project.path().to_path_buf()),
        },
        output_manifest: None,
        exclude: vec!["frontend/static/**".to_string()],
        jobs: Some(1),
        defaults: None,
        max_file_size_mb: 10,
        allow_symlinks: false,
        dry_run: false,
        no_progress: true,
    };

    let outcome = run_scan(args, false).await.unwrap();
    assert_eq!(outcome.files.len(), 2);
    assert!(outcome.manifest.classes.contains_key("flex"));
    assert!(!outcome.manifest.classes.contains_key("hover:underline"));
}

#[test]
fn test_render_config_formats_reload_equal() {
    let project = tempdir().unwrap();
    let mut config = BuildConfiguration::shipped();
    config.plugins = vec![PluginRef::Configured {
        name: "@tailwindcss/typography".to_string(),
        options: json!({ "className": "prose" }),
    }];
    config.theme.extend.insert("spacing".to_string(), json!({ "128": "32rem" }));

    for (format, file_name) in [
        (OutputFormat::Js, "tailwind.config.js"),
        (OutputFormat::Json, "tailwind.config.json"),
        (OutputFormat::Yaml, "tailwind.config.yaml"),
    ] {
        let rendered = render_config(&config, format).unwrap();
        let path = project.path().join(file_name);
        fs::write(&path, rendered).unwrap();

        let loaded = BuildConfiguration::from_file(&path).unwrap();
        assert_eq!(loaded.config, config, "{:?} output did not reload", format);
    }
}

#[tokio::test]
async fn test_files_show_and_check_commands() {
    let project = tempdir().unwrap();
    let config_path = create_project(project.path());
    let config = ConfigArgs {
        config: Some(config_path),
        cwd: Some(project.path().to_path_buf()),
    };

    handle_files_command(FilesArgs {
        config: config.clone(),
        exclude: vec!["frontend/static/**".to_string()],
    })
    .await
    .unwrap();

    for format in [OutputFormat::Js, OutputFormat::Json, OutputFormat::Yaml] {
        handle_show_command(ShowArgs {
            config: config.clone(),
            format,
        })
        .await
        .unwrap();
    }

    handle_check_command(config).await.unwrap();
}

#[tokio::test]
async fn test_check_command_rejects_invalid_config() {
    let project = tempdir().unwrap();
    let config_path = project.path().join("tailwind.config.js");
    fs::write(&config_path, "module.exports = { separator: \"\" }").unwrap();

    let err = handle_check_command(ConfigArgs {
        config: Some(config_path.clone()),
        cwd: None,
    })
    .await
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    fs::write(&config_path, "module.exports = { content: [").unwrap();
    let err = handle_check_command(ConfigArgs {
        config: Some(config_path),
        cwd: None,
    })
    .await
    .unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}
