use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::{env, fs};

const DEFAULT_LOCALE: &str = "zh-CN";
const LOCALES_DIR: &str = "locales";

fn main() {
    println!("cargo:rerun-if-changed={LOCALES_DIR}");

    let mut locales = BTreeMap::<String, BTreeMap<String, String>>::new();
    let entries = fs::read_dir(LOCALES_DIR).expect("locales directory must exist");
    for entry in entries {
        let path = entry.expect("locale entry must be readable").path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
            continue;
        }
        println!("cargo:rerun-if-changed={}", path.display());
        let Some(locale) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let text = fs::read_to_string(&path).expect("locale file must be readable");
        let table: toml::Table = toml::from_str(&text)
            .unwrap_or_else(|error| panic!("invalid locale file {}: {error}", path.display()));
        let mut flat = BTreeMap::new();
        flatten("", &table, &mut flat);
        locales.insert(locale.to_string(), flat);
    }

    let mut out = String::new();
    writeln!(out, "pub const DEFAULT_LOCALE: &str = {DEFAULT_LOCALE:?};").unwrap();
    writeln!(out, "pub static LOCALES: &[(&str, &[(&str, &str)])] = &[").unwrap();
    for (locale, entries) in &locales {
        writeln!(out, "    ({locale:?}, &[").unwrap();
        for (key, value) in entries {
            writeln!(out, "        ({key:?}, {value:?}),").unwrap();
        }
        writeln!(out, "    ]),").unwrap();
    }
    writeln!(out, "];").unwrap();

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    fs::write(Path::new(&out_dir).join("unoui_i18n_generated.rs"), out)
        .expect("generated i18n catalog must be writable");
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut BTreeMap<String, String>) {
    for (key, value) in table {
        let full = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::String(text) => {
                out.insert(full, text.clone());
            }
            toml::Value::Table(nested) => flatten(&full, nested, out),
            other => panic!("locale key {full} must be a string, got {other}"),
        }
    }
}
