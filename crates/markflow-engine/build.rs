/// Generates one test function per .md file in tests/fixtures/corpus/.
/// Each one checks that the document survives printing and re-scanning.
fn main() {
    let out_dir = std::env::var("OUT_DIR").unwrap();
    let dest = std::path::Path::new(&out_dir).join("corpus_tests.rs");

    let mut code = String::from(
        r#"mod corpus {
    use super::round_trip;
"#,
    );

    let mut entries: Vec<_> = std::fs::read_dir("tests/fixtures/corpus")
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        if path.extension().is_some_and(|e| e == "md") {
            let name = path.file_stem().unwrap().to_str().unwrap();
            code.push_str(&format!(
                r#"
    #[test]
    fn {name}() {{
        round_trip("{name}");
    }}
"#
            ));
        }
    }

    code.push_str("}\n");
    std::fs::write(&dest, code).unwrap();

    // Rerun if the corpus changes
    println!("cargo::rerun-if-changed=tests/fixtures/corpus");
}
