use std::path::Path;
use walkdir::WalkDir;

const MAX_WIDTH: usize = 100;

#[test]
fn sources_fit_rustfmt_width() {
    let src = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut overlong = Vec::new();

    for entry in WalkDir::new(&src).into_iter().filter_map(|e| e.ok()) {
        if entry.path().extension().map_or(true, |ext| ext != "rs") {
            continue;
        }
        let content = std::fs::read_to_string(entry.path()).unwrap();
        for (index, line) in content.lines().enumerate() {
            if line.chars().count() > MAX_WIDTH {
                overlong.push(format!("{}:{}", entry.path().display(), index + 1));
            }
        }
    }

    assert!(overlong.is_empty(), "lines over {MAX_WIDTH} columns: {overlong:#?}");
}
