use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{OptifindError, Result};
use crate::orchestrator::RunResult;

pub const MERGED_CATALOGUE_NAME: &str = "optifind_merged_catalogue.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub path: PathBuf,
    pub catalogues: usize,
    pub header_lines: usize,
    pub rows: usize,
}

/// Location of the plain-text catalogue written by one run.
pub fn catalogue_path(output_dir: &Path, output_filename: &str) -> PathBuf {
    output_dir.join(format!("{}_cat.txt", output_filename))
}

/// Concatenates the per-run catalogues into one file. Nothing is written when
/// there are no runs or text catalogues are disabled.
pub fn merge(
    runs: &[RunResult],
    output_dir: &Path,
    text_enabled: bool,
) -> Result<Option<MergeSummary>> {
    if runs.is_empty() || !text_enabled {
        return Ok(None);
    }

    let path = output_dir.join(MERGED_CATALOGUE_NAME);
    info!("Creating merged ASCII catalogue: {}", path.display());

    let contents = runs
        .iter()
        .map(|run| {
            let catalogue = catalogue_path(output_dir, &run.output_filename);
            fs::read_to_string(&catalogue).map_err(|source| OptifindError::MergeRead {
                path: catalogue,
                source,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut header: Vec<&str> = Vec::new();
    let mut body = String::new();
    let mut rows = 0;

    for content in &contents {
        let needs_header = header.is_empty();
        let mut in_header = true;

        for line in content.lines() {
            if line.starts_with('#') {
                if needs_header && in_header {
                    header.push(line);
                }
            } else if !line.trim().is_empty() {
                in_header = false;
                body.push_str(line);
                body.push('\n');
                rows += 1;
            }
        }
    }

    let mut output = String::new();
    for line in &header {
        output.push_str(line);
        output.push('\n');
    }
    output.push('\n');
    output.push_str(&body);

    fs::write(&path, output).map_err(|source| OptifindError::MergeWrite {
        path: path.clone(),
        source,
    })?;

    Ok(Some(MergeSummary {
        path,
        catalogues: runs.len(),
        header_lines: header.len(),
        rows,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(name: &str) -> RunResult {
        RunResult {
            id: name.to_string(),
            output_filename: name.to_string(),
        }
    }

    const CAT_A: &str = "\
# SoFiA 2.3.1
# Creator: test
#
#   name   x   y   z
\"A\"  10.0  20.0  5.0
\"A2\" 11.0  21.0  6.0
";

    const CAT_B: &str = "\
# SoFiA 2.3.1
# Creator: other

#   name   x   y   z
\"B\"  30.0  40.0  7.0
";

    #[test]
    fn header_once_and_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_cat.txt"), CAT_A).unwrap();
        fs::write(dir.path().join("b_cat.txt"), CAT_B).unwrap();

        let summary = merge(&[run("a"), run("b")], dir.path(), true)
            .unwrap()
            .unwrap();
        assert_eq!(summary.catalogues, 2);
        assert_eq!(summary.header_lines, 4);
        assert_eq!(summary.rows, 3);

        let merged = fs::read_to_string(dir.path().join(MERGED_CATALOGUE_NAME)).unwrap();
        assert_eq!(
            merged,
            "# SoFiA 2.3.1\n# Creator: test\n#\n#   name   x   y   z\n\n\
             \"A\"  10.0  20.0  5.0\n\"A2\" 11.0  21.0  6.0\n\"B\"  30.0  40.0  7.0\n"
        );
    }

    #[test]
    fn header_taken_from_first_catalogue_that_has_one() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("empty_cat.txt"), "\n\n").unwrap();
        fs::write(dir.path().join("b_cat.txt"), CAT_B).unwrap();

        let summary = merge(&[run("empty"), run("b")], dir.path(), true)
            .unwrap()
            .unwrap();
        assert_eq!(summary.header_lines, 3);
        let merged = fs::read_to_string(&summary.path).unwrap();
        assert!(merged.starts_with("# SoFiA 2.3.1\n# Creator: other\n#   name"));
    }

    #[test]
    fn last_row_without_newline() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_cat.txt"), "# h\n1 2 3").unwrap();
        merge(&[run("a")], dir.path(), true).unwrap();
        let merged = fs::read_to_string(dir.path().join(MERGED_CATALOGUE_NAME)).unwrap();
        assert_eq!(merged, "# h\n\n1 2 3\n");
    }

    #[test]
    fn no_runs_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(merge(&[], dir.path(), true).unwrap(), None);
        assert!(!dir.path().join(MERGED_CATALOGUE_NAME).exists());
    }

    #[test]
    fn text_output_disabled_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_cat.txt"), CAT_A).unwrap();
        assert_eq!(merge(&[run("a")], dir.path(), false).unwrap(), None);
        assert!(!dir.path().join(MERGED_CATALOGUE_NAME).exists());
    }

    #[test]
    fn missing_catalogue_aborts_merge() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_cat.txt"), CAT_A).unwrap();

        let err = merge(&[run("a"), run("missing")], dir.path(), true).unwrap_err();
        match err {
            OptifindError::MergeRead { path, .. } => {
                assert_eq!(path, dir.path().join("missing_cat.txt"))
            }
            other => panic!("Expected MergeRead error, got {:?}", other),
        }
        assert!(!dir.path().join(MERGED_CATALOGUE_NAME).exists());
    }

    #[test]
    fn unwritable_merged_catalogue() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_cat.txt"), CAT_A).unwrap();
        fs::create_dir(dir.path().join(MERGED_CATALOGUE_NAME)).unwrap();

        let err = merge(&[run("a")], dir.path(), true).unwrap_err();
        assert!(matches!(err, OptifindError::MergeWrite { .. }));
    }
}
