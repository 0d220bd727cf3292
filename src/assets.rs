//! Companion asset files and the file-system collaborator they go through.

use crate::capability::AssetKind;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File-system boundary used for companion assets.
pub trait AssetStore {
    fn exists(&self, path: &Path) -> bool;
    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()>;
}

/// Reads and writes the real file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskStore;

impl AssetStore for DiskStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()> {
        fs::write(path, contents)
    }
}

/// Checks existence on disk but only records writes.
#[derive(Debug, Default, Clone)]
pub struct DryRunStore {
    pub planned: Vec<AssetFile>,
}

impl DryRunStore {
    /// Write the recorded files through `store`.
    ///
    /// Files that appeared since they were planned are left alone.
    pub fn commit(self, store: &mut dyn AssetStore) -> io::Result<Vec<AssetOutcome>> {
        provision(store, self.planned)
    }
}

impl AssetStore for DryRunStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists() || self.planned.iter().any(|f| f.path == path)
    }

    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()> {
        self.planned.push(AssetFile {
            path: path.to_path_buf(),
            contents: contents.to_string(),
        });
        Ok(())
    }
}

/// One companion file considered during an injection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetOutcome {
    pub path: PathBuf,
    /// False when the file already existed and was left alone
    pub created: bool,
}

/// A companion file to provision: where it goes and its initial contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    pub path: PathBuf,
    pub contents: String,
}

impl AssetKind {
    /// Import statement for the asset, without terminator.
    pub fn import_statement(&self, stem: &str) -> String {
        match self {
            AssetKind::Stylesheet => format!("import * as css from './{stem}.m.css';"),
            AssetKind::MessageBundle => format!("import bundle from './{stem}.nls';"),
        }
    }

    /// Files backing the asset for a source file `<dir>/<stem>.*`.
    pub fn files(&self, dir: &Path, stem: &str, eol: &str) -> Vec<AssetFile> {
        match self {
            AssetKind::Stylesheet => vec![
                AssetFile {
                    path: dir.join(format!("{stem}.m.css")),
                    contents: format!(".root {{{eol}{eol}}}{eol}"),
                },
                AssetFile {
                    path: dir.join(format!("{stem}.m.css.d.ts")),
                    contents: format!("export const root: string;{eol}"),
                },
            ],
            AssetKind::MessageBundle => vec![AssetFile {
                path: dir.join(format!("{stem}.nls.ts")),
                contents: format!(
                    "const messages = {{{eol}{eol}}};{eol}{eol}export default {{ messages }};{eol}"
                ),
            }],
        }
    }
}

/// Write each missing file; existing files are never touched.
pub fn provision(
    store: &mut dyn AssetStore,
    files: Vec<AssetFile>,
) -> io::Result<Vec<AssetOutcome>> {
    let mut outcomes = Vec::with_capacity(files.len());
    for file in files {
        if store.exists(&file.path) {
            tracing::debug!(path = %file.path.display(), "companion file exists, leaving it");
            outcomes.push(AssetOutcome {
                path: file.path,
                created: false,
            });
            continue;
        }
        store.write(&file.path, &file.contents)?;
        tracing::info!(path = %file.path.display(), "created companion file");
        outcomes.push(AssetOutcome {
            path: file.path,
            created: true,
        });
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stylesheet_files() {
        let files = AssetKind::Stylesheet.files(Path::new("src/widgets"), "Hello", "\n");
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, PathBuf::from("src/widgets/Hello.m.css"));
        assert_eq!(files[0].contents, ".root {\n\n}\n");
        assert_eq!(files[1].path, PathBuf::from("src/widgets/Hello.m.css.d.ts"));
        assert_eq!(files[1].contents, "export const root: string;\n");
    }

    #[test]
    fn test_message_bundle_files() {
        let files = AssetKind::MessageBundle.files(Path::new("w"), "Hello", "\r\n");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, PathBuf::from("w/Hello.nls.ts"));
        assert_eq!(
            files[0].contents,
            "const messages = {\r\n\r\n};\r\n\r\nexport default { messages };\r\n"
        );
    }

    #[test]
    fn test_import_statements() {
        assert_eq!(
            AssetKind::Stylesheet.import_statement("Hello"),
            "import * as css from './Hello.m.css';"
        );
        assert_eq!(
            AssetKind::MessageBundle.import_statement("Hello"),
            "import bundle from './Hello.nls';"
        );
    }

    #[test]
    fn test_provision_skips_existing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let existing = temp_dir.path().join("Hello.m.css");
        fs::write(&existing, ".root { color: red; }\n").unwrap();

        let files = AssetKind::Stylesheet.files(temp_dir.path(), "Hello", "\n");
        let outcomes = provision(&mut DiskStore, files).unwrap();

        assert!(!outcomes[0].created);
        assert!(outcomes[1].created);
        assert_eq!(
            fs::read_to_string(&existing).unwrap(),
            ".root { color: red; }\n"
        );
        assert!(temp_dir.path().join("Hello.m.css.d.ts").exists());
    }

    #[test]
    fn test_dry_run_records_without_writing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = DryRunStore::default();
        let files = AssetKind::MessageBundle.files(temp_dir.path(), "Hello", "\n");
        let outcomes = provision(&mut store, files).unwrap();

        assert!(outcomes[0].created);
        assert_eq!(store.planned.len(), 1);
        assert!(!temp_dir.path().join("Hello.nls.ts").exists());
    }

    #[test]
    fn test_commit_writes_planned_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = DryRunStore::default();
        let files = AssetKind::Stylesheet.files(temp_dir.path(), "Hello", "\n");
        provision(&mut store, files).unwrap();

        // Appeared between planning and commit
        let css = temp_dir.path().join("Hello.m.css");
        fs::write(&css, ".root { color: red; }\n").unwrap();

        let outcomes = store.commit(&mut DiskStore).unwrap();

        assert!(!outcomes[0].created);
        assert!(outcomes[1].created);
        assert_eq!(fs::read_to_string(&css).unwrap(), ".root { color: red; }\n");
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("Hello.m.css.d.ts")).unwrap(),
            "export const root: string;\n"
        );
    }
}
