//! Output manifest: artifact descriptors with addressable URLs.

use crate::domain::compile::{OutputFile, ProjectId};

/// An [`OutputFile`] plus the URL it is served under. The URL is uniquely
/// determined by `(project_id, build_id, path)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub file: OutputFile,
    pub url: String,
}

/// Attach a download URL to every descriptor, preserving input order and all
/// original fields. Each entry uses its own file's build id, so artifacts
/// surviving from an earlier build keep their original namespace.
pub fn build_manifest(
    base_url: &str,
    project_id: &ProjectId,
    output_files: Vec<OutputFile>,
) -> Vec<ManifestEntry> {
    let base = base_url.trim_end_matches('/');
    output_files
        .into_iter()
        .map(|file| {
            let url = format!(
                "{base}/project/{project_id}/build/{build}/output/{path}",
                build = file.build_id,
                path = file.path,
            );
            ManifestEntry { file, url }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::compile::BuildId;

    fn file(path: &str, kind: &str, size: Option<u64>, build: &str) -> OutputFile {
        OutputFile {
            path: path.to_string(),
            kind: kind.to_string(),
            size,
            build_id: BuildId::from(build.to_string()),
        }
    }

    #[test]
    fn url_is_derived_from_project_build_and_path() {
        let project = ProjectId::parse("project-id-123").expect("valid id");
        let manifest = build_manifest(
            "http://clsi.example.com",
            &project,
            vec![file("output.pdf", "pdf", Some(1337), "1234")],
        );

        assert_eq!(
            manifest[0].url,
            "http://clsi.example.com/project/project-id-123/build/1234/output/output.pdf"
        );
    }

    #[test]
    fn order_and_fields_are_preserved() {
        let project = ProjectId::parse("p").expect("valid id");
        let manifest = build_manifest(
            "http://clsi.example.com/",
            &project,
            vec![
                file("output.pdf", "pdf", Some(1337), "1234"),
                file("output.log", "log", None, "1234"),
            ],
        );

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest[0].file.path, "output.pdf");
        assert_eq!(manifest[0].file.size, Some(1337));
        assert_eq!(manifest[1].file.path, "output.log");
        assert_eq!(manifest[1].file.size, None);
        assert_eq!(
            manifest[1].url,
            "http://clsi.example.com/project/p/build/1234/output/output.log"
        );
    }

    #[test]
    fn entries_keep_their_own_build_namespace() {
        let project = ProjectId::parse("p").expect("valid id");
        let manifest = build_manifest(
            "http://clsi.example.com",
            &project,
            vec![
                file("output.pdf", "pdf", Some(10), "new-build"),
                file("output.blg", "blg", None, "old-build"),
            ],
        );

        assert!(manifest[0].url.contains("/build/new-build/"));
        assert!(manifest[1].url.contains("/build/old-build/"));
    }
}
