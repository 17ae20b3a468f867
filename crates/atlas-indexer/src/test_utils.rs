//! Test utilities for atlas-indexer

use std::fs;

use tempfile::TempDir;

/// Create a temporary repository containing `files` as (relative path, content).
pub fn create_repo(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (path, content) in files {
        let full = temp_dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }
    temp_dir
}

/// A small Go + Python repository with cross-file references.
pub fn create_mixed_repo() -> TempDir {
    create_repo(&[
        (
            "svc/server.go",
            r#"package svc

type Server struct {
	Addr string
}

func NewServer(addr string) *Server {
	return &Server{Addr: addr}
}

func (s *Server) Start() error {
	return listen(s.Addr)
}
"#,
        ),
        (
            "svc/net.go",
            r#"package svc

func listen(addr string) error {
	return nil
}
"#,
        ),
        (
            "tools/report.py",
            r#"class Report:
    def render(self):
        return format_rows(self)


def format_rows(report):
    return []
"#,
        ),
        ("README.md", "# not indexed\n"),
    ])
}
