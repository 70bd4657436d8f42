use std::path::{Path, PathBuf};

use axum::{
    extract::{Multipart, Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::error;

use crate::web::{
    AppState, auth,
    templates::{FlashQuery, render_upload_page},
};

/// File types students may upload to the portal.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "pdf", "docx", "xlsx"];

pub type UploadResult<T> = Result<T, UploadError>;

/// Error returned when validating or persisting an uploaded file.
#[derive(Debug)]
pub enum UploadError {
    EmptyFilename,
    DisallowedType(String),
    Io(std::io::Error),
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadError::EmptyFilename => write!(f, "no file was selected"),
            UploadError::DisallowedType(ext) if ext.is_empty() => {
                write!(f, "the file has no extension")
            }
            UploadError::DisallowedType(ext) => {
                write!(f, "files of type `{ext}` are not allowed")
            }
            UploadError::Io(err) => write!(f, "failed to store the file: {err}"),
        }
    }
}

impl std::error::Error for UploadError {}

/// Allow-list membership test on the lowercased text after the final dot.
/// A filename with no dot never passes.
pub fn allowed_file(filename: &str, allowed: &[&str]) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            allowed.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Validate an upload and persist it under `dest_dir`. The filename is
/// sanitized before use, and a prior file with the same sanitized name is
/// overwritten.
pub async fn accept(
    dest_dir: &Path,
    filename: &str,
    bytes: &[u8],
    allowed: &[&str],
) -> UploadResult<PathBuf> {
    if filename.is_empty() {
        return Err(UploadError::EmptyFilename);
    }

    if !allowed_file(filename, allowed) {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        return Err(UploadError::DisallowedType(extension));
    }

    let sanitized = sanitize_filename::sanitize(filename);
    if sanitized.is_empty() {
        return Err(UploadError::EmptyFilename);
    }

    let stored_path = dest_dir.join(&sanitized);
    let mut file = File::create(&stored_path).await.map_err(UploadError::Io)?;
    file.write_all(bytes).await.map_err(UploadError::Io)?;
    file.flush().await.map_err(UploadError::Io)?;

    Ok(stored_path)
}

pub async fn upload_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<FlashQuery>,
) -> Result<Html<String>, Redirect> {
    auth::require_student(&state, &jar).await?;

    Ok(Html(render_upload_page(&params)))
}

pub async fn process_upload(
    State(state): State<AppState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Result<Redirect, Redirect> {
    auth::require_student(&state, &jar).await?;

    let mut upload = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let field_name = field.name().unwrap_or("").to_string();
                let file_name = field.file_name().map(|name| name.to_string());

                if field_name == "file" {
                    let Some(filename) = file_name else { continue };
                    match field.bytes().await {
                        Ok(bytes) => upload = Some((filename, bytes)),
                        Err(err) => {
                            error!(?err, "failed to read uploaded file");
                            return Ok(Redirect::to("/upload?error=bad_form"));
                        }
                    }
                }
            }
            Ok(None) => break,
            Err(err) => {
                error!(?err, "failed to parse upload form");
                return Ok(Redirect::to("/upload?error=bad_form"));
            }
        }
    }

    let Some((filename, bytes)) = upload else {
        return Ok(Redirect::to("/upload?error=no_file"));
    };

    match accept(state.upload_dir(), &filename, &bytes, ALLOWED_EXTENSIONS).await {
        Ok(_) => Ok(Redirect::to("/dashboard?status=uploaded")),
        Err(UploadError::EmptyFilename) => Ok(Redirect::to("/upload?error=no_file")),
        Err(UploadError::DisallowedType(_)) => Ok(Redirect::to("/upload?error=bad_type")),
        Err(UploadError::Io(err)) => {
            error!(?err, "failed to store upload");
            Ok(Redirect::to("/upload?error=unknown"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn allow_list_is_case_insensitive_on_extension() {
        assert!(allowed_file("photo.PNG", ALLOWED_EXTENSIONS));
        assert!(allowed_file("report.pdf", ALLOWED_EXTENSIONS));
        assert!(allowed_file("grades.xlsx", ALLOWED_EXTENSIONS));
        assert!(!allowed_file("tool.exe", ALLOWED_EXTENSIONS));
        assert!(!allowed_file("README", ALLOWED_EXTENSIONS));
    }

    #[test]
    fn only_the_final_extension_counts() {
        assert!(allowed_file("archive.tar.png", ALLOWED_EXTENSIONS));
        assert!(!allowed_file("photo.png.exe", ALLOWED_EXTENSIONS));
    }

    #[tokio::test]
    async fn rejects_empty_filename() {
        let dir = tempdir().unwrap();
        let result = accept(dir.path(), "", b"data", ALLOWED_EXTENSIONS).await;
        assert!(matches!(result, Err(UploadError::EmptyFilename)));
    }

    #[tokio::test]
    async fn rejects_disallowed_type() {
        let dir = tempdir().unwrap();
        let result = accept(dir.path(), "x.exe", b"data", ALLOWED_EXTENSIONS).await;
        assert!(matches!(result, Err(UploadError::DisallowedType(ext)) if ext == "exe"));
    }

    #[tokio::test]
    async fn stores_bytes_unchanged() {
        let dir = tempdir().unwrap();
        let bytes = b"\x89PNG\r\n\x1a\npixel data";
        let path = accept(dir.path(), "a.png", bytes, ALLOWED_EXTENSIONS)
            .await
            .unwrap();

        let stored = tokio::fs::read(&path).await.unwrap();
        assert_eq!(stored, bytes);
    }

    #[tokio::test]
    async fn sanitizes_path_components_out_of_filenames() {
        let dir = tempdir().unwrap();
        let path = accept(dir.path(), "../../escape.png", b"data", ALLOWED_EXTENSIONS)
            .await
            .unwrap();

        assert_eq!(path.parent(), Some(dir.path()));
    }

    #[tokio::test]
    async fn same_name_overwrites_previous_upload() {
        let dir = tempdir().unwrap();
        accept(dir.path(), "notes.pdf", b"first", ALLOWED_EXTENSIONS)
            .await
            .unwrap();
        let path = accept(dir.path(), "notes.pdf", b"second", ALLOWED_EXTENSIONS)
            .await
            .unwrap();

        let stored = tokio::fs::read(&path).await.unwrap();
        assert_eq!(stored, b"second");
    }
}
