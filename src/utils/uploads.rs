// utils/uploads.rs
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use regex::Regex;
use uuid::Uuid;

use crate::{error::HttpError, models::taskmodel::NewTaskFile};

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
pub const MAX_FILES: usize = 10;
pub const MAX_CSV_SIZE: usize = 5 * 1024 * 1024;

/// Multipart body limit for a full evidence upload plus form fields.
pub const MAX_SUBMISSION_BODY: usize = MAX_FILE_SIZE * MAX_FILES + 1024 * 1024;

#[derive(Debug, Default)]
pub struct TaskSubmissionForm {
    pub submission_data: Option<String>,
    pub files: Vec<NewTaskFile>,
}

pub struct UploadPolicy {
    media_type: Regex,
    extension: Regex,
}

impl UploadPolicy {
    pub fn evidence() -> Result<Self, regex::Error> {
        Ok(Self {
            media_type: Regex::new(r"^(image|video)/[a-z0-9.+-]+$")?,
            extension: Regex::new(r"(?i)^(jpe?g|png|gif|webp|heic|mp4|mov|avi|webm|3gp)$")?,
        })
    }

    pub fn accepts(&self, content_type: &str, file_name: &str) -> bool {
        let extension_ok = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extension.is_match(e))
            .unwrap_or(false);

        self.media_type.is_match(&content_type.to_lowercase()) && extension_ok
    }
}

fn stored_name(file_name: &str) -> String {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();

    format!(
        "{}-{}{}",
        chrono::Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        extension
    )
}

/// Reads `submission_data` and up to `MAX_FILES` `files` parts, writing
/// each accepted file under `uploads_dir`.
pub async fn read_submission(
    mut multipart: Multipart,
    uploads_dir: &str,
) -> Result<TaskSubmissionForm, HttpError> {
    let policy = UploadPolicy::evidence().map_err(HttpError::internal)?;

    tokio::fs::create_dir_all(uploads_dir)
        .await
        .map_err(HttpError::internal)?;

    let mut form = TaskSubmissionForm::default();
    let mut written: Vec<PathBuf> = Vec::new();

    let result = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| HttpError::bad_request(e.to_string()))?
        {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("submission_data") => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| HttpError::bad_request(e.to_string()))?;
                    if !text.trim().is_empty() {
                        form.submission_data = Some(text);
                    }
                }
                Some("files") => {
                    if form.files.len() >= MAX_FILES {
                        return Err(HttpError::bad_request(format!(
                            "At most {} files can be uploaded",
                            MAX_FILES
                        )));
                    }

                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().unwrap_or_default().to_string();
                    if !policy.accepts(&content_type, &file_name) {
                        return Err(HttpError::bad_request(
                            "Only image and video files are allowed",
                        ));
                    }

                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| HttpError::bad_request(e.to_string()))?;
                    if bytes.len() > MAX_FILE_SIZE {
                        return Err(HttpError::bad_request(format!(
                            "{} exceeds the {} MB limit",
                            file_name,
                            MAX_FILE_SIZE / (1024 * 1024)
                        )));
                    }

                    let path = Path::new(uploads_dir).join(stored_name(&file_name));
                    tokio::fs::write(&path, &bytes)
                        .await
                        .map_err(HttpError::internal)?;
                    written.push(path.clone());

                    form.files.push(NewTaskFile {
                        file_path: path.to_string_lossy().into_owned(),
                        file_type: content_type,
                        file_size: Some(bytes.len() as i64),
                    });
                }
                _ => {}
            }
        }
        Ok::<(), HttpError>(())
    }
    .await;

    if let Err(error) = result {
        discard(&written).await;
        return Err(error);
    }

    Ok(form)
}

/// Removes files written for a submission that was not recorded.
pub async fn discard(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!("Could not remove upload {}: {}", path.display(), e);
        }
    }
}

pub fn paths_of(files: &[NewTaskFile]) -> Vec<PathBuf> {
    files.iter().map(|f| PathBuf::from(&f.file_path)).collect()
}

/// Pulls the `file` part of a CSV upload into memory.
pub async fn read_csv(mut multipart: Multipart) -> Result<Vec<u8>, HttpError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::bad_request(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| HttpError::bad_request(e.to_string()))?;

        if bytes.len() > MAX_CSV_SIZE {
            return Err(HttpError::bad_request("CSV file is too large"));
        }
        return Ok(bytes.to_vec());
    }

    Err(HttpError::bad_request("No CSV file uploaded"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_accepts_images_and_videos() {
        let policy = UploadPolicy::evidence().unwrap();
        assert!(policy.accepts("image/jpeg", "shelf.JPG"));
        assert!(policy.accepts("video/mp4", "walkthrough.mp4"));
        assert!(policy.accepts("image/png", "receipt.png"));
    }

    #[test]
    fn test_policy_rejects_other_files() {
        let policy = UploadPolicy::evidence().unwrap();
        assert!(!policy.accepts("application/pdf", "report.pdf"));
        assert!(!policy.accepts("image/jpeg", "script.sh"));
        assert!(!policy.accepts("text/html", "photo.png"));
        assert!(!policy.accepts("image/png", "noextension"));
    }

    #[test]
    fn test_stored_name_keeps_extension() {
        let name = stored_name("Shelf Photo.JPEG");
        assert!(name.ends_with(".jpeg"));
        assert!(!name.contains(' '));
    }
}
