use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::document::extractor::{ensure_supported, extract_text};
use crate::document::info::{InfoExtractor, ResumeInfo};
use crate::errors::AppError;
use crate::models::resume::{NewResume, ResumeRow};
use crate::store::ResumeStore;

/// A freshly stored résumé together with the fields found in its text.
#[derive(Debug, Serialize)]
pub struct UploadedResume {
    #[serde(flatten)]
    pub resume: ResumeRow,
    pub info: ResumeInfo,
}

/// Owns résumé files on disk and their rows in the store.
pub struct ResumeService {
    store: Arc<dyn ResumeStore>,
    upload_dir: PathBuf,
    max_bytes: u64,
    extractor: InfoExtractor,
}

impl ResumeService {
    pub fn new(
        store: Arc<dyn ResumeStore>,
        upload_dir: PathBuf,
        max_bytes: u64,
        extractor: InfoExtractor,
    ) -> Self {
        Self {
            store,
            upload_dir,
            max_bytes,
            extractor,
        }
    }

    /// Validates, stores and extracts an uploaded document.
    /// The file type is checked before anything touches the disk.
    pub async fn upload(
        &self,
        user_id: Uuid,
        file_name: &str,
        data: Bytes,
    ) -> Result<UploadedResume, AppError> {
        let base_name = Path::new(file_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| AppError::Validation("upload has no file name".into()))?;

        ensure_supported(Path::new(&base_name))?;

        if data.is_empty() {
            return Err(AppError::UnsupportedInput("uploaded file is empty".into()));
        }
        if data.len() as u64 > self.max_bytes {
            return Err(AppError::UnsupportedInput(format!(
                "uploaded file is {} bytes, the limit is {} bytes",
                data.len(),
                self.max_bytes
            )));
        }

        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .with_context(|| format!("creating upload dir {}", self.upload_dir.display()))?;

        let stored_path = self
            .upload_dir
            .join(format!("{}_{base_name}", Uuid::new_v4()));
        write_new_file(&stored_path, &data).await?;

        let content = match extract_on_blocking_pool(stored_path.clone()).await {
            Ok(text) => text,
            Err(e) => {
                remove_quietly(&stored_path).await;
                return Err(e);
            }
        };

        let created = self
            .store
            .create_resume(NewResume {
                user_id,
                file_name: base_name,
                file_path: stored_path.to_string_lossy().into_owned(),
                file_size: data.len() as i64,
                content,
            })
            .await;
        let resume = match created {
            Ok(row) => row,
            Err(e) => {
                remove_quietly(&stored_path).await;
                return Err(e);
            }
        };

        info!(
            "Stored resume {} for user {user_id} ({} bytes, {} chars of text)",
            resume.id,
            resume.file_size,
            resume.content.chars().count()
        );

        let info = self.extractor.extract(&resume.content);
        Ok(UploadedResume { resume, info })
    }

    pub async fn get(&self, resume_id: Uuid) -> Result<ResumeRow, AppError> {
        self.store
            .get_resume(resume_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("resume {resume_id} not found")))
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ResumeRow>, AppError> {
        self.store.list_resumes_for_user(user_id).await
    }

    /// Deletes a résumé owned by `user_id`. Someone else's résumé reads as absent.
    pub async fn delete(&self, resume_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let resume = self.get(resume_id).await?;
        if resume.user_id != user_id {
            return Err(AppError::NotFound(format!("resume {resume_id} not found")));
        }

        if !self.store.delete_resume(resume_id).await? {
            return Err(AppError::NotFound(format!("resume {resume_id} not found")));
        }
        remove_quietly(Path::new(&resume.file_path)).await;

        info!("Deleted resume {resume_id} for user {user_id}");
        Ok(())
    }

    pub async fn info(&self, resume_id: Uuid) -> Result<ResumeInfo, AppError> {
        let resume = self.get(resume_id).await?;
        Ok(self.extractor.extract(&resume.content))
    }
}

async fn extract_on_blocking_pool(path: PathBuf) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || extract_text(&path))
        .await
        .context("document extraction task panicked")?
        .map_err(AppError::from)
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Could not remove {}: {e}", path.display());
    }
}

/// Stored documents are never overwritten: an existing path is an error
/// and is left untouched. A partial write removes only the file it created.
async fn write_new_file(path: &Path, data: &[u8]) -> Result<(), AppError> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .with_context(|| format!("creating {}", path.display()))?;

    let written = async {
        file.write_all(data).await?;
        file.flush().await
    }
    .await;
    if let Err(e) = written {
        drop(file);
        remove_quietly(path).await;
        return Err(anyhow::Error::new(e)
            .context(format!("writing {}", path.display()))
            .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::document::extractor::tests::{docx_bytes, document};
    use crate::store::memory::MemoryStore;

    fn service(dir: &TempDir, max_bytes: u64) -> (Arc<MemoryStore>, ResumeService) {
        let store = Arc::new(MemoryStore::new());
        let service = ResumeService::new(
            store.clone(),
            dir.path().join("uploads"),
            max_bytes,
            InfoExtractor::default(),
        );
        (store, service)
    }

    fn upload_body(paragraphs: &[&[&str]]) -> Bytes {
        Bytes::from(docx_bytes(document(paragraphs)))
    }

    fn stored_files(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path().join("uploads"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_upload_stores_file_and_extracts_fields() {
        let dir = TempDir::new().unwrap();
        let (_, service) = service(&dir, 1024 * 1024);
        let data = upload_body(&[&["张三"], &["邮箱:zhang@x.com"], &["教育经历"], &["北京大学"]]);
        let user_id = Uuid::new_v4();

        let uploaded = service
            .upload(user_id, "../../etc/简历.docx", data.clone())
            .await
            .unwrap();

        assert_eq!(uploaded.resume.file_name, "简历.docx");
        assert_eq!(uploaded.resume.file_size, data.len() as i64);
        assert!(uploaded.resume.file_path.ends_with("_简历.docx"));
        assert!(Path::new(&uploaded.resume.file_path).starts_with(dir.path().join("uploads")));
        assert!(Path::new(&uploaded.resume.file_path).exists());
        assert_eq!(uploaded.info.name.as_deref(), Some("张三"));
        assert_eq!(uploaded.info.email.as_deref(), Some("zhang@x.com"));
        assert_eq!(uploaded.info.education(), Some("教育经历\n北京大学\n"));

        let listed = service.list_for_user(user_id).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_rejected_before_writing() {
        let dir = TempDir::new().unwrap();
        let (_, service) = service(&dir, 1024);

        let err = service
            .upload(Uuid::new_v4(), "cv.pdf", Bytes::from_static(b"%PDF-1.7"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedInput(_)));
        assert_eq!(stored_files(&dir), 0);
    }

    #[tokio::test]
    async fn test_empty_and_oversized_uploads_are_rejected() {
        let dir = TempDir::new().unwrap();
        let (_, service) = service(&dir, 8);

        let empty = service
            .upload(Uuid::new_v4(), "cv.docx", Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(empty, AppError::UnsupportedInput(_)));

        let large = service
            .upload(Uuid::new_v4(), "cv.docx", Bytes::from(vec![0u8; 9]))
            .await
            .unwrap_err();
        assert!(matches!(large, AppError::UnsupportedInput(_)));
        assert_eq!(stored_files(&dir), 0);
    }

    #[tokio::test]
    async fn test_unparseable_document_is_removed() {
        let dir = TempDir::new().unwrap();
        let (store, service) = service(&dir, 1024);

        let err = service
            .upload(Uuid::new_v4(), "cv.doc", Bytes::from_static(b"not a zip archive"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ParseFailure(_)));
        assert_eq!(stored_files(&dir), 0);
        assert!(store.list_resumes_for_user(Uuid::nil()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_requires_owner_and_removes_file() {
        let dir = TempDir::new().unwrap();
        let (_, service) = service(&dir, 1024 * 1024);
        let owner = Uuid::new_v4();
        let data = upload_body(&[&["Rust engineer"]]);
        let uploaded = service.upload(owner, "cv.docx", data).await.unwrap();
        let id = uploaded.resume.id;

        let err = service.delete(id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(service.get(id).await.is_ok());

        service.delete(id, owner).await.unwrap();
        assert!(matches!(service.get(id).await, Err(AppError::NotFound(_))));
        assert!(!Path::new(&uploaded.resume.file_path).exists());
    }

    #[tokio::test]
    async fn test_same_file_name_uploads_get_separate_files() {
        let dir = TempDir::new().unwrap();
        let (_, service) = service(&dir, 1024 * 1024);
        let (user_a, user_b) = (Uuid::new_v4(), Uuid::new_v4());

        let (a, b) = tokio::join!(
            service.upload(user_a, "resume.docx", upload_body(&[&["user A"]])),
            service.upload(user_b, "resume.docx", upload_body(&[&["user B"]])),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.resume.file_path, b.resume.file_path);
        assert_eq!(stored_files(&dir), 2);
        assert_eq!(a.resume.content, "user A\n");
        assert_eq!(
            extract_text(Path::new(&a.resume.file_path)).unwrap(),
            "user A\n"
        );

        service.delete(b.resume.id, user_b).await.unwrap();
        assert!(Path::new(&a.resume.file_path).exists());
        assert!(!Path::new(&b.resume.file_path).exists());
        assert_eq!(
            extract_text(Path::new(&a.resume.file_path)).unwrap(),
            "user A\n"
        );
    }

    #[tokio::test]
    async fn test_existing_stored_file_is_never_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("taken.docx");
        std::fs::write(&path, b"original").unwrap();

        let err = write_new_file(&path, b"replacement").await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(std::fs::read(&path).unwrap(), b"original");
    }

    #[tokio::test]
    async fn test_info_for_missing_resume_is_not_found() {
        let dir = TempDir::new().unwrap();
        let (_, service) = service(&dir, 1024);
        assert!(matches!(
            service.info(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
