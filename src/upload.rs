//! Uploader storing files in a local directory

use crate::form::Form;
use anyhow::{Context, Result};
use semform_core::{FormError, UploadError, UploadResponse, UploadTicket, Uploader};
use semform_types::UploadRequest;
use std::cell::RefCell;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use uuid::Uuid;

type Completed = Vec<(UploadTicket, Result<UploadResponse, UploadError>)>;

/// Finished uploads waiting to be handed back to their form
#[derive(Debug, Clone, Default)]
pub struct UploadCompletions {
    completed: Rc<RefCell<Completed>>,
}

impl UploadCompletions {
    pub fn len(&self) -> usize {
        self.completed.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.borrow().is_empty()
    }

    /// Report every finished upload to `form`, in submission order
    pub fn deliver(&self, form: &mut Form) -> Result<usize, FormError> {
        let completed = std::mem::take(&mut *self.completed.borrow_mut());
        let count = completed.len();
        for (ticket, result) in completed {
            form.finish_upload(ticket, result)?;
        }
        Ok(count)
    }
}

/// Copies uploaded files below `upload_dir`, into `images/` or `files/`
/// under a fresh name.
///
/// Storing happens synchronously inside `submit`; the outcome is queued in
/// [`UploadCompletions`] so the form still sees it arrive after the request.
pub struct DirectoryUploader {
    upload_dir: PathBuf,
    completions: UploadCompletions,
}

impl DirectoryUploader {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            completions: UploadCompletions::default(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Handle on the queue of finished uploads
    pub fn completions(&self) -> UploadCompletions {
        self.completions.clone()
    }

    fn store(&self, request: &UploadRequest) -> Result<UploadResponse, UploadError> {
        let file = &request.file;
        let extension = Path::new(&file.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let mime = file
            .mime
            .clone()
            .or_else(|| mime_guess::from_path(&file.name).first_raw().map(str::to_string))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        if !request.accept.is_empty() && !request.accept.contains(&mime) {
            return Err(UploadError::NotAccepted { mime });
        }

        let folder = if mime.starts_with("image/") {
            "images"
        } else {
            "files"
        };
        let name = if extension.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            format!("{}.{}", Uuid::new_v4(), extension)
        };
        self.write(folder, &name, &file.data)
            .map_err(|e| UploadError::Transport(format!("{:#}", e)))?;

        let size = if folder == "images" {
            image_size(&file.data)
        } else {
            None
        };
        let (width, height) = match size {
            Some((w, h)) => (Some(w), Some(h)),
            None => (None, None),
        };
        log::info!("Stored {} as {}/{}", file.name, folder, name);
        Ok(UploadResponse {
            path: format!("{}/{}", folder, name),
            mime,
            width,
            height,
        })
    }

    fn write(&self, folder: &str, name: &str, data: &[u8]) -> Result<()> {
        let dir = self.upload_dir.join(folder);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join(name);
        std::fs::write(&path, data).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

impl Uploader for DirectoryUploader {
    fn submit(&mut self, ticket: UploadTicket, request: UploadRequest) -> Result<(), UploadError> {
        let result = self.store(&request);
        if let Err(e) = &result {
            log::warn!("Upload of {} failed: {}", request.file.name, e);
        }
        self.completions
            .completed
            .borrow_mut()
            .push((ticket, result));
        Ok(())
    }
}

/// Pixel size of an image in any format the decoder knows
fn image_size(data: &[u8]) -> Option<(u64, u64)> {
    let reader = image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?;
    match reader.into_dimensions() {
        Ok((width, height)) => Some((width.into(), height.into())),
        Err(e) => {
            log::debug!("No image size: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::builtin_registry;
    use semform_core::{FormOptions, Input};
    use semform_types::{parse_semantics, UploadFile};
    use serde_json::json;

    fn encoded(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
        let picture = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut data = Vec::new();
        picture.write_to(&mut Cursor::new(&mut data), format).unwrap();
        data
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        encoded(width, height, image::ImageFormat::Png)
    }

    fn upload_form(semantics: &str) -> (Form, UploadCompletions, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let uploader = DirectoryUploader::new(dir.path());
        let completions = uploader.completions();
        let semantics = parse_semantics(semantics).unwrap();
        let mut form =
            Form::with_registry(semantics, json!({}), builtin_registry(), FormOptions::default())
                .unwrap();
        form.set_uploader(Box::new(uploader));
        (form, completions, dir)
    }

    #[test]
    fn test_image_size() {
        assert_eq!(image_size(&png(800, 600)), Some((800, 600)));
        assert_eq!(
            image_size(&encoded(16, 32, image::ImageFormat::Gif)),
            Some((16, 32))
        );
        assert_eq!(
            image_size(&encoded(40, 30, image::ImageFormat::Jpeg)),
            Some((40, 30))
        );
        assert_eq!(image_size(b"plain"), None);
    }

    #[test]
    fn test_jpeg_upload_sets_coordinate_bounds() {
        let (mut form, completions, _dir) = upload_form(
            r#"[
                {"name": "hotspot", "type": "group", "widget": "coordinates", "max": "image"},
                {"name": "image", "type": "image"}
            ]"#,
        );
        let photo = encoded(40, 30, image::ImageFormat::Jpeg);
        form.input_at("image", Input::Upload(UploadFile::new("cat.jpg", photo)))
            .unwrap();
        completions.deliver(&mut form).unwrap();

        let image = &form.params()["image"];
        assert_eq!(image["mime"], json!("image/jpeg"));
        assert_eq!((image["width"].clone(), image["height"].clone()), (json!(40), json!(30)));

        form.input_at("hotspot", Input::Pair("41".into(), "5".into()))
            .unwrap();
        assert!(!form.validate());
        form.input_at("hotspot", Input::Pair("40".into(), "30".into()))
            .unwrap();
        assert!(form.validate());
    }

    #[test]
    fn test_mime_guessed_from_name() {
        let dir = tempfile::tempdir().unwrap();
        let uploader = DirectoryUploader::new(dir.path());
        let request = UploadRequest {
            field: semform_types::Field::new("clip", "file"),
            content_id: None,
            accept: vec!["audio/wav".to_string(), "audio/x-wav".to_string()],
            file: UploadFile::new("beep.wav", b"RIFF".to_vec()),
        };
        let response = uploader.store(&request).unwrap();
        assert!(response.mime.ends_with("wav"), "{}", response.mime);
        assert!(response.path.starts_with("files/") && response.path.ends_with(".wav"));
        assert_eq!(response.width, None);
    }

    #[test]
    fn test_upload_into_form() {
        let (mut form, completions, dir) = upload_form(r#"[{"name": "image", "type": "image"}]"#);

        form.input_at(
            "image",
            Input::Upload(UploadFile::new("Cat.PNG", png(800, 600))),
        )
        .unwrap();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions.deliver(&mut form).unwrap(), 1);
        assert!(completions.is_empty());

        let image = &form.params()["image"];
        assert_eq!(image["mime"], json!("image/png"));
        assert_eq!(image["width"], json!(800));
        let path = image["path"].as_str().unwrap();
        assert!(path.starts_with("images/") && path.ends_with(".png"));
        assert!(dir.path().join(path).exists());
    }

    #[test]
    fn test_rejects_unaccepted_type() {
        let dir = tempfile::tempdir().unwrap();
        let uploader = DirectoryUploader::new(dir.path());
        let request = UploadRequest {
            field: semform_types::Field::new("doc", "file"),
            content_id: None,
            accept: vec!["application/pdf".to_string()],
            file: UploadFile::new("notes.txt", b"hi".to_vec()),
        };
        assert_eq!(
            uploader.store(&request),
            Err(UploadError::NotAccepted {
                mime: "text/plain".into()
            })
        );
    }
}
