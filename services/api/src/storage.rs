//! Image uploads to S3

use aws_sdk_s3::{Client, primitives::ByteStream};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::ApiError;

/// Largest accepted image, in bytes
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    /// Prefix of the public URL an object is served from
    pub public_base_url: String,
}

impl StorageConfig {
    /// Create a new StorageConfig from environment variables
    ///
    /// # Environment Variables
    /// - `MEDIA_BUCKET_NAME`: Bucket receiving uploads (default: "swachhata-media")
    /// - `MEDIA_PUBLIC_BASE_URL`: Public URL prefix (default: "https://<bucket>.s3.amazonaws.com")
    pub fn from_env() -> Self {
        let bucket =
            std::env::var("MEDIA_BUCKET_NAME").unwrap_or_else(|_| "swachhata-media".to_string());
        let public_base_url = std::env::var("MEDIA_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("https://{}.s3.amazonaws.com", bucket));

        StorageConfig {
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Where an upload is filed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFolder {
    ComplaintImages,
    EmployeePhotos,
}

impl UploadFolder {
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "complaint-images" => Some(UploadFolder::ComplaintImages),
            "employee-photos" => Some(UploadFolder::EmployeePhotos),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadFolder::ComplaintImages => "complaint-images",
            UploadFolder::EmployeePhotos => "employee-photos",
        }
    }
}

/// Reject anything that is not an image or is over [`MAX_IMAGE_BYTES`]
pub fn validate_image(content_type: Option<&str>, size: usize) -> Result<(), ApiError> {
    let is_image = content_type.is_some_and(|ct| ct.starts_with("image/"));
    if !is_image {
        return Err(ApiError::Validation("Please upload an image file".to_string()));
    }
    if size == 0 {
        return Err(ApiError::Validation("The uploaded file is empty".to_string()));
    }
    if size > MAX_IMAGE_BYTES {
        return Err(ApiError::Validation(
            "Image must be smaller than 5MB".to_string(),
        ));
    }
    Ok(())
}

/// File extension for an image MIME type
fn extension(content_type: &str) -> &str {
    let subtype = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .trim_start_matches("image/");
    match subtype {
        "jpeg" | "pjpeg" => "jpg",
        "svg+xml" => "svg",
        other => other.split('+').next().unwrap_or(other),
    }
}

/// `{folder}/{user_id}/{unix_millis}.{ext}`
pub fn object_key(
    folder: UploadFolder,
    user_id: Uuid,
    unix_millis: i64,
    content_type: &str,
) -> String {
    format!(
        "{}/{}/{}.{}",
        folder.as_str(),
        user_id,
        unix_millis,
        extension(content_type)
    )
}

/// Uploads images and hands back their public URL
#[derive(Clone)]
pub struct ImageStorage {
    s3_client: Client,
    config: StorageConfig,
}

impl ImageStorage {
    pub fn new(s3_client: Client, config: StorageConfig) -> Self {
        Self { s3_client, config }
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.config.public_base_url, key)
    }

    /// Validate and store an image, returning its public URL
    pub async fn upload(
        &self,
        folder: UploadFolder,
        user_id: Uuid,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<String, ApiError> {
        validate_image(content_type, bytes.len())?;
        let content_type = content_type.unwrap_or("image/jpeg");

        let key = object_key(
            folder,
            user_id,
            chrono::Utc::now().timestamp_millis(),
            content_type,
        );
        info!("Uploading {} bytes to S3: {}", bytes.len(), key);

        self.s3_client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to upload {}: {}", key, e);
                ApiError::Storage("please try again later".to_string())
            })?;

        Ok(self.public_url(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_images_within_limit_are_accepted() {
        assert!(validate_image(Some("image/png"), 1024).is_ok());
        assert!(validate_image(Some("image/jpeg"), MAX_IMAGE_BYTES).is_ok());
        assert!(validate_image(Some("image/jpeg"), MAX_IMAGE_BYTES + 1).is_err());
        assert!(validate_image(Some("application/pdf"), 1024).is_err());
        assert!(validate_image(None, 1024).is_err());
        assert!(validate_image(Some("image/png"), 0).is_err());
    }

    #[test]
    fn test_object_key_layout() {
        let user_id = Uuid::nil();
        assert_eq!(
            object_key(UploadFolder::ComplaintImages, user_id, 1700000000000, "image/jpeg"),
            "complaint-images/00000000-0000-0000-0000-000000000000/1700000000000.jpg"
        );
        assert_eq!(
            object_key(UploadFolder::EmployeePhotos, user_id, 1, "image/svg+xml"),
            "employee-photos/00000000-0000-0000-0000-000000000000/1.svg"
        );
        assert_eq!(extension("image/webp; charset=binary"), "webp");
    }

    #[test]
    fn test_folder_paths() {
        assert_eq!(
            UploadFolder::from_path("employee-photos"),
            Some(UploadFolder::EmployeePhotos)
        );
        assert_eq!(UploadFolder::from_path("avatars"), None);
    }

    #[test]
    #[serial_test::serial]
    fn test_config_defaults_follow_bucket() {
        unsafe {
            std::env::remove_var("MEDIA_PUBLIC_BASE_URL");
            std::env::set_var("MEDIA_BUCKET_NAME", "nagpur-uploads");
        }
        let config = StorageConfig::from_env();
        assert_eq!(config.public_base_url, "https://nagpur-uploads.s3.amazonaws.com");

        unsafe { std::env::set_var("MEDIA_PUBLIC_BASE_URL", "https://cdn.example.com/") };
        assert_eq!(StorageConfig::from_env().public_base_url, "https://cdn.example.com");

        unsafe {
            std::env::remove_var("MEDIA_BUCKET_NAME");
            std::env::remove_var("MEDIA_PUBLIC_BASE_URL");
        }
    }
}
