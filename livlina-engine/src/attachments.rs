//! Photo checks applied before attachments reach the intake machine.

use livlina_config::IntakeConfig;
use livlina_core::report::Attachment;

use crate::ServiceError;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Sniffs the format from the leading bytes; the file name is ignored.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(JPEG_MAGIC) {
            Some(ImageFormat::Jpeg)
        } else if data.starts_with(PNG_MAGIC) {
            Some(ImageFormat::Png)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentPolicy {
    pub max_count: usize,
    pub max_bytes: usize,
}

impl AttachmentPolicy {
    pub fn from_config(config: &IntakeConfig) -> Self {
        Self {
            max_count: config.max_attachments,
            max_bytes: config.max_attachment_bytes,
        }
    }

    pub fn check(&self, attachments: &[Attachment]) -> Result<(), ServiceError> {
        if attachments.len() > self.max_count {
            return Err(ServiceError::Attachment(format!(
                "at most {} photos can be sent, got {}",
                self.max_count,
                attachments.len()
            )));
        }
        for attachment in attachments {
            if attachment.is_empty() {
                return Err(ServiceError::Attachment(format!(
                    "{} is empty",
                    attachment.file_name
                )));
            }
            if attachment.len() > self.max_bytes {
                return Err(ServiceError::Attachment(format!(
                    "{} is larger than {} bytes",
                    attachment.file_name, self.max_bytes
                )));
            }
            if ImageFormat::detect(&attachment.data).is_none() {
                return Err(ServiceError::Attachment(format!(
                    "{} is not a JPEG or PNG image",
                    attachment.file_name
                )));
            }
        }
        Ok(())
    }
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self::from_config(&IntakeConfig::default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn jpeg(name: &str, len: usize) -> Attachment {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
        data.resize(len.max(data.len()), 0);
        Attachment::new(name, data)
    }

    #[test]
    fn detects_formats_by_magic_bytes() {
        assert_eq!(ImageFormat::detect(&[0xFF, 0xD8, 0xFF, 0xDB]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::detect(PNG_MAGIC), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::detect(b"GIF89a"), None);
        assert_eq!(ImageFormat::detect(&[]), None);
    }

    #[test]
    fn accepts_images_within_limits() {
        let policy = AttachmentPolicy {
            max_count: 2,
            max_bytes: 64,
        };
        let mut png = PNG_MAGIC.to_vec();
        png.extend_from_slice(&[0; 8]);
        let photos = vec![jpeg("a.jpg", 32), Attachment::new("b.png", png)];
        assert!(policy.check(&photos).is_ok());
        assert!(policy.check(&[]).is_ok());
    }

    #[test]
    fn rejects_violations() {
        let policy = AttachmentPolicy {
            max_count: 1,
            max_bytes: 16,
        };
        let too_many = vec![jpeg("a.jpg", 8), jpeg("b.jpg", 8)];
        assert!(matches!(policy.check(&too_many), Err(ServiceError::Attachment(_))));

        let too_big = vec![jpeg("big.jpg", 17)];
        assert!(matches!(policy.check(&too_big), Err(ServiceError::Attachment(_))));

        let not_image = vec![Attachment::new("notes.txt", b"hello".to_vec())];
        let err = policy.check(&not_image).unwrap_err();
        assert!(err.to_string().contains("notes.txt"));
    }
}
