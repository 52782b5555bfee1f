use richfield_core::{
    Editor, EditorConfig, NodeData, UploadError, UploadFile, UploadedImage, Uploader,
};

struct FakeUploader {
    calls: usize,
    result: Result<UploadedImage, String>,
}

impl FakeUploader {
    fn returning(url: &str) -> Self {
        Self {
            calls: 0,
            result: Ok(UploadedImage {
                url: url.to_string(),
                alt: None,
                width: Some(640),
                height: None,
            }),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            calls: 0,
            result: Err(message.to_string()),
        }
    }
}

impl Uploader for FakeUploader {
    fn upload(&mut self, _file: &UploadFile, _alt: &str) -> Result<UploadedImage, UploadError> {
        self.calls += 1;
        self.result.clone().map_err(UploadError::Failed)
    }
}

fn file(content_type: &str) -> UploadFile {
    UploadFile {
        name: "photo.png".to_string(),
        content_type: content_type.to_string(),
        bytes: vec![0x89, b'P', b'N', b'G'],
    }
}

#[test]
fn upload_inserts_returned_image() {
    let mut editor = Editor::new(EditorConfig::default());
    let mut uploader = FakeUploader::returning("/uploads/photo.png");

    let key = editor
        .upload_image(&mut uploader, &file("image/png"), "A photo")
        .unwrap();

    assert_eq!(uploader.calls, 1);
    assert!(matches!(
        editor.doc().data(key),
        Some(NodeData::Image(data)) if data.src == "/uploads/photo.png" && data.alt_text == "A photo"
    ));
    assert!(editor.html().contains("width=\"640\""));
    assert!(editor.can_undo());
}

#[test]
fn non_images_are_refused_before_uploading() {
    let mut editor = Editor::new(EditorConfig::default());
    let mut uploader = FakeUploader::returning("/uploads/a.pdf");

    let err = editor
        .upload_image(&mut uploader, &file("application/pdf"), "")
        .unwrap_err();

    assert!(matches!(err, UploadError::UnsupportedType(ref t) if t == "application/pdf"));
    assert_eq!(uploader.calls, 0);
}

#[test]
fn failed_upload_leaves_document_untouched() {
    let mut editor = Editor::new(EditorConfig::default());
    let mut uploader = FakeUploader::failing("503");

    let err = editor
        .upload_image(&mut uploader, &file("image/jpeg"), "")
        .unwrap_err();

    assert!(matches!(err, UploadError::Failed(ref m) if m == "503"));
    assert_eq!(editor.html(), "<p></p>");
    assert!(!editor.can_undo());
}

#[test]
fn rejected_upload_url_is_reported() {
    let mut editor = Editor::new(EditorConfig::default());
    let mut uploader = FakeUploader::returning("javascript:alert(1)");

    let err = editor
        .upload_image(&mut uploader, &file("image/gif"), "")
        .unwrap_err();

    assert!(matches!(err, UploadError::RejectedUrl(_)));
    assert_eq!(editor.html(), "<p></p>");
}
