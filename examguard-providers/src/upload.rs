use crate::request::{Body, HttpRequest, join_url};
use examguard_core::types::{AttemptNumber, CandidateId, RECORDING_MIME_TYPE, artifact_file_name};

pub const UPLOAD_VIDEO_PATH: &str = "/upload-video";

/// The finalized recording of one media session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoArtifact {
    pub candidate_id: CandidateId,
    pub attempt_number: AttemptNumber,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl VideoArtifact {
    /// Concatenates recorded segments in capture order, skipping empty ones.
    pub fn from_chunks(
        candidate_id: CandidateId,
        attempt_number: AttemptNumber,
        chunks: &[Vec<u8>],
    ) -> Self {
        let len = chunks.iter().map(Vec::len).sum();
        let mut bytes = Vec::with_capacity(len);
        for chunk in chunks.iter().filter(|c| !c.is_empty()) {
            bytes.extend_from_slice(chunk);
        }
        Self {
            candidate_id,
            attempt_number,
            mime_type: RECORDING_MIME_TYPE.into(),
            bytes,
        }
    }

    pub fn file_name(&self) -> String {
        artifact_file_name(&self.candidate_id, self.attempt_number)
    }
}

pub fn build_upload_video_request(backend_url: &str, artifact: &VideoArtifact) -> HttpRequest {
    let boundary = format!("Boundary-{}", uuid::Uuid::new_v4());

    let mut body: Vec<u8> = Vec::new();
    append_file(
        &mut body,
        &boundary,
        "video",
        &artifact.file_name(),
        &artifact.mime_type,
        &artifact.bytes,
    );
    append_field(&mut body, &boundary, "candidate_id", artifact.candidate_id.as_str());
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    HttpRequest {
        method: "POST".into(),
        url: join_url(backend_url, UPLOAD_VIDEO_PATH),
        headers: vec![
            (
                "Content-Type".into(),
                format!("multipart/form-data; boundary={}", boundary),
            ),
            ("Accept".into(), "application/json".into()),
        ],
        body: Body::MultipartFormData {
            boundary,
            bytes: body,
        },
    }
}

fn append_field(body: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
    );
    body.extend_from_slice(value.as_bytes());
    body.extend_from_slice(b"\r\n");
}

fn append_file(
    body: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    filename: &str,
    mime_type: &str,
    bytes: &[u8],
) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            name, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> VideoArtifact {
        VideoArtifact::from_chunks(
            CandidateId::new("12"),
            AttemptNumber(2),
            &[b"ab".to_vec(), Vec::new(), b"cd".to_vec()],
        )
    }

    #[test]
    fn joins_non_empty_chunks_in_order() {
        let a = artifact();
        assert_eq!(a.bytes, b"abcd");
        assert_eq!(a.file_name(), "candidate12attempt2.webm");
        assert_eq!(a.mime_type, "video/webm");
    }

    #[test]
    fn builds_multipart_with_video_and_candidate() {
        let req = build_upload_video_request("http://localhost:5000/", &artifact());
        assert_eq!(req.method, "POST");
        assert_eq!(req.url, "http://localhost:5000/upload-video");
        assert!(
            req.header("content-type")
                .is_some_and(|v| v.starts_with("multipart/form-data; boundary=Boundary-"))
        );

        match req.body {
            Body::MultipartFormData { bytes, boundary } => {
                let s = String::from_utf8_lossy(&bytes);
                assert!(s.contains(
                    "name=\"video\"; filename=\"candidate12attempt2.webm\"\r\nContent-Type: video/webm"
                ));
                assert!(s.contains("abcd"));
                assert!(s.contains("name=\"candidate_id\"\r\n\r\n12\r\n"));
                assert!(s.ends_with(&format!("--{}--\r\n", boundary)));
            }
            _ => panic!("expected multipart"),
        }
    }
}
