use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct UploadVideoResponse {
    pub message: String,
}

pub fn parse_upload_response(body: &[u8]) -> anyhow::Result<String> {
    let resp: UploadVideoResponse =
        serde_json::from_slice(body).context("decode upload-video JSON")?;
    Ok(resp.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_message() {
        let body = br#"{"message":"Video uploaded to S3"}"#;
        assert_eq!(parse_upload_response(body).unwrap(), "Video uploaded to S3");
    }

    #[test]
    fn missing_message_errors() {
        assert!(parse_upload_response(br#"{"ok":true}"#).is_err());
        assert!(parse_upload_response(b"<html>").is_err());
    }
}
