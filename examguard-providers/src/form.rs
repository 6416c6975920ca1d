use crate::request::{Body, HttpRequest, join_url};
use examguard_core::submission::SubmissionPayload;

/// The browser-equivalent native form post: `application/x-www-form-urlencoded`.
pub fn build_form_submission_request(
    backend_url: &str,
    form_action: &str,
    payload: &SubmissionPayload,
) -> HttpRequest {
    let mut encoder = url::form_urlencoded::Serializer::new(String::new());
    for (name, value) in payload.fields() {
        encoder.append_pair(&name, &value);
    }

    HttpRequest {
        method: "POST".into(),
        url: join_url(backend_url, form_action),
        headers: vec![(
            "Content-Type".into(),
            "application/x-www-form-urlencoded".into(),
        )],
        body: Body::FormUrlEncoded(encoder.finish()),
    }
}
