use crate::request::{Body, HttpRequest, join_url};
use examguard_core::tab_switch::TabSwitchReport;
use serde_json::json;

pub const TAB_SWITCH_PATH: &str = "/tab-switch";

pub fn build_tab_switch_request(backend_url: &str, report: &TabSwitchReport) -> HttpRequest {
    let payload = json!({
        "count": report.count,
        "timestamp": report.timestamp,
    });

    HttpRequest {
        method: "POST".into(),
        url: join_url(backend_url, TAB_SWITCH_PATH),
        headers: vec![("Content-Type".into(), "application/json".into())],
        body: Body::Json(payload.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_json_report() {
        let report = TabSwitchReport {
            count: 3,
            timestamp: "2024-05-01T10:00:00.000Z".into(),
        };
        let req = build_tab_switch_request("http://localhost:5000", &report);

        assert_eq!(req.method, "POST");
        assert_eq!(req.url, "http://localhost:5000/tab-switch");
        assert_eq!(req.header("content-type"), Some("application/json"));
        match req.body {
            Body::Json(s) => {
                let v: serde_json::Value = serde_json::from_str(&s).unwrap();
                assert_eq!(v["count"], 3);
                assert_eq!(v["timestamp"], "2024-05-01T10:00:00.000Z");
            }
            _ => panic!("expected json"),
        }
    }
}
