use anyhow::anyhow;
use reqwest::StatusCode;

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub(crate) error: ApiErrorBody,
}

// The API answers either {"error": "text"} or {"error": {"message": ...}}.
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
pub(crate) enum ApiErrorBody {
    Text(String),
    Detailed {
        #[serde(default)]
        message: Option<String>,
        #[serde(default, rename = "type")]
        kind: Option<String>,
        #[serde(default)]
        hint: Option<String>,
    },
}

impl ApiErrorBody {
    fn message(&self) -> &str {
        match self {
            ApiErrorBody::Text(s) => s,
            ApiErrorBody::Detailed { message, .. } => message.as_deref().unwrap_or(""),
        }
    }

    fn kind(&self) -> &str {
        match self {
            ApiErrorBody::Text(_) => "",
            ApiErrorBody::Detailed { kind, .. } => kind.as_deref().unwrap_or(""),
        }
    }

    fn hint(&self) -> &str {
        match self {
            ApiErrorBody::Text(_) => "",
            ApiErrorBody::Detailed { hint, .. } => hint.as_deref().unwrap_or(""),
        }
    }
}

/// Turns an error payload into a message that says what to do next.
///
/// `resource` names what was being looked up, e.g. `project maya-glyphs/yax-w4l6k`.
pub(crate) fn format_api_error(
    status: StatusCode,
    resource: &str,
    e: &ApiErrorResponse,
) -> anyhow::Error {
    let message = e.error.message();
    let kind = e.error.kind();
    let hint = e.error.hint();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return anyhow!(
            "Roboflow authentication/authorization failed (HTTP {}).\n- Check that ROBOFLOW_API_KEY holds the private API key from your workspace settings\n- Public projects of other workspaces are readable with any valid key\n\nServer message: {}\nkind: {}\n{}",
            status.as_u16(),
            message,
            kind,
            hint
        );
    }

    if status == StatusCode::NOT_FOUND {
        return anyhow!(
            "Roboflow could not find {} (HTTP 404).\n- Identifiers are the URL slugs shown on app.roboflow.com, not display names\n\nServer message: {}\n{}",
            resource,
            message,
            hint
        );
    }

    anyhow!(
        "API request failed: HTTP {} for {}\n{}\n{}",
        status.as_u16(),
        resource,
        message,
        hint
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_error_shapes() {
        let text: ApiErrorResponse = serde_json::from_str(r#"{"error":"nope"}"#).unwrap();
        assert_eq!(text.error.message(), "nope");

        let detailed: ApiErrorResponse = serde_json::from_str(
            r#"{"error":{"message":"Unsupported request","type":"GraphMethodException","hint":"check the id"}}"#,
        )
        .unwrap();
        assert_eq!(detailed.error.message(), "Unsupported request");
        assert_eq!(detailed.error.kind(), "GraphMethodException");
        assert_eq!(detailed.error.hint(), "check the id");
    }

    #[test]
    fn unauthorized_mentions_the_env_var() {
        let e: ApiErrorResponse = serde_json::from_str(r#"{"error":"bad key"}"#).unwrap();
        let msg = format_api_error(StatusCode::UNAUTHORIZED, "workspace x", &e).to_string();
        assert!(msg.contains("HTTP 401"));
        assert!(msg.contains("ROBOFLOW_API_KEY"));
        assert!(msg.contains("bad key"));
    }

    #[test]
    fn not_found_names_the_resource() {
        let e: ApiErrorResponse =
            serde_json::from_str(r#"{"error":{"message":"missing"}}"#).unwrap();
        let msg = format_api_error(StatusCode::NOT_FOUND, "version ws/p/9", &e).to_string();
        assert!(msg.contains("version ws/p/9"));
        assert!(msg.contains("HTTP 404"));
    }

    #[test]
    fn other_statuses_fall_through() {
        let e: ApiErrorResponse = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        let msg =
            format_api_error(StatusCode::BAD_REQUEST, "export ws/p/1/coco", &e).to_string();
        assert!(msg.starts_with("API request failed: HTTP 400"));
        assert!(msg.contains("boom"));
    }
}
