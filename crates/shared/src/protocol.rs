use serde::{Deserialize, Serialize};

/// Form-derived payload that starts a remote documentation build.
///
/// Every field is optional: a form field the user left out stays off the wire
/// entirely rather than being sent as an empty string. The payload is built
/// fresh per submission and not retained client-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A build log line paired with the overall completion percentage.
///
/// The server does not guarantee `done_percent` stays within 0..=100 or grows
/// monotonically; consumers clamp it themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressMessage {
    pub data: String,
    pub done_percent: f64,
}

/// Final notification carrying the coordinates of the generated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionMessage {
    pub email: String,
    pub unique_id: String,
}

/// Events the client sends over the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum ClientRequest {
    Execute(SubmissionRequest),
}

/// Events the server pushes over the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum ServerEvent {
    Logs(ProgressMessage),
    ErrLogs(String),
    Success(CompletionMessage),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn execute_event_is_tagged_with_camel_case_payload() {
        let request = ClientRequest::Execute(SubmissionRequest {
            email: Some("a@b.com".into()),
            git_url: Some("u".into()),
            author: Some("x".into()),
            doc_theme: Some("t".into()),
            doc_path: Some("p".into()),
            project_name: Some("n".into()),
            version: Some("1.0".into()),
        });

        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            value,
            json!({
                "event": "execute",
                "payload": {
                    "email": "a@b.com",
                    "gitUrl": "u",
                    "author": "x",
                    "docTheme": "t",
                    "docPath": "p",
                    "projectName": "n",
                    "version": "1.0",
                }
            })
        );
    }

    #[test]
    fn absent_fields_stay_off_the_wire() {
        let request = ClientRequest::Execute(SubmissionRequest {
            git_url: Some("u".into()),
            ..SubmissionRequest::default()
        });

        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            value,
            json!({
                "event": "execute",
                "payload": { "gitUrl": "u" }
            })
        );
    }

    #[test]
    fn parses_logs_event() {
        let event: ServerEvent = serde_json::from_str(
            r#"{"event":"logs","payload":{"data":"building","donePercent":42}}"#,
        )
        .expect("parse");
        assert_eq!(
            event,
            ServerEvent::Logs(ProgressMessage {
                data: "building".into(),
                done_percent: 42.0,
            })
        );
    }

    #[test]
    fn parses_err_logs_event_with_raw_string_payload() {
        let event: ServerEvent =
            serde_json::from_str(r#"{"event":"err-logs","payload":"failed to clone"}"#)
                .expect("parse");
        assert_eq!(event, ServerEvent::ErrLogs("failed to clone".into()));
    }

    #[test]
    fn parses_success_event() {
        let event: ServerEvent = serde_json::from_str(
            r#"{"event":"success","payload":{"email":"a@b.com","uniqueId":"xyz"}}"#,
        )
        .expect("parse");
        assert_eq!(
            event,
            ServerEvent::Success(CompletionMessage {
                email: "a@b.com".into(),
                unique_id: "xyz".into(),
            })
        );
    }
}
