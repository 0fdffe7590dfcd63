//! JSON tool dispatcher.
//!
//! A request is `{"tool": "...", "arguments": {...}}`. Every reply is a
//! [`Response`]; failures become `{"ok": false, "error": {kind, message}}`
//! and never escape as a raw error.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{GtdError, Result};
use crate::model::mailbox::Folder;
use crate::service::{MailboxService, SendRequest};
use crate::workflow::{Clarification, Outcome};

/// Tool names accepted by [`Dispatcher::handle`].
pub const TOOLS: [&str; 12] = [
    "list-mailboxes",
    "collect-inbox",
    "get-folder",
    "read-message",
    "clarify-item",
    "organize-to-reference",
    "organize-item",
    "move-message",
    "send-message",
    "collect-team-inbox",
    "archive-team-item",
    "search-mailbox",
];

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub tool: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

impl Response {
    pub fn success(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(err: &GtdError) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(ErrorPayload {
                kind: err.kind().to_string(),
                message: err.to_string(),
            }),
        }
    }
}

#[derive(Deserialize)]
struct MailboxArgs {
    mailbox: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct FolderArgs {
    mailbox: String,
    folder: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct MessageArgs {
    mailbox: String,
    filename: String,
}

#[derive(Deserialize)]
struct ClarifyArgs {
    mailbox: String,
    filename: String,
    clarification: Clarification,
}

#[derive(Deserialize)]
struct OrganizeArgs {
    mailbox: String,
    filename: String,
    outcome: String,
}

#[derive(Deserialize)]
struct MoveArgs {
    mailbox: String,
    filename: String,
    folder: String,
}

#[derive(Deserialize)]
struct OwnerArgs {
    owner: String,
}

#[derive(Deserialize)]
struct ArchiveArgs {
    owner: String,
    item: String,
}

#[derive(Deserialize)]
struct SearchArgs {
    mailbox: String,
    pattern: String,
}

/// Routes tool requests to a [`MailboxService`].
#[derive(Clone)]
pub struct Dispatcher {
    service: MailboxService,
}

impl Dispatcher {
    pub fn new(service: MailboxService) -> Self {
        Self { service }
    }

    pub async fn handle(&self, request: Request) -> Response {
        debug!(tool = %request.tool, "Dispatching");
        match self.run(&request.tool, request.arguments).await {
            Ok(data) => Response::success(data),
            Err(e) => {
                warn!(tool = %request.tool, kind = e.kind(), error = %e, "Tool failed");
                Response::failure(&e)
            }
        }
    }

    /// Handle one line of JSON and return one line of JSON (no trailing newline).
    pub async fn handle_line(&self, line: &str) -> String {
        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request).await,
            Err(e) => Response::failure(&GtdError::InvalidArgument(format!(
                "malformed request: {e}"
            ))),
        };
        serde_json::to_string(&response).unwrap_or_else(|e| {
            format!(
                r#"{{"ok":false,"error":{{"kind":"EncodingError","message":"{}"}}}}"#,
                e.to_string().replace('"', "'")
            )
        })
    }

    async fn run(&self, tool: &str, arguments: Value) -> Result<Value> {
        let service = &self.service;
        match tool {
            "list-mailboxes" => to_data(service.list_mailboxes().await),
            "collect-inbox" => {
                let args: MailboxArgs = parse_args(arguments)?;
                to_data(service.get_inbox(&args.mailbox, args.limit).await?)
            }
            "get-folder" => {
                let args: FolderArgs = parse_args(arguments)?;
                let folder = parse_folder(&args.folder)?;
                to_data(service.get_folder(&args.mailbox, folder, args.limit).await?)
            }
            "read-message" => {
                let args: MessageArgs = parse_args(arguments)?;
                to_data(service.read_message(&args.mailbox, &args.filename).await?)
            }
            "clarify-item" => {
                let args: ClarifyArgs = parse_args(arguments)?;
                to_data(
                    service
                        .clarify_item(&args.mailbox, &args.filename, args.clarification)
                        .await?,
                )
            }
            "organize-to-reference" => {
                let args: MessageArgs = parse_args(arguments)?;
                to_data(
                    service
                        .organize_to_reference(&args.mailbox, &args.filename)
                        .await?,
                )
            }
            "organize-item" => {
                let args: OrganizeArgs = parse_args(arguments)?;
                let outcome: Outcome = args.outcome.parse().map_err(GtdError::InvalidArgument)?;
                to_data(
                    service
                        .organize_item(&args.mailbox, &args.filename, outcome)
                        .await?,
                )
            }
            "move-message" => {
                let args: MoveArgs = parse_args(arguments)?;
                let folder = parse_folder(&args.folder)?;
                to_data(
                    service
                        .move_to_folder(&args.mailbox, &args.filename, folder)
                        .await?,
                )
            }
            "send-message" => {
                let request: SendRequest = parse_args(arguments)?;
                to_data(service.send_message(request).await?)
            }
            "collect-team-inbox" => {
                let args: OwnerArgs = parse_args(arguments)?;
                to_data(service.collect_team_inbox(&args.owner).await?)
            }
            "archive-team-item" => {
                let args: ArchiveArgs = parse_args(arguments)?;
                to_data(service.archive_team_item(&args.owner, &args.item).await?)
            }
            "search-mailbox" => {
                let args: SearchArgs = parse_args(arguments)?;
                to_data(service.search_mailbox(&args.mailbox, &args.pattern).await?)
            }
            other => Err(GtdError::InvalidArgument(format!(
                "unknown tool '{other}' (expected one of: {})",
                TOOLS.join(", ")
            ))),
        }
    }
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(arguments)
        .map_err(|e| GtdError::InvalidArgument(format!("bad arguments: {e}")))
}

fn parse_folder(name: &str) -> Result<Folder> {
    name.parse().map_err(GtdError::InvalidArgument)
}

fn to_data<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| GtdError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::store::{MemoryStorage, Storage};

    async fn dispatcher() -> Dispatcher {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .write(
                "People/kevin@swoft.ai/new/1700000000.1.h_2,.eml",
                "Subject: Test\nFrom: a@b.com\n\nhello\n",
            )
            .await
            .unwrap();
        Dispatcher::new(MailboxService::new(storage).with_host("h"))
    }

    async fn call(d: &Dispatcher, request: Value) -> Response {
        let line = d.handle_line(&request.to_string()).await;
        serde_json::from_str(&line).unwrap()
    }

    #[tokio::test]
    async fn test_list_mailboxes_without_arguments() {
        let d = dispatcher().await;
        let resp = call(&d, json!({"tool": "list-mailboxes"})).await;
        assert!(resp.ok);
        let data = resp.data.unwrap();
        assert_eq!(data["mailboxes"][0]["address"], "kevin@swoft.ai");
        assert_eq!(data["mailboxes"][0]["kind"], "human");
    }

    #[tokio::test]
    async fn test_collect_inbox() {
        let d = dispatcher().await;
        let resp = call(
            &d,
            json!({"tool": "collect-inbox", "arguments": {"mailbox": "kevin@swoft.ai", "limit": 5}}),
        )
        .await;
        assert!(resp.ok);
        assert_eq!(resp.data.unwrap()[0]["subject"], "Test");
    }

    #[tokio::test]
    async fn test_read_message_missing_is_null() {
        let d = dispatcher().await;
        let request = json!({"tool": "read-message", "arguments": {"mailbox": "kevin@swoft.ai", "filename": "nope.eml"}});
        let line = d.handle_line(&request.to_string()).await;
        let raw: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(raw["ok"], true);
        assert!(raw["data"].is_null());
    }

    #[tokio::test]
    async fn test_clarify_item() {
        let d = dispatcher().await;
        let resp = call(
            &d,
            json!({"tool": "clarify-item", "arguments": {
                "mailbox": "kevin@swoft.ai",
                "filename": "1700000000.1.h_2,.eml",
                "clarification": {"what_is_it": "bug", "is_actionable": true, "outcome": "next_action"}
            }}),
        )
        .await;
        assert!(resp.ok, "{resp:?}");
        let data = resp.data.unwrap();
        assert!(data["recommended_action"]
            .as_str()
            .unwrap()
            .contains("Next Actions"));
        assert_eq!(data["event"]["type"], "InboxItemClarified");
    }

    #[tokio::test]
    async fn test_send_then_organize_to_reference() {
        let d = dispatcher().await;
        let sent = call(
            &d,
            json!({"tool": "send-message", "arguments": {
                "from": "x@swoft.ai", "to": "kevin@swoft.ai", "subject": "Hi", "body": "Body"
            }}),
        )
        .await;
        assert!(sent.ok, "{sent:?}");
        let filename = sent.data.unwrap()["filename"].as_str().unwrap().to_string();

        let moved = call(
            &d,
            json!({"tool": "organize-to-reference", "arguments": {"mailbox": "kevin@swoft.ai", "filename": filename}}),
        )
        .await;
        assert!(moved.ok);
        assert_eq!(moved.data.unwrap()["success"], true);
    }

    #[tokio::test]
    async fn test_unknown_mailbox_is_structured_error() {
        let d = dispatcher().await;
        let resp = call(
            &d,
            json!({"tool": "collect-inbox", "arguments": {"mailbox": "ghost@swoft.ai"}}),
        )
        .await;
        assert!(!resp.ok);
        let error = resp.error.unwrap();
        assert_eq!(error.kind, "MailboxNotFoundError");
        assert!(error.message.contains("ghost@swoft.ai"));
    }

    #[tokio::test]
    async fn test_bad_requests() {
        let d = dispatcher().await;
        let resp = call(&d, json!({"tool": "format-disk"})).await;
        assert_eq!(resp.error.unwrap().kind, "InvalidArgumentError");

        let resp = call(&d, json!({"tool": "get-folder", "arguments": {"mailbox": "kevin@swoft.ai"}})).await;
        assert_eq!(resp.error.unwrap().kind, "InvalidArgumentError");

        let line = d.handle_line("not json").await;
        let resp: Response = serde_json::from_str(&line).unwrap();
        assert!(!resp.ok);
    }
}
