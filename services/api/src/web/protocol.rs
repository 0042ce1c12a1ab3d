//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol for live snapshots. The server only
//! pushes; client frames other than Close are ignored.

use serde::Serialize;
use uuid::Uuid;

use crate::web::rest::{EmployeeResponse, NoteResponse};

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Each snapshot carries the full current result set, not a diff.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The caller's employees, in creation order.
    Employees { employees: Vec<EmployeeResponse> },

    /// One employee's notes, newest first.
    Notes {
        employee_id: Uuid,
        notes: Vec<NoteResponse>,
    },

    /// The subscription failed; the server closes the socket after sending this.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_tagged_by_type() {
        let json = serde_json::to_value(ServerMessage::Error {
            message: "boom".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "boom");

        let json = serde_json::to_value(ServerMessage::Employees { employees: vec![] }).unwrap();
        assert_eq!(json["type"], "employees");
        assert!(json["employees"].as_array().unwrap().is_empty());
    }
}
