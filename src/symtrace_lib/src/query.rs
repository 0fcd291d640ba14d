//! The query interface (component E): read-only views over a finished
//! [`SymbolicState`], plus the JSON wire types a front end would exchange
//! with a caller. The wire protocol itself (a line-delimited TCP server) is
//! out of scope; this module only provides the pure `answer` function a
//! transport would be built on top of.

use crate::evaluator::SymbolicState;
use crate::prelude::*;
use crate::trace::Message;

/// The one command the core answers: "what happened at this guest IP".
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct WatchIp {
    pub ip: u64,
    /// Maximum number of messages to return; `0` means unlimited.
    #[serde(default)]
    pub limit: usize,
}

/// The response to a [`WatchIp`] query.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
}

/// Answer a [`WatchIp`] query against a finished state.
pub fn answer(state: &SymbolicState, query: WatchIp) -> MessagesResponse {
    let all = state.messages_by_ip(query.ip);
    let messages = if query.limit == 0 || query.limit >= all.len() {
        all.to_vec()
    } else {
        all[..query.limit].to_vec()
    };
    MessagesResponse { messages }
}
