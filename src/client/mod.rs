//! The browser-side half of the chat widget: keeps the local
//! conversation, talks to the relay and rebuilds the reply from the
//! streamed records.

mod conversation;
pub use conversation::{APOLOGY_MESSAGE, ChatState, ClientMessage, Conversation};

mod decoder;
pub use decoder::{StreamDecoder, StreamEvent};

mod session;
pub use session::{ChatClient, ChatUpdate, ClientError, TurnOutcome};
