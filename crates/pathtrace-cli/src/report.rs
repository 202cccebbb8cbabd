use crate::app::TraceInfo;

pub mod csv;
pub mod json;
pub mod stream;
pub mod table;
mod types;

const UNINTERPRETABLE: &str = "the tool output could not be interpreted";

/// A note for traces whose tool output no parser understood.
///
/// Such traces have no hops but, unlike a trace which found none, they say
/// nothing about the path.
fn uninterpretable_note(info: &TraceInfo) -> Option<&'static str> {
    info.result.is_uninterpretable().then_some(UNINTERPRETABLE)
}
