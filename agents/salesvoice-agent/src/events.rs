use serde::Deserialize;

/// Transport-agnostic room events. The realtime voice platform (STT, VAD,
/// turn detection) lives outside this process boundary; whatever bridge
/// drives the worker only has to produce these.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    /// A finalized transcript fragment for one turn of speech.
    FinalTranscript { speaker: String, text: String },
    /// A participant left the room.
    ParticipantDisconnected { identity: String },
    /// The hosting infrastructure is shutting this worker down.
    Shutdown,
}

/// Recovers the participant's user id from a decorated room name
/// (`{room}-user-{id}`, as issued by the token endpoint).
pub fn participant_id_from_room(room_name: &str) -> Option<&str> {
    room_name
        .rfind("-user-")
        .map(|idx| &room_name[idx + "-user-".len()..])
        .filter(|id| !id.is_empty())
}
