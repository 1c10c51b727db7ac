//! Saving study notes

mod gate;

pub use gate::{
    PersistenceGate, SaveDecision, SaveOutcome, SaveRequest, DEFAULT_TOPIC_NAME, NOTE_TYPE,
    SKIP_INFO,
};
