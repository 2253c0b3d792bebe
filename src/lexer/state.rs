/// Where the scanner is in the hierarchy.
///
/// The open object and attribute names live in the variants, so an attribute
/// can only be open while its object is.
#[derive(Debug, Clone, PartialEq, Eq, strum::AsRefStr)]
pub enum LexState {
    /// Looking for the process start marker.
    Prelude,
    /// Process open, no object open.
    Idle,
    InObject {
        object: String,
    },
    InAttribute {
        object: String,
        attribute: String,
    },
    /// Process closed; nothing more is scanned.
    Finished,
}

impl LexState {
    pub fn open_object(&self) -> Option<&str> {
        match self {
            LexState::InObject { object } | LexState::InAttribute { object, .. } => Some(object),
            LexState::Prelude | LexState::Idle | LexState::Finished => None,
        }
    }

    pub fn open_attribute(&self) -> Option<&str> {
        match self {
            LexState::InAttribute { attribute, .. } => Some(attribute),
            LexState::Prelude | LexState::Idle | LexState::InObject { .. } | LexState::Finished => {
                None
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, LexState::Finished)
    }
}
