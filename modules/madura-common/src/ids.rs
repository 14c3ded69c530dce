use uuid::Uuid;

/// Length of a MongoDB ObjectId in hex characters.
pub const OBJECT_ID_LEN: usize = 24;

/// A throwaway ObjectId-shaped identifier for a batch sub-object the backend has
/// not assigned one to yet. Random, not guaranteed unique.
pub fn placeholder_object_id() -> String {
    let mut hex = Uuid::new_v4().simple().to_string();
    hex.truncate(OBJECT_ID_LEN);
    hex
}

pub fn is_object_id(candidate: &str) -> bool {
    candidate.len() == OBJECT_ID_LEN && candidate.chars().all(|c| c.is_ascii_hexdigit())
}
