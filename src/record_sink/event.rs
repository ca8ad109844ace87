use super::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Share(ShareRecord),
    BlockFound(FoundBlock),
}

impl Event {
    pub fn created_at(&self) -> u64 {
        match self {
            Event::Share(share) => share.created_at,
            Event::BlockFound(block) => block.created_at,
        }
    }
}
