//! In-memory record of subscribed instance inboxes.
//!
//! Persistent storage of actors and instances lives outside the
//! dispatch core; this registry is the minimal collaborator the inbox
//! handler needs to know where to fan a message out to.

use parking_lot::RwLock;
use url::Url;

#[derive(Debug, Default)]
pub struct InstanceRegistry {
    inboxes: RwLock<Vec<Url>>,
}

impl InstanceRegistry {
    /// Returns false when the inbox was already registered.
    pub fn add(&self, inbox: Url) -> bool {
        let mut inboxes = self.inboxes.write();
        if inboxes.contains(&inbox) {
            return false;
        }
        inboxes.push(inbox);
        true
    }

    /// Returns false when the inbox was not registered.
    pub fn remove(&self, inbox: &Url) -> bool {
        let mut inboxes = self.inboxes.write();
        match inboxes.iter().position(|known| known == inbox) {
            Some(pos) => {
                inboxes.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> Vec<Url> {
        self.inboxes.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inboxes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inboxes.read().is_empty()
    }
}
