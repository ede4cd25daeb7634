/// Resume state carried across reconnects.
///
/// Ready supplies the identity, every dispatch bumps the sequence, and a
/// non-resumable invalid session wipes both.
#[derive(Debug, Clone, Default)]
pub struct ResumeSession {
    identity: Option<SessionIdentity>,
    last_sequence: Option<u64>,
}

#[derive(Debug, Clone)]
struct SessionIdentity {
    id: String,
    gateway_url: Option<String>,
}

impl ResumeSession {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            identity: None,
            last_sequence: None,
        }
    }

    /// Records the session identity announced by Ready.
    pub fn record(&mut self, id: String, gateway_url: Option<String>) {
        self.identity = Some(SessionIdentity { id, gateway_url });
    }

    /// Records the sequence of a dispatch. `None` leaves the last value.
    pub fn record_sequence(&mut self, sequence: Option<u64>) {
        if sequence.is_some() {
            self.last_sequence = sequence;
        }
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.id.as_str())
    }

    /// Resume endpoint announced by Ready, when the server sent one.
    #[must_use]
    pub fn gateway_url(&self) -> Option<&str> {
        self.identity
            .as_ref()
            .and_then(|identity| identity.gateway_url.as_deref())
    }

    #[must_use]
    pub const fn sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    /// A resume needs both an identity and at least one seen sequence.
    #[must_use]
    pub const fn can_resume(&self) -> bool {
        self.identity.is_some() && self.last_sequence.is_some()
    }

    pub fn clear(&mut self) {
        self.identity = None;
        self.last_sequence = None;
    }
}
