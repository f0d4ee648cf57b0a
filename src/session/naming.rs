//! Naming step that runs after a meeting is created.

use async_trait::async_trait;

use crate::remote::MeetingId;

/// Supplies a display name for a freshly created meeting.
///
/// `None` or a blank answer means "use the default name".
#[async_trait]
pub trait MeetingNamer: Send + Sync {
    async fn prompt_name(&self, meeting_id: &MeetingId) -> Option<String>;
}

/// Never asks; every meeting gets the default name.
pub struct DefaultName;

#[async_trait]
impl MeetingNamer for DefaultName {
    async fn prompt_name(&self, _meeting_id: &MeetingId) -> Option<String> {
        None
    }
}

/// Always answers with the same name, e.g. from `--name`.
pub struct FixedName(pub String);

#[async_trait]
impl MeetingNamer for FixedName {
    async fn prompt_name(&self, _meeting_id: &MeetingId) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Trim the answer and fall back to `default` when it is blank.
pub fn resolve_name(answer: Option<String>, default: &str) -> String {
    answer
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_name() {
        assert_eq!(resolve_name(Some("  Standup ".to_string()), "Untitled"), "Standup");
        assert_eq!(resolve_name(Some("   ".to_string()), "Untitled"), "Untitled");
        assert_eq!(resolve_name(None, "Untitled"), "Untitled");
    }

    #[tokio::test]
    async fn test_fixed_name() {
        let namer = FixedName("Retro".to_string());
        assert_eq!(
            namer.prompt_name(&MeetingId::from("m1")).await.as_deref(),
            Some("Retro")
        );
        assert!(DefaultName.prompt_name(&MeetingId::from("m1")).await.is_none());
    }
}
