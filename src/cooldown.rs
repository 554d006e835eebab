use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Last successful reply per channel. Process-lifetime only; never evicted.
#[derive(Debug, Default)]
pub struct ChannelCooldowns {
    last_reply: Mutex<HashMap<String, Instant>>,
}

impl ChannelCooldowns {
    pub fn new() -> Self {
        Self::default()
    }

    /// When we last replied in `chat_id`, or `None` if we never have.
    pub fn last(&self, chat_id: &str) -> Option<Instant> {
        let map = self.last_reply.lock().unwrap_or_else(|e| e.into_inner());
        map.get(chat_id).copied()
    }

    pub fn record(&self, chat_id: &str, at: Instant) {
        let mut map = self.last_reply.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(chat_id.to_string(), at);
    }

    /// True while less than `window` has passed since the last reply in `chat_id`.
    pub fn in_cooldown(&self, chat_id: &str, now: Instant, window: Duration) -> bool {
        match self.last(chat_id) {
            Some(last) => now.saturating_duration_since(last) < window,
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.last_reply.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_channel_has_no_entry() {
        let cooldowns = ChannelCooldowns::new();
        assert!(cooldowns.last("123").is_none());
        assert!(!cooldowns.in_cooldown("123", Instant::now(), Duration::from_secs(25)));
        assert_eq!(cooldowns.len(), 0);
    }

    #[test]
    fn test_record_and_window() {
        let cooldowns = ChannelCooldowns::new();
        let t0 = Instant::now();
        cooldowns.record("123", t0);
        assert_eq!(cooldowns.last("123"), Some(t0));

        let window = Duration::from_secs(25);
        assert!(cooldowns.in_cooldown("123", t0 + Duration::from_secs(1), window));
        assert!(cooldowns.in_cooldown("123", t0 + Duration::from_millis(24_999), window));
        assert!(!cooldowns.in_cooldown("123", t0 + window, window));
        assert!(!cooldowns.in_cooldown("456", t0, window));
    }

    #[test]
    fn test_record_overwrites() {
        let cooldowns = ChannelCooldowns::new();
        let t0 = Instant::now();
        cooldowns.record("a", t0);
        cooldowns.record("a", t0 + Duration::from_secs(5));
        cooldowns.record("b", t0);
        assert_eq!(cooldowns.last("a"), Some(t0 + Duration::from_secs(5)));
        assert_eq!(cooldowns.len(), 2);
    }

    #[test]
    fn test_now_before_last_counts_as_cooling() {
        let cooldowns = ChannelCooldowns::new();
        let t0 = Instant::now();
        cooldowns.record("a", t0 + Duration::from_secs(10));
        assert!(cooldowns.in_cooldown("a", t0, Duration::from_secs(1)));
    }
}
