use std::collections::VecDeque;

use crate::enums::PlayerId;

/// 먼저 들어온 순서대로 두 명씩 짝을 짓는 대기열
#[derive(Debug, Default)]
pub struct MatchQueue {
    waiting: VecDeque<PlayerId>,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이미 대기 중이면 false
    pub fn enqueue(&mut self, player_id: PlayerId) -> bool {
        if self.contains(player_id) {
            return false;
        }
        self.waiting.push_back(player_id);
        true
    }

    pub fn remove(&mut self, player_id: PlayerId) -> bool {
        let before = self.waiting.len();
        self.waiting.retain(|id| *id != player_id);
        before != self.waiting.len()
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.waiting.contains(&player_id)
    }

    /// 두 명 이상 대기 중이면 가장 오래 기다린 두 명을 꺼냅니다.
    pub fn pop_pair(&mut self) -> Option<(PlayerId, PlayerId)> {
        if self.waiting.len() < 2 {
            return None;
        }
        let first = self.waiting.pop_front()?;
        let second = self.waiting.pop_front()?;
        Some((first, second))
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_in_arrival_order() {
        let mut queue = MatchQueue::new();
        assert!(queue.enqueue(3));
        assert!(queue.enqueue(1));
        assert!(!queue.enqueue(3));
        assert_eq!(queue.pop_pair(), Some((3, 1)));
        assert!(queue.is_empty());
    }

    #[test]
    fn removed_players_are_not_paired() {
        let mut queue = MatchQueue::new();
        queue.enqueue(0);
        queue.enqueue(1);
        assert!(queue.remove(0));
        assert!(!queue.remove(0));
        assert_eq!(queue.pop_pair(), None);
        assert_eq!(queue.len(), 1);
    }
}
