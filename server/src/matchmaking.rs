//! First-come first-served matchmaking
//!
//! Participants wait in arrival order. As soon as two are waiting they are
//! taken off the queue together, put into a brand new room, and given colours
//! by a coin flip so that queue position does not decide who moves first.

use crate::registry::{Release, SessionRegistry};
use log::{info, warn};
use rand::Rng;
use shared::Color;
use std::collections::VecDeque;

/// Two participants placed into a new room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    pub room_id: String,
    pub players: [(u32, Color); 2],
    /// Seats the players held elsewhere and gave up to join this room
    pub released: Vec<Release>,
}

#[derive(Debug, Default)]
pub struct WaitingQueue {
    waiting: VecDeque<u32>,
}

impl WaitingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the participant at the back. Returns false if already waiting.
    pub fn enqueue(&mut self, participant: u32) -> bool {
        if self.contains(participant) {
            return false;
        }
        self.waiting.push_back(participant);
        true
    }

    /// Removes the participant. Returns false if they were not waiting.
    pub fn cancel(&mut self, participant: u32) -> bool {
        let before = self.waiting.len();
        self.waiting.retain(|id| *id != participant);
        self.waiting.len() != before
    }

    pub fn contains(&self, participant: u32) -> bool {
        self.waiting.contains(&participant)
    }

    /// Pairs the two longest-waiting participants into a new room.
    ///
    /// Returns `None` while fewer than two are waiting. Taking both entries
    /// and seating them happens in one call, so nobody can be paired twice.
    pub fn pair_next<R: Rng + ?Sized>(
        &mut self,
        registry: &mut SessionRegistry,
        rng: &mut R,
    ) -> Option<Pairing> {
        if self.waiting.len() < 2 {
            return None;
        }
        let first = self.waiting.pop_front()?;
        let second = self.waiting.pop_front()?;

        let (first_color, second_color) = if rng.gen_bool(0.5) {
            (Color::Black, Color::White)
        } else {
            (Color::White, Color::Black)
        };

        let room_id = registry.create_session(rng);
        let mut players = [(first, first_color), (second, second_color)];
        let mut released = Vec::new();
        for (participant, color) in players.iter_mut() {
            match registry.bind_participant(&room_id, *participant, Some(*color)) {
                Ok(binding) => {
                    *color = binding.color;
                    released.extend(binding.previous);
                }
                Err(err) => warn!(
                    "Could not seat participant {} in {}: {}",
                    participant, room_id, err
                ),
            }
        }

        info!(
            "Matched {} ({}) with {} ({}) in {}",
            players[0].0, players[0].1, players[1].0, players[1].1, room_id
        );
        Some(Pairing {
            room_id,
            players,
            released,
        })
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
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_enqueue_is_idempotent() {
        let mut queue = WaitingQueue::new();
        assert!(queue.enqueue(1));
        assert!(!queue.enqueue(1));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_cancel() {
        let mut queue = WaitingQueue::new();
        queue.enqueue(1);
        queue.enqueue(2);

        assert!(queue.cancel(1));
        assert!(!queue.cancel(1));
        assert!(!queue.contains(1));
        assert!(queue.contains(2));
    }

    #[test]
    fn test_single_participant_not_paired() {
        let mut queue = WaitingQueue::new();
        let mut registry = SessionRegistry::new();
        let mut rng = StdRng::seed_from_u64(1);

        queue.enqueue(1);
        assert!(queue.pair_next(&mut registry, &mut rng).is_none());
        assert_eq!(queue.len(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_pair_two_oldest() {
        let mut queue = WaitingQueue::new();
        let mut registry = SessionRegistry::new();
        let mut rng = StdRng::seed_from_u64(1);

        queue.enqueue(1);
        queue.enqueue(2);
        queue.enqueue(3);

        let pairing = queue.pair_next(&mut registry, &mut rng).unwrap();
        let ids: Vec<u32> = pairing.players.iter().map(|(id, _)| *id).collect();

        assert_eq!(ids, vec![1, 2]);
        assert_ne!(pairing.players[0].1, pairing.players[1].1);
        assert_eq!(queue.len(), 1);
        assert!(queue.contains(3));

        assert_eq!(registry.session_of(1), Some(pairing.room_id.as_str()));
        assert_eq!(registry.session_of(2), Some(pairing.room_id.as_str()));
        assert_eq!(registry.color_of(1), Some(pairing.players[0].1));
        assert_eq!(registry.color_of(2), Some(pairing.players[1].1));
    }

    #[test]
    fn test_pairing_reports_released_seat() {
        let mut queue = WaitingQueue::new();
        let mut registry = SessionRegistry::new();
        let mut rng = StdRng::seed_from_u64(1);
        registry.bind_participant("old", 1, None).unwrap();
        registry.bind_participant("old", 3, None).unwrap();

        queue.enqueue(1);
        queue.enqueue(2);
        let pairing = queue.pair_next(&mut registry, &mut rng).unwrap();

        assert_eq!(pairing.released.len(), 1);
        assert_eq!(pairing.released[0].room_id, "old");
        assert!(pairing.released[0].forfeited);
        assert_eq!(registry.session_of(1), Some(pairing.room_id.as_str()));
        assert_eq!(registry.participants("old"), vec![3]);
    }

    #[test]
    fn test_fresh_pairing_releases_nothing() {
        let mut queue = WaitingQueue::new();
        let mut registry = SessionRegistry::new();
        let mut rng = StdRng::seed_from_u64(1);

        queue.enqueue(1);
        queue.enqueue(2);
        let pairing = queue.pair_next(&mut registry, &mut rng).unwrap();
        assert!(pairing.released.is_empty());
    }

    #[test]
    fn test_cancelled_participant_not_paired() {
        let mut queue = WaitingQueue::new();
        let mut registry = SessionRegistry::new();
        let mut rng = StdRng::seed_from_u64(1);

        queue.enqueue(1);
        queue.enqueue(2);
        queue.cancel(1);
        queue.enqueue(3);

        let pairing = queue.pair_next(&mut registry, &mut rng).unwrap();
        let ids: Vec<u32> = pairing.players.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_coin_flip_not_tied_to_queue_order() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut first_was_black = 0;

        for round in 0..200u32 {
            let mut queue = WaitingQueue::new();
            let mut registry = SessionRegistry::new();
            queue.enqueue(round * 2);
            queue.enqueue(round * 2 + 1);
            let pairing = queue.pair_next(&mut registry, &mut rng).unwrap();
            if pairing.players[0].1 == Color::Black {
                first_was_black += 1;
            }
        }

        assert!(first_was_black > 50 && first_was_black < 150);
    }

    #[test]
    fn test_pairing_deterministic_with_seed() {
        let run = || {
            let mut queue = WaitingQueue::new();
            let mut registry = SessionRegistry::new();
            let mut rng = StdRng::seed_from_u64(2024);
            queue.enqueue(10);
            queue.enqueue(20);
            queue.pair_next(&mut registry, &mut rng).unwrap()
        };
        assert_eq!(run(), run());
    }
}
