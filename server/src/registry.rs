//! Authoritative player registry for the session server
//!
//! This module owns the server-side mapping from connections to player state:
//! - Id assignment on accept and release on disconnect
//! - Input integration into authoritative positions
//! - Snapshot production for the broadcast loop
//!
//! Exactly one player exists per live connection; removing the connection
//! removes the player, and the freed id becomes eligible for reassignment.
//! Ids are a connection index, not a permanent player identity.

use log::info;
use shared::PlayerState;
use std::collections::HashMap;

/// Playable-area size. When configured, integrated positions are clamped to
/// `[0, width] x [0, height]`; by default positions are unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

/// All currently registered players, indexed by connection id.
pub struct Registry {
    players: HashMap<u32, PlayerState>,
    bounds: Option<WorldBounds>,
}

impl Registry {
    pub fn new(bounds: Option<WorldBounds>) -> Self {
        Self {
            players: HashMap::new(),
            bounds,
        }
    }

    /// Registers a zero-initialized player under the smallest free id.
    ///
    /// Ids start at 0 and the lowest id not bound to a live connection is
    /// always picked, so an id freed by a disconnect is reused by the next
    /// connection.
    pub fn add_player(&mut self) -> u32 {
        let mut id = 0;
        while self.players.contains_key(&id) {
            id += 1;
        }
        self.players.insert(id, PlayerState::new(id));
        info!("Registered player {}", id);
        id
    }

    /// Removes a player when its connection closes. Returns false if the id
    /// was already gone, which makes teardown idempotent.
    pub fn remove_player(&mut self, id: u32) -> bool {
        if self.players.remove(&id).is_some() {
            info!("Removed player {}", id);
            true
        } else {
            false
        }
    }

    /// Stores the latest input delta and integrates it into the player's
    /// authoritative position. Returns false for an unknown id.
    pub fn apply_input(&mut self, id: u32, dx: i32, dy: i32) -> bool {
        let Some(player) = self.players.get_mut(&id) else {
            return false;
        };

        player.dx = dx;
        player.dy = dy;
        player.x += dx as f32;
        player.y += dy as f32;

        if let Some(bounds) = self.bounds {
            player.x = player.x.clamp(0.0, bounds.width);
            player.y = player.y.clamp(0.0, bounds.height);
        }

        true
    }

    /// Builds the complete current snapshot, ascending by id.
    pub fn snapshot(&self) -> Vec<PlayerState> {
        let mut players: Vec<PlayerState> = self.players.values().cloned().collect();
        players.sort_by_key(|p| p.id);
        players
    }

    pub fn contains(&self, id: u32) -> bool {
        self.players.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn ids_start_at_zero_and_increment() {
        let mut registry = Registry::new(None);

        assert_eq!(registry.add_player(), 0);
        assert_eq!(registry.add_player(), 1);
        assert_eq!(registry.add_player(), 2);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn freed_id_is_reused() {
        let mut registry = Registry::new(None);

        let a = registry.add_player();
        let b = registry.add_player();
        assert_eq!((a, b), (0, 1));

        assert!(registry.remove_player(a));
        assert_eq!(registry.add_player(), 0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn smallest_free_id_wins() {
        let mut registry = Registry::new(None);

        for _ in 0..4 {
            registry.add_player();
        }
        registry.remove_player(1);
        registry.remove_player(3);

        assert_eq!(registry.add_player(), 1);
        assert_eq!(registry.add_player(), 3);
        assert_eq!(registry.add_player(), 4);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut registry = Registry::new(None);
        let id = registry.add_player();

        assert!(registry.remove_player(id));
        assert!(!registry.remove_player(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn new_player_is_zero_initialized() {
        let mut registry = Registry::new(None);
        let id = registry.add_player();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, id);
        assert_eq!(snapshot[0].x, 0.0);
        assert_eq!(snapshot[0].y, 0.0);
    }

    #[test]
    fn input_integrates_into_position() {
        let mut registry = Registry::new(None);
        let id = registry.add_player();

        assert!(registry.apply_input(id, 5, 0));
        assert!(registry.apply_input(id, 0, -3));

        let snapshot = registry.snapshot();
        assert_approx_eq!(snapshot[0].x, 5.0);
        assert_approx_eq!(snapshot[0].y, -3.0);
        assert_eq!(snapshot[0].dx, 0);
        assert_eq!(snapshot[0].dy, -3);
    }

    #[test]
    fn opposite_inputs_net_zero() {
        let mut registry = Registry::new(None);
        let id = registry.add_player();

        registry.apply_input(id, 5, 0);
        registry.apply_input(id, -5, 0);

        assert_approx_eq!(registry.snapshot()[0].x, 0.0);
    }

    #[test]
    fn input_for_unknown_id_is_rejected() {
        let mut registry = Registry::new(None);
        assert!(!registry.apply_input(99, 1, 1));
    }

    #[test]
    fn positions_unbounded_by_default() {
        let mut registry = Registry::new(None);
        let id = registry.add_player();

        registry.apply_input(id, -500, 9000);

        let snapshot = registry.snapshot();
        assert_approx_eq!(snapshot[0].x, -500.0);
        assert_approx_eq!(snapshot[0].y, 9000.0);
    }

    #[test]
    fn configured_bounds_clamp_positions() {
        let mut registry = Registry::new(Some(WorldBounds {
            width: 1000.0,
            height: 700.0,
        }));
        let id = registry.add_player();

        registry.apply_input(id, -500, 9000);

        let snapshot = registry.snapshot();
        assert_approx_eq!(snapshot[0].x, 0.0);
        assert_approx_eq!(snapshot[0].y, 700.0);
    }

    #[test]
    fn snapshot_is_ordered_by_id() {
        let mut registry = Registry::new(None);
        for _ in 0..5 {
            registry.add_player();
        }
        registry.remove_player(2);
        registry.add_player();

        let ids: Vec<u32> = registry.snapshot().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn one_player_per_connection_no_ghosts() {
        let mut registry = Registry::new(None);

        let mut live = Vec::new();
        for _ in 0..8 {
            live.push(registry.add_player());
        }
        for id in [1, 4, 6] {
            registry.remove_player(id);
            live.retain(|&x| x != id);
        }

        assert_eq!(registry.len(), live.len());
        for id in &live {
            assert!(registry.contains(*id));
        }
        let snapshot_ids: Vec<u32> = registry.snapshot().iter().map(|p| p.id).collect();
        let mut expected = live.clone();
        expected.sort_unstable();
        assert_eq!(snapshot_ids, expected);
    }
}
