//! # Playlist Cursor
//!
//! Navigable position within a [`Playlist`] under shuffle and repeat
//! policies.
//!
//! The cursor keeps an *effective order*: a list of indices into the
//! playlist. Without shuffle it is the identity; with shuffle it is a
//! permutation fixed when shuffle was switched on, with the then-current item
//! moved to the front so switching never changes what is playing. Every index
//! the cursor reports or accepts addresses the effective order.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{PlaybackError, Result};
use crate::item::{PlayableItem, Playlist};

/// Repeat policy applied by `forward`/`backward`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RepeatMode {
    /// Stop at either end of the playlist.
    #[default]
    None,
    /// Wrap around at either end.
    All,
    /// Stay on the current item.
    Item,
}

/// Cursor over a playlist.
#[derive(Debug, Default)]
pub struct PlaylistCursor {
    playlist: Option<Playlist>,
    order: Vec<usize>,
    position: Option<usize>,
    shuffled: bool,
    repeat_mode: RepeatMode,
}

impl PlaylistCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the playlist and move to its first item.
    ///
    /// Shuffle and repeat settings are kept; with shuffle on, a new
    /// permutation is drawn for the new playlist.
    pub fn set_playlist(&mut self, playlist: Playlist) {
        self.set_playlist_with_rng(playlist, &mut rand::thread_rng());
    }

    pub fn set_playlist_with_rng<R: Rng + ?Sized>(&mut self, playlist: Playlist, rng: &mut R) {
        let len = playlist.len();
        self.order = (0..len).collect();
        if self.shuffled {
            self.order.shuffle(rng);
        }
        self.position = if len == 0 { None } else { Some(0) };
        self.playlist = Some(playlist);
    }

    /// Move to `index` in the effective order.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::IndexOutOfRange`] if `index >= len()`; the cursor is
    /// left unchanged.
    pub fn set_index(&mut self, index: usize) -> Result<()> {
        let len = self.len();
        if index >= len {
            return Err(PlaybackError::IndexOutOfRange { index, len });
        }
        self.position = Some(index);
        Ok(())
    }

    /// Advance according to the repeat mode and return the new current item.
    pub fn forward(&mut self) -> Option<Arc<PlayableItem>> {
        let next = self.next_position()?;
        self.position = Some(next);
        self.current_item()
    }

    /// Step back according to the repeat mode and return the new current item.
    pub fn backward(&mut self) -> Option<Arc<PlayableItem>> {
        let previous = self.previous_position()?;
        self.position = Some(previous);
        self.current_item()
    }

    pub fn can_forward(&self) -> bool {
        self.next_position().is_some()
    }

    pub fn can_backward(&self) -> bool {
        self.previous_position().is_some()
    }

    fn next_position(&self) -> Option<usize> {
        let position = self.position?;
        let len = self.len();
        match self.repeat_mode {
            RepeatMode::Item => Some(position),
            RepeatMode::All => Some((position + 1) % len),
            RepeatMode::None => (position + 1 < len).then_some(position + 1),
        }
    }

    fn previous_position(&self) -> Option<usize> {
        let position = self.position?;
        let len = self.len();
        match self.repeat_mode {
            RepeatMode::Item => Some(position),
            RepeatMode::All => Some(if position == 0 { len - 1 } else { position - 1 }),
            RepeatMode::None => position.checked_sub(1),
        }
    }

    /// Drop the playlist; there is no current item afterwards.
    pub fn reset(&mut self) {
        self.playlist = None;
        self.order.clear();
        self.position = None;
    }

    /// Switch shuffle on or off, keeping the current item.
    pub fn set_shuffled(&mut self, shuffled: bool) {
        self.set_shuffled_with_rng(shuffled, &mut rand::thread_rng());
    }

    pub fn set_shuffled_with_rng<R: Rng + ?Sized>(&mut self, shuffled: bool, rng: &mut R) {
        if self.shuffled == shuffled {
            return;
        }
        self.shuffled = shuffled;

        let current = self.position.map(|position| self.order[position]);
        let len = self.len();

        if shuffled {
            let mut rest: Vec<usize> = (0..len).filter(|&i| Some(i) != current).collect();
            rest.shuffle(rng);
            self.order = current.into_iter().chain(rest).collect();
            self.position = current.map(|_| 0);
        } else {
            self.order = (0..len).collect();
            self.position = current;
        }
    }

    pub fn current_item(&self) -> Option<Arc<PlayableItem>> {
        let position = self.position?;
        let playlist = self.playlist.as_ref()?;
        playlist.get(self.order[position]).cloned()
    }

    /// Current index in the effective order.
    pub fn current_index(&self) -> Option<usize> {
        self.position
    }

    /// Position of `item` in the effective order.
    pub fn index_of(&self, item: &PlayableItem) -> Option<usize> {
        let playlist = self.playlist.as_ref()?;
        self.order
            .iter()
            .position(|&i| playlist.items()[i].as_ref() == item)
    }

    /// Items in the effective order.
    pub fn items(&self) -> Vec<Arc<PlayableItem>> {
        match &self.playlist {
            Some(playlist) => self
                .order
                .iter()
                .map(|&i| Arc::clone(&playlist.items()[i]))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn playlist(&self) -> Option<&Playlist> {
        self.playlist.as_ref()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat_mode = mode;
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn playlist(len: usize) -> Playlist {
        let items = (0..len)
            .map(|i| Arc::new(PlayableItem::new(format!("/media/{}.ogg", i))))
            .collect();
        Playlist::collection("test", items)
    }

    fn cursor(len: usize, mode: RepeatMode) -> PlaylistCursor {
        let mut cursor = PlaylistCursor::new();
        cursor.set_repeat_mode(mode);
        cursor.set_playlist(playlist(len));
        cursor
    }

    fn path_of(item: &Arc<PlayableItem>) -> String {
        item.path().display().to_string()
    }

    #[test]
    fn test_set_playlist_starts_at_zero() {
        let cursor = cursor(3, RepeatMode::None);
        assert_eq!(cursor.current_index(), Some(0));
        assert_eq!(cursor.len(), 3);
    }

    #[test]
    fn test_empty_playlist() {
        let mut cursor = cursor(0, RepeatMode::All);
        assert!(cursor.current_item().is_none());
        assert!(cursor.current_index().is_none());
        assert!(cursor.forward().is_none());
        assert!(cursor.backward().is_none());
        assert!(!cursor.can_forward());
        assert!(!cursor.can_backward());
    }

    #[test]
    fn test_set_index_out_of_range_leaves_cursor() {
        let mut cursor = cursor(3, RepeatMode::None);
        cursor.set_index(2).unwrap();

        let err = cursor.set_index(3).unwrap_err();
        assert!(matches!(err, PlaybackError::IndexOutOfRange { index: 3, len: 3 }));
        assert_eq!(cursor.current_index(), Some(2));
    }

    #[test]
    fn test_repeat_none_stops_at_ends() {
        let mut cursor = cursor(2, RepeatMode::None);
        assert!(!cursor.can_backward());
        assert!(cursor.backward().is_none());
        assert_eq!(cursor.current_index(), Some(0));

        assert!(cursor.forward().is_some());
        assert_eq!(cursor.current_index(), Some(1));
        assert!(!cursor.can_forward());
        assert!(cursor.forward().is_none());
        assert_eq!(cursor.current_index(), Some(1));
    }

    #[test]
    fn test_repeat_all_cycles_back_to_start() {
        for len in 1..6 {
            let mut cursor = cursor(len, RepeatMode::All);
            cursor.set_index(len / 2).unwrap();
            let start = cursor.current_index();
            for _ in 0..len {
                assert!(cursor.forward().is_some());
            }
            assert_eq!(cursor.current_index(), start);
        }
    }

    #[test]
    fn test_repeat_all_index_sequence() {
        let mut cursor = cursor(3, RepeatMode::All);
        let mut seen = Vec::new();
        for _ in 0..3 {
            cursor.forward();
            seen.push(cursor.current_index().unwrap());
        }
        assert_eq!(seen, vec![1, 2, 0]);

        cursor.backward();
        assert_eq!(cursor.current_index(), Some(2));
    }

    #[test]
    fn test_repeat_item_is_fixed_point() {
        let mut cursor = cursor(4, RepeatMode::Item);
        cursor.set_index(2).unwrap();
        let current = cursor.current_item().unwrap();

        assert_eq!(cursor.forward().unwrap(), current);
        assert_eq!(cursor.backward().unwrap(), current);
        assert_eq!(cursor.current_index(), Some(2));
    }

    #[test]
    fn test_reset_clears_everything_but_policies() {
        let mut cursor = cursor(3, RepeatMode::All);
        cursor.set_shuffled(true);
        cursor.reset();
        cursor.reset();

        assert!(cursor.current_item().is_none());
        assert!(cursor.playlist().is_none());
        assert!(cursor.is_empty());
        assert_eq!(cursor.repeat_mode(), RepeatMode::All);
        assert!(cursor.is_shuffled());
    }

    #[test]
    fn test_shuffle_keeps_current_and_is_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut cursor = cursor(8, RepeatMode::None);
        cursor.set_index(5).unwrap();
        let current = cursor.current_item().unwrap();

        cursor.set_shuffled_with_rng(true, &mut rng);
        assert_eq!(cursor.current_item().unwrap(), current);
        assert_eq!(cursor.current_index(), Some(0));

        let mut paths: Vec<String> = cursor.items().iter().map(path_of).collect();
        paths.sort();
        let mut expected: Vec<String> = (0..8).map(|i| format!("/media/{}.ogg", i)).collect();
        expected.sort();
        assert_eq!(paths, expected);
    }

    #[test]
    fn test_shuffle_order_is_fixed_between_steps() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut cursor = cursor(6, RepeatMode::All);
        cursor.set_shuffled_with_rng(true, &mut rng);
        let order = cursor.items();

        let mut walked = vec![cursor.current_item().unwrap()];
        for _ in 1..6 {
            walked.push(cursor.forward().unwrap());
        }
        assert_eq!(walked, order);
    }

    #[test]
    fn test_unshuffle_relocates_current() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut cursor = cursor(5, RepeatMode::None);
        cursor.set_shuffled_with_rng(true, &mut rng);
        cursor.forward();
        cursor.forward();
        let current = cursor.current_item().unwrap();

        cursor.set_shuffled(false);
        assert_eq!(cursor.current_item().unwrap(), current);
        assert_eq!(cursor.current_index(), cursor.playlist().unwrap().position(&current));
    }

    #[test]
    fn test_index_of_uses_effective_order() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut cursor = cursor(4, RepeatMode::None);
        cursor.set_shuffled_with_rng(true, &mut rng);

        for (index, item) in cursor.items().iter().enumerate() {
            assert_eq!(cursor.index_of(item), Some(index));
        }
        assert!(cursor.index_of(&PlayableItem::new("/elsewhere.ogg")).is_none());
    }

    #[test]
    fn test_set_playlist_keeps_flags() {
        let mut cursor = cursor(3, RepeatMode::Item);
        cursor.set_shuffled(true);
        cursor.set_playlist(playlist(4));

        assert_eq!(cursor.repeat_mode(), RepeatMode::Item);
        assert!(cursor.is_shuffled());
        assert_eq!(cursor.current_index(), Some(0));
        assert_eq!(cursor.len(), 4);
    }
}
